//! Character REST endpoints for players, enemies and NPCs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::{kind_label, ApiError, AppState};
use crate::characters::{CharacterId, CharacterKind, NewCharacter, Stats};
use crate::dice::DieType;
use crate::error::ValidationError;
use crate::sync::CharacterView;

/// Build the character router
pub fn router() -> Router<AppState> {
    let mut router = Router::new()
        .route(
            "/api/players/{id}/host-update",
            put(
                |State(state): State<AppState>, Path(id): Path<String>, body: EditBody| {
                    host_update(state, CharacterKind::Player, id, body)
                },
            ),
        )
        .route("/api/players/{id}/update-self", put(update_self));

    for (kind, base) in [
        (CharacterKind::Player, "/api/players"),
        (CharacterKind::Enemy, "/api/enemies"),
        (CharacterKind::Npc, "/api/npcs"),
    ] {
        let mut item = get(move |State(state): State<AppState>, Path(id): Path<String>| {
            get_character(state, kind, id)
        })
        .delete(move |State(state): State<AppState>, Path(id): Path<String>| {
            delete_character(state, kind, id)
        });
        // Players are edited through host-update / update-self instead
        if kind != CharacterKind::Player {
            item = item.put(
                move |State(state): State<AppState>, Path(id): Path<String>, body: EditBody| {
                    host_update(state, kind, id, body)
                },
            );
        }

        router = router
            .route(
                base,
                get(move |State(state): State<AppState>| list_characters(state, kind)).post(
                    move |State(state): State<AppState>, body: CreateBody| {
                        create_character(state, kind, body)
                    },
                ),
            )
            .route(&format!("{base}/{{id}}"), item)
            .route(
                &format!("{base}/{{id}}/roll/{{die}}"),
                post(
                    move |State(state): State<AppState>, Path((id, die)): Path<(String, String)>| {
                        roll_die(state, kind, id, die)
                    },
                ),
            );
    }

    router
}

type CreateBody = Result<Json<NewCharacter>, JsonRejection>;
type EditBody = Result<Json<Value>, JsonRejection>;

fn parse_id(kind: CharacterKind, raw: &str) -> Result<CharacterId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(kind))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// List every character of a kind as full records
async fn list_characters(state: AppState, kind: CharacterKind) -> Json<Vec<CharacterView>> {
    Json(state.projector.project_kind(kind).await)
}

async fn get_character(
    state: AppState,
    kind: CharacterKind,
    id: String,
) -> Result<Json<CharacterView>, ApiError> {
    let id = parse_id(kind, &id)?;
    let view = state
        .projector
        .project_character(id, kind)
        .await
        .map_err(ApiError::core(kind))?;
    Ok(Json(view))
}

/// Creation response
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: CharacterId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_applied: Option<Stats>,
}

async fn create_character(
    state: AppState,
    kind: CharacterKind,
    body: CreateBody,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(body)?;
    let character = state
        .projector
        .create(kind, request)
        .await
        .map_err(ApiError::core(kind))?;

    let stats_applied = (kind == CharacterKind::Player).then_some(character.stats);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: format!("{} created successfully", kind_label(kind)),
            id: character.id,
            stats_applied,
        }),
    ))
}

async fn host_update(
    state: AppState,
    kind: CharacterKind,
    id: String,
    body: EditBody,
) -> Result<Json<CharacterView>, ApiError> {
    let id = parse_id(kind, &id)?;
    let fields = json_body(body)?;
    let character = state
        .projector
        .apply_host_edit(id, kind, &fields)
        .await
        .map_err(ApiError::core(kind))?;
    Ok(Json(CharacterView::from(&character)))
}

async fn update_self(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: EditBody,
) -> Result<Json<CharacterView>, ApiError> {
    let kind = CharacterKind::Player;
    let id = parse_id(kind, &id)?;
    let fields = json_body(body)?;
    let character = state
        .projector
        .apply_self_edit(id, &fields)
        .await
        .map_err(ApiError::core(kind))?;
    Ok(Json(CharacterView::from(&character)))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn delete_character(
    state: AppState,
    kind: CharacterKind,
    id: String,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(kind, &id)?;
    state
        .projector
        .remove(id, kind)
        .await
        .map_err(ApiError::core(kind))?;
    Ok(Json(MessageResponse {
        message: format!("{} with id {} deleted successfully", kind_label(kind), id),
    }))
}

/// Roll response
#[derive(Debug, Serialize)]
pub struct RollResponse {
    pub message: String,
    pub result: u32,
    pub dice_type: DieType,
    pub character_name: String,
}

/// Unknown characters are reported before unsupported dice
async fn roll_die(
    state: AppState,
    kind: CharacterKind,
    id: String,
    die: String,
) -> Result<Json<RollResponse>, ApiError> {
    let id = parse_id(kind, &id)?;
    state
        .store
        .get_kind(id, kind)
        .await
        .map_err(ApiError::core(kind))?;
    let die: DieType = die
        .parse()
        .map_err(|e: ValidationError| ApiError::Core(kind, e.into()))?;

    let outcome = state
        .projector
        .roll(id, kind, die)
        .await
        .map_err(ApiError::core(kind))?;
    Ok(Json(RollResponse {
        message: format!("Rolled {}", die),
        result: outcome.result,
        dice_type: die,
        character_name: outcome.character.name,
    }))
}
