//! HTTP API module - REST endpoints and WebSocket

mod characters;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::characters::{CharacterKind, CharacterStore};
use crate::combat::CombatManager;
use crate::db::Database;
use crate::dice::DiceEngine;
use crate::error::{CoreError, CoreResult};
use crate::sync::{ConnectionManager, SyncProjector};
pub use websocket::ClientMessage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub store: Arc<CharacterStore>,
    pub connections: Arc<ConnectionManager>,
    pub projector: Arc<SyncProjector>,
}

impl AppState {
    /// Load every stored character and wire the store, combat registry,
    /// hub and projector together
    pub async fn new(db: Arc<Database>, dice: Arc<DiceEngine>) -> CoreResult<Self> {
        let store = CharacterStore::load(db.pool().clone()).await?.shared();
        let combat = CombatManager::shared(store.clone(), dice.clone());
        let connections = Arc::new(ConnectionManager::new());
        let projector = Arc::new(SyncProjector::new(
            store.clone(),
            dice,
            combat,
            connections.clone(),
        ));

        Ok(Self {
            db,
            store,
            connections,
            projector,
        })
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .merge(characters::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "tabletopd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
                characters: state.store.len(),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
                characters: state.store.len(),
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    characters: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Database failure body, one entry per failure
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub loc: Vec<&'static str>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Display name of a kind in response messages
pub(crate) fn kind_label(kind: CharacterKind) -> &'static str {
    match kind {
        CharacterKind::Player => "Player",
        CharacterKind::Enemy => "Enemy",
        CharacterKind::Npc => "NPC",
    }
}

/// Failure of a character request
#[derive(Debug)]
pub enum ApiError {
    /// Store or validation failure on a character of this kind
    Core(CharacterKind, CoreError),
    /// No such character (including ids that do not parse)
    NotFound(CharacterKind),
    /// Body could not be read
    BadRequest(String),
}

impl ApiError {
    pub fn core(kind: CharacterKind) -> impl Fn(CoreError) -> ApiError {
        move |e| ApiError::Core(kind, e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = |status: StatusCode, message: String| {
            (status, Json(ErrorResponse { error: message })).into_response()
        };

        match self {
            ApiError::NotFound(kind) | ApiError::Core(kind, CoreError::NotFound(_)) => error(
                StatusCode::NOT_FOUND,
                format!("{} not found", kind_label(kind)),
            ),
            ApiError::BadRequest(message) => error(StatusCode::BAD_REQUEST, message),
            ApiError::Core(_, CoreError::Validation(e)) => {
                error(StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Core(_, e) => {
                error!("Character request failed: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(DetailResponse {
                        detail: vec![ErrorDetail {
                            loc: vec!["query"],
                            msg: e.to_string(),
                            kind: "database_error",
                        }],
                    }),
                )
                    .into_response()
            }
        }
    }
}
