//! WebSocket handler for live dashboard connections

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use serde::{Deserialize, Deserializer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::AppState;
use crate::characters::{CharacterId, CharacterKind, VitalField};
use crate::combat::CombatError;
use crate::sync::{ConnectionId, Role, ServerMessage, Subscription};

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Choose what this connection receives
    Subscribe {
        role: Role,
        character_id: Option<CharacterId>,
    },
    Chat {
        #[serde(default)]
        recipients: Vec<CharacterId>,
        text: String,
    },
    /// Host only: open the combat overlay
    OpenCombat,
    /// Host only: replace the tracked character set
    Track { character_ids: Vec<CharacterId> },
    /// Host only: move a current-value slider
    AdjustVital {
        character_id: CharacterId,
        field: VitalField,
        #[serde(deserialize_with = "number_or_string")]
        value: f64,
    },
    /// Host only: roll the generic combat die
    RollCombatDie { faces: u32 },
    /// Host only
    CloseCombat,
    /// Keepalive
    Ping,
}

/// Range inputs report their value as a string
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("value {text:?} is not a number"))),
    }
}

/// Handle WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode server message: {}", e);
            true
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Pushed events for this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let conn_id = uuid::Uuid::new_v4();
    info!("WebSocket connected: {}", conn_id);
    state.connections.register(conn_id, tx);

    if send(&mut socket, &ServerMessage::Welcome { connection_id: conn_id }).await {
        // Main loop: push events out, handle client requests
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if !send(&mut socket, &msg).await {
                        break;
                    }
                }
                result = socket.recv() => {
                    match result {
                        Some(Ok(Message::Text(text))) => {
                            let replies = match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(msg) => handle_client_message(&state, conn_id, msg).await,
                                Err(e) => vec![ServerMessage::Error {
                                    message: format!("invalid message: {}", e),
                                }],
                            };
                            let mut open = true;
                            for reply in &replies {
                                if !send(&mut socket, reply).await {
                                    open = false;
                                    break;
                                }
                            }
                            if !open {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                        _ => {}
                    }
                }
            }
        }
    }

    // Clean up; a host's combat session does not outlive its connection
    if state.connections.unregister(conn_id) == Some(Subscription::Host) {
        state.projector.close_combat(conn_id).await;
    }
    info!("WebSocket disconnected: {}", conn_id);
}

fn error(message: impl ToString) -> Vec<ServerMessage> {
    vec![ServerMessage::Error {
        message: message.to_string(),
    }]
}

/// Handle a message from the client, returning direct replies
async fn handle_client_message(
    state: &AppState,
    conn_id: ConnectionId,
    msg: ClientMessage,
) -> Vec<ServerMessage> {
    let subscription = state.connections.subscription(conn_id);
    debug!("Connection {} sent {:?}", conn_id, msg);

    match msg {
        ClientMessage::Ping => vec![ServerMessage::Pong],
        ClientMessage::Subscribe { role, character_id } => {
            subscribe(state, conn_id, role, character_id).await
        }
        ClientMessage::Chat { recipients, text } => {
            let Some(subscription) = subscription else {
                return error("subscribe before chatting");
            };
            match state
                .projector
                .send_chat(conn_id, subscription, recipients, &text)
                .await
            {
                // The echo arrives through the hub
                Ok(_) => Vec::new(),
                Err(e) => error(e),
            }
        }
        command => {
            if subscription != Some(Subscription::Host) {
                return error("combat commands are host only");
            }
            combat_command(state, conn_id, command)
                .await
                .unwrap_or_else(error)
        }
    }
}

async fn subscribe(
    state: &AppState,
    conn_id: ConnectionId,
    role: Role,
    character_id: Option<CharacterId>,
) -> Vec<ServerMessage> {
    let subscription = match (role, character_id) {
        (Role::Host, _) => Subscription::Host,
        (Role::Player, Some(id)) => match state.store.get_kind(id, CharacterKind::Player).await {
            Ok(_) => Subscription::Player(id),
            Err(e) => return error(e),
        },
        (Role::Player, None) => return error("player subscription needs a character_id"),
    };

    // Dropping the host role ends that host's combat session
    if state.connections.subscription(conn_id) == Some(Subscription::Host)
        && subscription != Subscription::Host
    {
        state.projector.close_combat(conn_id).await;
    }
    state.connections.subscribe(conn_id, subscription);
    info!("Connection {} subscribed as {:?}", conn_id, subscription);

    let ack = ServerMessage::Subscribed {
        role,
        character_id: match subscription {
            Subscription::Host => None,
            Subscription::Player(id) => Some(id),
        },
    };
    let initial = match subscription {
        Subscription::Host => state.projector.host_snapshot().await,
        Subscription::Player(id) => match state.projector.project_for_player(id).await {
            Ok(character) => ServerMessage::Character { character },
            Err(e) => return error(e),
        },
    };
    vec![ack, initial]
}

async fn combat_command(
    state: &AppState,
    host: ConnectionId,
    command: ClientMessage,
) -> Result<Vec<ServerMessage>, CombatError> {
    let projector = &state.projector;
    let replies = match command {
        ClientMessage::OpenCombat => vec![projector.open_combat(host).await?],
        ClientMessage::Track { character_ids } => vec![projector.track(host, character_ids).await?],
        ClientMessage::AdjustVital {
            character_id,
            field,
            value,
        } => {
            // Hosts see the new value through the vital push
            projector
                .adjust_vital(host, character_id, field, value)
                .await?;
            Vec::new()
        }
        ClientMessage::RollCombatDie { faces } => {
            let roll = projector.roll_combat_die(host, faces).await?;
            vec![ServerMessage::CombatRoll { roll }]
        }
        ClientMessage::CloseCombat => {
            projector.close_combat(host).await;
            vec![ServerMessage::CombatClosed]
        }
        ClientMessage::Ping | ClientMessage::Subscribe { .. } | ClientMessage::Chat { .. } => {
            Vec::new()
        }
    };
    Ok(replies)
}
