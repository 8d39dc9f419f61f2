//! Push hub for connected dashboards

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::views::{CharacterSummary, CharacterView};
use crate::characters::{CharacterId, CharacterKind, VitalField};
use crate::combat::{CombatRoll, CombatSnapshot};
use crate::dice::DieType;

/// Identifies one websocket connection
pub type ConnectionId = Uuid;

/// Who is on the other end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Player,
}

/// What a connection has asked to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// Every character event
    Host,
    /// Events about one character
    Player(CharacterId),
}

impl Subscription {
    pub fn role(self) -> Role {
        match self {
            Subscription::Host => Role::Host,
            Subscription::Player(_) => Role::Player,
        }
    }
}

/// Recipients of one push event. A connection matching several rules gets
/// the event once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audience {
    pub hosts: bool,
    pub characters: Vec<CharacterId>,
    pub connections: Vec<ConnectionId>,
}

impl Audience {
    /// Every host connection
    pub fn hosts() -> Self {
        Self {
            hosts: true,
            ..Self::default()
        }
    }

    /// Hosts plus players watching `id`
    pub fn character(id: CharacterId) -> Self {
        Self {
            hosts: true,
            characters: vec![id],
            connections: Vec::new(),
        }
    }

    /// A single connection
    pub fn connection(id: ConnectionId) -> Self {
        Self {
            connections: vec![id],
            ..Self::default()
        }
    }

    pub fn with_characters(mut self, ids: impl IntoIterator<Item = CharacterId>) -> Self {
        self.characters.extend(ids);
        self
    }

    pub fn with_connection(mut self, id: ConnectionId) -> Self {
        self.connections.push(id);
        self
    }

    fn matches(&self, id: ConnectionId, subscription: Option<Subscription>) -> bool {
        if self.connections.contains(&id) {
            return true;
        }
        match subscription {
            Some(Subscription::Host) => self.hosts,
            Some(Subscription::Player(c)) => self.characters.contains(&c),
            None => false,
        }
    }
}

/// Messages pushed from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once on connect
    Welcome { connection_id: ConnectionId },
    /// Subscription accepted
    Subscribed {
        role: Role,
        character_id: Option<CharacterId>,
    },
    /// Host roster, sent on host subscription
    Snapshot {
        players: Vec<CharacterSummary>,
        enemies: Vec<CharacterSummary>,
        npcs: Vec<CharacterSummary>,
    },
    /// A full record after creation or update
    Character { character: CharacterView },
    /// One vital changed
    Vital {
        character_id: CharacterId,
        field: VitalField,
        value: f64,
    },
    /// A character die roll
    Roll {
        character_id: CharacterId,
        character_name: String,
        dice_type: DieType,
        result: u32,
    },
    CharacterRemoved {
        character_id: CharacterId,
        kind: CharacterKind,
    },
    Chat {
        sender_role: Role,
        sender_name: String,
        recipients: Vec<CharacterId>,
        text: String,
        sent_at: DateTime<Utc>,
    },
    /// Combat overlay state with the tracked roster
    Combat {
        combat: CombatSnapshot,
        roster: Vec<CharacterSummary>,
    },
    CombatRoll { roll: CombatRoll },
    CombatClosed,
    Error { message: String },
    Pong,
}

/// Transport for push events
pub trait Delivery: Send + Sync {
    /// Queue `msg` for every connection in `audience`, returning how many
    /// connections it was queued for
    fn deliver(&self, audience: &Audience, msg: ServerMessage) -> usize;
}

struct Connection {
    subscription: Option<Subscription>,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Registry of all active websocket connections
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. It receives nothing but direct messages
    /// until it subscribes.
    pub fn register(&self, id: ConnectionId, sender: mpsc::UnboundedSender<ServerMessage>) {
        self.connections.write().insert(
            id,
            Connection {
                subscription: None,
                sender,
            },
        );
    }

    /// Remove a connection, returning its last subscription
    pub fn unregister(&self, id: ConnectionId) -> Option<Subscription> {
        self.connections
            .write()
            .remove(&id)
            .and_then(|c| c.subscription)
    }

    /// Set or replace a connection's subscription
    pub fn subscribe(&self, id: ConnectionId, subscription: Subscription) -> bool {
        match self.connections.write().get_mut(&id) {
            Some(conn) => {
                conn.subscription = Some(subscription);
                true
            }
            None => false,
        }
    }

    pub fn subscription(&self, id: ConnectionId) -> Option<Subscription> {
        self.connections
            .read()
            .get(&id)
            .and_then(|c| c.subscription)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl Delivery for ConnectionManager {
    fn deliver(&self, audience: &Audience, msg: ServerMessage) -> usize {
        let connections = self.connections.read();
        let mut sent = 0;
        for (id, conn) in connections.iter() {
            if !audience.matches(*id, conn.subscription) {
                continue;
            }
            // Unbounded: a slow client lags but never loses an event
            match conn.sender.send(msg.clone()) {
                Ok(()) => sent += 1,
                Err(e) => warn!("Failed to push to connection {}: {}", id, e),
            }
        }
        debug!("Delivered push event to {} connections", sent);
        sent
    }
}
