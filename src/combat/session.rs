//! Combat session tracking

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::characters::{Character, CharacterId, CharacterStore, CharacterUpdate, VitalField};
use crate::dice::DiceEngine;
use crate::error::{CoreError, ValidationError};

/// Combat errors
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("no combat session open for host {0}")]
    NotOpen(String),

    #[error("character {0} is not in combat")]
    NotTracked(CharacterId),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for CombatError {
    fn from(e: ValidationError) -> Self {
        CombatError::Core(CoreError::Validation(e))
    }
}

/// Last roll of the generic combat die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CombatRoll {
    pub faces: u32,
    pub result: u32,
}

/// What the overlay shows about a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatSnapshot {
    pub host_id: String,
    pub tracked: Vec<CharacterId>,
    pub last_roll: Option<CombatRoll>,
}

#[derive(Debug, Default)]
struct CombatSession {
    tracked: BTreeSet<CharacterId>,
    last_roll: Option<CombatRoll>,
}

impl CombatSession {
    fn snapshot(&self, host_id: &str) -> CombatSnapshot {
        CombatSnapshot {
            host_id: host_id.to_string(),
            tracked: self.tracked.iter().copied().collect(),
            last_roll: self.last_roll,
        }
    }
}

/// Combat sessions by host
pub struct CombatManager {
    sessions: RwLock<HashMap<String, CombatSession>>,
    store: Arc<CharacterStore>,
    dice: Arc<DiceEngine>,
}

impl CombatManager {
    /// Create a new combat manager
    pub fn new(store: Arc<CharacterStore>, dice: Arc<DiceEngine>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            dice,
        }
    }

    /// Create a shared instance
    pub fn shared(store: Arc<CharacterStore>, dice: Arc<DiceEngine>) -> Arc<Self> {
        Arc::new(Self::new(store, dice))
    }

    /// Open the host's session, or return the one already open
    pub async fn open(&self, host_id: &str) -> CombatSnapshot {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(host_id.to_string()).or_insert_with(|| {
            info!("Combat opened by host {}", host_id);
            CombatSession::default()
        });
        session.snapshot(host_id)
    }

    /// Check if the host has a session open
    pub async fn is_open(&self, host_id: &str) -> bool {
        self.sessions.read().await.contains_key(host_id)
    }

    /// Current state of the host's session
    pub async fn snapshot(&self, host_id: &str) -> Option<CombatSnapshot> {
        self.sessions
            .read()
            .await
            .get(host_id)
            .map(|s| s.snapshot(host_id))
    }

    /// Replace the tracked set. Ids unknown to the store are dropped.
    pub async fn set_tracked(
        &self,
        host_id: &str,
        ids: impl IntoIterator<Item = CharacterId>,
    ) -> Result<CombatSnapshot, CombatError> {
        let mut tracked = BTreeSet::new();
        for id in ids {
            if self.store.contains(id) {
                tracked.insert(id);
            } else {
                warn!("Combat for host {}: ignoring unknown character {}", host_id, id);
            }
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(host_id)
            .ok_or_else(|| CombatError::NotOpen(host_id.to_string()))?;
        session.tracked = tracked;
        Ok(session.snapshot(host_id))
    }

    /// Move a current-value slider for a tracked character
    pub async fn adjust_vital(
        &self,
        host_id: &str,
        id: CharacterId,
        field: VitalField,
        value: f64,
    ) -> Result<Character, CombatError> {
        self.adjust_vital_then(host_id, id, field, value, |_| {})
            .await
    }

    /// Like [`adjust_vital`](Self::adjust_vital), running `on_commit` inside
    /// the character's critical section
    pub async fn adjust_vital_then<C>(
        &self,
        host_id: &str,
        id: CharacterId,
        field: VitalField,
        value: f64,
        on_commit: C,
    ) -> Result<Character, CombatError>
    where
        C: FnOnce(&Character),
    {
        if !field.is_current() {
            return Err(ValidationError::FieldNotEditable(field.key().to_string()).into());
        }

        {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(host_id)
                .ok_or_else(|| CombatError::NotOpen(host_id.to_string()))?;
            if !session.tracked.contains(&id) {
                return Err(CombatError::NotTracked(id));
            }
        }

        let update = CharacterUpdate::new().vital(field, value);
        Ok(self.store.apply_update_then(id, &update, on_commit).await?)
    }

    /// Roll the generic combat die. Not recorded on any character.
    pub async fn roll_combat_die(
        &self,
        host_id: &str,
        faces: u32,
    ) -> Result<CombatRoll, CombatError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(host_id)
            .ok_or_else(|| CombatError::NotOpen(host_id.to_string()))?;

        let result = self.dice.roll_faces(faces)?;
        let roll = CombatRoll { faces, result };
        session.last_roll = Some(roll);
        Ok(roll)
    }

    /// Tracked characters still in the store, in id order.
    /// Characters removed since tracking are skipped.
    pub async fn tracked_characters(&self, host_id: &str) -> Result<Vec<Character>, CombatError> {
        let ids: Vec<CharacterId> = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(host_id)
                .ok_or_else(|| CombatError::NotOpen(host_id.to_string()))?;
            session.tracked.iter().copied().collect()
        };

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(id).await {
                Ok(c) => out.push(c),
                Err(CoreError::NotFound(_)) => {
                    warn!("Combat for host {}: tracked character {} is gone", host_id, id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    /// Discard the host's session. Character state is untouched.
    pub async fn close(&self, host_id: &str) -> bool {
        let closed = self.sessions.write().await.remove(host_id).is_some();
        if closed {
            info!("Combat closed by host {}", host_id);
        }
        closed
    }
}
