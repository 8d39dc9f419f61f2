//! Projection of store state into dashboard views, and inbound edits

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::hub::{Audience, ConnectionId, Delivery, ServerMessage, Subscription};
use super::views::{CharacterSummary, CharacterView};
use crate::characters::{
    Character, CharacterId, CharacterKind, CharacterStore, CharacterUpdate, NewCharacter,
    VitalField, HOST_EDITABLE, SELF_EDITABLE,
};
use crate::combat::{CombatError, CombatManager, CombatRoll};
use crate::dice::{DiceEngine, DieType, RollOutcome};
use crate::error::{CoreResult, ValidationError};

/// Display name used for chat sent from the host console
pub const HOST_NAME: &str = "Host";

/// Reads the store on every call and publishes every accepted mutation
pub struct SyncProjector {
    store: Arc<CharacterStore>,
    dice: Arc<DiceEngine>,
    combat: Arc<CombatManager>,
    delivery: Arc<dyn Delivery>,
}

impl SyncProjector {
    pub fn new(
        store: Arc<CharacterStore>,
        dice: Arc<DiceEngine>,
        combat: Arc<CombatManager>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            store,
            dice,
            combat,
            delivery,
        }
    }

    /// Host roster for one kind
    pub async fn project_for_host(&self, kind: CharacterKind) -> Vec<CharacterSummary> {
        self.store
            .list_by_kind(kind)
            .await
            .iter()
            .map(CharacterSummary::from)
            .collect()
    }

    /// Full records for one kind
    pub async fn project_kind(&self, kind: CharacterKind) -> Vec<CharacterView> {
        self.store
            .list_by_kind(kind)
            .await
            .iter()
            .map(CharacterView::from)
            .collect()
    }

    /// The roster message a host receives on subscribing
    pub async fn host_snapshot(&self) -> ServerMessage {
        ServerMessage::Snapshot {
            players: self.project_for_host(CharacterKind::Player).await,
            enemies: self.project_for_host(CharacterKind::Enemy).await,
            npcs: self.project_for_host(CharacterKind::Npc).await,
        }
    }

    /// Player dashboard detail
    pub async fn project_for_player(&self, id: CharacterId) -> CoreResult<CharacterView> {
        self.project_character(id, CharacterKind::Player).await
    }

    /// Full record of a character of `kind`
    pub async fn project_character(
        &self,
        id: CharacterId,
        kind: CharacterKind,
    ) -> CoreResult<CharacterView> {
        let character = self.store.get_kind(id, kind).await?;
        Ok(CharacterView::from(&character))
    }

    /// Create a character and announce it to hosts
    pub async fn create(&self, kind: CharacterKind, request: NewCharacter) -> CoreResult<Character> {
        let character = self.store.create(kind, request).await?;
        self.delivery.deliver(
            &Audience::hosts(),
            ServerMessage::Character {
                character: CharacterView::from(&character),
            },
        );
        Ok(character)
    }

    /// Host edit: name, vitals and every narrative field
    pub async fn apply_host_edit(
        &self,
        id: CharacterId,
        kind: CharacterKind,
        fields: &Value,
    ) -> CoreResult<Character> {
        let update = CharacterUpdate::from_json(fields, HOST_EDITABLE)?;
        self.apply_update(id, kind, &update).await
    }

    /// Player edit of their own sheet
    pub async fn apply_self_edit(&self, id: CharacterId, fields: &Value) -> CoreResult<Character> {
        let update = CharacterUpdate::from_json(fields, SELF_EDITABLE)?;
        self.apply_update(id, CharacterKind::Player, &update).await
    }

    /// Apply an already-parsed update to a character of `kind`
    pub async fn apply_update(
        &self,
        id: CharacterId,
        kind: CharacterKind,
        update: &CharacterUpdate,
    ) -> CoreResult<Character> {
        self.store.get_kind(id, kind).await?;
        let vitals = update.vital_fields();
        self.store
            .apply_update_then(id, update, |c| self.publish_update(c, &vitals))
            .await
    }

    /// Roll a character die and push the result
    pub async fn roll(
        &self,
        id: CharacterId,
        kind: CharacterKind,
        die: DieType,
    ) -> CoreResult<RollOutcome> {
        self.store.get_kind(id, kind).await?;
        self.dice
            .roll_for_character_then(&self.store, id, die, |outcome| {
                let audience = Audience::character(id);
                self.delivery.deliver(
                    &audience,
                    ServerMessage::Roll {
                        character_id: id,
                        character_name: outcome.character.name.clone(),
                        dice_type: die,
                        result: outcome.result,
                    },
                );
                self.delivery.deliver(
                    &audience,
                    ServerMessage::Character {
                        character: CharacterView::from(&outcome.character),
                    },
                );
            })
            .await
    }

    /// Administrative removal
    pub async fn remove(&self, id: CharacterId, kind: CharacterKind) -> CoreResult<Character> {
        self.store.get_kind(id, kind).await?;
        let character = self.store.remove(id).await?;
        self.delivery.deliver(
            &Audience::character(id),
            ServerMessage::CharacterRemoved {
                character_id: id,
                kind,
            },
        );
        Ok(character)
    }

    /// Route a chat line. Host chat needs at least one recipient; player
    /// chat always reaches the hosts. The sender gets an echo.
    pub async fn send_chat(
        &self,
        sender: ConnectionId,
        subscription: Subscription,
        recipients: Vec<CharacterId>,
        text: &str,
    ) -> CoreResult<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::MissingField("text").into());
        }

        let (sender_name, audience) = match subscription {
            Subscription::Host => {
                if recipients.is_empty() {
                    return Err(ValidationError::MissingField("recipients").into());
                }
                (HOST_NAME.to_string(), Audience::default())
            }
            Subscription::Player(id) => (self.store.get(id).await?.name, Audience::hosts()),
        };
        let audience = audience
            .with_characters(recipients.iter().copied())
            .with_connection(sender);

        debug!("Chat from {} to {:?}", sender_name, recipients);
        let sent = self.delivery.deliver(
            &audience,
            ServerMessage::Chat {
                sender_role: subscription.role(),
                sender_name,
                recipients,
                text: text.to_string(),
                sent_at: chrono::Utc::now(),
            },
        );
        Ok(sent)
    }

    /// Push vital and record events for a committed update. Called inside
    /// the character's critical section so pushes follow commit order.
    pub fn publish_update(&self, character: &Character, vitals: &[VitalField]) {
        let audience = Audience::character(character.id);
        for field in vitals {
            self.delivery.deliver(
                &audience,
                ServerMessage::Vital {
                    character_id: character.id,
                    field: *field,
                    value: character.vital(*field),
                },
            );
        }
        self.delivery.deliver(
            &audience,
            ServerMessage::Character {
                character: CharacterView::from(character),
            },
        );
    }

    /// Combat overlay state for a host
    pub async fn project_combat(&self, host: ConnectionId) -> Result<ServerMessage, CombatError> {
        let host_id = host.to_string();
        let combat = self
            .combat
            .snapshot(&host_id)
            .await
            .ok_or_else(|| CombatError::NotOpen(host_id.clone()))?;
        let roster = self
            .combat
            .tracked_characters(&host_id)
            .await?
            .iter()
            .map(CharacterSummary::from)
            .collect();
        Ok(ServerMessage::Combat { combat, roster })
    }

    pub async fn open_combat(&self, host: ConnectionId) -> Result<ServerMessage, CombatError> {
        self.combat.open(&host.to_string()).await;
        self.project_combat(host).await
    }

    pub async fn track(
        &self,
        host: ConnectionId,
        ids: Vec<CharacterId>,
    ) -> Result<ServerMessage, CombatError> {
        self.combat.set_tracked(&host.to_string(), ids).await?;
        self.project_combat(host).await
    }

    /// Combat slider move. The new value is pushed like any other update.
    pub async fn adjust_vital(
        &self,
        host: ConnectionId,
        id: CharacterId,
        field: VitalField,
        value: f64,
    ) -> Result<Character, CombatError> {
        self.combat
            .adjust_vital_then(&host.to_string(), id, field, value, |c| {
                self.publish_update(c, &[field])
            })
            .await
    }

    pub async fn roll_combat_die(
        &self,
        host: ConnectionId,
        faces: u32,
    ) -> Result<CombatRoll, CombatError> {
        self.combat.roll_combat_die(&host.to_string(), faces).await
    }

    /// Close the host's combat session, if one is open
    pub async fn close_combat(&self, host: ConnectionId) -> bool {
        let closed = self.combat.close(&host.to_string()).await;
        if closed {
            info!("Combat session of {} discarded", host);
        }
        closed
    }
}
