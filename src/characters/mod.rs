//! Character records and the authoritative character store
//!
//! - `model`: record types per character kind, vitals and roll history
//! - `stats`: base stats and origin modifiers
//! - `update`: creation requests, partial updates and field allowlists
//! - `store`: the shared keyed store with per-character atomic updates

mod model;
mod stats;
mod store;
mod update;

pub use model::{
    Character, CharacterDraft, CharacterId, CharacterKind, CreatureSheet, LastRolls, PlayerSheet,
    Sheet, Vital, VitalField, DEFAULT_VITAL,
};
pub use stats::{Origin, Stats};
pub use store::CharacterStore;
pub use update::{CharacterUpdate, Field, NewCharacter, HOST_EDITABLE, SELF_EDITABLE};
