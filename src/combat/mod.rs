//! Combat overlay sessions
//!
//! A combat session belongs to one host connection and tracks which
//! characters are in the encounter:
//! - Opening is idempotent per host
//! - Vital sliders round-trip through the character store
//! - The generic combat die is rolled here and never stored on a character
//! - Closing (or the host disconnecting) discards the session only

mod session;

pub use session::{CombatError, CombatManager, CombatRoll, CombatSnapshot};
