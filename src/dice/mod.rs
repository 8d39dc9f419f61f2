//! Dice resolution
//!
//! Rolls the fixed character dice (d5, d10, d20, d100) and the host's
//! free-form combat die, and records character rolls in the store.

mod die;
mod engine;

pub use die::DieType;
pub use engine::{DiceEngine, RollOutcome};
