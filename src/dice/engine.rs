//! Dice engine
//!
//! Draws uniform integers with `rand`'s range sampling, which rejects
//! out-of-zone samples instead of reducing modulo the face count.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::DieType;
use crate::characters::{Character, CharacterId, CharacterStore};
use crate::error::{CoreResult, ValidationError};

/// Smallest face count accepted for the combat die
pub const MIN_FACES: u32 = 2;

/// A character roll as committed to the store
#[derive(Debug, Clone)]
pub struct RollOutcome {
    pub die: DieType,
    pub result: u32,
    /// The character as stored right after the roll
    pub character: Character,
}

/// Source of die results
pub struct DiceEngine {
    rng: Mutex<StdRng>,
}

impl Default for DiceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceEngine {
    /// Create an engine seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create an engine with a fixed seed (reproducible sequences)
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Roll a character die
    pub fn roll(&self, die: DieType) -> u32 {
        self.draw(die.faces())
    }

    /// Roll an arbitrary die with at least two faces
    pub fn roll_faces(&self, faces: u32) -> Result<u32, ValidationError> {
        if faces < MIN_FACES {
            return Err(ValidationError::InvalidFaceCount(faces));
        }
        Ok(self.draw(faces))
    }

    fn draw(&self, faces: u32) -> u32 {
        self.rng.lock().random_range(1..=faces)
    }

    /// Roll for a character and record the result as its last roll of that die.
    ///
    /// The draw happens inside the character's critical section, so the
    /// returned result and the stored `last_roll` are one transition.
    pub async fn roll_for_character(
        &self,
        store: &CharacterStore,
        id: CharacterId,
        die: DieType,
    ) -> CoreResult<RollOutcome> {
        self.roll_for_character_then(store, id, die, |_| {}).await
    }

    /// Roll for a character, handing the committed outcome to `on_commit`
    /// before the character's lock is released
    pub async fn roll_for_character_then<C>(
        &self,
        store: &CharacterStore,
        id: CharacterId,
        die: DieType,
        on_commit: C,
    ) -> CoreResult<RollOutcome>
    where
        C: FnOnce(&RollOutcome),
    {
        let (character, result) = store
            .modify_then(
                id,
                |c| {
                    let result = self.roll(die);
                    c.rolls.record(die, result);
                    Ok(result)
                },
                |c, result| {
                    on_commit(&RollOutcome {
                        die,
                        result: *result,
                        character: c.clone(),
                    })
                },
            )
            .await?;

        debug!("{} ({}) rolled {}: {}", character.name, id, die, result);

        Ok(RollOutcome {
            die,
            result,
            character,
        })
    }
}
