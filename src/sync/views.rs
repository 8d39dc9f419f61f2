//! View models served to host and player dashboards

use serde::Serialize;

use crate::characters::{
    Character, CharacterId, CharacterKind, CreatureSheet, PlayerSheet, Sheet, Stats,
};
use crate::dice::DieType;

/// Roster line for the host console and the combat overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub kind: CharacterKind,
    pub name: String,
    pub current_hp: f64,
    pub max_hp: f64,
    pub current_stam: f64,
    pub max_stam: f64,
    /// Result of the most recently rolled die, if any
    pub last_roll: Option<u32>,
    pub last_roll_die: Option<DieType>,
}

impl From<&Character> for CharacterSummary {
    fn from(c: &Character) -> Self {
        let recent = c.rolls.most_recent();
        Self {
            id: c.id,
            kind: c.kind(),
            name: c.name.clone(),
            current_hp: c.hp.current(),
            max_hp: c.hp.max(),
            current_stam: c.stamina.current(),
            max_stam: c.stamina.max(),
            last_roll: recent.map(|(_, r)| r),
            last_roll_die: recent.map(|(d, _)| d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetView {
    Player(PlayerSheet),
    Creature(CreatureSheet),
}

/// The full record, flattened the way dashboards read it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterView {
    #[serde(flatten)]
    pub summary: CharacterSummary,
    pub last_d5_roll: Option<u32>,
    pub last_d10_roll: Option<u32>,
    pub last_d20_roll: Option<u32>,
    pub last_d100_roll: Option<u32>,
    #[serde(flatten)]
    pub stats: Stats,
    #[serde(flatten)]
    pub sheet: SheetView,
}

impl From<&Character> for CharacterView {
    fn from(c: &Character) -> Self {
        let sheet = match &c.sheet {
            Sheet::Player(p) => SheetView::Player(p.clone()),
            Sheet::Enemy(s) | Sheet::Npc(s) => SheetView::Creature(s.clone()),
        };
        Self {
            summary: CharacterSummary::from(c),
            last_d5_roll: c.rolls.get(DieType::D5),
            last_d10_roll: c.rolls.get(DieType::D10),
            last_d20_roll: c.rolls.get(DieType::D20),
            last_d100_roll: c.rolls.get(DieType::D100),
            stats: c.stats,
            sheet,
        }
    }
}
