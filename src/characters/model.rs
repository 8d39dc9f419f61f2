//! Character types and core structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::stats::Stats;
use crate::dice::DieType;

/// Starting value for every vital
pub const DEFAULT_VITAL: f64 = 100.0;

/// Unique character identifier, shared across all kinds and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub i64);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CharacterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CharacterId)
    }
}

/// Which roster a character belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    Player,
    Enemy,
    Npc,
}

impl CharacterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterKind::Player => "player",
            CharacterKind::Enemy => "enemy",
            CharacterKind::Npc => "npc",
        }
    }

    /// Parse from the stored kind column
    pub fn parse(s: &str) -> Option<CharacterKind> {
        match s {
            "player" => Some(CharacterKind::Player),
            "enemy" => Some(CharacterKind::Enemy),
            "npc" => Some(CharacterKind::Npc),
            _ => None,
        }
    }
}

impl fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A current/max pair with `0 <= current <= max` always holding.
///
/// Out-of-range values are clamped rather than rejected so that racing
/// slider updates never fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vital {
    current: f64,
    max: f64,
}

impl Vital {
    /// A full vital
    pub fn full(max: f64) -> Self {
        Self::new(max, max)
    }

    /// Build a vital, clamping both values
    pub fn new(current: f64, max: f64) -> Self {
        let mut vital = Self { current, max };
        vital.clamp();
        vital
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Set the current value, clamped into `[0, max]`
    pub fn set_current(&mut self, current: f64) {
        self.current = current;
        self.clamp();
    }

    /// Change the ceiling. Current is not rescaled, only re-clamped.
    pub fn set_max(&mut self, max: f64) {
        self.max = max;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.max = self.max.max(0.0);
        self.current = self.current.clamp(0.0, self.max);
    }
}

impl Default for Vital {
    fn default() -> Self {
        Self::full(DEFAULT_VITAL)
    }
}

/// One of the four numeric vital fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    CurrentHp,
    MaxHp,
    CurrentStam,
    MaxStam,
}

impl VitalField {
    pub fn key(self) -> &'static str {
        match self {
            VitalField::CurrentHp => "current_hp",
            VitalField::MaxHp => "max_hp",
            VitalField::CurrentStam => "current_stam",
            VitalField::MaxStam => "max_stam",
        }
    }

    /// Combat sliders only move current values
    pub fn is_current(self) -> bool {
        matches!(self, VitalField::CurrentHp | VitalField::CurrentStam)
    }
}

/// Most recent result per die type. No history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRolls {
    d5: Option<u32>,
    d10: Option<u32>,
    d20: Option<u32>,
    d100: Option<u32>,
    /// Die type rolled most recently
    last_die: Option<DieType>,
}

impl LastRolls {
    /// Rebuild from stored columns
    pub fn from_parts(
        d5: Option<u32>,
        d10: Option<u32>,
        d20: Option<u32>,
        d100: Option<u32>,
        last_die: Option<DieType>,
    ) -> Self {
        Self {
            d5,
            d10,
            d20,
            d100,
            last_die,
        }
    }

    pub fn get(&self, die: DieType) -> Option<u32> {
        match die {
            DieType::D5 => self.d5,
            DieType::D10 => self.d10,
            DieType::D20 => self.d20,
            DieType::D100 => self.d100,
        }
    }

    /// Overwrite the last result for `die` and mark it most recent
    pub fn record(&mut self, die: DieType, result: u32) {
        let slot = match die {
            DieType::D5 => &mut self.d5,
            DieType::D10 => &mut self.d10,
            DieType::D20 => &mut self.d20,
            DieType::D100 => &mut self.d100,
        };
        *slot = Some(result);
        self.last_die = Some(die);
    }

    pub fn last_die(&self) -> Option<DieType> {
        self.last_die
    }

    /// The roll of the die type invoked most recently.
    ///
    /// Records written without a `last_die` fall back to the last non-empty
    /// slot in d5, d10, d20, d100 order.
    pub fn most_recent(&self) -> Option<(DieType, u32)> {
        if let Some(die) = self.last_die {
            if let Some(result) = self.get(die) {
                return Some((die, result));
            }
        }
        DieType::ALL
            .into_iter()
            .rev()
            .find_map(|die| self.get(die).map(|r| (die, r)))
    }
}

/// Narrative sheet of a player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSheet {
    pub title: Option<String>,
    pub sin: Option<String>,
    pub virtue: Option<String>,
    pub general_feeling: String,
    pub skill_name: String,
    pub skill_description: String,
    pub passive_name: Option<String>,
    pub passive_description: Option<String>,
    pub starter_background: String,
    pub age: i64,
    pub gender: String,
    pub temperature: Option<i64>,
    pub saturation: String,
    pub biology: String,
    pub main_style: Option<String>,
    pub ritual: String,
}

/// Narrative sheet shared by enemies and NPCs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSheet {
    pub title: Option<String>,
    pub sin: Option<String>,
    pub virtue: Option<String>,
    pub skill_name: Option<String>,
    pub skill_description: Option<String>,
    pub age: Option<i64>,
    pub gender: String,
    pub biology: String,
    pub main_style: Option<String>,
    pub ritual: String,
}

/// Kind-specific part of a character
#[derive(Debug, Clone, PartialEq)]
pub enum Sheet {
    Player(PlayerSheet),
    Enemy(CreatureSheet),
    Npc(CreatureSheet),
}

impl Sheet {
    pub fn kind(&self) -> CharacterKind {
        match self {
            Sheet::Player(_) => CharacterKind::Player,
            Sheet::Enemy(_) => CharacterKind::Enemy,
            Sheet::Npc(_) => CharacterKind::Npc,
        }
    }

    /// Serialize the sheet body for storage
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Sheet::Player(s) => serde_json::to_string(s),
            Sheet::Enemy(s) | Sheet::Npc(s) => serde_json::to_string(s),
        }
    }

    /// Parse a stored sheet body for the given kind
    pub fn from_json(kind: CharacterKind, json: &str) -> serde_json::Result<Sheet> {
        Ok(match kind {
            CharacterKind::Player => Sheet::Player(serde_json::from_str(json)?),
            CharacterKind::Enemy => Sheet::Enemy(serde_json::from_str(json)?),
            CharacterKind::Npc => Sheet::Npc(serde_json::from_str(json)?),
        })
    }
}

/// A validated character that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDraft {
    pub name: String,
    pub hp: Vital,
    pub stamina: Vital,
    pub stats: Stats,
    pub sheet: Sheet,
}

/// A player, enemy or NPC
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub hp: Vital,
    pub stamina: Vital,
    pub rolls: LastRolls,
    pub stats: Stats,
    pub sheet: Sheet,
}

impl Character {
    /// Attach an id to a draft. New characters have never rolled.
    pub fn from_draft(id: CharacterId, draft: CharacterDraft) -> Self {
        Self {
            id,
            name: draft.name,
            hp: draft.hp,
            stamina: draft.stamina,
            rolls: LastRolls::default(),
            stats: draft.stats,
            sheet: draft.sheet,
        }
    }

    pub fn kind(&self) -> CharacterKind {
        self.sheet.kind()
    }

    /// Read one vital field
    pub fn vital(&self, field: VitalField) -> f64 {
        match field {
            VitalField::CurrentHp => self.hp.current(),
            VitalField::MaxHp => self.hp.max(),
            VitalField::CurrentStam => self.stamina.current(),
            VitalField::MaxStam => self.stamina.max(),
        }
    }

    pub fn as_player(&self) -> Option<&PlayerSheet> {
        match &self.sheet {
            Sheet::Player(s) => Some(s),
            _ => None,
        }
    }
}
