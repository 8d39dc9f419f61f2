//! Character die types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A die a character can roll and keep a last result for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D5,
    D10,
    D20,
    D100,
}

impl DieType {
    /// Every character die, in dashboard display order
    pub const ALL: [DieType; 4] = [DieType::D5, DieType::D10, DieType::D20, DieType::D100];

    /// Number of faces
    pub fn faces(self) -> u32 {
        match self {
            DieType::D5 => 5,
            DieType::D10 => 10,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    /// URL / JSON key, e.g. "d20"
    pub fn key(self) -> &'static str {
        match self {
            DieType::D5 => "d5",
            DieType::D10 => "d10",
            DieType::D20 => "d20",
            DieType::D100 => "d100",
        }
    }
}

impl FromStr for DieType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d5" => Ok(DieType::D5),
            "d10" => Ok(DieType::D10),
            "d20" => Ok(DieType::D20),
            "d100" => Ok(DieType::D100),
            _ => Err(ValidationError::UnsupportedDie(s.to_string())),
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
