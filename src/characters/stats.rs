//! Base stats and origin modifiers

use serde::{Deserialize, Serialize};

/// Character stats. Integer stats start at 10, the money multiplier at 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Strength
    pub str_stat: i64,
    /// Stamina
    pub stm_stat: i64,
    /// Speed
    pub spd_stat: i64,
    /// Luck
    pub luk_stat: i64,
    /// Money multiplier
    pub mny_stat: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            str_stat: 10,
            stm_stat: 10,
            spd_stat: 10,
            luk_stat: 10,
            mny_stat: 1.0,
        }
    }
}

/// Starter backgrounds that adjust base stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Vif,
    Martial,
    HommeDeFoie,
    Mediateur,
}

impl Origin {
    /// Parse a `starter_background` value. Keys match exactly; anything
    /// else, including other casings, has no modifiers.
    pub fn from_background(s: &str) -> Option<Origin> {
        match s {
            "vif" => Some(Origin::Vif),
            "martial" => Some(Origin::Martial),
            "hommedefoie" => Some(Origin::HommeDeFoie),
            "mediateur" => Some(Origin::Mediateur),
            _ => None,
        }
    }

    fn apply(self, stats: &mut Stats) {
        match self {
            Origin::Vif => {
                stats.str_stat -= 15;
                stats.spd_stat += 10;
                stats.stm_stat += 10;
            }
            Origin::Martial => {
                stats.str_stat += 20;
                stats.spd_stat -= 5;
                stats.mny_stat += 0.2;
            }
            Origin::HommeDeFoie => {
                stats.str_stat -= 10;
                stats.spd_stat -= 5;
                stats.stm_stat += 20;
                stats.mny_stat -= 0.2;
            }
            Origin::Mediateur => {
                stats.luk_stat += 5;
                stats.mny_stat += 0.5;
            }
        }
    }
}

impl Stats {
    /// Base stats with the background's modifiers applied
    pub fn for_background(background: &str) -> Self {
        let mut stats = Stats::default();
        if let Some(origin) = Origin::from_background(background) {
            origin.apply(&mut stats);
        }
        stats
    }
}
