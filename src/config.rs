//! Server configuration
//!
//! Layered lowest to highest: built-in defaults, a TOML file, then
//! `TABLETOPD_`-prefixed environment variables. CLI flags are applied on
//! top by the binary.

use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// File read when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "tabletopd.toml";

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// SQLite file. None = in-memory, nothing survives a restart.
    pub db_path: Option<String>,
    pub log_format: LogFormat,
    /// Fixed dice seed for reproducible sessions
    pub dice_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: None,
            log_format: LogFormat::default(),
            dice_seed: None,
        }
    }
}

impl Config {
    /// Build the layered provider chain. A missing file is skipped.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("TABLETOPD_"))
    }

    /// Load configuration from defaults, file and environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}
