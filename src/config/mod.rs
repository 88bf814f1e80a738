mod basic;
mod export;

pub use basic::BasicConfig;
pub use export::ExportConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock, time::Duration};

use crate::db::DbOptions;
use crate::undo::UndoSessions;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Storage and runtime settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Export artifact settings (see `export` table in config.toml).
    #[serde(default)]
    pub export: ExportConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Options for spawning the database actor.
    pub fn db_options(&self) -> DbOptions {
        DbOptions::new(self.basic.database_url.as_str())
            .seed_demo_data(self.basic.seed_demo_data)
            .csv_filename(self.export.csv_filename.as_str())
            .snapshot_filename(self.export.snapshot_filename.as_str())
    }

    /// Per-session undo slots expiring after `basic.undo_idle_secs` of inactivity.
    pub fn undo_sessions(&self) -> UndoSessions {
        UndoSessions::new(Duration::from_secs(self.basic.undo_idle_secs))
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
