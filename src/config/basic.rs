use serde::{Deserialize, Serialize};

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// Database URL for SQLite.
    /// TOML: `basic.database_url`. Default: `sqlite://lab_assets.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Insert the sample lab devices when the inventory is empty at start-up.
    /// TOML: `basic.seed_demo_data`. Default: `false`.
    #[serde(default)]
    pub seed_demo_data: bool,

    /// Seconds an idle session keeps its undo slot.
    /// TOML: `basic.undo_idle_secs`. Default: `1800`.
    #[serde(default = "default_undo_idle_secs")]
    pub undo_idle_secs: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            loglevel: default_loglevel(),
            seed_demo_data: false,
            undo_idle_secs: default_undo_idle_secs(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://lab_assets.db".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_undo_idle_secs() -> u64 {
    1800
}
