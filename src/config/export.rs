use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Export artifact settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Attachment name of the tabular export.
    /// TOML: `export.csv_filename`. Default: `lab_audit.csv`.
    #[serde(default = "default_csv_filename")]
    pub csv_filename: String,

    /// Attachment name of the raw database snapshot.
    /// TOML: `export.snapshot_filename`. Default: `lab_assets.db`.
    #[serde(default = "default_snapshot_filename")]
    pub snapshot_filename: String,

    /// Directory the binary writes export artifacts into.
    /// TOML: `export.output_dir`. Default: `exports`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_filename: default_csv_filename(),
            snapshot_filename: default_snapshot_filename(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_csv_filename() -> String {
    "lab_audit.csv".to_string()
}

fn default_snapshot_filename() -> String {
    "lab_assets.db".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}
