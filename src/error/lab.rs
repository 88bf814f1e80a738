use lab_assets_schema::SchemaError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LabError {
    /// Rejected column registration input. Malformed numeric cell input is
    /// never reported here; it is coerced to zero instead.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<SchemaError> for LabError {
    fn from(err: SchemaError) -> Self {
        LabError::Validation(err.to_string())
    }
}

impl LabError {
    /// `true` for storage failures, the only kind callers must treat as fatal.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, LabError::Database(_) | LabError::Io(_))
    }
}
