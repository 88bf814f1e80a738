use async_trait::async_trait;
use lab_assets_schema::{ColumnDefinition, RecordPatch, RowImage};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::LabError;

/// Abstraction for writing a change onto one inventory record.
///
/// Implementors read the record's stored cells and apply their change in
/// the same transaction. The pre-change image is returned (`None` when the
/// record does not exist, in which case nothing is written).
#[async_trait]
pub trait DbPatchable {
    async fn apply_patch(
        &self,
        pool: &SqlitePool,
        columns: &[ColumnDefinition],
    ) -> Result<Option<RowImage>, LabError>;
}

/// A partial update addressed to one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub id: i64,
    pub patch: RecordPatch,
}

impl RecordUpdate {
    pub fn new(id: i64, patch: RecordPatch) -> Self {
        Self { id, patch }
    }
}
