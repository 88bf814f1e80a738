//! `DbPatchable` implementations.
//!
//! This sits in the `db` module because it contains SQL/table knowledge.

use async_trait::async_trait;
use lab_assets_schema::{ColumnDefinition, CoreField, FieldValue, RowImage};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::patch::{DbPatchable, RecordUpdate};
use crate::db::records::{fetch_row_image, update_builder};
use crate::error::LabError;
use crate::undo::UndoSnapshot;
use crate::utils::logging::with_json_debug;

impl RecordUpdate {
    /// Coerced `(column, value)` assignments for the fields this patch sets.
    fn assignments(&self, columns: &[ColumnDefinition]) -> Vec<(String, FieldValue)> {
        let patch = &self.patch;
        let mut out = Vec::new();

        let core = [
            (CoreField::Zone, &patch.zone),
            (CoreField::ItemName, &patch.item_name),
            (CoreField::Identifier, &patch.identifier),
            (CoreField::Notes, &patch.notes),
        ];
        for (field, value) in core {
            if let Some(v) = value {
                out.push((field.column().to_string(), FieldValue::Text(v.clone())));
            }
        }
        if let Some(raw) = &patch.power_draw_amps {
            out.push((
                CoreField::PowerDrawAmps.column().to_string(),
                FieldValue::Real(FieldValue::parse_real(raw)),
            ));
        }

        for (key, raw) in &patch.custom {
            match columns.iter().find(|def| def.physical_id.as_str() == key) {
                Some(def) => out.push((key.clone(), def.column_type.coerce(raw))),
                None => debug!(column = %key, "ignoring patch value for unknown column"),
            }
        }
        out
    }
}

#[async_trait]
impl DbPatchable for RecordUpdate {
    async fn apply_patch(
        &self,
        pool: &SqlitePool,
        columns: &[ColumnDefinition],
    ) -> Result<Option<RowImage>, LabError> {
        with_json_debug(&self.patch, |json| {
            debug!(id = self.id, patch = %json, "applying record patch");
        });

        let mut tx = pool.begin().await?;
        let Some(before) = fetch_row_image(&mut *tx, columns, self.id).await? else {
            debug!(id = self.id, "update target missing; nothing written");
            return Ok(None);
        };

        let assignments = self.assignments(columns);
        let assigned = assignments.len();
        let mut affected = 0;
        if !assignments.is_empty() {
            let mut qb = update_builder(self.id, assignments);
            affected = qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        debug!(id = self.id, assigned, affected, "db patch applied");
        Ok(Some(before))
    }
}

#[async_trait]
impl DbPatchable for UndoSnapshot {
    /// Write every cell of the stored image back, verbatim (NULLs included).
    async fn apply_patch(
        &self,
        pool: &SqlitePool,
        columns: &[ColumnDefinition],
    ) -> Result<Option<RowImage>, LabError> {
        let id = self.record_id();

        let mut tx = pool.begin().await?;
        let Some(current) = fetch_row_image(&mut *tx, columns, id).await? else {
            debug!(id, "undo target no longer exists");
            return Ok(None);
        };

        let mut qb = update_builder(id, self.image.cells.clone());
        let affected = qb.build().execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        debug!(id, affected, taken_at = %self.taken_at, "undo snapshot restored");
        Ok(Some(current))
    }
}
