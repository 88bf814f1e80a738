//! Registry of user-defined columns (`custom_columns` table).
//!
//! Pure metadata: nothing here touches the inventory table. Materializing a
//! registered column is the synchronizer's job.

use chrono::Utc;
use lab_assets_schema::{ColumnDefinition, NewColumn, PhysicalId};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::models::DbColumnDefinition;
use crate::error::LabError;

const SELECT_COLUMNS: &str = r#"
SELECT id, column_name, column_type, display_name, created_at, deleted_at
FROM custom_columns
"#;

/// Register a column, or resolve to the existing definition for the same
/// physical id.
///
/// A tombstoned definition is revived as it was: type, label and creation
/// order are never rewritten.
pub async fn register(pool: &SqlitePool, column: &NewColumn) -> Result<ColumnDefinition, LabError> {
    let physical_id = column.physical_id()?;

    if let Some(existing) = find(pool, &physical_id).await? {
        if existing.is_tombstoned() {
            sqlx::query("UPDATE custom_columns SET deleted_at = NULL WHERE column_name = ?")
                .bind(physical_id.as_str())
                .execute(pool)
                .await?;
            info!(column = %physical_id, "revived soft-deleted column");
            return Ok(ColumnDefinition {
                deleted_at: None,
                ..existing
            });
        }
        debug!(column = %physical_id, "column already registered");
        return Ok(existing);
    }

    let display_name = column.resolved_display_name();
    let res = sqlx::query(
        r#"
        INSERT INTO custom_columns (column_name, column_type, display_name, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(column_name) DO NOTHING
        "#,
    )
    .bind(physical_id.as_str())
    .bind(column.column_type.sql_type())
    .bind(display_name.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if res.rows_affected() == 1 {
        info!(
            column = %physical_id,
            column_type = %column.column_type,
            display_name = %display_name,
            "registered column"
        );
    } else {
        debug!(column = %physical_id, "column registered concurrently");
    }

    find(pool, &physical_id).await?.ok_or_else(|| {
        LabError::UnexpectedError(format!("column {physical_id} missing after registration"))
    })
}

/// Active definitions in creation order.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<ColumnDefinition>, LabError> {
    let rows = sqlx::query_as::<_, DbColumnDefinition>(&format!(
        "{SELECT_COLUMNS} WHERE deleted_at IS NULL ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(into_definitions(rows))
}

/// Every definition ever registered, tombstoned ones included.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ColumnDefinition>, LabError> {
    let rows = sqlx::query_as::<_, DbColumnDefinition>(&format!("{SELECT_COLUMNS} ORDER BY id"))
        .fetch_all(pool)
        .await?;

    Ok(into_definitions(rows))
}

pub async fn find(
    pool: &SqlitePool,
    physical_id: &PhysicalId,
) -> Result<Option<ColumnDefinition>, LabError> {
    let row = sqlx::query_as::<_, DbColumnDefinition>(&format!(
        "{SELECT_COLUMNS} WHERE column_name = ?"
    ))
    .bind(physical_id.as_str())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row.try_into()?)),
        None => Ok(None),
    }
}

/// Hide a column. The physical column and its values stay in place.
///
/// Returns `false` when no active definition had that id.
pub async fn soft_delete(pool: &SqlitePool, physical_id: &str) -> Result<bool, LabError> {
    let res = sqlx::query(
        "UPDATE custom_columns SET deleted_at = ? WHERE column_name = ? AND deleted_at IS NULL",
    )
    .bind(Utc::now())
    .bind(physical_id)
    .execute(pool)
    .await?;

    let hidden = res.rows_affected() > 0;
    if hidden {
        info!(column = physical_id, "soft-deleted column");
    }
    Ok(hidden)
}

fn into_definitions(rows: Vec<DbColumnDefinition>) -> Vec<ColumnDefinition> {
    rows.into_iter()
        .filter_map(|row| {
            let name = row.column_name.clone();
            match ColumnDefinition::try_from(row) {
                Ok(def) => Some(def),
                Err(e) => {
                    warn!(column = %name, error = %e, "skipping malformed column metadata");
                    None
                }
            }
        })
        .collect()
}
