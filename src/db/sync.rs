//! Reconciles the column registry with the physical inventory table.
//!
//! Storage is append-only: columns are added, never dropped. Every helper
//! here tolerates a column that is already present, because another
//! connection (or process) may have materialized it first.

use ahash::AHashSet;
use lab_assets_schema::{ColumnDefinition, PhysicalId};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::models::PhysicalColumn;
use crate::db::registry;
use crate::db::schema::{ADDITIVE_MIGRATIONS, INVENTORY_TABLE};
use crate::error::LabError;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Active definitions, creation order. All of them are materialized.
    pub columns: Vec<ColumnDefinition>,
    /// Columns this pass added to the inventory table.
    pub added: Vec<PhysicalId>,
}

/// Materialize every active definition that is missing from the inventory table.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<SyncOutcome, LabError> {
    let columns = registry::list_active(pool).await?;
    let observed: AHashSet<String> = observed_columns(pool, INVENTORY_TABLE)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let mut added = Vec::new();
    for def in columns
        .iter()
        .filter(|def| !observed.contains(def.physical_id.as_str()))
    {
        let sql_type = def.column_type.sql_type();
        if add_column(pool, INVENTORY_TABLE, def.physical_id.as_str(), sql_type).await? {
            info!(column = %def.physical_id, sql_type, "materialized column");
            added.push(def.physical_id.clone());
        }
    }

    Ok(SyncOutcome { columns, added })
}

/// Columns of `table` as SQLite reports them.
pub async fn observed_columns(
    pool: &SqlitePool,
    table: &str,
) -> Result<Vec<PhysicalColumn>, LabError> {
    let rows = sqlx::query_as::<_, PhysicalColumn>(
        "SELECT name, type AS sql_type FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Apply the additive migrations for tables created by older releases.
pub async fn apply_migrations(pool: &SqlitePool) -> Result<(), LabError> {
    for (table, column, sql_type) in ADDITIVE_MIGRATIONS {
        if add_column(pool, table, column, sql_type).await? {
            info!(table, column, "applied additive migration");
        }
    }
    Ok(())
}

/// `ALTER TABLE .. ADD COLUMN`. Returns `false` when the column already existed.
pub async fn add_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    sql_type: &str,
) -> Result<bool, LabError> {
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {sql_type}",
        quote_ident(table),
        quote_ident(column)
    );

    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) if is_duplicate_column(&e) => {
            debug!(table, column, "column already present");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// SQLite reports an existing column as `duplicate column name: <name>`.
pub fn is_duplicate_column(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains("duplicate column name"),
        _ => false,
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("custom_voltage"), "\"custom_voltage\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn non_database_errors_are_not_duplicate_columns() {
        assert!(!is_duplicate_column(&sqlx::Error::RowNotFound));
    }
}
