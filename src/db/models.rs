use chrono::{DateTime, Utc};
use lab_assets_schema::{ColumnDefinition, PhysicalId, SchemaError};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `custom_columns` metadata table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbColumnDefinition {
    pub id: i64,
    pub column_name: String,
    pub column_type: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbColumnDefinition> for ColumnDefinition {
    type Error = SchemaError;

    fn try_from(row: DbColumnDefinition) -> Result<Self, Self::Error> {
        Ok(ColumnDefinition {
            physical_id: PhysicalId::parse(&row.column_name)?,
            column_type: row.column_type.parse()?,
            display_name: row.display_name.unwrap_or_default(),
            creation_order: row.id,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// A column as it exists in the physical table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct PhysicalColumn {
    pub name: String,
    pub sql_type: String,
}

/// Side-by-side view of physical storage and the registry, tombstones included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaReport {
    pub physical_columns: Vec<PhysicalColumn>,
    pub definitions: Vec<ColumnDefinition>,
}
