//! Domain types shared by the lab asset store.
//!
//! Nothing in here touches storage: column metadata, typed field values and
//! the record shapes that flow in and out of the store live here so the
//! coercion rules can be tested without a database.

pub mod column;
pub mod record;
pub mod value;

pub use column::{
    COLUMN_PREFIX, ColumnDefinition, ColumnType, NewColumn, PhysicalId, SchemaError, capitalize,
};
pub use record::{CoreField, InventoryRecord, NewRecord, RecordPatch, RowImage};
pub use value::FieldValue;
