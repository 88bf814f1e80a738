//! Database module: the dynamic-schema inventory store.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `registry.rs`: user-defined column metadata
//! - `sync.rs`: reconciles the registry with the physical table
//! - `records.rs`: inventory record reads and writes
//! - `patch.rs` / `patch_impl.rs`: updates that capture an undo image
//! - `actor.rs`: single-writer actor every caller goes through

pub mod actor;
pub mod models;
pub mod options;
pub mod patch;
pub mod records;
pub mod registry;
pub mod schema;
pub mod sync;

mod patch_impl;

pub use models::{DbColumnDefinition, PhysicalColumn, SchemaReport};
pub use options::DbOptions;
pub use patch::{DbPatchable, RecordUpdate};
pub use schema::SQLITE_INIT;
pub use sync::SyncOutcome;

pub use actor::{DbActorHandle, spawn};
