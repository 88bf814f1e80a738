pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod undo;

mod utils;

pub use db::{DbActorHandle, DbOptions};
pub use error::LabError;
pub use export::{Attachment, TabularExport};
pub use lab_assets_schema as schema;
pub use undo::{SessionId, UndoSessions, UndoSlot, UndoSnapshot};
