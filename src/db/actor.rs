use crate::db::models::SchemaReport;
use crate::db::options::DbOptions;
use crate::db::patch::{DbPatchable, RecordUpdate};
use crate::db::schema::{INVENTORY_TABLE, SQLITE_INIT};
use crate::db::sync::{self, SyncOutcome};
use crate::db::{records, registry};
use crate::error::LabError;
use crate::export::{Attachment, SQLITE_CONTENT_TYPE, TabularExport};
use crate::undo::{UndoSlot, UndoSnapshot};
use lab_assets_schema::{ColumnDefinition, InventoryRecord, NewColumn, NewRecord, RecordPatch};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Run one reconciliation pass and report what it did.
    SyncSchema(RpcReplyPort<Result<SyncOutcome, LabError>>),

    /// List active column definitions (creation order).
    ListColumns(RpcReplyPort<Result<Vec<ColumnDefinition>, LabError>>),

    /// Register (or resolve) a user-defined column.
    RegisterColumn(NewColumn, RpcReplyPort<Result<ColumnDefinition, LabError>>),

    /// Tombstone a column by physical id.
    SoftDeleteColumn(String, RpcReplyPort<Result<bool, LabError>>),

    /// Physical columns alongside every definition, tombstones included.
    DescribeSchema(RpcReplyPort<Result<SchemaReport, LabError>>),

    /// List records ordered by zone, then item name.
    ListRecords(RpcReplyPort<Result<Vec<InventoryRecord>, LabError>>),

    /// Get one record by id.
    GetRecord(i64, RpcReplyPort<Result<Option<InventoryRecord>, LabError>>),

    /// Insert a record and return its id.
    InsertRecord(NewRecord, RpcReplyPort<Result<i64, LabError>>),

    /// Patch a record; replies with its pre-update image.
    UpdateRecord(RecordUpdate, RpcReplyPort<Result<Option<UndoSnapshot>, LabError>>),

    /// Write an undo image back; replies whether the record still existed.
    RestoreSnapshot(UndoSnapshot, RpcReplyPort<Result<bool, LabError>>),

    /// Clone a record under a new id.
    DuplicateRecord(i64, RpcReplyPort<Result<Option<i64>, LabError>>),

    /// Delete a record by id.
    DeleteRecord(i64, RpcReplyPort<Result<bool, LabError>>),

    /// Move a set of records to a zone in one transaction.
    BulkSetZone(Vec<i64>, String, RpcReplyPort<Result<u64, LabError>>),

    /// Header + rows projection of every record.
    ExportTabular(RpcReplyPort<Result<TabularExport, LabError>>),

    /// Tabular export serialized as a CSV attachment.
    ExportCsv(RpcReplyPort<Result<Attachment, LabError>>),

    /// The database file, byte for byte.
    ExportSnapshot(RpcReplyPort<Result<Attachment, LabError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn sync_schema(&self) -> Result<SyncOutcome, LabError> {
        ractor::call!(self.actor, DbActorMessage::SyncSchema)
            .map_err(|e| LabError::RactorError(format!("DbActor SyncSchema RPC failed: {e}")))?
    }

    pub async fn list_columns(&self) -> Result<Vec<ColumnDefinition>, LabError> {
        ractor::call!(self.actor, DbActorMessage::ListColumns)
            .map_err(|e| LabError::RactorError(format!("DbActor ListColumns RPC failed: {e}")))?
    }

    pub async fn register_column(&self, column: NewColumn) -> Result<ColumnDefinition, LabError> {
        ractor::call!(self.actor, DbActorMessage::RegisterColumn, column).map_err(|e| {
            LabError::RactorError(format!("DbActor RegisterColumn RPC failed: {e}"))
        })?
    }

    pub async fn soft_delete_column(&self, physical_id: &str) -> Result<bool, LabError> {
        ractor::call!(
            self.actor,
            DbActorMessage::SoftDeleteColumn,
            physical_id.to_string()
        )
        .map_err(|e| LabError::RactorError(format!("DbActor SoftDeleteColumn RPC failed: {e}")))?
    }

    pub async fn describe_schema(&self) -> Result<SchemaReport, LabError> {
        ractor::call!(self.actor, DbActorMessage::DescribeSchema).map_err(|e| {
            LabError::RactorError(format!("DbActor DescribeSchema RPC failed: {e}"))
        })?
    }

    pub async fn list_records(&self) -> Result<Vec<InventoryRecord>, LabError> {
        ractor::call!(self.actor, DbActorMessage::ListRecords)
            .map_err(|e| LabError::RactorError(format!("DbActor ListRecords RPC failed: {e}")))?
    }

    pub async fn get_record(&self, id: i64) -> Result<Option<InventoryRecord>, LabError> {
        ractor::call!(self.actor, DbActorMessage::GetRecord, id)
            .map_err(|e| LabError::RactorError(format!("DbActor GetRecord RPC failed: {e}")))?
    }

    pub async fn insert_record(&self, record: NewRecord) -> Result<i64, LabError> {
        ractor::call!(self.actor, DbActorMessage::InsertRecord, record)
            .map_err(|e| LabError::RactorError(format!("DbActor InsertRecord RPC failed: {e}")))?
    }

    /// Apply `patch` to record `id`; its pre-update image replaces the
    /// contents of `undo`.
    ///
    /// An unknown id is not an error: nothing is written and `undo` keeps
    /// the snapshot it already held.
    pub async fn update_record(
        &self,
        undo: &mut UndoSlot,
        id: i64,
        patch: RecordPatch,
    ) -> Result<(), LabError> {
        let update = RecordUpdate::new(id, patch);
        let snapshot = ractor::call!(self.actor, DbActorMessage::UpdateRecord, update)
            .map_err(|e| LabError::RactorError(format!("DbActor UpdateRecord RPC failed: {e}")))??;

        if let Some(snapshot) = snapshot {
            undo.replace(snapshot);
        }
        Ok(())
    }

    /// Restore the snapshot held in `undo`, emptying the slot.
    ///
    /// Returns `false` when the slot was empty or its record has since been deleted.
    pub async fn revert(&self, undo: &mut UndoSlot) -> Result<bool, LabError> {
        let Some(snapshot) = undo.take() else {
            return Ok(false);
        };
        ractor::call!(self.actor, DbActorMessage::RestoreSnapshot, snapshot).map_err(|e| {
            LabError::RactorError(format!("DbActor RestoreSnapshot RPC failed: {e}"))
        })?
    }

    pub async fn duplicate_record(&self, id: i64) -> Result<Option<i64>, LabError> {
        ractor::call!(self.actor, DbActorMessage::DuplicateRecord, id).map_err(|e| {
            LabError::RactorError(format!("DbActor DuplicateRecord RPC failed: {e}"))
        })?
    }

    pub async fn delete_record(&self, id: i64) -> Result<bool, LabError> {
        ractor::call!(self.actor, DbActorMessage::DeleteRecord, id)
            .map_err(|e| LabError::RactorError(format!("DbActor DeleteRecord RPC failed: {e}")))?
    }

    pub async fn bulk_set_zone(&self, ids: Vec<i64>, zone: &str) -> Result<u64, LabError> {
        ractor::call!(
            self.actor,
            DbActorMessage::BulkSetZone,
            ids,
            zone.to_string()
        )
        .map_err(|e| LabError::RactorError(format!("DbActor BulkSetZone RPC failed: {e}")))?
    }

    pub async fn export_tabular(&self) -> Result<TabularExport, LabError> {
        ractor::call!(self.actor, DbActorMessage::ExportTabular)
            .map_err(|e| LabError::RactorError(format!("DbActor ExportTabular RPC failed: {e}")))?
    }

    pub async fn export_csv(&self) -> Result<Attachment, LabError> {
        ractor::call!(self.actor, DbActorMessage::ExportCsv)
            .map_err(|e| LabError::RactorError(format!("DbActor ExportCsv RPC failed: {e}")))?
    }

    pub async fn export_snapshot(&self) -> Result<Attachment, LabError> {
        ractor::call!(self.actor, DbActorMessage::ExportSnapshot).map_err(|e| {
            LabError::RactorError(format!("DbActor ExportSnapshot RPC failed: {e}"))
        })?
    }
}

struct DbActorState {
    pool: SqlitePool,
    options: DbOptions,
    /// `None` for in-memory databases.
    db_path: Option<PathBuf>,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DbOptions;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        options: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(options.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let db_path = storage_path(connect_opts.get_filename());

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        if options.seed_demo_data {
            records::seed_if_empty(&pool)
                .await
                .map_err(|e| ActorProcessingErr::from(format!("db seed failed: {e}")))?;
        }

        let outcome = sync::ensure_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema sync failed: {e}")))?;

        info!(
            columns = outcome.columns.len(),
            added = outcome.added.len(),
            "DbActor initialized"
        );
        Ok(DbActorState {
            pool,
            options,
            db_path,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::SyncSchema(reply) => {
                let res = sync::ensure_schema(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListColumns(reply) => {
                let res = self.columns(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::RegisterColumn(column, reply) => {
                let res = self.register_column(&state.pool, column).await;
                let _ = reply.send(res);
            }
            DbActorMessage::SoftDeleteColumn(physical_id, reply) => {
                let res = self.soft_delete_column(&state.pool, &physical_id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::DescribeSchema(reply) => {
                let res = self.describe_schema(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListRecords(reply) => {
                let res = self.list_records(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetRecord(id, reply) => {
                let res = self.get_record(&state.pool, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::InsertRecord(record, reply) => {
                let res = self.insert_record(&state.pool, record).await;
                let _ = reply.send(res);
            }
            DbActorMessage::UpdateRecord(update, reply) => {
                let res = self.update_record(&state.pool, update).await;
                let _ = reply.send(res);
            }
            DbActorMessage::RestoreSnapshot(snapshot, reply) => {
                let res = self.restore_snapshot(&state.pool, snapshot).await;
                let _ = reply.send(res);
            }
            DbActorMessage::DuplicateRecord(id, reply) => {
                let res = self.duplicate_record(&state.pool, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::DeleteRecord(id, reply) => {
                let res = self.delete_record(&state.pool, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::BulkSetZone(ids, zone, reply) => {
                let res = self.bulk_set_zone(&state.pool, &ids, &zone).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ExportTabular(reply) => {
                let res = self.export_tabular(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ExportCsv(reply) => {
                let res = self.export_csv(state).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ExportSnapshot(reply) => {
                let res = self.export_snapshot(state).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    /// Reconcile storage, then return the active column set.
    async fn columns(&self, pool: &SqlitePool) -> Result<Vec<ColumnDefinition>, LabError> {
        Ok(sync::ensure_schema(pool).await?.columns)
    }

    async fn register_column(
        &self,
        pool: &SqlitePool,
        column: NewColumn,
    ) -> Result<ColumnDefinition, LabError> {
        let def = registry::register(pool, &column).await?;
        sync::ensure_schema(pool).await?;
        Ok(def)
    }

    async fn soft_delete_column(
        &self,
        pool: &SqlitePool,
        physical_id: &str,
    ) -> Result<bool, LabError> {
        sync::ensure_schema(pool).await?;
        registry::soft_delete(pool, physical_id).await
    }

    async fn describe_schema(&self, pool: &SqlitePool) -> Result<SchemaReport, LabError> {
        sync::ensure_schema(pool).await?;
        Ok(SchemaReport {
            physical_columns: sync::observed_columns(pool, INVENTORY_TABLE).await?,
            definitions: registry::list_all(pool).await?,
        })
    }

    async fn list_records(&self, pool: &SqlitePool) -> Result<Vec<InventoryRecord>, LabError> {
        let columns = self.columns(pool).await?;
        records::list(pool, &columns).await
    }

    async fn get_record(
        &self,
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<InventoryRecord>, LabError> {
        let columns = self.columns(pool).await?;
        records::fetch_image(pool, &columns, id).await
    }

    async fn insert_record(&self, pool: &SqlitePool, record: NewRecord) -> Result<i64, LabError> {
        let columns = self.columns(pool).await?;
        records::insert(pool, &columns, &record).await
    }

    async fn update_record(
        &self,
        pool: &SqlitePool,
        update: RecordUpdate,
    ) -> Result<Option<UndoSnapshot>, LabError> {
        let columns = self.columns(pool).await?;
        let before = update.apply_patch(pool, &columns).await?;
        Ok(before.map(UndoSnapshot::new))
    }

    async fn restore_snapshot(
        &self,
        pool: &SqlitePool,
        snapshot: UndoSnapshot,
    ) -> Result<bool, LabError> {
        let columns = self.columns(pool).await?;
        let restored = snapshot.apply_patch(pool, &columns).await?.is_some();
        info!(id = snapshot.record_id(), restored, "undo applied");
        Ok(restored)
    }

    async fn duplicate_record(&self, pool: &SqlitePool, id: i64) -> Result<Option<i64>, LabError> {
        sync::ensure_schema(pool).await?;
        records::duplicate(pool, id).await
    }

    async fn delete_record(&self, pool: &SqlitePool, id: i64) -> Result<bool, LabError> {
        sync::ensure_schema(pool).await?;
        records::delete(pool, id).await
    }

    async fn bulk_set_zone(
        &self,
        pool: &SqlitePool,
        ids: &[i64],
        zone: &str,
    ) -> Result<u64, LabError> {
        sync::ensure_schema(pool).await?;
        records::bulk_set_zone(pool, ids, zone).await
    }

    async fn export_tabular(&self, pool: &SqlitePool) -> Result<TabularExport, LabError> {
        let columns = self.columns(pool).await?;
        let rows = records::list(pool, &columns).await?;
        debug!(
            columns = columns.len(),
            rows = rows.len(),
            "tabular export built"
        );
        Ok(TabularExport::build(&columns, &rows))
    }

    async fn export_csv(&self, state: &DbActorState) -> Result<Attachment, LabError> {
        self.export_tabular(&state.pool)
            .await?
            .into_csv_attachment(&state.options.csv_filename)
    }

    async fn export_snapshot(&self, state: &DbActorState) -> Result<Attachment, LabError> {
        let path = state.db_path.as_ref().ok_or_else(|| {
            LabError::UnexpectedError("in-memory database has no storage artifact".to_string())
        })?;

        // (busy, WAL frames, frames checkpointed)
        let (busy, wal_frames, checkpointed): (i64, i64, i64) =
            sqlx::query_as("PRAGMA wal_checkpoint(TRUNCATE)")
                .fetch_one(&state.pool)
                .await?;
        if busy != 0 {
            return Err(LabError::UnexpectedError(format!(
                "WAL checkpoint blocked by another connection \
                 ({checkpointed} of {wal_frames} frames copied); snapshot would be incomplete"
            )));
        }

        let body = tokio::fs::read(path).await?;

        info!(path = %path.display(), bytes = body.len(), "raw snapshot exported");
        Ok(Attachment {
            filename: state.options.snapshot_filename.clone(),
            content_type: SQLITE_CONTENT_TYPE.to_string(),
            body,
        })
    }
}

fn storage_path(filename: &Path) -> Option<PathBuf> {
    let name = filename.to_string_lossy();
    if name.is_empty()
        || name == ":memory:"
        || name.contains("mode=memory")
        || name.contains("in-memory")
    {
        None
    } else {
        Some(filename.to_path_buf())
    }
}

/// Spawn the database actor and return a cloneable handle.
///
/// Start-up creates the tables, applies additive migrations, optionally
/// seeds demo data and reconciles user-defined columns.
pub async fn spawn(options: DbOptions) -> Result<DbActorHandle, LabError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, options)
        .await
        .map_err(|e| LabError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), LabError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    sync::apply_migrations(pool).await
}
