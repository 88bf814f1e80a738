#![allow(dead_code)]

use lab_assets::db::{DbActorHandle, DbOptions};
use lab_assets::schema::{ColumnDefinition, ColumnType, NewColumn};
use sqlx::SqlitePool;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::fs;

static SEQ: AtomicU64 = AtomicU64::new(0);

/// A throwaway SQLite file under the system temp dir.
pub struct TestDb {
    pub path: PathBuf,
    pub url: String,
}

impl TestDb {
    pub fn new(tag: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        SystemTime::now().hash(&mut hasher);
        SEQ.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
        std::process::id().hash(&mut hasher);

        let path = std::env::temp_dir().join(format!("test_{tag}_{:016x}.sqlite", hasher.finish()));
        let url = format!("sqlite:{}", path.to_str().unwrap());
        Self { path, url }
    }

    pub async fn spawn(&self) -> DbActorHandle {
        lab_assets::db::spawn(DbOptions::new(&self.url))
            .await
            .expect("spawn DbActor")
    }

    /// A second, independent pool on the same file (stands in for another process).
    pub async fn external_pool(&self) -> SqlitePool {
        SqlitePool::connect(&self.url)
            .await
            .expect("connect external pool")
    }

    pub async fn cleanup(self) {
        let wal_path = PathBuf::from(format!("{}-wal", self.path.to_string_lossy()));
        let shm_path = PathBuf::from(format!("{}-shm", self.path.to_string_lossy()));
        let _ = fs::remove_file(&wal_path).await;
        let _ = fs::remove_file(&shm_path).await;
        let _ = fs::remove_file(&self.path).await;
    }
}

pub async fn register(
    db: &DbActorHandle,
    name: &str,
    column_type: ColumnType,
    display_name: &str,
) -> ColumnDefinition {
    db.register_column(NewColumn::new(name, column_type).with_display_name(display_name))
        .await
        .expect("register column")
}
