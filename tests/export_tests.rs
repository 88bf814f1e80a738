mod common;

use common::{TestDb, register};
use lab_assets::LabError;
use lab_assets::db::DbOptions;
use lab_assets::schema::{ColumnType, FieldValue, NewRecord};

#[tokio::test]
async fn registered_column_appears_in_tabular_export() {
    let tdb = TestDb::new("export_voltage");
    let db = tdb.spawn().await;

    let def = register(&db, "Voltage", ColumnType::Real, "Voltage").await;
    assert_eq!(def.physical_id.as_str(), "custom_voltage");

    let id = db
        .insert_record(
            NewRecord::new("4", "Sensor")
                .identifier("X1")
                .power_draw_amps("1")
                .custom("custom_voltage", "12.5"),
        )
        .await
        .expect("insert record");
    let record = db.get_record(id).await.expect("get").expect("exists");
    assert_eq!(record.custom_value(&def.physical_id), FieldValue::Real(12.5));

    let export = db.export_tabular().await.expect("export");
    assert_eq!(
        export.headers,
        vec!["Zone", "Item Name", "Identifier", "Notes", "Power (Amps)", "Voltage"]
    );
    assert_eq!(export.rows, vec![vec!["4", "Sensor", "X1", "", "1.0", "12.5"]]);

    tdb.cleanup().await;
}

#[tokio::test]
async fn csv_attachment_carries_header_and_rows() {
    let tdb = TestDb::new("export_csv");
    let db = lab_assets::db::spawn(DbOptions::new(&tdb.url).csv_filename("audit.csv"))
        .await
        .expect("spawn DbActor");

    register(&db, "Ports", ColumnType::Integer, "Ports").await;
    db.insert_record(
        NewRecord::new("4", "Switch, managed")
            .power_draw_amps("0.5")
            .custom("custom_ports", "24"),
    )
    .await
    .expect("insert record");

    let attachment = db.export_csv().await.expect("csv export");
    assert_eq!(attachment.filename, "audit.csv");
    assert_eq!(attachment.content_type, "text/csv");
    assert_eq!(
        attachment.content_disposition(),
        "attachment; filename=audit.csv"
    );

    let text = String::from_utf8(attachment.body).expect("utf8 csv");
    assert_eq!(
        text,
        "Zone,Item Name,Identifier,Notes,Power (Amps),Ports\n4,\"Switch, managed\",,,0.5,24\n"
    );

    tdb.cleanup().await;
}

#[tokio::test]
async fn empty_inventory_exports_headers_only() {
    let tdb = TestDb::new("export_empty");
    let db = tdb.spawn().await;

    let export = db.export_tabular().await.expect("export");
    assert_eq!(export.headers.len(), 5);
    assert!(export.rows.is_empty());

    let text = String::from_utf8(db.export_csv().await.expect("csv").body).expect("utf8");
    assert_eq!(text, "Zone,Item Name,Identifier,Notes,Power (Amps)\n");

    tdb.cleanup().await;
}

#[tokio::test]
async fn snapshot_is_the_raw_database_file() {
    let tdb = TestDb::new("export_snapshot");
    let db = tdb.spawn().await;

    register(&db, "Voltage", ColumnType::Real, "Voltage").await;
    db.insert_record(NewRecord::new("4", "Sensor").custom("custom_voltage", "12.5"))
        .await
        .expect("insert record");

    let snapshot = db.export_snapshot().await.expect("snapshot");
    assert_eq!(snapshot.filename, "lab_assets.db");
    assert_eq!(snapshot.content_type, "application/vnd.sqlite3");
    assert!(snapshot.body.starts_with(b"SQLite format 3\0"));

    tdb.cleanup().await;
}

#[tokio::test]
async fn snapshot_is_refused_while_a_reader_pins_the_wal() {
    let tdb = TestDb::new("export_snapshot_busy");
    let db = tdb.spawn().await;

    db.insert_record(NewRecord::new("4", "Sensor"))
        .await
        .expect("insert record");

    let external = tdb.external_pool().await;
    let mut reader = external.begin().await.expect("begin read transaction");
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
        .fetch_one(&mut *reader)
        .await
        .expect("read inside transaction");
    assert_eq!(rows, 1);

    let err = db
        .export_snapshot()
        .await
        .expect_err("checkpoint cannot complete while the reader is open");
    assert!(matches!(err, LabError::UnexpectedError(_)), "{err:?}");

    reader.rollback().await.expect("end read transaction");
    let snapshot = db.export_snapshot().await.expect("snapshot after reader ends");
    assert!(snapshot.body.starts_with(b"SQLite format 3\0"));

    external.close().await;
    tdb.cleanup().await;
}

#[tokio::test]
async fn in_memory_database_has_no_snapshot() {
    let db = lab_assets::db::spawn(DbOptions::new("sqlite::memory:"))
        .await
        .expect("spawn in-memory DbActor");

    db.insert_record(NewRecord::new("1", "Ephemeral"))
        .await
        .expect("insert record");

    let err = db.export_snapshot().await.expect_err("no file to export");
    assert!(matches!(err, LabError::UnexpectedError(_)), "{err:?}");
}
