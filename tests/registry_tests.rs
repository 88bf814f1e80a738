mod common;

use common::{TestDb, register};
use lab_assets::LabError;
use lab_assets::schema::{ColumnType, FieldValue, NewColumn, NewRecord, PhysicalId};

#[tokio::test]
async fn registering_the_same_name_twice_yields_one_column() {
    let tdb = TestDb::new("registry_idempotent");
    let db = tdb.spawn().await;

    let first = register(&db, "Voltage", ColumnType::Real, "Voltage").await;
    let second = register(&db, "  VOLTAGE ", ColumnType::Text, "Other label").await;
    let prefixed = register(&db, "custom_voltage", ColumnType::Integer, "").await;

    assert_eq!(first.physical_id.as_str(), "custom_voltage");
    assert_eq!(second, first);
    assert_eq!(prefixed, first);
    assert_eq!(second.column_type, ColumnType::Real);
    assert_eq!(second.display_name, "Voltage");

    let columns = db.list_columns().await.expect("list columns");
    assert_eq!(columns.len(), 1);

    let report = db.describe_schema().await.expect("describe schema");
    assert_eq!(report.definitions.len(), 1);
    let physical = report
        .physical_columns
        .iter()
        .filter(|c| c.name == "custom_voltage")
        .count();
    assert_eq!(physical, 1);

    tdb.cleanup().await;
}

#[tokio::test]
async fn columns_are_listed_in_creation_order() {
    let tdb = TestDb::new("registry_order");
    let db = tdb.spawn().await;

    register(&db, "Rack", ColumnType::Text, "Rack").await;
    register(&db, "Amps Peak", ColumnType::Real, "Peak").await;
    register(&db, "Count", ColumnType::Integer, "Count").await;

    let ids: Vec<String> = db
        .list_columns()
        .await
        .expect("list columns")
        .into_iter()
        .map(|c| c.physical_id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["custom_rack", "custom_ampspeak", "custom_count"]);

    tdb.cleanup().await;
}

#[tokio::test]
async fn blank_display_name_falls_back_to_raw_name() {
    let tdb = TestDb::new("registry_label");
    let db = tdb.spawn().await;

    let def = register(&db, "Serial Port", ColumnType::Text, "   ").await;
    assert_eq!(def.physical_id.as_str(), "custom_serialport");
    assert_eq!(def.display_name, "Serial Port");

    let unlabeled = db
        .register_column(NewColumn::new("Firmware", ColumnType::Text))
        .await
        .expect("register without label");
    assert_eq!(unlabeled.display_name, "Firmware");

    tdb.cleanup().await;
}

#[tokio::test]
async fn names_without_usable_characters_are_rejected() {
    let tdb = TestDb::new("registry_invalid");
    let db = tdb.spawn().await;

    for name in ["", "   ", "!!!", "custom_"] {
        let err = db
            .register_column(NewColumn::new(name, ColumnType::Text))
            .await
            .expect_err("name must be rejected");
        assert!(matches!(err, LabError::Validation(_)), "{name:?}: {err:?}");
        assert!(!err.is_storage_failure());
    }

    let err = LabError::from(
        "BLOB"
            .parse::<ColumnType>()
            .expect_err("BLOB is not a column type"),
    );
    assert!(matches!(err, LabError::Validation(_)));

    assert!(db.list_columns().await.expect("list columns").is_empty());

    tdb.cleanup().await;
}

#[tokio::test]
async fn soft_delete_hides_column_but_keeps_storage() {
    let tdb = TestDb::new("registry_soft_delete");
    let db = tdb.spawn().await;

    let def = register(&db, "Voltage", ColumnType::Real, "Voltage").await;
    let id = db
        .insert_record(NewRecord::new("4", "Sensor").custom("custom_voltage", "12.5"))
        .await
        .expect("insert record");

    assert!(db.soft_delete_column("custom_voltage").await.expect("soft delete"));
    assert!(!db.soft_delete_column("custom_voltage").await.expect("second soft delete"));
    assert!(!db.soft_delete_column("custom_missing").await.expect("unknown soft delete"));

    assert!(db.list_columns().await.expect("list columns").is_empty());

    let record = db.get_record(id).await.expect("get record").expect("record exists");
    assert!(record.custom.is_empty());

    let export = db.export_tabular().await.expect("export");
    assert!(!export.headers.iter().any(|h| h == "Voltage"));
    assert_eq!(export.rows[0].len(), export.headers.len());

    let report = db.describe_schema().await.expect("describe schema");
    assert!(report.physical_columns.iter().any(|c| c.name == "custom_voltage"));
    let tombstone = report
        .definitions
        .iter()
        .find(|d| d.physical_id == def.physical_id)
        .expect("definition retained");
    assert!(tombstone.is_tombstoned());

    tdb.cleanup().await;
}

#[tokio::test]
async fn reregistering_a_soft_deleted_column_revives_its_values() {
    let tdb = TestDb::new("registry_revive");
    let db = tdb.spawn().await;

    let original = register(&db, "Voltage", ColumnType::Real, "Voltage").await;
    let id = db
        .insert_record(NewRecord::new("4", "Sensor").custom("custom_voltage", "12.5"))
        .await
        .expect("insert record");
    assert!(db.soft_delete_column("custom_voltage").await.expect("soft delete"));

    let revived = register(&db, "voltage", ColumnType::Text, "Volts").await;
    assert_eq!(revived.creation_order, original.creation_order);
    assert_eq!(revived.column_type, ColumnType::Real);
    assert_eq!(revived.display_name, "Voltage");
    assert!(!revived.is_tombstoned());

    let record = db.get_record(id).await.expect("get record").expect("record exists");
    let voltage = PhysicalId::parse("custom_voltage").expect("valid id");
    assert_eq!(record.custom_value(&voltage), FieldValue::Real(12.5));

    tdb.cleanup().await;
}
