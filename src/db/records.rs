//! Record store over the `inventory` table.
//!
//! Callers pass the active column set returned by
//! [`ensure_schema`](crate::db::sync::ensure_schema); every column named in
//! it is guaranteed to exist physically.

use lab_assets_schema::{ColumnDefinition, CoreField, FieldValue, InventoryRecord, NewRecord, RowImage};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor, SqlitePool, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::db::schema::{DEMO_SEED, INVENTORY_TABLE};
use crate::db::sync::{observed_columns, quote_ident};
use crate::error::LabError;

/// Ids per `IN (..)` list; keeps bulk statements well below SQLite's bind limit.
const BULK_CHUNK: usize = 500;

const CORE_SELECT: &str = "SELECT id, zone, item_name, identifier, notes, power_draw_amps";

fn select_sql(columns: &[ColumnDefinition]) -> String {
    let mut sql = String::from(CORE_SELECT);
    for def in columns {
        sql.push_str(", ");
        sql.push_str(&quote_ident(def.physical_id.as_str()));
    }
    sql.push_str(" FROM inventory");
    sql
}

/// Current image of one record, projected onto `columns`.
pub async fn fetch_image<'e, E>(
    executor: E,
    columns: &[ColumnDefinition],
    id: i64,
) -> Result<Option<InventoryRecord>, LabError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE id = ?", select_sql(columns));
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;

    match row {
        Some(row) => Ok(Some(decode_record(&row, columns)?)),
        None => Ok(None),
    }
}

/// Stored cells of one record, core fields then `columns`, NULLs kept.
pub async fn fetch_row_image<'e, E>(
    executor: E,
    columns: &[ColumnDefinition],
    id: i64,
) -> Result<Option<RowImage>, LabError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE id = ?", select_sql(columns));
    let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(executor).await? else {
        return Ok(None);
    };

    let cells = CoreField::ALL
        .iter()
        .map(|f| f.column())
        .chain(columns.iter().map(|def| def.physical_id.as_str()))
        .map(|name| Ok((name.to_string(), decode_value(&row, name)?)))
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(Some(RowImage { id, cells }))
}

/// All records ordered by zone, then item name.
pub async fn list(
    pool: &SqlitePool,
    columns: &[ColumnDefinition],
) -> Result<Vec<InventoryRecord>, LabError> {
    let sql = format!(
        "{} ORDER BY zone ASC, item_name ASC, id ASC",
        select_sql(columns)
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter()
        .map(|row| decode_record(row, columns).map_err(LabError::from))
        .collect()
}

/// Insert a record, coercing every input by its declared type.
///
/// Active columns missing from `new.custom` get the coercion of an empty
/// input; keys that name no active column are dropped.
pub async fn insert(
    pool: &SqlitePool,
    columns: &[ColumnDefinition],
    new: &NewRecord,
) -> Result<i64, LabError> {
    let mut values: Vec<(String, FieldValue)> = vec![
        ("zone".to_string(), FieldValue::from(new.zone.as_str())),
        ("item_name".to_string(), FieldValue::from(new.item_name.as_str())),
        ("identifier".to_string(), FieldValue::from(new.identifier.as_str())),
        ("notes".to_string(), FieldValue::from(new.notes.as_str())),
        (
            "power_draw_amps".to_string(),
            FieldValue::Real(FieldValue::parse_real(&new.power_draw_amps)),
        ),
    ];

    for def in columns {
        let raw = new
            .custom
            .get(def.physical_id.as_str())
            .map(String::as_str)
            .unwrap_or("");
        values.push((
            def.physical_id.as_str().to_string(),
            def.column_type.coerce(raw),
        ));
    }

    for key in new.custom.keys() {
        if !columns.iter().any(|def| def.physical_id.as_str() == key) {
            debug!(column = %key, "ignoring value for unknown column");
        }
    }

    let mut qb = insert_builder(values);
    let res = qb.build().execute(pool).await?;
    let id = res.last_insert_rowid();

    debug!(id, item_name = %new.item_name, "record inserted");
    Ok(id)
}

/// Clone a record under a fresh id, `" (Copy)"` appended to its name.
///
/// Copies every physical column verbatim, including values of hidden
/// columns. Returns `None` when `id` does not exist.
pub async fn duplicate(pool: &SqlitePool, id: i64) -> Result<Option<i64>, LabError> {
    let physical: Vec<String> = observed_columns(pool, INVENTORY_TABLE)
        .await?
        .into_iter()
        .map(|c| c.name)
        .filter(|name| name != "id")
        .collect();

    let targets: Vec<String> = physical.iter().map(|c| quote_ident(c)).collect();
    let sources: Vec<String> = physical
        .iter()
        .map(|c| {
            if c == "item_name" {
                "COALESCE(item_name, '') || ' (Copy)'".to_string()
            } else {
                quote_ident(c)
            }
        })
        .collect();

    let sql = format!(
        "INSERT INTO inventory ({}) SELECT {} FROM inventory WHERE id = ?",
        targets.join(", "),
        sources.join(", ")
    );
    let res = sqlx::query(&sql).bind(id).execute(pool).await?;

    if res.rows_affected() == 0 {
        debug!(id, "duplicate source missing");
        return Ok(None);
    }

    let new_id = res.last_insert_rowid();
    debug!(id, new_id, "record duplicated");
    Ok(Some(new_id))
}

/// Permanently remove a record. Returns whether a row was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, LabError> {
    let res = sqlx::query("DELETE FROM inventory WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    debug!(id, affected = res.rows_affected(), "record deleted");
    Ok(res.rows_affected() > 0)
}

/// Move every listed record to `zone` in one transaction.
///
/// Unknown ids are skipped. Returns the number of rows changed.
pub async fn bulk_set_zone(pool: &SqlitePool, ids: &[i64], zone: &str) -> Result<u64, LabError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut changed = 0;
    for chunk in ids.chunks(BULK_CHUNK) {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE inventory SET zone = ");
        qb.push_bind(zone.to_string());
        qb.push(" WHERE id IN (");
        let mut list = qb.separated(", ");
        for id in chunk {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        changed += qb.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    info!(requested = ids.len(), changed, zone, "bulk zone update");
    Ok(changed)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, LabError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Insert the sample devices if the inventory is empty. Returns rows inserted.
pub async fn seed_if_empty(pool: &SqlitePool) -> Result<u64, LabError> {
    if count(pool).await? > 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for (zone, item_name, identifier, notes, power) in DEMO_SEED {
        inserted += sqlx::query(
            r#"
            INSERT INTO inventory (zone, item_name, identifier, notes, power_draw_amps)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(*zone)
        .bind(*item_name)
        .bind(*identifier)
        .bind(*notes)
        .bind(*power)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;

    info!(rows = inserted, "seeded demo inventory");
    Ok(inserted)
}

/// `INSERT INTO inventory (..) VALUES (..)` with every value bound.
pub(crate) fn insert_builder(values: Vec<(String, FieldValue)>) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("INSERT INTO inventory (");
    let names: Vec<String> = values.iter().map(|(name, _)| quote_ident(name)).collect();
    qb.push(names.join(", "));
    qb.push(") VALUES (");
    for (i, (_, value)) in values.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_field(&mut qb, value);
    }
    qb.push(")");
    qb
}

/// `UPDATE inventory SET .. WHERE id = ?` with every value bound.
pub(crate) fn update_builder(
    id: i64,
    values: Vec<(String, FieldValue)>,
) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("UPDATE inventory SET ");
    for (i, (name, value)) in values.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(quote_ident(&name));
        qb.push(" = ");
        push_field(&mut qb, value);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb
}

fn push_field(qb: &mut QueryBuilder<'static, Sqlite>, value: FieldValue) {
    match value {
        FieldValue::Null => qb.push_bind(None::<String>),
        FieldValue::Integer(v) => qb.push_bind(v),
        FieldValue::Real(v) => qb.push_bind(v),
        FieldValue::Text(v) => qb.push_bind(v),
    };
}

fn decode_record(
    row: &SqliteRow,
    columns: &[ColumnDefinition],
) -> Result<InventoryRecord, sqlx::Error> {
    let mut custom = BTreeMap::new();
    for def in columns {
        custom.insert(
            def.physical_id.clone(),
            decode_value(row, def.physical_id.as_str())?,
        );
    }

    Ok(InventoryRecord {
        id: row.try_get("id")?,
        zone: decode_value(row, "zone")?.into_text(),
        item_name: decode_value(row, "item_name")?.into_text(),
        identifier: decode_value(row, "identifier")?.into_text(),
        notes: decode_value(row, "notes")?.into_text(),
        power_draw_amps: decode_value(row, "power_draw_amps")?.as_f64(),
        custom,
    })
}

/// Decode a cell by its storage class rather than the declared column type.
fn decode_value(row: &SqliteRow, column: &str) -> Result<FieldValue, sqlx::Error> {
    let storage = {
        let raw = row.try_get_raw(column)?;
        if raw.is_null() {
            return Ok(FieldValue::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match storage.as_str() {
        "INTEGER" => FieldValue::Integer(row.try_get_unchecked(column)?),
        "REAL" => FieldValue::Real(row.try_get_unchecked(column)?),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get_unchecked(column)?;
            FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => FieldValue::Text(row.try_get_unchecked(column)?),
    };
    Ok(value)
}
