//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// Name of the record table whose column set grows at runtime.
pub const INVENTORY_TABLE: &str = "inventory";

/// Name of the column metadata table.
pub const COLUMNS_TABLE: &str = "custom_columns";

/// SQLite schema includes:
/// - `inventory` table (core fields only; user-defined columns are appended by the synchronizer)
/// - `custom_columns` table (one row per registered column; never physically dropped)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Inventory records
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    zone TEXT,
    item_name TEXT,
    identifier TEXT,
    notes TEXT,
    power_draw_amps REAL DEFAULT 0.0
);

CREATE INDEX IF NOT EXISTS idx_inventory_zone_item ON inventory(zone, item_name);

-- ---------------------------------------------------------------------------
-- User-defined column registry (id doubles as creation order)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS custom_columns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    column_name TEXT NOT NULL UNIQUE,
    column_type TEXT NOT NULL DEFAULT 'TEXT',
    display_name TEXT,
    created_at TEXT NOT NULL, -- RFC3339
    deleted_at TEXT NULL -- RFC3339, tombstone
);
"#;

/// Columns added to tables after their first release. Applied with the same
/// add-if-missing rule as user-defined columns so older files keep working.
pub const ADDITIVE_MIGRATIONS: &[(&str, &str, &str)] =
    &[(COLUMNS_TABLE, "deleted_at", "TEXT NULL")];

/// Sample devices inserted into an empty inventory when seeding is enabled.
/// `(zone, item_name, identifier, notes, power_draw_amps)`
pub const DEMO_SEED: &[(&str, &str, &str, &str, f64)] = &[
    ("4", "ifm O3D313 (1)", "00:02:01:40:2F:75", "IP 67; 24V DC ToF Sensor", 2.4),
    ("4", "ifm O3D313 (2)", "Pending", "IP 67; 24V DC", 2.4),
    ("4", "Lucid Helios Flex", "223600163", "HTP0035-001; FPD-Link III", 0.5),
    ("4", "Mean Well DR-120-24", "N/A", "120W 24V; 5A Max Output", 0.0),
    ("4", "ifm OVP800", "N/A", "3D processing system", 1.0),
    ("4", "LF RFID System", "N/A", "Reader + 2 Antennas", 0.3),
];
