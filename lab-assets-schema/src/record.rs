use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::column::PhysicalId;
use crate::value::FieldValue;

/// The fixed inventory columns, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreField {
    Zone,
    ItemName,
    Identifier,
    Notes,
    PowerDrawAmps,
}

impl CoreField {
    pub const ALL: [CoreField; 5] = [
        CoreField::Zone,
        CoreField::ItemName,
        CoreField::Identifier,
        CoreField::Notes,
        CoreField::PowerDrawAmps,
    ];

    pub fn column(self) -> &'static str {
        match self {
            CoreField::Zone => "zone",
            CoreField::ItemName => "item_name",
            CoreField::Identifier => "identifier",
            CoreField::Notes => "notes",
            CoreField::PowerDrawAmps => "power_draw_amps",
        }
    }

    /// Export header for the column.
    pub fn header(self) -> &'static str {
        match self {
            CoreField::Zone => "Zone",
            CoreField::ItemName => "Item Name",
            CoreField::Identifier => "Identifier",
            CoreField::Notes => "Notes",
            CoreField::PowerDrawAmps => "Power (Amps)",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

/// One row of the inventory, projected onto the active column set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: i64,
    pub zone: String,
    pub item_name: String,
    pub identifier: String,
    pub notes: String,
    pub power_draw_amps: f64,
    /// Values of user-defined columns keyed by physical id.
    pub custom: BTreeMap<PhysicalId, FieldValue>,
}

impl InventoryRecord {
    pub fn core_value(&self, field: CoreField) -> FieldValue {
        match field {
            CoreField::Zone => FieldValue::Text(self.zone.clone()),
            CoreField::ItemName => FieldValue::Text(self.item_name.clone()),
            CoreField::Identifier => FieldValue::Text(self.identifier.clone()),
            CoreField::Notes => FieldValue::Text(self.notes.clone()),
            CoreField::PowerDrawAmps => FieldValue::Real(self.power_draw_amps),
        }
    }

    /// Value of a user-defined column; `Null` when the column is not part of this image.
    pub fn custom_value(&self, id: &PhysicalId) -> FieldValue {
        self.custom.get(id).cloned().unwrap_or_default()
    }

    /// Look up any column by its storage name.
    pub fn value(&self, column: &str) -> Option<FieldValue> {
        if let Some(field) = CoreField::from_column(column) {
            return Some(self.core_value(field));
        }
        self.custom
            .iter()
            .find(|(id, _)| id.as_str() == column)
            .map(|(_, v)| v.clone())
    }
}

/// Every stored cell of one record, exactly as read (NULLs included).
///
/// Unlike [`InventoryRecord`] nothing is normalized, so writing the cells
/// back reproduces the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowImage {
    pub id: i64,
    /// `(storage name, value)`, core fields first.
    pub cells: Vec<(String, FieldValue)>,
}

impl RowImage {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }
}

/// Insert payload. All inputs are raw text and coerced by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecord {
    pub zone: String,
    pub item_name: String,
    pub identifier: String,
    pub notes: String,
    pub power_draw_amps: String,
    /// Raw values for user-defined columns keyed by physical id.
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl NewRecord {
    pub fn new(zone: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            item_name: item_name.into(),
            ..Default::default()
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn power_draw_amps(mut self, raw: impl Into<String>) -> Self {
        self.power_draw_amps = raw.into();
        self
    }

    pub fn custom(mut self, id: impl Into<String>, raw: impl Into<String>) -> Self {
        self.custom.insert(id.into(), raw.into());
        self
    }
}

/// Partial update. `None` / absent keys leave the stored value unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    /// `None` => do not change; `Some(v)` => update
    pub zone: Option<String>,
    pub item_name: Option<String>,
    pub identifier: Option<String>,
    pub notes: Option<String>,
    /// Raw text, coerced like a REAL column.
    pub power_draw_amps: Option<String>,
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl RecordPatch {
    /// Route a flat `column => raw text` map (e.g. a submitted form) into a patch.
    ///
    /// Keys naming a core field fill that field; every other key is kept as a
    /// candidate user-defined column and checked against the registry when
    /// the patch is applied. An `id` key is ignored.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut patch = RecordPatch::default();
        for (key, value) in fields {
            let key = key.into();
            let value = value.into();
            match CoreField::from_column(key.as_str()) {
                Some(CoreField::Zone) => patch.zone = Some(value),
                Some(CoreField::ItemName) => patch.item_name = Some(value),
                Some(CoreField::Identifier) => patch.identifier = Some(value),
                Some(CoreField::Notes) => patch.notes = Some(value),
                Some(CoreField::PowerDrawAmps) => patch.power_draw_amps = Some(value),
                None if key == "id" => {}
                None => {
                    patch.custom.insert(key, value);
                }
            }
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.zone.is_none()
            && self.item_name.is_none()
            && self.identifier.is_none()
            && self.notes.is_none()
            && self.power_draw_amps.is_none()
            && self.custom.is_empty()
    }
}
