use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

use crate::value::FieldValue;

/// Namespace token every user-defined column carries, so it can never
/// shadow one of the core inventory fields.
pub const COLUMN_PREFIX: &str = "custom_";

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SchemaError {
    #[error("column name {0:?} has no usable characters")]
    EmptyName(String),

    #[error("unknown column type {0:?}; expected TEXT, INTEGER or REAL")]
    UnknownColumnType(String),

    #[error("invalid physical column identifier {0:?}")]
    InvalidPhysicalId(String),
}

/// Declared type of a user-defined column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// SQL type used when the column is materialized.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }

    /// Lenient parse of user input into a value of this type.
    pub fn coerce(self, raw: &str) -> FieldValue {
        match self {
            ColumnType::Text => FieldValue::Text(raw.to_string()),
            ColumnType::Integer => FieldValue::Integer(FieldValue::parse_integer(raw)),
            ColumnType::Real => FieldValue::Real(FieldValue::parse_real(raw)),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

impl FromStr for ColumnType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(ColumnType::Text),
            "INTEGER" => Ok(ColumnType::Integer),
            "REAL" => Ok(ColumnType::Real),
            _ => Err(SchemaError::UnknownColumnType(s.to_string())),
        }
    }
}

/// Storage-safe column identifier, always `custom_[a-z0-9_]+`.
///
/// Values of this type are the only identifiers ever spliced into SQL text,
/// so construction is restricted to [`PhysicalId::normalize`] and
/// [`PhysicalId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhysicalId(String);

impl PhysicalId {
    /// Derive the identifier for a user supplied column name.
    ///
    /// Lower-cases, keeps ASCII alphanumerics and underscores and adds the
    /// `custom_` prefix unless the cleaned name already starts with it.
    pub fn normalize(name: &str) -> Result<Self, SchemaError> {
        let cleaned: String = name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        let id = if cleaned.starts_with(COLUMN_PREFIX) {
            cleaned
        } else {
            format!("{COLUMN_PREFIX}{cleaned}")
        };

        if id.len() == COLUMN_PREFIX.len() {
            return Err(SchemaError::EmptyName(name.to_string()));
        }
        Ok(Self(id))
    }

    /// Accept an identifier that is already in normalized form.
    pub fn parse(id: &str) -> Result<Self, SchemaError> {
        let valid = id.len() > COLUMN_PREFIX.len()
            && id.starts_with(COLUMN_PREFIX)
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(SchemaError::InvalidPhysicalId(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhysicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhysicalId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhysicalId> for String {
    fn from(id: PhysicalId) -> Self {
        id.0
    }
}

/// Registration request for a user-defined column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    pub column_type: ColumnType,
    /// `None` or blank => the raw name is shown.
    pub display_name: Option<String>,
}

impl NewColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn physical_id(&self) -> Result<PhysicalId, SchemaError> {
        PhysicalId::normalize(&self.name)
    }

    pub fn resolved_display_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.name.trim().to_string(),
        }
    }
}

/// A registered user-defined column. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub physical_id: PhysicalId,
    pub column_type: ColumnType,
    pub display_name: String,
    /// Monotonic registration sequence; dynamic columns are laid out in this order.
    pub creation_order: i64,
    pub created_at: DateTime<Utc>,
    /// Set when the column has been soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ColumnDefinition {
    pub fn is_tombstoned(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Label used for tabular exports.
    pub fn header(&self) -> String {
        let label = self.display_name.trim();
        if label.is_empty() {
            capitalize(self.physical_id.as_str())
        } else {
            label.to_string()
        }
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_prefix_and_strips_unsafe_characters() {
        let id = PhysicalId::normalize("Voltage").unwrap();
        assert_eq!(id.as_str(), "custom_voltage");

        let id = PhysicalId::normalize("Serial No. (Rev-2)").unwrap();
        assert_eq!(id.as_str(), "custom_serialnorev2");

        let id = PhysicalId::normalize("max_temp_C").unwrap();
        assert_eq!(id.as_str(), "custom_max_temp_c");
    }

    #[test]
    fn normalize_keeps_existing_prefix() {
        let id = PhysicalId::normalize("custom_voltage").unwrap();
        assert_eq!(id.as_str(), "custom_voltage");
        assert_eq!(id, PhysicalId::normalize("VOLTAGE").unwrap());
    }

    #[test]
    fn normalize_rejects_names_without_usable_characters() {
        assert_eq!(
            PhysicalId::normalize("  !!  "),
            Err(SchemaError::EmptyName("  !!  ".to_string()))
        );
        assert!(PhysicalId::normalize("custom_").is_err());
        assert!(PhysicalId::normalize("Ω").is_err());
    }

    #[test]
    fn parse_only_accepts_normalized_identifiers() {
        assert!(PhysicalId::parse("custom_voltage").is_ok());
        assert!(PhysicalId::parse("zone").is_err());
        assert!(PhysicalId::parse("custom_Voltage").is_err());
        assert!(PhysicalId::parse("custom_x; DROP TABLE inventory").is_err());
        assert!(PhysicalId::parse("custom_").is_err());
    }

    #[test]
    fn column_type_parses_case_insensitively() {
        assert_eq!("real".parse::<ColumnType>(), Ok(ColumnType::Real));
        assert_eq!(" Integer ".parse::<ColumnType>(), Ok(ColumnType::Integer));
        assert_eq!("TEXT".parse::<ColumnType>(), Ok(ColumnType::Text));
        assert_eq!(
            "BLOB".parse::<ColumnType>(),
            Err(SchemaError::UnknownColumnType("BLOB".to_string()))
        );
    }

    #[test]
    fn display_name_falls_back_to_raw_name() {
        let col = NewColumn::new(" Voltage ", ColumnType::Real);
        assert_eq!(col.resolved_display_name(), "Voltage");

        let col = NewColumn::new("volt", ColumnType::Real).with_display_name("  ");
        assert_eq!(col.resolved_display_name(), "volt");

        let col = NewColumn::new("volt", ColumnType::Real).with_display_name("Voltage (V)");
        assert_eq!(col.resolved_display_name(), "Voltage (V)");
    }

    #[test]
    fn header_falls_back_to_capitalized_identifier() {
        let def = ColumnDefinition {
            physical_id: PhysicalId::parse("custom_voltage").unwrap(),
            column_type: ColumnType::Real,
            display_name: String::new(),
            creation_order: 1,
            created_at: Utc::now(),
            deleted_at: None,
        };
        assert_eq!(def.header(), "Custom_voltage");

        let labelled = ColumnDefinition {
            display_name: "Voltage".to_string(),
            ..def
        };
        assert_eq!(labelled.header(), "Voltage");
    }

    #[test]
    fn physical_id_serializes_as_plain_string() {
        let id = PhysicalId::parse("custom_rack").unwrap();
        let out = serde_json::to_value(&id).expect("serialize id");
        assert_eq!(out, serde_json::json!("custom_rack"));

        let bad: Result<PhysicalId, _> = serde_json::from_value(serde_json::json!("rack"));
        assert!(bad.is_err());
    }
}
