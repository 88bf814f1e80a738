//! Tabular projection of the inventory and the downloadable artifacts built from it.

use csv::WriterBuilder;
use lab_assets_schema::{ColumnDefinition, CoreField, InventoryRecord};
use serde::{Deserialize, Serialize};

use crate::error::LabError;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const SQLITE_CONTENT_TYPE: &str = "application/vnd.sqlite3";

/// Header row plus one text row per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularExport {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularExport {
    /// Core fields in canonical order, then `columns` in creation order.
    pub fn build(columns: &[ColumnDefinition], records: &[InventoryRecord]) -> Self {
        let headers = CoreField::ALL
            .iter()
            .map(|f| f.header().to_string())
            .chain(columns.iter().map(ColumnDefinition::header))
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                CoreField::ALL
                    .iter()
                    .map(|f| record.core_value(*f).render())
                    .chain(
                        columns
                            .iter()
                            .map(|def| record.custom_value(&def.physical_id).render()),
                    )
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, LabError> {
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(vec![]);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| LabError::UnexpectedError(format!("csv buffer flush failed: {e}")))
    }

    pub fn into_csv_attachment(self, filename: &str) -> Result<Attachment, LabError> {
        Ok(Attachment {
            filename: filename.to_string(),
            content_type: CSV_CONTENT_TYPE.to_string(),
            body: self.to_csv()?,
        })
    }
}

/// A named file handed to the transport layer for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Attachment {
    /// `Content-Disposition` value for serving the body as a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}
