//! Row sources - where recipient rows come from.
//!
//! A source is a lazy, finite, non-restartable sequence of rows plus an
//! optional up-front row count. Two backends exist:
//! - `excel` - an `.xlsx`/`.xls`/`.ods` sheet read through calamine
//! - `memory` - rows built in code (tests, embedding callers)

pub mod excel;
pub mod memory;

pub use excel::ExcelRowSource;
pub use memory::MemoryRowSource;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening a row source. All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    #[error("required columns are missing from the header row: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// One row as read from the source: header name to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row position in the sheet (the header is row 1).
    pub position: usize,
    pub cells: HashMap<String, String>,
}

impl RawRow {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            cells: HashMap::new(),
        }
    }

    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// Source-agnostic row contract consumed by the batch pipeline.
pub trait RowSource: Iterator<Item = RawRow> {
    /// Total number of rows, when the backend knows it up front.
    fn len_hint(&self) -> Option<usize>;
}

/// Header names used to pick each recipient field out of a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMapping {
    pub name: String,
    pub postal_code: String,
    pub address: String,
    pub prefecture: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: "氏名".to_string(),
            postal_code: "郵便番号".to_string(),
            address: "住所".to_string(),
            prefecture: "都道府県".to_string(),
        }
    }
}

impl ColumnMapping {
    pub fn required(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.postal_code.as_str(),
            self.address.as_str(),
            self.prefecture.as_str(),
        ]
    }
}

/// The input unit of the core: one recipient, fields as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientRecord {
    pub position: usize,
    pub name: Option<String>,
    pub postal_code: Option<String>,
    pub prefecture: Option<String>,
    pub address: Option<String>,
}

impl RecipientRecord {
    pub fn from_row(row: &RawRow, columns: &ColumnMapping) -> Self {
        let field = |column: &str| row.get(column).map(str::to_string);
        Self {
            position: row.position,
            name: field(&columns.name),
            postal_code: field(&columns.postal_code),
            prefecture: field(&columns.prefecture),
            address: field(&columns.address),
        }
    }
}
