//! In-memory row source.

use std::collections::VecDeque;

use super::{ColumnMapping, RawRow, RowSource};

/// Rows held in memory, yielded front to back.
#[derive(Debug, Default)]
pub struct MemoryRowSource {
    rows: VecDeque<RawRow>,
    total: usize,
    report_len: bool,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        let total = rows.len();
        Self {
            rows: rows.into(),
            total,
            report_len: true,
        }
    }

    /// Build rows from `(name, postal_code, prefecture, address)` tuples using
    /// the column names in `columns`. Empty strings become empty cells.
    pub fn from_fields(columns: &ColumnMapping, fields: &[(&str, &str, &str, &str)]) -> Self {
        let rows = fields
            .iter()
            .enumerate()
            .map(|(i, (name, postal_code, prefecture, address))| {
                let mut row = RawRow::new(i + 2);
                for (column, value) in [
                    (&columns.name, name),
                    (&columns.postal_code, postal_code),
                    (&columns.prefecture, prefecture),
                    (&columns.address, address),
                ] {
                    if !value.is_empty() {
                        row.cells.insert(column.clone(), value.to_string());
                    }
                }
                row
            })
            .collect();
        Self::new(rows)
    }

    /// Hide the row count, as a streaming backend without a length would.
    pub fn without_len(mut self) -> Self {
        self.report_len = false;
        self
    }
}

impl Iterator for MemoryRowSource {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        self.rows.pop_front()
    }
}

impl RowSource for MemoryRowSource {
    fn len_hint(&self) -> Option<usize> {
        self.report_len.then_some(self.total)
    }
}
