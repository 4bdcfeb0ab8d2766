//! Spreadsheet row source backed by calamine.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

use super::{ColumnMapping, RawRow, RowSource, SourceError};

/// Reads one sheet of a workbook, yielding each non-header row once.
///
/// The sheet's cell range is loaded on open; rows are materialised into
/// `RawRow`s one at a time as the pipeline pulls them.
pub struct ExcelRowSource {
    range: Range<Data>,
    headers: Vec<String>,
    first_row: usize,
    next_row: usize,
}

impl ExcelRowSource {
    /// Open `sheet` in the workbook at `path` and check the header row.
    pub fn open(path: &Path, sheet: &str, columns: &ColumnMapping) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::FileNotFound(path.to_path_buf()));
        }

        let mut workbook = open_workbook_auto(path).map_err(|e| SourceError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == sheet) {
            return Err(SourceError::SheetNotFound {
                sheet: sheet.to_string(),
                available,
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| SourceError::Workbook {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let headers: Vec<String> = (0..range.width())
            .map(|col| {
                range
                    .get((0, col))
                    .and_then(cell_text)
                    .unwrap_or_default()
            })
            .collect();

        let missing: Vec<String> = columns
            .required()
            .iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::MissingColumns(missing));
        }

        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        log::info!(
            "Loaded sheet '{}' from {}: {} rows x {} columns",
            sheet,
            path.display(),
            range.height().saturating_sub(1),
            headers.len()
        );
        log::debug!("Columns: {:?}", headers);

        Ok(Self {
            range,
            headers,
            first_row,
            next_row: 1,
        })
    }
}

impl Iterator for ExcelRowSource {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        if self.next_row >= self.range.height() {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;

        let mut raw = RawRow::new(self.first_row + row + 1);
        for (col, header) in self.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            if let Some(text) = self.range.get((row, col)).and_then(cell_text) {
                raw.cells.insert(header.clone(), text);
            }
        }
        Some(raw)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.range.height().saturating_sub(self.next_row);
        (remaining, Some(remaining))
    }
}

impl RowSource for ExcelRowSource {
    fn len_hint(&self) -> Option<usize> {
        Some(self.range.height().saturating_sub(1))
    }
}

/// Cell text as it should reach the validator; `None` for empty cells.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        // Postal codes typed as numbers arrive as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_float_without_fraction() {
        assert_eq!(cell_text(&Data::Float(2300025.0)).as_deref(), Some("2300025"));
        assert_eq!(cell_text(&Data::Int(1000001)).as_deref(), Some("1000001"));
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(
            cell_text(&Data::String("東京都".into())).as_deref(),
            Some("東京都")
        );
    }

    #[test]
    fn test_open_missing_file() {
        let result = ExcelRowSource::open(
            Path::new("does/not/exist.xlsx"),
            "営業リスト",
            &ColumnMapping::default(),
        );
        assert!(matches!(result, Err(SourceError::FileNotFound(_))));
    }
}
