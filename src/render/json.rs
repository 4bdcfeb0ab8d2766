//! Layout dump writer: every page's draw calls as JSON.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ensure_parent_dir, DocumentWriter, DrawText, PageSink, SavedDocument, WriterError};
use crate::config::LayoutConfig;

#[derive(Debug, Serialize)]
struct LayoutDump<'a> {
    page_width_mm: f64,
    page_height_mm: f64,
    pages: &'a [Vec<DrawText>],
}

/// Keeps draw calls in memory and writes them out as JSON.
#[derive(Debug, Default)]
pub struct LayoutJsonWriter {
    page_width_mm: f64,
    page_height_mm: f64,
    pages: Vec<Vec<DrawText>>,
    current: Vec<DrawText>,
    page_open: bool,
}

impl LayoutJsonWriter {
    pub fn new(layout: &LayoutConfig) -> Self {
        Self {
            page_width_mm: layout.page_width_mm,
            page_height_mm: layout.page_height_mm,
            ..Self::default()
        }
    }
}

impl PageSink for LayoutJsonWriter {
    fn new_page(&mut self) -> Result<(), WriterError> {
        self.pages.push(std::mem::take(&mut self.current));
        self.page_open = false;
        Ok(())
    }

    fn draw_text(&mut self, command: &DrawText) -> Result<(), WriterError> {
        self.current.push(command.clone());
        self.page_open = true;
        Ok(())
    }
}

impl DocumentWriter for LayoutJsonWriter {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn finalize_and_save(mut self, path: &Path) -> Result<SavedDocument, WriterError> {
        if self.page_open {
            self.new_page()?;
        }
        if self.pages.is_empty() {
            return Err(WriterError::EmptyDocument);
        }

        ensure_parent_dir(path)?;
        let file = File::create(path).map_err(WriterError::Io)?;
        let dump = LayoutDump {
            page_width_mm: self.page_width_mm,
            page_height_mm: self.page_height_mm,
            pages: &self.pages,
        };
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &dump).map_err(WriterError::Serialize)?;
        out.flush().map_err(WriterError::Io)?;

        let size_bytes = std::fs::metadata(path).map_err(WriterError::Io)?.len();
        Ok(SavedDocument {
            path: path.to_path_buf(),
            pages: self.pages.len(),
            size_bytes,
        })
    }
}
