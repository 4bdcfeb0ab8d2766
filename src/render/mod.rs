//! Document writers - where composed pages go.
//!
//! The composer draws against [`PageSink`]; a full output document is a
//! [`DocumentWriter`]. Implementations:
//! - `PageBuffer` - records one page's draw calls for later, ordered replay
//! - `TypstDocumentWriter` - Typst markup compiled to PDF by `TypstRenderEngine`
//! - `LayoutJsonWriter` - the draw calls themselves, as JSON

pub mod buffer;
pub mod engine;
pub mod json;
pub mod typst;

pub use buffer::{PageBuffer, PageCommand};
pub use engine::TypstRenderEngine;
pub use json::LayoutJsonWriter;
pub use typst::TypstDocumentWriter;

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a document writer.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("failed to write document data: {0}")]
    Io(#[source] std::io::Error),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {0}")]
    TypstExit(i32),
    #[error("failed to serialize layout: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("document has no pages")]
    EmptyDocument,
}

/// How a piece of text sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Left-to-right line anchored at its top-left corner.
    Horizontal,
    /// A CJK glyph centred in a vertical-text cell.
    Vertical,
    /// Latin letters or digits set upright, centred in a vertical-text cell.
    Upright,
}

/// One draw call. Coordinates are millimetres from the page's top-left
/// corner; for vertical cells `(x_mm, y_mm)` is the cell's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawText {
    pub x_mm: f64,
    pub y_mm: f64,
    pub text: String,
    pub size_pt: f64,
    /// Cell height for vertical glyphs; unused for horizontal text.
    pub cell_mm: f64,
    pub orientation: Orientation,
}

/// What the composer needs from a writer.
pub trait PageSink {
    /// Finish the current page; later draw calls land on a new one.
    fn new_page(&mut self) -> Result<(), WriterError>;
    fn draw_text(&mut self, command: &DrawText) -> Result<(), WriterError>;
}

/// A whole output document with a single owner for the run.
pub trait DocumentWriter: PageSink {
    /// Pages finished so far.
    fn page_count(&self) -> usize;
    /// Write the document to `path`. Consumes the writer; temporary state is
    /// released whether or not saving succeeds.
    fn finalize_and_save(self, path: &Path) -> Result<SavedDocument, WriterError>;
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    pub path: PathBuf,
    pub pages: usize,
    pub size_bytes: u64,
}

/// Create the parent directory of an output path when it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), WriterError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(WriterError::Io)
        }
        _ => Ok(()),
    }
}
