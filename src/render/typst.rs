//! Typst-backed PDF writer.
//!
//! Page markup is streamed into a source file inside a temporary directory as
//! pages arrive, so memory use does not grow with the number of records. The
//! PDF is produced once, on `finalize_and_save`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use super::engine::TypstRenderEngine;
use super::{ensure_parent_dir, DocumentWriter, DrawText, Orientation, PageSink, SavedDocument, WriterError};
use crate::config::LayoutConfig;
use crate::hagaki::common::escape_typst_string;

const SOURCE_FILE: &str = "hagaki.typ";

pub struct TypstDocumentWriter {
    engine: TypstRenderEngine,
    source: BufWriter<File>,
    source_path: PathBuf,
    pages: usize,
    page_open: bool,
    // Dropped last; removes the source file.
    _workdir: TempDir,
}

impl TypstDocumentWriter {
    /// Start a document sized and typeset per `layout`.
    pub fn create(layout: &LayoutConfig, engine: TypstRenderEngine) -> Result<Self, WriterError> {
        let workdir = tempdir().map_err(WriterError::TempDir)?;
        let source_path = workdir.path().join(SOURCE_FILE);
        let file = File::create(&source_path).map_err(WriterError::Io)?;

        let mut writer = Self {
            engine,
            source: BufWriter::new(file),
            source_path,
            pages: 0,
            page_open: false,
            _workdir: workdir,
        };
        writer.write_preamble(layout)?;
        Ok(writer)
    }

    fn write_preamble(&mut self, layout: &LayoutConfig) -> Result<(), WriterError> {
        let fonts = layout
            .fonts
            .iter()
            .map(|f| format!("\"{}\"", escape_typst_string(f)))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            self.source,
            "#set page(width: {:.2}mm, height: {:.2}mm, margin: 0mm)",
            layout.page_width_mm, layout.page_height_mm
        )
        .map_err(WriterError::Io)?;
        writeln!(self.source, "#set text(font: ({},), lang: \"ja\")", fonts).map_err(WriterError::Io)
    }

    fn open_page(&mut self) -> Result<(), WriterError> {
        if !self.page_open {
            if self.pages > 0 {
                writeln!(self.source, "#pagebreak()").map_err(WriterError::Io)?;
            }
            self.page_open = true;
        }
        Ok(())
    }
}

/// Typst markup placing one draw call on the page.
fn markup(command: &DrawText) -> String {
    let text = escape_typst_string(&command.text);
    match command.orientation {
        Orientation::Horizontal => format!(
            "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, text(size: {}pt, \"{}\"))",
            command.x_mm, command.y_mm, command.size_pt, text
        ),
        Orientation::Vertical | Orientation::Upright => format!(
            "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, box(width: {}pt, height: {:.2}mm, align(center + horizon, text(size: {}pt, \"{}\"))))",
            command.x_mm, command.y_mm, command.size_pt, command.cell_mm, command.size_pt, text
        ),
    }
}

impl PageSink for TypstDocumentWriter {
    fn new_page(&mut self) -> Result<(), WriterError> {
        self.open_page()?;
        self.pages += 1;
        self.page_open = false;
        Ok(())
    }

    fn draw_text(&mut self, command: &DrawText) -> Result<(), WriterError> {
        self.open_page()?;
        writeln!(self.source, "{}", markup(command)).map_err(WriterError::Io)
    }
}

impl DocumentWriter for TypstDocumentWriter {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn finalize_and_save(mut self, path: &Path) -> Result<SavedDocument, WriterError> {
        if self.page_open {
            self.pages += 1;
            self.page_open = false;
        }
        if self.pages == 0 {
            return Err(WriterError::EmptyDocument);
        }

        self.source.flush().map_err(WriterError::Io)?;
        ensure_parent_dir(path)?;
        self.engine.compile(&self.source_path, path)?;

        let size_bytes = std::fs::metadata(path).map_err(WriterError::Io)?.len();
        Ok(SavedDocument {
            path: path.to_path_buf(),
            pages: self.pages,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(text: &str, orientation: Orientation) -> DrawText {
        DrawText {
            x_mm: 80.0,
            y_mm: 28.0,
            text: text.to_string(),
            size_pt: 12.0,
            cell_mm: 5.08,
            orientation,
        }
    }

    fn source_text(writer: &mut TypstDocumentWriter) -> String {
        writer.source.flush().unwrap();
        std::fs::read_to_string(&writer.source_path).unwrap()
    }

    #[test]
    fn test_markup_vertical_cell() {
        let line = markup(&draw("東", Orientation::Vertical));
        assert_eq!(
            line,
            "#place(top + left, dx: 80.00mm, dy: 28.00mm, box(width: 12pt, height: 5.08mm, align(center + horizon, text(size: 12pt, \"東\"))))"
        );
    }

    #[test]
    fn test_markup_escapes_text() {
        let line = markup(&draw("a\"b", Orientation::Horizontal));
        assert!(line.ends_with("text(size: 12pt, \"a\\\"b\"))"));
    }

    #[test]
    fn test_pages_separated_by_pagebreak() {
        let mut writer =
            TypstDocumentWriter::create(&LayoutConfig::default(), TypstRenderEngine::default())
                .unwrap();
        writer.draw_text(&draw("一", Orientation::Vertical)).unwrap();
        writer.new_page().unwrap();
        writer.draw_text(&draw("二", Orientation::Vertical)).unwrap();
        writer.new_page().unwrap();

        let source = source_text(&mut writer);
        assert!(source.starts_with("#set page(width: 100.00mm, height: 148.00mm, margin: 0mm)"));
        assert!(source.contains("#set text(font: (\"IPAexMincho\", \"Noto Serif CJK JP\", \"Hiragino Mincho ProN\",), lang: \"ja\")"));
        assert_eq!(source.matches("#pagebreak()").count(), 1);
        assert_eq!(writer.page_count(), 2);
    }

    #[test]
    fn test_finalize_without_pages_fails() {
        let writer =
            TypstDocumentWriter::create(&LayoutConfig::default(), TypstRenderEngine::default())
                .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = writer.finalize_and_save(&dir.path().join("out.pdf"));
        assert!(matches!(result, Err(WriterError::EmptyDocument)));
    }

    #[test]
    fn test_finalize_with_missing_compiler_fails() {
        let mut writer = TypstDocumentWriter::create(
            &LayoutConfig::default(),
            TypstRenderEngine::new("/nonexistent/bin/typst"),
        )
        .unwrap();
        writer.draw_text(&draw("一", Orientation::Vertical)).unwrap();
        writer.new_page().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = writer.finalize_and_save(&dir.path().join("out.pdf"));
        assert!(matches!(result, Err(WriterError::TypstIo(_))));
    }
}
