//! Typst rendering engine.
//!
//! Handles invoking the Typst compiler on a source file and placing the
//! resulting PDF at the requested output path.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::WriterError;

pub const DEFAULT_TYPST_BIN: &str = "typst";

/// Stateless wrapper around the `typst` CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypstRenderEngine {
    binary: PathBuf,
    font_paths: Vec<PathBuf>,
}

impl Default for TypstRenderEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TYPST_BIN)
    }
}

impl TypstRenderEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            font_paths: Vec::new(),
        }
    }

    /// Extra directory searched for fonts, passed as `--font-path`.
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_paths.push(path.into());
        self
    }

    /// Compile the Typst file at `source` into a PDF at `output`.
    ///
    /// # Arguments
    /// * `source` - Typst source file; the compiler runs in its directory.
    /// * `output` - Destination PDF path, absolute or relative to the current directory.
    pub fn compile(&self, source: &Path, output: &Path) -> Result<(), WriterError> {
        let output = if output.is_absolute() {
            output.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(WriterError::Io)?
                .join(output)
        };

        let mut command = Command::new(&self.binary);
        command.arg("compile");
        for font_path in &self.font_paths {
            command.arg("--font-path").arg(font_path);
        }
        command.arg(source).arg(&output);
        if let Some(dir) = source.parent() {
            command.current_dir(dir);
        }

        log::debug!("Running {:?}", command);
        let status = command.status().map_err(WriterError::TypstIo)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(WriterError::TypstExit(code));
        }
        Ok(())
    }
}
