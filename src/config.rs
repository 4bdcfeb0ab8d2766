//! Run configuration.
//!
//! Three layers, later ones winning: built-in defaults, an optional JSON file
//! (`HagakiConfig`), and environment variables (`EnvSettings`, `.env` is
//! honoured). Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hagaki::common::pt_to_mm;
use crate::source::ColumnMapping;

pub const DEFAULT_INPUT_FILE: &str = "data/recipients.xlsx";
pub const DEFAULT_SHEET_NAME: &str = "営業リスト";
pub const DEFAULT_OUTPUT_PDF: &str = "output/hagaki_labels.pdf";
pub const DEFAULT_LOG_DIR: &str = "logs";
/// Records processed in test mode.
pub const TEST_MODE_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Whether a block is set as a horizontal line or in vertical columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextDirection {
    Horizontal,
    Vertical,
}

/// Placement of one text block on the card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockLayout {
    /// Left edge of the rightmost column (vertical) or of the line (horizontal).
    pub anchor_x_mm: f64,
    /// Top edge of the first slot or line.
    pub anchor_y_mm: f64,
    pub font_size_pt: f64,
    /// Slots per column.
    pub max_column_height: usize,
    /// Columns the block is laid out for.
    pub column_capacity: usize,
    /// Horizontal distance between neighbouring columns.
    pub column_pitch_mm: f64,
    pub direction: TextDirection,
}

/// Physical canvas and the three blocks drawn on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Slot pitch as a multiple of the font size.
    pub char_spacing: f64,
    /// Font families in fallback order.
    pub fonts: Vec<String>,
    pub postal_code: BlockLayout,
    pub address: BlockLayout,
    pub name: BlockLayout,
}

impl Default for LayoutConfig {
    /// Standard Japan Post card, 100mm x 148mm.
    fn default() -> Self {
        Self {
            page_width_mm: 100.0,
            page_height_mm: 148.0,
            char_spacing: 1.2,
            fonts: vec![
                "IPAexMincho".to_string(),
                "Noto Serif CJK JP".to_string(),
                "Hiragino Mincho ProN".to_string(),
            ],
            postal_code: BlockLayout {
                anchor_x_mm: 10.0,
                anchor_y_mm: 12.0,
                font_size_pt: 14.0,
                max_column_height: 1,
                column_capacity: 1,
                column_pitch_mm: 0.0,
                direction: TextDirection::Horizontal,
            },
            address: BlockLayout {
                anchor_x_mm: 80.0,
                anchor_y_mm: 28.0,
                font_size_pt: 12.0,
                max_column_height: 22,
                column_capacity: 3,
                column_pitch_mm: pt_to_mm(18.0),
                direction: TextDirection::Vertical,
            },
            name: BlockLayout {
                anchor_x_mm: 47.0,
                anchor_y_mm: 35.0,
                font_size_pt: 16.0,
                max_column_height: 14,
                column_capacity: 2,
                column_pitch_mm: pt_to_mm(24.0),
                direction: TextDirection::Vertical,
            },
        }
    }
}

impl LayoutConfig {
    /// Height of one vertical slot for `block`.
    pub fn slot_pitch_mm(&self, block: &BlockLayout) -> f64 {
        pt_to_mm(block.font_size_pt * self.char_spacing)
    }

    /// Reject layouts that cannot produce a sensible card.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(ConfigError::InvalidLayout(
                "page dimensions must be positive".to_string(),
            ));
        }
        if self.char_spacing <= 0.0 {
            return Err(ConfigError::InvalidLayout(
                "char_spacing must be positive".to_string(),
            ));
        }
        if self.fonts.is_empty() {
            return Err(ConfigError::InvalidLayout(
                "at least one font family is required".to_string(),
            ));
        }

        for (label, block) in [
            ("postal_code", &self.postal_code),
            ("address", &self.address),
            ("name", &self.name),
        ] {
            if block.font_size_pt <= 0.0 {
                return Err(ConfigError::InvalidLayout(format!(
                    "{label}: font_size_pt must be positive"
                )));
            }
            if block.max_column_height == 0 {
                return Err(ConfigError::InvalidLayout(format!(
                    "{label}: max_column_height must be at least 1"
                )));
            }
            let inside = (0.0..self.page_width_mm).contains(&block.anchor_x_mm)
                && (0.0..self.page_height_mm).contains(&block.anchor_y_mm);
            if !inside {
                return Err(ConfigError::InvalidLayout(format!(
                    "{label}: anchor ({}, {}) lies outside the page",
                    block.anchor_x_mm, block.anchor_y_mm
                )));
            }
        }
        Ok(())
    }
}

/// Batch pipeline tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Emit a progress line every this many records.
    pub progress_interval: usize,
    /// Warn about a field once its missing count exceeds this.
    pub missing_warning_threshold: usize,
    /// Records composed concurrently; pages are still written in row order.
    pub jobs: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            missing_warning_threshold: 0,
            jobs: 1,
        }
    }
}

/// Everything a run reads once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HagakiConfig {
    pub layout: LayoutConfig,
    pub columns: ColumnMapping,
    pub pipeline: PipelineSettings,
}

impl HagakiConfig {
    /// Defaults, or the JSON file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        };
        config.layout.validate()?;
        Ok(config)
    }
}

/// Paths and tool locations taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub log_dir: PathBuf,
    pub typst_bin: PathBuf,
    pub font_path: Option<PathBuf>,
    /// Overrides `LayoutConfig::fonts` when set.
    pub fonts: Option<Vec<String>>,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_FILE),
            sheet: DEFAULT_SHEET_NAME.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT_PDF),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            typst_bin: PathBuf::from(crate::render::engine::DEFAULT_TYPST_BIN),
            font_path: None,
            fonts: None,
        }
    }
}

impl EnvSettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            input: get("HAGAKI_INPUT").map(PathBuf::from).unwrap_or(defaults.input),
            sheet: get("HAGAKI_SHEET").unwrap_or(defaults.sheet),
            output: get("HAGAKI_OUTPUT").map(PathBuf::from).unwrap_or(defaults.output),
            log_dir: get("HAGAKI_LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            typst_bin: get("TYPST_BIN").map(PathBuf::from).unwrap_or(defaults.typst_bin),
            font_path: get("HAGAKI_FONT_PATH").map(PathBuf::from),
            fonts: get("HAGAKI_FONTS").map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_layout_is_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_anchor_outside_page_rejected() {
        let mut layout = LayoutConfig::default();
        layout.name.anchor_y_mm = 200.0;
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "pipeline": { "jobs": 4 }, "columns": { "name": "宛名" } }"#;
        let config: HagakiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pipeline.jobs, 4);
        assert_eq!(config.pipeline.progress_interval, 100);
        assert_eq!(config.columns.name, "宛名");
        assert_eq!(config.columns.address, "住所");
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> = [
            ("HAGAKI_SHEET", "Sheet1"),
            ("HAGAKI_FONTS", "A, B ,"),
            ("TYPST_BIN", "  "),
        ]
        .into_iter()
        .collect();
        let settings = EnvSettings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(settings.sheet, "Sheet1");
        assert_eq!(settings.fonts, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(settings.typst_bin, PathBuf::from("typst"));
        assert_eq!(settings.input, PathBuf::from(DEFAULT_INPUT_FILE));
    }
}
