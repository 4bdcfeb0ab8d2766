//! Plain-text data quality report written at the end of a run.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use super::RunSummary;
use crate::hagaki::common::format_japanese_datetime;
use crate::hagaki::FieldKind;

const RULE_WIDTH: usize = 70;

pub struct QualityReport<'a> {
    summary: &'a RunSummary,
    input: PathBuf,
    generated_at: DateTime<Local>,
}

impl<'a> QualityReport<'a> {
    pub fn new(summary: &'a RunSummary, input: impl Into<PathBuf>) -> Self {
        Self {
            summary,
            input: input.into(),
            generated_at: Local::now(),
        }
    }

    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn render(&self) -> String {
        let stats = &self.summary.statistics;
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            rule.clone(),
            "Hagaki address printing - data quality report".to_string(),
            rule.clone(),
            String::new(),
            format!("Generated: {}", format_japanese_datetime(self.generated_at)),
            format!("Input: {}", self.input.display()),
        ];
        match &self.summary.document {
            Some(doc) => lines.push(format!(
                "Output: {} ({} pages, {} bytes)",
                doc.path.display(),
                doc.pages,
                doc.size_bytes
            )),
            None => lines.push("Output: (nothing written)".to_string()),
        }
        lines.push(String::new());

        lines.push("[Totals]".to_string());
        lines.push(format!("  Records processed: {}", stats.total()));
        lines.push(format!("  Succeeded: {}", stats.succeeded));
        lines.push(format!("  Failed: {}", stats.failed));
        lines.push(format!("  Success rate: {:.1}%", stats.success_rate()));
        if self.summary.cancelled {
            lines.push("  Run was cancelled before the end of the source".to_string());
        }
        lines.push(String::new());

        lines.push("[Missing data]".to_string());
        let mut any_missing = false;
        for field in FieldKind::ALL {
            if let Some(missing) = stats.missing(field) {
                any_missing = true;
                let more = missing.count.saturating_sub(missing.sample_rows.len());
                let rows = missing
                    .sample_rows
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let suffix = if more > 0 {
                    format!(" ... ({} more)", more)
                } else {
                    String::new()
                };
                lines.push(format!(
                    "  {}: {} ({:.1}%) rows [{}]{}",
                    field,
                    missing.count,
                    stats.missing_rate(field),
                    rows,
                    suffix
                ));
            }
        }
        if !any_missing {
            lines.push("  none".to_string());
        }
        lines.push(String::new());

        lines.push("[Postal codes]".to_string());
        lines.push(format!(
            "  Rewritten to NNN-NNNN: {}",
            stats.normalized_postal_codes
        ));
        lines.push(format!(
            "  Malformed (printed as given): {}",
            stats.malformed_postal_codes
        ));
        lines.push(String::new());

        lines.push("[Addresses]".to_string());
        lines.push(format!("  Possibly outside Japan: {}", stats.foreign_addresses));
        lines.push(format!("  Repeated addresses: {}", stats.duplicate_addresses));
        lines.push(String::new());
        lines.push(rule);

        lines.join("\n")
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())
    }
}
