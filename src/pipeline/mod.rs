//! Batch pipeline - rows in, one postcard page per row out.
//!
//! `Idle -> Running -> {Completed, Aborted}`. Each row is validated and
//! composed into its own `PageBuffer`; buffers are replayed into the document
//! writer strictly in source order, even when several rows are composed at
//! once. A row that cannot be rendered is logged and counted, and the run
//! moves on. Only a writer failure ends the run early.

pub mod report;
pub mod stats;

pub use report::QualityReport;
pub use stats::{FieldMissing, FieldWarning, RunStatistics};

use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{LayoutConfig, PipelineSettings};
use crate::hagaki::{compose, validate, ComposeError, FieldDefects, NormalizedRecord};
use crate::render::{DocumentWriter, PageBuffer, SavedDocument, WriterError};
use crate::source::{ColumnMapping, RawRow, RecipientRecord, RowSource, SourceError};

/// Run-level failures. Anything here stops the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("row source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
    #[error("writer failed while emitting row {row}: {source}")]
    Writer {
        row: usize,
        #[source]
        source: WriterError,
    },
    #[error("failed to save document ({pages} pages were composed): {source}")]
    Finalize {
        pages: usize,
        #[source]
        source: WriterError,
    },
    #[error("pipeline cannot start from state {0:?}")]
    NotIdle(PipelineState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Why a single row produced no page.
#[derive(Debug, Error)]
pub enum RecordFailure {
    #[error("{0}")]
    Render(#[from] ComposeError),
    #[error("composition panicked: {0}")]
    Panicked(String),
}

/// The tagged result for one row.
#[derive(Debug)]
pub struct RecordOutcome {
    pub position: usize,
    /// Present whenever validation ran.
    pub validated: Option<(NormalizedRecord, FieldDefects)>,
    pub result: Result<PageBuffer, RecordFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Stop after this many rows (test mode).
    pub record_limit: Option<usize>,
    pub progress_interval: usize,
    pub missing_warning_threshold: usize,
    pub jobs: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineSettings::default().into()
    }
}

impl From<PipelineSettings> for PipelineOptions {
    fn from(settings: PipelineSettings) -> Self {
        Self {
            record_limit: None,
            progress_interval: settings.progress_interval,
            missing_warning_threshold: settings.missing_warning_threshold,
            jobs: settings.jobs,
        }
    }
}

/// What a finished run reports.
#[derive(Debug)]
pub struct RunSummary {
    pub statistics: RunStatistics,
    pub field_warnings: Vec<FieldWarning>,
    /// `None` when no page was composed.
    pub document: Option<SavedDocument>,
    pub cancelled: bool,
}

/// Validate one row and compose its page into a fresh buffer.
pub fn render_record(row: RawRow, columns: &ColumnMapping, layout: &LayoutConfig) -> RecordOutcome {
    let record = RecipientRecord::from_row(&row, columns);
    let (normalized, defects) = validate(&record);
    for defect in defects.iter() {
        log::debug!("Row {}: {}", row.position, defect);
    }

    let mut page = PageBuffer::new();
    let result = compose(&normalized, layout, &mut page)
        .map(|()| page)
        .map_err(RecordFailure::from);

    RecordOutcome {
        position: row.position,
        validated: Some((normalized, defects)),
        result,
    }
}

pub struct BatchPipeline {
    layout: Arc<LayoutConfig>,
    columns: Arc<ColumnMapping>,
    options: PipelineOptions,
    state: PipelineState,
}

impl BatchPipeline {
    pub fn new(layout: LayoutConfig, columns: ColumnMapping, options: PipelineOptions) -> Self {
        Self {
            layout: Arc::new(layout),
            columns: Arc::new(columns),
            options,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Process every row of `source` into `writer` and save to `output`.
    ///
    /// `cancel` is checked between rows; when it fires, pages composed so far
    /// are still saved.
    pub async fn run<S, W>(
        &mut self,
        source: S,
        mut writer: W,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, PipelineError>
    where
        S: RowSource,
        W: DocumentWriter,
    {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::NotIdle(self.state));
        }
        self.state = PipelineState::Running;

        let total = match (source.len_hint(), self.options.record_limit) {
            (Some(len), Some(limit)) => Some(len.min(limit)),
            (Some(len), None) => Some(len),
            (None, _) => None,
        };
        match total {
            Some(total) => log::info!("Processing started: {} records", total),
            None => log::info!("Processing started: record count unknown"),
        }

        let limit = self.options.record_limit.unwrap_or(usize::MAX);
        let jobs = self.options.jobs.max(1);
        let layout = Arc::clone(&self.layout);
        let columns = Arc::clone(&self.columns);

        let outcomes = stream::iter(source.take(limit))
            .map(move |row| {
                let layout = Arc::clone(&layout);
                let columns = Arc::clone(&columns);
                let position = row.position;
                async move {
                    tokio::task::spawn_blocking(move || render_record(row, &columns, &layout))
                        .await
                        .unwrap_or_else(|e| RecordOutcome {
                            position,
                            validated: None,
                            result: Err(RecordFailure::Panicked(e.to_string())),
                        })
                }
            })
            .buffered(jobs);
        let mut outcomes = std::pin::pin!(outcomes);

        let mut statistics = RunStatistics::new();
        let mut cancelled = false;

        while let Some(outcome) = outcomes.next().await {
            if cancel.is_cancelled() {
                log::warn!(
                    "Cancellation requested; stopping after {} records",
                    statistics.total()
                );
                cancelled = true;
                break;
            }

            if let Some((record, defects)) = &outcome.validated {
                statistics.record_defects(record, defects);
            }

            match outcome.result {
                Ok(page) => {
                    if let Err(source) = page.replay_into(&mut writer) {
                        self.state = PipelineState::Aborted;
                        log::error!("Writer failed at row {}: {}", outcome.position, source);
                        return Err(PipelineError::Writer {
                            row: outcome.position,
                            source,
                        });
                    }
                    statistics.record_success();
                }
                Err(failure) => {
                    statistics.record_failure();
                    log::error!("Failed to render row {}: {}", outcome.position, failure);
                    if let Some((record, _)) = &outcome.validated {
                        log::error!(
                            "Row {} data: name={}, postal_code={}, address={}",
                            outcome.position,
                            record.name,
                            record.postal_code,
                            record.display_address()
                        );
                    }
                }
            }

            self.report_progress(statistics.total(), total);
        }

        let field_warnings = statistics.field_warnings(self.options.missing_warning_threshold);
        if field_warnings.is_empty() {
            log::info!("No missing data detected");
        }
        for warning in &field_warnings {
            log::warn!("{}", warning);
        }

        let pages = writer.page_count();
        let document = if pages == 0 {
            log::warn!(
                "No pages were composed; nothing written to {}",
                output.display()
            );
            None
        } else {
            log::info!("Saving {} pages to {}", pages, output.display());
            match writer.finalize_and_save(output) {
                Ok(saved) => Some(saved),
                Err(source) => {
                    self.state = PipelineState::Aborted;
                    log::error!("Failed to save {}: {}", output.display(), source);
                    return Err(PipelineError::Finalize { pages, source });
                }
            }
        };

        self.state = PipelineState::Completed;
        log::info!("Processing complete");
        log::info!("Succeeded: {}", statistics.succeeded);
        log::info!("Failed: {}", statistics.failed);
        log::info!("Total: {}", statistics.total());
        if let Some(doc) = &document {
            log::info!(
                "Output: {} ({:.2} MB)",
                doc.path.display(),
                doc.size_bytes as f64 / (1024.0 * 1024.0)
            );
        }

        Ok(RunSummary {
            statistics,
            field_warnings,
            document,
            cancelled,
        })
    }

    fn report_progress(&self, processed: usize, total: Option<usize>) {
        let interval = self.options.progress_interval;
        if interval == 0 || processed % interval != 0 {
            return;
        }
        match total {
            Some(total) if total > 0 => log::info!(
                "Processing... [{}/{}] ({:.1}%)",
                processed,
                total,
                processed as f64 / total as f64 * 100.0
            ),
            _ => log::info!("Processing... [{}] records", processed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_record_never_fails_on_empty_row() {
        let outcome = render_record(
            RawRow::new(5),
            &ColumnMapping::default(),
            &LayoutConfig::default(),
        );
        assert_eq!(outcome.position, 5);
        let page = outcome.result.unwrap();
        assert_eq!(page.pages(), 1);
        let (record, defects) = outcome.validated.unwrap();
        assert_eq!(record.defects.len(), 4);
        assert_eq!(defects.len(), 4);
    }

    #[test]
    fn test_options_from_settings() {
        let options = PipelineOptions::from(PipelineSettings {
            progress_interval: 50,
            missing_warning_threshold: 3,
            jobs: 8,
        });
        assert_eq!(options.record_limit, None);
        assert_eq!(options.jobs, 8);
    }
}
