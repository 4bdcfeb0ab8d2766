//! Hagaki address printing.
//!
//! Reads a recipient list, checks and fills in each recipient's fields, sets
//! the address and name in vertical Japanese text, and writes one postcard
//! page per recipient into a single PDF.

use anyhow::Context;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub mod cli;
pub mod config;
pub mod hagaki;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod source;

pub use cli::Cli;
pub use config::{EnvSettings, HagakiConfig, LayoutConfig};
pub use pipeline::{BatchPipeline, PipelineError, PipelineOptions, RunSummary};

/// One command-line run: configure, process the workbook, save, report.
///
/// `env` already has the command-line flags applied.
pub async fn run(cli: &Cli, env: &EnvSettings) -> anyhow::Result<RunSummary> {
    let mut config = HagakiConfig::load(cli.config.as_deref())?;
    if let Some(fonts) = &env.fonts {
        config.layout.fonts = fonts.clone();
    }

    let mut options = PipelineOptions::from(config.pipeline.clone());
    options.record_limit = cli.record_limit();
    if let Some(jobs) = cli.jobs {
        options.jobs = jobs;
    }

    log::info!("Input file: {}", env.input.display());
    log::info!("Sheet: {}", env.sheet);
    if let Some(limit) = options.record_limit {
        log::info!("Test mode: processing the first {} records only", limit);
    }

    let rows = source::ExcelRowSource::open(&env.input, &env.sheet, &config.columns)
        .map_err(PipelineError::from)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received; finishing the current record");
            on_signal.cancel();
        }
    });

    let mut pipeline = BatchPipeline::new(config.layout.clone(), config.columns.clone(), options);
    let summary = if cli.dump_layout {
        let output: PathBuf = env.output.with_extension("json");
        let writer = render::LayoutJsonWriter::new(&config.layout);
        pipeline.run(rows, writer, &output, &cancel).await?
    } else {
        let mut engine = render::TypstRenderEngine::new(&env.typst_bin);
        if let Some(fonts) = &env.font_path {
            engine = engine.with_font_path(fonts);
        }
        let writer = render::TypstDocumentWriter::create(&config.layout, engine)?;
        pipeline.run(rows, writer, &env.output, &cancel).await?
    };

    if let Some(path) = &cli.report {
        pipeline::QualityReport::new(&summary, &env.input)
            .write(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        log::info!("Quality report: {}", path.display());
    }

    Ok(summary)
}
