use clap::Parser;
use std::path::PathBuf;

use crate::config::{EnvSettings, TEST_MODE_LIMIT};

#[derive(Parser, Debug, Default)]
#[command(
    name = "hagaki-labels",
    version,
    about = "Print recipient addresses onto hagaki postcards as a PDF"
)]
pub struct Cli {
    #[arg(short, long, help = "Recipient workbook (.xlsx)")]
    pub input: Option<PathBuf>,
    #[arg(short, long, help = "Output PDF path")]
    pub output: Option<PathBuf>,
    #[arg(short, long, help = "Worksheet holding the recipient list")]
    pub sheet: Option<String>,
    #[arg(
        short,
        long,
        default_value_t = false,
        help = "Process only the first 10 records"
    )]
    pub test: bool,
    #[arg(long, help = "JSON file with layout, column, and pipeline settings")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Also write a data quality report to this path")]
    pub report: Option<PathBuf>,
    #[arg(long, help = "Records composed concurrently")]
    pub jobs: Option<usize>,
    #[arg(
        long,
        default_value_t = false,
        help = "Write the page layout as JSON instead of compiling a PDF"
    )]
    pub dump_layout: bool,
    #[arg(long, help = "Directory for the run log")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Flags win over whatever the environment supplied.
    pub fn apply_to(&self, env: &mut EnvSettings) {
        if let Some(input) = &self.input {
            env.input = input.clone();
        }
        if let Some(output) = &self.output {
            env.output = output.clone();
        }
        if let Some(sheet) = &self.sheet {
            env.sheet = sheet.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            env.log_dir = log_dir.clone();
        }
    }

    pub fn record_limit(&self) -> Option<usize> {
        self.test.then_some(TEST_MODE_LIMIT)
    }
}
