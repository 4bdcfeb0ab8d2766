//! Console plus per-run log file.

use anyhow::Context;
use chrono::{DateTime, Local};
use env_logger::{Builder, Env, Target};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// `logs/hagaki_generation_20251106_140509.log`
pub fn log_file_path(dir: &Path, started: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "hagaki_generation_{}.log",
        started.format("%Y%m%d_%H%M%S")
    ))
}

/// Every line goes to stdout and to the run's log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// Install the global logger and return the log file path.
///
/// Filter defaults to `info`; `RUST_LOG` overrides it.
pub fn init(dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = log_file_path(dir, Local::now());
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .context("logger already initialised")?;

    Ok(path)
}
