use clap::Parser;

use hagaki_labels::{logging, run, Cli, EnvSettings};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut env = EnvSettings::from_env();
    cli.apply_to(&mut env);

    let log_path = match logging::init(&env.log_dir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to set up logging: {:#}", e);
            std::process::exit(1);
        }
    };
    log::info!("Log file: {}", log_path.display());

    match run(&cli, &env).await {
        Ok(summary) if summary.cancelled => {
            log::warn!("Run cancelled after {} records", summary.statistics.total());
        }
        Ok(_) => {}
        Err(e) => {
            log::error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}
