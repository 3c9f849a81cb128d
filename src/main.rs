use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use opencost_reporter::cli::Cli;
use opencost_reporter::config::load_config;
use opencost_reporter::report::{run, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let cfg = match load_config() {
        Ok(cfg) => cli.apply(cfg),
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("renderer = {:?}, window = {}", cfg.renderer, cfg.window);

    match run(cfg).await {
        Ok(RunOutcome::Printed(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Rendered(path)) => {
            println!("Rendered {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Published { path, file_id }) => {
            info!("Published {} as {}", path.display(), file_id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
