use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use springboard::{BootstrapError, GlobalSettings};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,springboard=debug")),
        )
        .init();

    let settings_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("usage: springboard <settings.json>");
            return ExitCode::from(2);
        }
    };

    tracing::info!("Springboard bootstrap starting...");

    let settings = match GlobalSettings::from_json_file(&settings_path) {
        Ok(settings) => settings,
        Err(err) => return report(err),
    };

    match springboard::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn report(err: BootstrapError) -> ExitCode {
    tracing::error!("Bootstrap failed: {}", err);
    ExitCode::FAILURE
}
