use anyhow::Result;
use clap::Parser;
use swift_lambda_sam::cli::cli::Cli;
use swift_lambda_sam::cli::config::Settings;
use tracing::{debug, error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Settings choose the log level, so load them before tracing is up
    let (settings, load_error) = match cli.load_settings() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default().merge_with_cli_args(&cli), Some(e)),
    };

    // Tool output owns stdout; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!("Starting swift-lambda-sam {}", swift_lambda_sam::cli::VERSION);
    if let Some(e) = load_error {
        warn!("Using default settings: {}", e);
    }

    // Execute command with user-friendly error handling
    if let Err(e) = cli.execute(settings).await {
        // Log the full error for debugging
        error!("Command execution failed: {:?}", e);

        eprintln!("Error: {}", e.user_message());
        std::process::exit(e.exit_code());
    }

    Ok(())
}
