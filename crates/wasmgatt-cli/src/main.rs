//! wasmgatt CLI entry point

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use wasmgatt_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            setup_logging(cli.verbose);
            error!("{}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    setup_logging(config.cli.verbose);
    debug!("Configuration: {:?}", config);

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(cli, config).await {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging based on verbosity level; `RUST_LOG` takes precedence
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file, environment and flags
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    Ok(AppConfig::load_with_overrides(
        cli.config.as_deref(),
        cli.device.clone(),
        cli.verbose,
        cli.json,
    )?)
}
