//! Chronos Weaver - generative choose-your-own-adventure CLI
//!
#![doc = "Chronos Weaver - generative choose-your-own-adventure CLI"]
#![doc = "Main entry point for the Chronos Weaver terminal game."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chronos_weaver::cli::{Cli, Commands};
use chronos_weaver::commands;
use chronos_weaver::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Play { genre, style, .. } => {
            tracing::info!("Starting play mode");
            if let Some(g) = &genre {
                tracing::debug!("Using genre: {}", g);
            }
            if let Some(s) = &style {
                tracing::debug!("Using visual style: {}", s);
            }
            tracing::debug!("Image resolution: {}", config.game.default_resolution);

            // Resolution overrides were already folded into `config`
            commands::play::run_play(config, genre, style).await?;
            Ok(())
        }
        Commands::Auth { clear } => {
            tracing::info!("Starting key selection (clear: {})", clear);
            commands::auth::authenticate(clear).await?;
            Ok(())
        }
        Commands::Styles => {
            commands::styles::list_styles();
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so they do not
/// interleave with the story on stdout.
fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose {
        "chronos_weaver=debug"
    } else {
        "chronos_weaver=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
