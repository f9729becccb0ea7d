//! refetch CLI - Main entry point

mod cli;

use clap::{Parser, Subcommand};
use cli::GetOptions;
use refetch_foundation::FetchConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// refetch - fetch web service URLs through a caching, deduplicating engine
#[derive(Parser, Debug)]
#[command(name = "refetch")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one or more URLs; duplicates are requested once
    Get {
        /// URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,

        /// Service name used for breakers and monitoring
        #[arg(short, long, default_value = "cli")]
        service: String,

        /// Extra request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Target environment (local, int, test, stage, live)
        #[arg(short, long)]
        env: Option<String>,

        /// Print status and body instead of parsed JSON
        #[arg(long)]
        raw: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = FetchConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        FetchConfig::default()
    });

    match args.command {
        Command::Get {
            urls,
            service,
            headers,
            env,
            raw,
        } => {
            cli::run_get(
                &config,
                GetOptions {
                    urls,
                    service,
                    headers,
                    environment: env,
                    raw,
                },
            )
            .await
        }
        Command::Config => cli::show_config(&config),
    }
}
