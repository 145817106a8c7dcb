use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "loadgate",
    about = "loadgate — load-aware request admission control",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter loadgate.toml
    Init {
        #[arg(short, long, default_value = "loadgate.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Report whether each path is subject to throttling
    Check {
        #[arg(short, long, default_value = "loadgate.toml")]
        config: PathBuf,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the admission capacity for a load percentage.
    ///
    /// Without --load the configured load source is sampled.
    Estimate {
        #[arg(short, long, default_value = "loadgate.toml")]
        config: PathBuf,
        #[arg(short, long)]
        load: Option<u8>,
    },
    /// Replay a burst of requests against a simulated clock
    Simulate {
        #[arg(short, long, default_value = "loadgate.toml")]
        config: PathBuf,
        /// Number of evaluations to run
        #[arg(short = 'n', long, default_value = "20")]
        requests: usize,
        /// Fixed load percentage (default: the configured source)
        #[arg(short, long)]
        load: Option<u8>,
        /// Simulated time between requests
        #[arg(short, long, default_value = "0")]
        interval_ms: u64,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Gate paths read from stdin, one per line, against the real clock
    Run {
        #[arg(short, long, default_value = "loadgate.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,loadgate=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, force } => commands::init::init(&path, force),
        Commands::Check { config, paths } => commands::check::check(&config, &paths),
        Commands::Estimate { config, load } => commands::estimate::estimate(&config, load),
        Commands::Simulate {
            config,
            requests,
            load,
            interval_ms,
            format,
        } => commands::simulate::simulate(&config, requests, load, interval_ms, &format),
        Commands::Run { config } => commands::run::run(&config).await,
    }
}
