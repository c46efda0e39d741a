use std::path::PathBuf;

use clap::{Parser, Subcommand};
use legend_cache_cli::commands::{ConfigCommand, SimulateCommand};
use legend_cache_cli::error::CliResult;
use legend_cache_cli::output::OutputFormat;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "legend-cache")]
#[command(about = "Legend Cache CLI - Replay access traces against the tiered legend cache")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Replay an access trace and report tier statistics")]
    Simulate(SimulateCommand),

    #[clap(about = "Configuration commands")]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// Logs go to stderr so JSON output on stdout stays parseable
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,legend_cache=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    match &cli.command {
        Command::Simulate(cmd) => cmd.execute(cli.config.as_deref(), format).await,
        Command::Config(cmd) => cmd.execute(cli.config.as_deref(), format).await,
    }
}
