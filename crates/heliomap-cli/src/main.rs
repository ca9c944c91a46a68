mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heliomap", about = "Solar coordinate frames and map reprojection")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show FITS map metadata and statistics
    Info(commands::info::InfoArgs),
    /// Convert a coordinate between solar frames
    Convert(commands::convert::ConvertArgs),
    /// Reproject one or more maps onto a target grid
    Reproject(commands::reproject::ReprojectArgs),
    /// Print a default reprojection job as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Reproject(args) => commands::reproject::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
