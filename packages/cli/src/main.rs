mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{convert, init, stats, ConvertArgs, InitArgs, StatsArgs};
use tracing_subscriber::EnvFilter;

/// Inkpress CLI - article conversion and authoring tools
#[derive(Parser, Debug)]
#[command(name = "inkpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default inkpress.config.json
    Init(InitArgs),

    /// Convert articles between markdown and flat markup
    Convert(ConvertArgs),

    /// Print word, sentence and reading-time statistics for an article
    Stats(StatsArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Convert(args) => convert(args, &cwd),
            Command::Stats(args) => stats(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
