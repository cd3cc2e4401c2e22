//! Botwar CLI - Command-line interface for running robot battles.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Botwar - A deterministic robot battle simulator
#[derive(Parser, Debug)]
#[command(name = "botwar")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single battle from a scenario file
    Run {
        /// Scenario JSON file (config + robot rosters)
        #[arg(required = true)]
        scenario: std::path::PathBuf,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum turns (overrides the scenario config)
        #[arg(short, long)]
        turns: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress turn-by-turn output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many battles on consecutive seeds and aggregate wins per side
    Series {
        /// Scenario JSON file (config + robot rosters)
        #[arg(required = true)]
        scenario: std::path::PathBuf,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Starting seed (increments for each battle)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Validate the programs in a scenario file without running it
    Check {
        /// Scenario JSON file to validate
        #[arg(required = true)]
        scenario: std::path::PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            scenario,
            seed,
            turns,
            format,
            quiet,
        } => cli::run::execute(&scenario, seed, turns, format, quiet),

        Commands::Series {
            scenario,
            games,
            seed,
        } => cli::series::execute(&scenario, games, seed),

        Commands::Check { scenario } => cli::check::execute(&scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
