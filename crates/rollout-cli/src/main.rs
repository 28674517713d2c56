//! rollout CLI
//!
//! Prints dynamic inventories and pins playbook repositories for a run.

mod cli;
mod commands;
mod error;
mod interrupt;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(command = ?cli.command, "Starting");

    match cli.command {
        Commands::Inventory(args) => {
            commands::run_inventory(&args)?;
            Ok(0)
        }
        Commands::Playbooks(args) => commands::run_playbooks(&args),
    }
}
