pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::QuoteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "archquote",
    about = "Architecture service quotation CLI",
    long_about = "Price architecture projects, render client proposals, and inspect runtime configuration.",
    after_help = "Examples:\n  archquote quote --area 120 --difficulty grande --json\n  archquote proposal --area 52 --addon render:3 --date 2026-03-07\n  archquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute a quote and print the pricing summary")]
    Quote {
        #[command(flatten)]
        args: QuoteArgs,
        #[arg(long, help = "Emit the full quote result as JSON")]
        json: bool,
    },
    #[command(about = "Render the client-facing proposal text for a quote")]
    Proposal {
        #[command(flatten)]
        args: QuoteArgs,
        #[arg(long, value_name = "YYYY-MM-DD", help = "Proposal date (defaults to today)")]
        date: Option<String>,
        #[arg(long, value_name = "PATH", help = "Write the proposal to a file instead of stdout")]
        out: Option<PathBuf>,
    },
    #[command(about = "List default phase weights and the add-on catalog")]
    Catalog,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, pricing tables, and export capabilities")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote { args, json } => commands::quote::run(args, json),
        Command::Proposal { args, date, out } => {
            commands::proposal::run(args, date.as_deref(), out.as_deref())
        }
        Command::Catalog => commands::catalog::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
