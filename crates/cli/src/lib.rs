pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stocky",
    about = "Stocky operator CLI",
    long_about = "Operate Stocky readiness, config inspection, one-shot questions, and stock checks.",
    after_help = "Examples:\n  stocky doctor --json\n  stocky config\n  stocky ask \"how many widgets are in stock\"\n  stocky alert"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with secrets redacted"
    )]
    Config,
    #[command(about = "Validate config, chat credential readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one question through the query pipeline and print the reply")]
    Ask {
        #[arg(help = "Natural-language question against the inventory database")]
        question: String,
    },
    #[command(about = "Run one stock check and report the alert outcome")]
    Alert,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { question } => commands::ask::run(&question),
        Command::Alert => commands::alert::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
