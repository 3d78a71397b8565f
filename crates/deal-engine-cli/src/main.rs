mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::loan::LoanArgs;
use commands::returns::IrrArgs;
use commands::syndication::{DefaultsArgs, SyndicationArgs};

/// Real estate syndication deal analysis
#[derive(Parser)]
#[command(
    name = "deal",
    version,
    about = "Real estate syndication deal analysis",
    long_about = "A CLI for underwriting real estate syndications with decimal precision. \
                  Projects the hold, values the exit, runs the LP/GP waterfall and reports \
                  returns with an exit cap rate sensitivity table."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a syndication deal (pro forma, exit, waterfall, returns)
    Syndication(SyndicationArgs),
    /// Calculate IRR, NPV and equity multiple for a cash-flow series
    Irr(IrrArgs),
    /// Build an annual loan schedule
    Loan(LoanArgs),
    /// Print the default deal inputs
    Defaults(DefaultsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{}: failed to set tracing subscriber: {}", "warning".yellow(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Syndication(args) => commands::syndication::run_syndication(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::Defaults(args) => commands::syndication::run_defaults(args),
        Commands::Version => {
            println!("deal {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
