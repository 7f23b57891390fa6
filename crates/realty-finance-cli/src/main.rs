mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::breakeven::BreakevenArgs;
use commands::cet::CetArgs;
use commands::compare::CompareArgs;
use commands::consortium::ConsortiumArgs;
use commands::financing::FinancingArgs;

/// Real-estate financing versus consortium comparison
#[derive(Parser)]
#[command(
    name = "rfc",
    version,
    about = "Compare real-estate financing against a consortium plan",
    long_about = "A CLI for comparing a PRICE-amortized real-estate financing plan against a \
                  consortium plan with decimal precision. Computes payment schedules, the \
                  effective total cost (CET), NPV and the capital whose yield covers an installment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Number rendering for table output
    #[arg(long, default_value = "plain", global = true)]
    locale: Locale,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a financing amortization schedule (PRICE)
    Financing(FinancingArgs),
    /// Build a consortium installment schedule
    Consortium(ConsortiumArgs),
    /// Compute the effective total cost (CET) of a plan or schedule
    Cet(CetArgs),
    /// Capital whose monthly yield covers an installment
    Breakeven(BreakevenArgs),
    /// Compare a financing plan against a consortium plan
    Compare(CompareArgs),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Locale {
    Plain,
    Br,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Financing(args) => commands::financing::run_financing(args),
        Commands::Consortium(args) => commands::consortium::run_consortium(args),
        Commands::Cet(args) => commands::cet::run_cet(args),
        Commands::Breakeven(args) => commands::breakeven::run_breakeven(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("rfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, cli.locale, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
