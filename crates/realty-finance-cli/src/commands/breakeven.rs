use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_finance_core::breakeven::{self, BreakevenInput};

use crate::input;

/// Arguments for the breakeven investment simulation
#[derive(Args)]
pub struct BreakevenArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly installment to cover
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Monthly investment yield as a decimal (0.005 = 0.5% a month)
    #[arg(long)]
    pub monthly_yield: Option<Decimal>,
}

pub fn run_breakeven(args: BreakevenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let be_input: BreakevenInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => BreakevenInput {
            target_installment: args
                .installment
                .ok_or("--installment is required (or provide --input)")?,
            monthly_yield_rate: args
                .monthly_yield
                .ok_or("--monthly-yield is required (or provide --input)")?,
        },
    };
    let result = breakeven::analyze_breakeven(&be_input)?;
    Ok(serde_json::to_value(result)?)
}
