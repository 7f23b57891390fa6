use clap::Args;
use serde_json::Value;

use realty_finance_core::cet::effective_cost::{self, CetInput};

use crate::input;

/// Arguments for the effective total cost (CET)
#[derive(Args)]
pub struct CetArgs {
    /// Path to JSON input file: {"financing": {...}}, {"consortium": {...}}
    /// or {"schedule": {"schedule": {...}, "principal": "..."}}
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cet(args: CetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cet_input: CetInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for CET")?;
    let result = effective_cost::analyze_cet(&cet_input)?;
    Ok(serde_json::to_value(result)?)
}
