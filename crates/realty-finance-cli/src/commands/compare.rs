use clap::Args;
use serde_json::Value;

use realty_finance_core::comparison::plans::{self, ComparisonInput};

use crate::input;

/// Arguments for the financing vs consortium comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file with "financing" and "consortium" plans
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cmp_input: ComparisonInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for comparison")?;
    let result = plans::compare(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
