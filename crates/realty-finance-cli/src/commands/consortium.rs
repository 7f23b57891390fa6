use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_finance_core::consortium::installments::{self, ConsortiumPlan};

use crate::input;

/// Arguments for the consortium installment schedule
#[derive(Args)]
pub struct ConsortiumArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Credit letter value
    #[arg(long)]
    pub credit_value: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub installments: Option<u32>,

    /// Administrative fee rate over the plan (0.18 = 18%)
    #[arg(long)]
    pub admin_fee_rate: Option<Decimal>,

    /// Reserve fund contribution rate over the plan
    #[arg(long)]
    pub fund_rate: Option<Decimal>,

    /// Month the credit letter is received
    #[arg(long)]
    pub draw_month: Option<u32>,

    /// Initial bid paid at signing
    #[arg(long)]
    pub bid_payment: Option<Decimal>,
}

impl ConsortiumArgs {
    pub fn into_plan(self) -> Result<ConsortiumPlan, Box<dyn std::error::Error>> {
        Ok(ConsortiumPlan {
            credit_value: self
                .credit_value
                .ok_or("--credit-value is required (or provide --input)")?,
            installments: self
                .installments
                .ok_or("--installments is required (or provide --input)")?,
            admin_fee_rate: self.admin_fee_rate.unwrap_or(Decimal::ZERO),
            fund_rate: self.fund_rate,
            draw_month: self.draw_month,
            bid_payment: self.bid_payment,
        })
    }
}

pub fn run_consortium(args: ConsortiumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan: ConsortiumPlan = match input::load(args.input.as_deref())? {
        Some(plan) => plan,
        None => args.into_plan()?,
    };
    let result = installments::analyze_consortium(&plan)?;
    Ok(serde_json::to_value(result)?)
}
