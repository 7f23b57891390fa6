use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_finance_core::financing::amortization::{self, FinancingPlan};

use crate::input;

/// Arguments for the financing amortization schedule
#[derive(Args)]
pub struct FinancingArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Own funds paid at signing
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Nominal annual interest rate as a decimal (0.09 = 9%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Fixed fee added to every installment
    #[arg(long)]
    pub monthly_fee: Option<Decimal>,

    /// One-time fee charged at signing
    #[arg(long)]
    pub upfront_fee: Option<Decimal>,

    /// Annual insurance rate on the original principal
    #[arg(long)]
    pub insurance_rate: Option<Decimal>,

    /// Annual fee rate on the outstanding balance
    #[arg(long)]
    pub balance_fee_rate: Option<Decimal>,
}

impl FinancingArgs {
    pub fn into_plan(self) -> Result<FinancingPlan, Box<dyn std::error::Error>> {
        Ok(FinancingPlan {
            principal: self
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            down_payment: self.down_payment,
            annual_rate: self
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_months: self
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            monthly_fee: self.monthly_fee,
            upfront_fee: self.upfront_fee,
            insurance_annual_rate: self.insurance_rate,
            balance_fee_annual_rate: self.balance_fee_rate,
        })
    }
}

pub fn run_financing(args: FinancingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan: FinancingPlan = match input::load(args.input.as_deref())? {
        Some(plan) => plan,
        None => args.into_plan()?,
    };
    let result = amortization::analyze_financing(&plan)?;
    Ok(serde_json::to_value(result)?)
}
