//! Capital required for investment income alone to cover an installment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyFinanceError;
use crate::time_value::effective_from_monthly;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyFinanceResult;

/// Monthly yield above which results are flagged as unrealistic.
const HIGH_MONTHLY_YIELD: Decimal = dec!(0.03);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakevenInput {
    /// Monthly installment the investment income must cover.
    pub target_installment: Money,
    /// Monthly yield of the investment (0.005 = 0.5% a month).
    pub monthly_yield_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakevenOutput {
    /// Principal P with P × yield = installment.
    pub required_capital: Money,
    /// Effective annual equivalent of the monthly yield.
    pub annual_yield: Rate,
}

pub fn analyze_breakeven(
    input: &BreakevenInput,
) -> RealtyFinanceResult<ComputationOutput<BreakevenOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let required_capital =
        simulate_breakeven_investment(input.target_installment, input.monthly_yield_rate)?;

    if input.monthly_yield_rate > HIGH_MONTHLY_YIELD {
        warnings.push(format!(
            "Monthly yield {} is unusually high; required capital may be understated",
            input.monthly_yield_rate
        ));
    }

    let output = BreakevenOutput {
        required_capital,
        annual_yield: effective_from_monthly(input.monthly_yield_rate)?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Perpetuity breakeven: capital = installment / monthly yield",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// P = target_installment / monthly_yield_rate.
pub fn simulate_breakeven_investment(
    target_installment: Money,
    monthly_yield_rate: Rate,
) -> RealtyFinanceResult<Money> {
    if monthly_yield_rate <= Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "monthly_yield_rate",
            "Yield must be positive; at zero yield no capital covers the installment",
        ));
    }
    if target_installment < Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "target_installment",
            "Installment cannot be negative",
        ));
    }
    target_installment
        .checked_div(monthly_yield_rate)
        .ok_or_else(|| RealtyFinanceError::overflow("monthly_yield_rate"))
}
