//! Side-by-side comparison of a financing plan and a consortium plan.
//!
//! Produces, for each plan, its schedule, CET, average installment, total
//! paid, an optional NPV at a caller-supplied discount rate and an optional
//! breakeven capital, plus a cumulative payment series for charting.

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::breakeven::simulate_breakeven_investment;
use crate::error::RealtyFinanceError;
use crate::cet::effective_cost::{compute_cet, CetOutput};
use crate::consortium::installments::{compute_consortium_schedule, ConsortiumPlan};
use crate::financing::amortization::{compute_financing_schedule, FinancingPlan};
use crate::time_value::{monthly_from_effective, npv};
use crate::types::{with_metadata, CashFlowSchedule, ComputationOutput, Money, PlanKind, Rate};
use crate::RealtyFinanceResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub financing: FinancingPlan,
    pub consortium: ConsortiumPlan,
    /// Monthly investment yield for the breakeven capital simulation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_yield_rate: Option<Rate>,
    /// Effective annual discount rate for NPV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_discount_rate: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub cet: CetOutput,
    /// Mean monthly outflow, excluding the month-0 charge.
    pub average_installment: Money,
    /// Upfront fee or initial bid.
    pub upfront_charge: Money,
    /// Own funds paid at signing (financing only).
    pub down_payment: Money,
    pub total_paid: Money,
    /// NPV of the buyer's signed flows; present when a discount rate is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npv: Option<Money>,
    /// Capital whose yield covers the average installment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakeven_capital: Option<Money>,
    pub schedule: CashFlowSchedule,
}

/// Running total of payments made under each plan up to a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub month: u32,
    pub financing: Money,
    pub consortium: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub financing: PlanSummary,
    pub consortium: PlanSummary,
    /// Plan with the lower nominal annual CET.
    pub lower_cet: PlanKind,
    /// Plan with the lower total paid.
    pub lower_total_paid: PlanKind,
    /// Months 0..=max(term), for charting.
    pub cumulative_payments: Vec<CumulativePoint>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run one full comparison; any invalid plan or unsolvable CET fails the whole run.
pub fn compare(input: &ComparisonInput) -> RealtyFinanceResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let monthly_discount = input
        .annual_discount_rate
        .map(monthly_from_effective)
        .transpose()?;

    let financing_schedule = compute_financing_schedule(&input.financing)?;
    let consortium_schedule = compute_consortium_schedule(&input.consortium)?;

    let financing = summarize(
        financing_schedule,
        input.financing.principal,
        monthly_discount,
        input.monthly_yield_rate,
    )?;
    let consortium = summarize(
        consortium_schedule,
        input.consortium.cet_principal(),
        monthly_discount,
        input.monthly_yield_rate,
    )?;

    if input.financing.term_months != input.consortium.installments {
        warnings.push(format!(
            "Plans have different terms ({} vs {} months); the shorter plan pays nothing after it ends",
            input.financing.term_months, input.consortium.installments
        ));
    }
    let property_value = input
        .financing
        .property_value()
        .ok_or_else(|| RealtyFinanceError::overflow("down_payment"))?;
    if property_value != input.consortium.credit_value {
        warnings.push(format!(
            "Financed property value ({}) differs from the credit letter ({})",
            property_value, input.consortium.credit_value
        ));
    }

    let lower_cet = if financing.cet.annual_rate <= consortium.cet.annual_rate {
        PlanKind::Financing
    } else {
        PlanKind::Consortium
    };
    let lower_total_paid = if financing.total_paid <= consortium.total_paid {
        PlanKind::Financing
    } else {
        PlanKind::Consortium
    };

    let cumulative_payments = cumulative_series(&financing.schedule, &consortium.schedule);

    debug!(
        "comparison: financing cet={} consortium cet={} lower={:?}",
        financing.cet.annual_rate, consortium.cet.annual_rate, lower_cet
    );

    let output = ComparisonResult {
        financing,
        consortium,
        lower_cet,
        lower_total_paid,
        cumulative_payments,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Financing (PRICE) vs consortium: IRR-based CET, NPV and breakeven capital",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn summarize(
    schedule: CashFlowSchedule,
    cet_principal: Money,
    monthly_discount: Option<Rate>,
    monthly_yield: Option<Rate>,
) -> RealtyFinanceResult<PlanSummary> {
    let cet = compute_cet(&schedule, cet_principal)?;
    let average_installment = schedule.average_installment()?;

    let npv = match monthly_discount {
        Some(rate) => Some(npv(rate, &schedule.signed_flows()?)?),
        None => None,
    };
    let breakeven_capital = monthly_yield
        .map(|rate| simulate_breakeven_investment(average_installment, rate))
        .transpose()?;

    Ok(PlanSummary {
        cet,
        average_installment,
        upfront_charge: schedule.upfront_charge,
        down_payment: schedule.down_payment,
        total_paid: schedule.total_paid()?,
        npv,
        breakeven_capital,
        schedule,
    })
}

fn cumulative_series(a: &CashFlowSchedule, b: &CashFlowSchedule) -> Vec<CumulativePoint> {
    let months = a.term().max(b.term());
    // Running totals never exceed each plan's already-checked total paid
    let outflow_at = |s: &CashFlowSchedule, month: u32| -> Money {
        if month == 0 {
            s.down_payment + s.upfront_charge
        } else {
            s.entries
                .get(month as usize - 1)
                .map(|e| e.outflow)
                .unwrap_or(Decimal::ZERO)
        }
    };

    let mut financing = Decimal::ZERO;
    let mut consortium = Decimal::ZERO;
    (0..=months)
        .map(|month| {
            financing += outflow_at(a, month);
            consortium += outflow_at(b, month);
            CumulativePoint {
                month,
                financing,
                consortium,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
