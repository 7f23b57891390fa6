//! Consortium (pooled-contribution) plans.
//!
//! Installments are flat: the credit letter is split evenly over the plan and
//! the administrative and reserve fund rates are charged on the nominal
//! value, never on a declining balance. The credit letter is received once,
//! in the month the participant is drawn or wins the bid.

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyFinanceError;
use crate::types::{
    with_metadata, CashFlowEntry, CashFlowSchedule, ComputationOutput, Money, PlanKind, Rate,
    MAX_TERM_MONTHS,
};
use crate::RealtyFinanceResult;

/// Combined fee rate above which a warning is emitted.
const HIGH_FEE_THRESHOLD: Decimal = dec!(0.30);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Parameters of a consortium quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsortiumPlan {
    /// Credit letter value.
    pub credit_value: Money,
    /// Number of monthly installments.
    pub installments: u32,
    /// Administrative fee rate over the whole plan, on the credit value.
    pub admin_fee_rate: Rate,
    /// Reserve fund contribution rate over the whole plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_rate: Option<Rate>,
    /// Month the credit letter is received (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_month: Option<u32>,
    /// Initial bid or entry paid at signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_payment: Option<Money>,
}

impl ConsortiumPlan {
    pub fn new(credit_value: Money, installments: u32, admin_fee_rate: Rate) -> Self {
        ConsortiumPlan {
            credit_value,
            installments,
            admin_fee_rate,
            fund_rate: None,
            draw_month: None,
            bid_payment: None,
        }
    }

    /// Administrative plus reserve fund rate.
    pub fn total_fee_rate(&self) -> RealtyFinanceResult<Rate> {
        self.admin_fee_rate
            .checked_add(self.fund_rate.unwrap_or(Decimal::ZERO))
            .ok_or_else(|| RealtyFinanceError::overflow("fund_rate"))
    }

    /// Amount treated as received at signing when solving for CET.
    ///
    /// Undrawn plans are compared as if the credit were available upfront.
    /// Once a draw month is set the credit arrives as that month's inflow,
    /// so nothing is received at signing.
    pub fn cet_principal(&self) -> Money {
        match self.draw_month {
            Some(_) => Decimal::ZERO,
            None => self.credit_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsortiumOutput {
    /// Flat monthly installment.
    pub installment: Money,
    /// Credit value / installments.
    pub credit_share: Money,
    /// Administrative and fund portion of each installment.
    pub fee_share: Money,
    /// Fees paid over the whole plan.
    pub total_fees: Money,
    /// Every outflow including the initial bid.
    pub total_paid: Money,
    pub schedule: CashFlowSchedule,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn analyze_consortium(
    plan: &ConsortiumPlan,
) -> RealtyFinanceResult<ComputationOutput<ConsortiumOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = compute_consortium_schedule(plan)?;
    let fee_rate = plan.total_fee_rate()?;
    let credit_share = plan.credit_value / Decimal::from(plan.installments);
    let installment = schedule.entries[0].outflow;
    let fee_share = installment - credit_share;

    if fee_rate > HIGH_FEE_THRESHOLD {
        warnings.push(format!(
            "Combined fee rate ({}) is above {}",
            fee_rate, HIGH_FEE_THRESHOLD
        ));
    }
    if let Some(bid) = plan.bid_payment {
        if bid >= plan.credit_value {
            warnings.push("Initial bid is not smaller than the credit letter".into());
        }
    }

    let output = ConsortiumOutput {
        installment,
        credit_share,
        fee_share,
        total_fees: plan
            .credit_value
            .checked_mul(fee_rate)
            .ok_or_else(|| RealtyFinanceError::overflow("admin_fee_rate"))?,
        total_paid: schedule.total_paid()?,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Consortium flat installment on nominal credit value",
        plan,
        warnings,
        elapsed,
        output,
    ))
}

/// Flat installment (credit / n) × (1 + admin + fund), credit inflow at the draw month.
pub fn compute_consortium_schedule(
    plan: &ConsortiumPlan,
) -> RealtyFinanceResult<CashFlowSchedule> {
    validate_plan(plan)?;

    let fee_rate = plan.total_fee_rate()?;
    let installment = Decimal::ONE
        .checked_add(fee_rate)
        .and_then(|factor| factor.checked_mul(plan.credit_value))
        .map(|gross| gross / Decimal::from(plan.installments))
        .ok_or_else(|| RealtyFinanceError::overflow("credit_value"))?;
    let upfront_charge = plan.bid_payment.unwrap_or(Decimal::ZERO);

    debug!(
        "consortium schedule: credit={} installments={} installment={} draw_month={:?}",
        plan.credit_value, plan.installments, installment, plan.draw_month
    );

    let entries = (1..=plan.installments)
        .map(|month| CashFlowEntry {
            month,
            outflow: installment,
            inflow: (plan.draw_month == Some(month)).then_some(plan.credit_value),
            breakdown: None,
        })
        .collect();

    let fee_free = fee_rate.is_zero()
        && upfront_charge.is_zero()
        && plan.draw_month.is_none();

    Ok(CashFlowSchedule {
        plan: PlanKind::Consortium,
        principal: plan.credit_value,
        upfront_charge,
        down_payment: Decimal::ZERO,
        contract_rate: fee_free.then_some(Decimal::ZERO),
        entries,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_plan(plan: &ConsortiumPlan) -> RealtyFinanceResult<()> {
    if plan.credit_value <= Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "credit_value",
            "Credit letter value must be positive",
        ));
    }
    if plan.installments == 0 {
        return Err(RealtyFinanceError::invalid(
            "installments",
            "Number of installments must be greater than zero",
        ));
    }
    if plan.installments > MAX_TERM_MONTHS {
        return Err(RealtyFinanceError::invalid(
            "installments",
            format!("Number of installments cannot exceed {MAX_TERM_MONTHS}"),
        ));
    }
    if plan.admin_fee_rate < Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "admin_fee_rate",
            "Administrative fee rate cannot be negative",
        ));
    }
    if plan.fund_rate.is_some_and(|r| r < Decimal::ZERO) {
        return Err(RealtyFinanceError::invalid(
            "fund_rate",
            "Fund contribution rate cannot be negative",
        ));
    }
    if plan.bid_payment.is_some_and(|b| b < Decimal::ZERO) {
        return Err(RealtyFinanceError::invalid(
            "bid_payment",
            "Bid payment cannot be negative",
        ));
    }
    if let Some(month) = plan.draw_month {
        if month < 1 || month > plan.installments {
            return Err(RealtyFinanceError::invalid(
                "draw_month",
                format!("Draw month must be within 1..={}", plan.installments),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
