//! Loan-style real-estate financing under the PRICE (level installment) system.
//!
//! Builds the month-by-month amortization table for a financed principal:
//! interest on the opening balance, principal amortization, insurance charged
//! on the original principal, fixed and balance-based fees. All math in
//! `rust_decimal::Decimal`.

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyFinanceError;
use crate::time_value::{annuity_payment, checked_sum, monthly_from_nominal};
use crate::types::{
    with_metadata, AmortizationBreakdown, CashFlowEntry, CashFlowSchedule, ComputationOutput,
    Money, PlanKind, Rate, MAX_TERM_MONTHS,
};
use crate::RealtyFinanceResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Parameters of a financing contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingPlan {
    /// Amount financed (property value less down payment).
    pub principal: Money,
    /// Own funds paid at signing; counted in totals, not in the CET.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    /// Nominal annual interest rate; the monthly rate is annual / 12.
    pub annual_rate: Rate,
    /// Number of monthly installments.
    pub term_months: u32,
    /// Fixed fee added to every installment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_fee: Option<Money>,
    /// One-time insurance or administrative fee charged at signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upfront_fee: Option<Money>,
    /// Annual insurance rate, charged monthly on the original principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_annual_rate: Option<Rate>,
    /// Annual fee rate, charged monthly on each month's opening balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_fee_annual_rate: Option<Rate>,
}

impl FinancingPlan {
    /// Fee-free plan at a nominal annual rate.
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> Self {
        FinancingPlan {
            principal,
            down_payment: None,
            annual_rate,
            term_months,
            monthly_fee: None,
            upfront_fee: None,
            insurance_annual_rate: None,
            balance_fee_annual_rate: None,
        }
    }

    pub fn monthly_rate(&self) -> Rate {
        monthly_from_nominal(self.annual_rate)
    }

    /// Principal plus down payment.
    pub fn property_value(&self) -> Option<Money> {
        self.principal
            .checked_add(self.down_payment.unwrap_or(Decimal::ZERO))
    }

    fn has_charges(&self) -> bool {
        [
            self.monthly_fee,
            self.upfront_fee,
            self.insurance_annual_rate,
            self.balance_fee_annual_rate,
        ]
        .into_iter()
        .any(|v| v.is_some_and(|x| !x.is_zero()))
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Financing schedule with headline figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancingOutput {
    /// Level PRICE installment before insurance and fees.
    pub base_installment: Money,
    /// First month's total outflow.
    pub first_outflow: Money,
    /// Mean monthly outflow.
    pub average_installment: Money,
    /// Sum of interest over the term.
    pub total_interest: Money,
    /// Every outflow including the upfront fee.
    pub total_paid: Money,
    pub schedule: CashFlowSchedule,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the financing schedule and wrap it with summary figures.
pub fn analyze_financing(
    plan: &FinancingPlan,
) -> RealtyFinanceResult<ComputationOutput<FinancingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = compute_financing_schedule(plan)?;
    let base_installment = annuity_payment(plan.principal, plan.monthly_rate(), plan.term_months)?;

    let total_interest = checked_sum(
        schedule
            .entries
            .iter()
            .filter_map(|e| e.breakdown.as_ref())
            .map(|b| b.interest),
    )
    .ok_or_else(|| RealtyFinanceError::overflow("annual_rate"))?;

    if total_interest > plan.principal {
        warnings.push(format!(
            "Total interest ({}) exceeds the financed principal ({})",
            total_interest.round_dp(2),
            plan.principal
        ));
    }

    let output = FinancingOutput {
        base_installment,
        first_outflow: schedule.entries[0].outflow,
        average_installment: schedule.average_installment()?,
        total_interest,
        total_paid: schedule.total_paid()?,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PRICE amortization (level installment, nominal monthly rate)",
        plan,
        warnings,
        elapsed,
        output,
    ))
}

/// One entry per month, outflow = level installment + insurance + fees.
pub fn compute_financing_schedule(plan: &FinancingPlan) -> RealtyFinanceResult<CashFlowSchedule> {
    validate_plan(plan)?;

    let monthly_rate = plan.monthly_rate();
    let installment = annuity_payment(plan.principal, monthly_rate, plan.term_months)?;
    let monthly_fee = plan.monthly_fee.unwrap_or(Decimal::ZERO);
    let insurance = monthly_from_nominal(plan.insurance_annual_rate.unwrap_or(Decimal::ZERO))
        .checked_mul(plan.principal)
        .ok_or_else(|| RealtyFinanceError::overflow("insurance_annual_rate"))?;
    let balance_fee_rate = monthly_from_nominal(plan.balance_fee_annual_rate.unwrap_or(Decimal::ZERO));
    let upfront_charge = plan.upfront_fee.unwrap_or(Decimal::ZERO);
    let down_payment = plan.down_payment.unwrap_or(Decimal::ZERO);
    if down_payment.checked_add(upfront_charge).is_none() {
        return Err(RealtyFinanceError::overflow("down_payment"));
    }

    debug!(
        "financing schedule: principal={} monthly_rate={} term={} installment={}",
        plan.principal, monthly_rate, plan.term_months, installment
    );

    let charges = MonthlyCharges {
        installment,
        monthly_rate,
        insurance,
        monthly_fee,
        balance_fee_rate,
    };
    let mut entries = Vec::with_capacity(plan.term_months as usize);
    let mut balance = plan.principal;

    for month in 1..=plan.term_months {
        let entry = charges
            .entry(month, balance, month == plan.term_months)
            .ok_or_else(|| RealtyFinanceError::overflow("principal"))?;
        balance = entry
            .breakdown
            .as_ref()
            .map_or(Decimal::ZERO, |b| b.closing_balance);
        entries.push(entry);
    }

    Ok(CashFlowSchedule {
        plan: PlanKind::Financing,
        principal: plan.principal,
        upfront_charge,
        down_payment,
        contract_rate: (!plan.has_charges()).then_some(monthly_rate),
        entries,
    })
}

/// Per-month pricing inputs shared by every row of the table.
struct MonthlyCharges {
    installment: Money,
    monthly_rate: Rate,
    insurance: Money,
    monthly_fee: Money,
    balance_fee_rate: Rate,
}

impl MonthlyCharges {
    /// One row of the PRICE table; the last month clears the balance. None on overflow.
    fn entry(&self, month: u32, opening_balance: Money, last: bool) -> Option<CashFlowEntry> {
        let interest = opening_balance.checked_mul(self.monthly_rate)?;
        let amortization = if last {
            opening_balance
        } else {
            self.installment.checked_sub(interest)?.min(opening_balance)
        };
        let closing_balance = (opening_balance - amortization).max(Decimal::ZERO);
        let fees = self
            .monthly_fee
            .checked_add(self.balance_fee_rate.checked_mul(opening_balance)?)?;
        let outflow = self
            .installment
            .checked_add(self.insurance)?
            .checked_add(fees)?;

        Some(CashFlowEntry {
            month,
            outflow,
            inflow: None,
            breakdown: Some(AmortizationBreakdown {
                opening_balance,
                interest,
                amortization,
                insurance: self.insurance,
                fees,
                closing_balance,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_plan(plan: &FinancingPlan) -> RealtyFinanceResult<()> {
    if plan.principal <= Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "principal",
            "Principal must be positive",
        ));
    }
    if plan.annual_rate < Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "annual_rate",
            "Interest rate cannot be negative",
        ));
    }
    if plan.term_months == 0 {
        return Err(RealtyFinanceError::invalid(
            "term_months",
            "Term must be greater than zero",
        ));
    }
    if plan.term_months > MAX_TERM_MONTHS {
        return Err(RealtyFinanceError::invalid(
            "term_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    let optional = [
        ("down_payment", plan.down_payment),
        ("monthly_fee", plan.monthly_fee),
        ("upfront_fee", plan.upfront_fee),
        ("insurance_annual_rate", plan.insurance_annual_rate),
        ("balance_fee_annual_rate", plan.balance_fee_annual_rate),
    ];
    for (field, value) in optional {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(RealtyFinanceError::invalid(field, "Cannot be negative"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::npv;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn standard_plan() -> FinancingPlan {
        FinancingPlan::new(dec!(480_000), dec!(0.09), 360)
    }

    #[test]
    fn test_schedule_length_equals_term() {
        let schedule = compute_financing_schedule(&standard_plan()).unwrap();
        assert_eq!(schedule.entries.len(), 360);
        assert_eq!(schedule.entries.first().unwrap().month, 1);
        assert_eq!(schedule.entries.last().unwrap().month, 360);
    }

    #[test]
    fn test_pv_of_outflows_equals_principal() {
        let plan = standard_plan();
        let schedule = compute_financing_schedule(&plan).unwrap();
        let mut flows = vec![Decimal::ZERO];
        flows.extend(schedule.entries.iter().map(|e| e.outflow));
        let pv = npv(plan.monthly_rate(), &flows).unwrap();
        assert_close(pv, plan.principal, dec!(0.000001), "PV of installments");
    }

    #[test]
    fn test_level_installment() {
        let schedule = compute_financing_schedule(&standard_plan()).unwrap();
        let first = schedule.entries[0].outflow;
        assert!(schedule.entries.iter().all(|e| e.outflow == first));
    }

    #[test]
    fn test_amortization_sums_to_principal() {
        let plan = standard_plan();
        let schedule = compute_financing_schedule(&plan).unwrap();
        let total: Decimal = schedule
            .entries
            .iter()
            .map(|e| e.breakdown.as_ref().unwrap().amortization)
            .sum();
        assert_close(total, plan.principal, dec!(0.000001), "Amortization total");
        let last = schedule.entries.last().unwrap().breakdown.as_ref().unwrap();
        assert_eq!(last.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_balance_monotonically_decreasing() {
        let schedule = compute_financing_schedule(&standard_plan()).unwrap();
        let mut prev = dec!(480_000);
        for e in &schedule.entries {
            let b = e.breakdown.as_ref().unwrap();
            assert!(b.closing_balance <= prev);
            prev = b.closing_balance;
        }
    }

    #[test]
    fn test_monthly_fee_added_to_each_installment() {
        let mut plan = standard_plan();
        let base = compute_financing_schedule(&plan).unwrap().entries[0].outflow;
        plan.monthly_fee = Some(dec!(25));
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert!(schedule.entries.iter().all(|e| e.outflow == base + dec!(25)));
        assert_eq!(schedule.contract_rate, None);
    }

    #[test]
    fn test_insurance_on_original_principal() {
        let mut plan = standard_plan();
        plan.insurance_annual_rate = Some(dec!(0.006));
        let schedule = compute_financing_schedule(&plan).unwrap();
        // 0.6% / 12 × 480k = 240
        let b = schedule.entries[100].breakdown.as_ref().unwrap();
        assert_eq!(b.insurance, dec!(240));
    }

    #[test]
    fn test_balance_fee_declines_with_balance() {
        let mut plan = standard_plan();
        plan.balance_fee_annual_rate = Some(dec!(0.012));
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert!(schedule.entries[0].outflow > schedule.entries[359].outflow);
    }

    #[test]
    fn test_zero_rate_divides_principal() {
        let plan = FinancingPlan::new(dec!(12_000), Decimal::ZERO, 12);
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert!(schedule.entries.iter().all(|e| e.outflow == dec!(1000)));
        assert_eq!(schedule.contract_rate, Some(Decimal::ZERO));
    }

    #[test]
    fn test_upfront_fee_is_month_zero_charge() {
        let mut plan = standard_plan();
        plan.upfront_fee = Some(dec!(4_800));
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert_eq!(schedule.upfront_charge, dec!(4_800));
        assert_eq!(schedule.entries.len(), 360);
    }

    #[test]
    fn test_validation_negative_principal() {
        let plan = FinancingPlan::new(dec!(-1), dec!(0.09), 360);
        assert!(matches!(
            compute_financing_schedule(&plan),
            Err(RealtyFinanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validation_zero_term() {
        let plan = FinancingPlan::new(dec!(100_000), dec!(0.09), 0);
        assert!(matches!(
            compute_financing_schedule(&plan),
            Err(RealtyFinanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validation_negative_rate() {
        let plan = FinancingPlan::new(dec!(100_000), dec!(-0.01), 120);
        assert!(compute_financing_schedule(&plan).is_err());
    }

    #[test]
    fn test_validation_negative_fee() {
        let mut plan = standard_plan();
        plan.monthly_fee = Some(dec!(-5));
        assert!(compute_financing_schedule(&plan).is_err());
    }

    #[test]
    fn test_down_payment_counted_in_total_paid() {
        let mut plan = standard_plan();
        plan.down_payment = Some(dec!(120_000));
        plan.upfront_fee = Some(dec!(4_800));
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert_eq!(schedule.down_payment, dec!(120_000));
        assert_eq!(schedule.upfront_charge, dec!(4_800));
        assert_eq!(schedule.month_zero_outflow(), Some(dec!(124_800)));

        let installments: Decimal = schedule.entries.iter().map(|e| e.outflow).sum();
        assert_close(
            schedule.total_paid().unwrap(),
            installments + dec!(124_800),
            dec!(0.000001),
            "Total paid",
        );
        assert_eq!(plan.property_value(), Some(dec!(600_000)));
    }

    #[test]
    fn test_down_payment_keeps_contract_rate() {
        let mut plan = standard_plan();
        plan.down_payment = Some(dec!(120_000));
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert_eq!(schedule.contract_rate, Some(plan.monthly_rate()));
    }

    #[test]
    fn test_validation_negative_down_payment() {
        let mut plan = standard_plan();
        plan.down_payment = Some(dec!(-1));
        assert!(compute_financing_schedule(&plan).is_err());
    }

    #[test]
    fn test_term_limit() {
        let plan = FinancingPlan::new(dec!(100_000), dec!(0.09), MAX_TERM_MONTHS);
        assert_eq!(
            compute_financing_schedule(&plan).unwrap().entries.len(),
            MAX_TERM_MONTHS as usize
        );

        for term in [MAX_TERM_MONTHS + 1, u32::MAX] {
            let plan = FinancingPlan::new(dec!(100_000), dec!(0.09), term);
            let err = compute_financing_schedule(&plan).unwrap_err();
            assert!(err.to_string().contains("term_months"), "got {err}");
        }
    }

    #[test]
    fn test_huge_principal_is_error_not_panic() {
        let plan = FinancingPlan::new(dec!(10_000_000_000_000_000_000_000_000_000), dec!(120), 12);
        assert!(matches!(
            compute_financing_schedule(&plan),
            Err(RealtyFinanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_huge_fees_are_error_not_panic() {
        let mut plan = standard_plan();
        plan.monthly_fee = Some(dec!(79_000_000_000_000_000_000_000_000_000));
        plan.balance_fee_annual_rate = Some(dec!(0.5));
        assert!(matches!(
            analyze_financing(&plan),
            Err(RealtyFinanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_analyze_financing_summary() {
        let out = analyze_financing(&standard_plan()).unwrap();
        let r = &out.result;
        assert_eq!(r.first_outflow, r.base_installment);
        assert!(r.total_interest > Decimal::ZERO);
        assert_close(
            r.total_paid,
            r.base_installment * dec!(360),
            dec!(0.0001),
            "Total paid",
        );
        assert!(!out.metadata.version.is_empty());
        // 9% over 30 years pays more interest than principal
        assert_eq!(out.warnings.len(), 1);
    }
}
