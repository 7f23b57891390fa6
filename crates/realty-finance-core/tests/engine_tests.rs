use pretty_assertions::assert_eq;
use realty_finance_core::breakeven::simulate_breakeven_investment;
use realty_finance_core::cet::effective_cost::{analyze_cet, compute_cet, CetInput, CetMethod};
use realty_finance_core::consortium::installments::{compute_consortium_schedule, ConsortiumPlan};
use realty_finance_core::financing::amortization::{compute_financing_schedule, FinancingPlan};
use realty_finance_core::time_value::npv;
use realty_finance_core::{CashFlowEntry, PlanKind, RealtyFinanceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Financing schedule
// ===========================================================================

#[test]
fn test_financing_schedule_length_matches_term() {
    for term in [1u32, 12, 120, 360, 420] {
        let plan = FinancingPlan::new(dec!(250_000), dec!(0.105), term);
        let schedule = compute_financing_schedule(&plan).unwrap();
        assert_eq!(schedule.entries.len(), term as usize);
        assert_eq!(schedule.plan, PlanKind::Financing);
    }
}

#[test]
fn test_financing_present_value_equals_principal() {
    // Discounting the level installments at the contract rate returns the principal
    for (principal, rate, term) in [
        (dec!(100_000), dec!(0.12), 360u32),
        (dec!(480_000), dec!(0.09), 240),
        (dec!(35_000), dec!(0.0), 48),
        (dec!(1_200_000), dec!(0.1375), 420),
    ] {
        let plan = FinancingPlan::new(principal, rate, term);
        let schedule = compute_financing_schedule(&plan).unwrap();
        let mut flows = vec![Decimal::ZERO];
        flows.extend(schedule.entries.iter().map(|e| e.outflow));
        let pv = npv(plan.monthly_rate(), &flows).unwrap();
        assert!(
            (pv - principal).abs() < dec!(0.000001),
            "PV {} vs principal {}",
            pv,
            principal
        );
    }
}

#[test]
fn test_financing_first_month_breakdown() {
    // 100k at 12% nominal: month 1 interest = 1000, installment ≈ 1028.61
    let plan = FinancingPlan::new(dec!(100_000), dec!(0.12), 360);
    let schedule = compute_financing_schedule(&plan).unwrap();
    let first = schedule.entries[0].breakdown.clone().unwrap();
    assert_eq!(first.opening_balance, dec!(100_000));
    assert_eq!(first.interest, dec!(1000));
    assert!((first.amortization - dec!(28.61)).abs() < dec!(0.01));
}

// ===========================================================================
// Consortium schedule
// ===========================================================================

#[test]
fn test_consortium_outflows_identical_without_draw() {
    let mut plan = ConsortiumPlan::new(dec!(350_000), 200, dec!(0.16));
    plan.fund_rate = Some(dec!(0.015));
    let schedule = compute_consortium_schedule(&plan).unwrap();
    let first = schedule.entries[0].outflow;
    assert_eq!(schedule.entries.len(), 200);
    assert!(schedule.entries.iter().all(|e| e.outflow == first));
}

#[test]
fn test_consortium_draw_month_five() {
    let mut plan = ConsortiumPlan::new(dec!(300_000), 100, dec!(0.15));
    plan.draw_month = Some(5);
    let schedule = compute_consortium_schedule(&plan).unwrap();
    assert_eq!(
        schedule.entries[4],
        CashFlowEntry {
            month: 5,
            outflow: dec!(3450),
            inflow: Some(dec!(300_000)),
            breakdown: None,
        }
    );
    let other_inflows: Decimal = schedule
        .entries
        .iter()
        .filter(|e| e.month != 5)
        .map(|e| e.inflow.unwrap_or(Decimal::ZERO))
        .sum();
    assert_eq!(other_inflows, Decimal::ZERO);
}

// ===========================================================================
// CET
// ===========================================================================

#[test]
fn test_cet_reference_twelve_percent() {
    let plan = FinancingPlan::new(dec!(100_000), dec!(0.12), 360);
    let schedule = compute_financing_schedule(&plan).unwrap();
    let cet = compute_cet(&schedule, dec!(100_000)).unwrap();
    assert!((cet.annual_rate - dec!(0.12)).abs() <= dec!(0.0001));
}

#[test]
fn test_cet_with_charges_above_nominal() {
    let mut plan = FinancingPlan::new(dec!(480_000), dec!(0.09), 360);
    plan.upfront_fee = Some(dec!(4_800));
    plan.insurance_annual_rate = Some(dec!(0.006));
    let out = analyze_cet(&CetInput::Financing(plan)).unwrap();
    assert_eq!(out.result.method, CetMethod::Newton);
    assert!(out.result.annual_rate > dec!(0.096), "got {}", out.result.annual_rate);
    assert!(out.result.annual_rate < dec!(0.11), "got {}", out.result.annual_rate);
}

#[test]
fn test_cet_drawn_consortium() {
    let mut plan = ConsortiumPlan::new(dec!(600_000), 180, dec!(0.20));
    plan.draw_month = Some(12);
    let out = analyze_cet(&CetInput::Consortium(plan)).unwrap();
    assert_eq!(out.result.method, CetMethod::Bisection);
    assert!(out.result.monthly_rate > Decimal::ZERO);
}

#[test]
fn test_cet_is_deterministic() {
    let mut plan = ConsortiumPlan::new(dec!(600_000), 180, dec!(0.18));
    plan.draw_month = Some(24);
    let a = analyze_cet(&CetInput::Consortium(plan.clone())).unwrap();
    let b = analyze_cet(&CetInput::Consortium(plan)).unwrap();
    assert_eq!(a.result, b.result);
}

// ===========================================================================
// Breakeven
// ===========================================================================

#[test]
fn test_breakeven_known_answer() {
    assert_eq!(
        simulate_breakeven_investment(dec!(1000), dec!(0.01)).unwrap(),
        dec!(100000)
    );
}

// ===========================================================================
// Invalid input
// ===========================================================================

#[test]
fn test_invalid_inputs_raise_invalid_parameter() {
    let negative_principal = compute_financing_schedule(&FinancingPlan::new(dec!(-1), dec!(0.1), 12));
    let zero_term = compute_financing_schedule(&FinancingPlan::new(dec!(1000), dec!(0.1), 0));
    let mut late_draw = ConsortiumPlan::new(dec!(1000), 10, dec!(0.1));
    late_draw.draw_month = Some(11);
    let late_draw = compute_consortium_schedule(&late_draw);
    let zero_yield = simulate_breakeven_investment(dec!(1000), Decimal::ZERO);

    assert!(matches!(
        negative_principal,
        Err(RealtyFinanceError::InvalidParameter { .. })
    ));
    assert!(matches!(
        zero_term,
        Err(RealtyFinanceError::InvalidParameter { .. })
    ));
    assert!(matches!(
        late_draw,
        Err(RealtyFinanceError::InvalidParameter { .. })
    ));
    assert!(matches!(
        zero_yield,
        Err(RealtyFinanceError::InvalidParameter { .. })
    ));
}

#[test]
fn test_error_messages_name_the_field() {
    let err = compute_financing_schedule(&FinancingPlan::new(dec!(1000), dec!(0.1), 0)).unwrap_err();
    assert!(err.to_string().contains("term_months"), "got {err}");
}
