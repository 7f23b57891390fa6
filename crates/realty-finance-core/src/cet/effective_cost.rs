//! Effective total cost (CET) of a financing or consortium schedule.
//!
//! The CET is the monthly internal rate of return `r` satisfying
//!
//! ```text
//! principal - upfront_charge = Σ (outflow_t - inflow_t) / (1 + r)^t
//! ```
//!
//! annualized both nominally (r × 12) and effectively ((1 + r)^12 - 1).
//! Fee-free annuities return their contract rate directly. Streams with a
//! single sign change are solved with Newton iteration kept inside a bracket;
//! streams with several sign changes (a consortium draw among installments)
//! use plain bisection on the bracket nearest zero. Either way the returned
//! rate leaves an NPV residual below `NPV_TOLERANCE` unless Decimal precision
//! runs out first.

use log::{debug, trace, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::consortium::installments::{compute_consortium_schedule, ConsortiumPlan};
use crate::error::RealtyFinanceError;
use crate::financing::amortization::{compute_financing_schedule, FinancingPlan};
use crate::time_value::{checked_npv, checked_sum, effective_from_monthly, nominal_from_monthly};
use crate::types::{with_metadata, CashFlowSchedule, ComputationOutput, Money, Rate};
use crate::RealtyFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Newton step or bracket width at which iteration stops.
const RATE_TOLERANCE: Decimal = dec!(0.000000001);

/// NPV left over at an accepted bisection rate.
const NPV_TOLERANCE: Decimal = dec!(0.000001);

/// Monthly rate beyond which the bracket is no longer widened.
const MAX_BRACKET_RATE: Decimal = dec!(1_000_000);

/// Maximum Newton iterations before giving up.
const NEWTON_MAX_ITER: u32 = 100;

/// Maximum bisection iterations before giving up.
const BISECTION_MAX_ITER: u32 = 200;

/// Monthly trial rates scanned for a sign change, ascending.
const BRACKET_GRID: [Decimal; 23] = [
    dec!(-0.5),
    dec!(-0.2),
    dec!(-0.1),
    dec!(-0.05),
    dec!(-0.02),
    dec!(-0.01),
    dec!(-0.005),
    dec!(-0.001),
    dec!(0),
    dec!(0.001),
    dec!(0.0025),
    dec!(0.005),
    dec!(0.0075),
    dec!(0.01),
    dec!(0.015),
    dec!(0.02),
    dec!(0.03),
    dec!(0.05),
    dec!(0.075),
    dec!(0.1),
    dec!(0.2),
    dec!(0.5),
    dec!(1),
];

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// What to compute a CET for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CetInput {
    /// An explicit schedule and the amount received at signing.
    Schedule {
        schedule: CashFlowSchedule,
        principal: Money,
    },
    /// A financing plan, solved against its principal.
    Financing(FinancingPlan),
    /// A consortium plan, solved against its credit value (or zero once drawn).
    Consortium(ConsortiumPlan),
}

/// How the rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CetMethod {
    ClosedForm,
    Newton,
    Bisection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CetOutput {
    /// Monthly IRR of the stream.
    pub monthly_rate: Rate,
    /// Nominal annual rate (monthly × 12).
    pub annual_rate: Rate,
    /// Effective annual rate ((1 + monthly)^12 - 1).
    pub effective_annual_rate: Rate,
    pub method: CetMethod,
    pub iterations: u32,
}

impl CetOutput {
    fn from_monthly(monthly_rate: Rate, method: CetMethod, iterations: u32) -> RealtyFinanceResult<Self> {
        Ok(CetOutput {
            monthly_rate,
            annual_rate: nominal_from_monthly(monthly_rate),
            effective_annual_rate: effective_from_monthly(monthly_rate)?,
            method,
            iterations,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the CET for a schedule or a plan, wrapped with metadata.
pub fn analyze_cet(input: &CetInput) -> RealtyFinanceResult<ComputationOutput<CetOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (schedule, principal) = match input {
        CetInput::Schedule {
            schedule,
            principal,
        } => (schedule.clone(), *principal),
        CetInput::Financing(plan) => (compute_financing_schedule(plan)?, plan.principal),
        CetInput::Consortium(plan) => (compute_consortium_schedule(plan)?, plan.cet_principal()),
    };

    let output = compute_cet(&schedule, principal)?;

    if output.monthly_rate < Decimal::ZERO {
        warnings.push("Negative CET: total payments are below the amount received".into());
    }

    let methodology = match output.method {
        CetMethod::ClosedForm => "CET from contract rate (fee-free annuity)",
        CetMethod::Newton => "CET via IRR (bracketed Newton-Raphson)",
        CetMethod::Bisection => "CET via IRR (bisection on nearest bracket)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

/// Solve for the rate equating `principal` to the schedule's net payments.
pub fn compute_cet(schedule: &CashFlowSchedule, principal: Money) -> RealtyFinanceResult<CetOutput> {
    if schedule.entries.is_empty() {
        return Err(RealtyFinanceError::invalid(
            "schedule",
            "Schedule must contain at least one month",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(RealtyFinanceError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }

    if let Some(rate) = schedule.contract_rate {
        if principal == schedule.principal {
            debug!("CET closed form: contract rate {rate}");
            return CetOutput::from_monthly(rate, CetMethod::ClosedForm, 0);
        }
    }

    let flows = borrower_flows(schedule, principal);
    let changes = sign_changes(&flows);
    if changes == 0 {
        warn!("CET undefined: cash flows never change sign");
        return Err(RealtyFinanceError::Convergence {
            function: "CET".into(),
            iterations: 0,
            last_delta: checked_sum(flows.iter().copied()).unwrap_or(Decimal::MAX),
        });
    }

    let bracket = find_bracket(&flows).or_else(|| {
        if changes == 1 {
            widen_bracket(&flows)
        } else {
            None
        }
    });
    let (lo, hi) = bracket.ok_or_else(|| {
        warn!("CET undefined: no sign change found across the rate grid");
        RealtyFinanceError::Convergence {
            function: "CET".into(),
            iterations: BRACKET_GRID.len() as u32,
            last_delta: checked_npv(Decimal::ZERO, &flows).unwrap_or(Decimal::MAX),
        }
    })?;

    debug!("CET bracket [{lo}, {hi}] with {changes} sign change(s)");

    let (rate, method, iterations) = if changes == 1 {
        let (rate, iterations) = safeguarded_newton(&flows, lo, hi)?;
        (rate, CetMethod::Newton, iterations)
    } else {
        let (rate, iterations) = bisection(&flows, lo, hi)?;
        (rate, CetMethod::Bisection, iterations)
    };

    CetOutput::from_monthly(rate, method, iterations)
}

// ---------------------------------------------------------------------------
// Cash flows
// ---------------------------------------------------------------------------

/// Month 0 receives the principal net of the upfront charge; later months pay.
fn borrower_flows(schedule: &CashFlowSchedule, principal: Money) -> Vec<Money> {
    let mut flows = Vec::with_capacity(schedule.entries.len() + 1);
    flows.push(principal - schedule.upfront_charge);
    flows.extend(schedule.entries.iter().map(|e| -e.net_outflow()));
    flows
}

fn sign_changes(flows: &[Money]) -> usize {
    flows
        .iter()
        .filter(|cf| !cf.is_zero())
        .map(|cf| cf.is_sign_positive())
        .collect::<Vec<_>>()
        .windows(2)
        .filter(|w| w[0] != w[1])
        .count()
}

// ---------------------------------------------------------------------------
// Root finding
// ---------------------------------------------------------------------------

/// Adjacent grid rates with opposite NPV signs, preferring the pair nearest zero.
fn find_bracket(flows: &[Money]) -> Option<(Rate, Rate)> {
    let samples: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|&r| checked_npv(r, flows).map(|v| (r, v)))
        .collect();

    if let Some(&(r, _)) = samples.iter().find(|(_, v)| v.is_zero()) {
        return Some((r, r));
    }

    samples
        .windows(2)
        .filter(|w| opposite_signs(w[0].1, w[1].1))
        .map(|w| (w[0].0, w[1].0))
        .min_by_key(|(lo, hi)| lo.abs().min(hi.abs()))
}

/// Doubles the top grid rate until the NPV changes sign.
///
/// Only used for a single sign change, where the root is unique and may lie
/// above the grid (very expensive short plans).
fn widen_bracket(flows: &[Money]) -> Option<(Rate, Rate)> {
    let mut lo = BRACKET_GRID[BRACKET_GRID.len() - 1];
    let mut npv_lo = checked_npv(lo, flows)?;

    while lo < MAX_BRACKET_RATE {
        let hi = lo.checked_mul(dec!(2))?;
        let npv_hi = checked_npv(hi, flows)?;
        if npv_hi.is_zero() {
            return Some((hi, hi));
        }
        if opposite_signs(npv_lo, npv_hi) {
            debug!("CET bracket widened to [{lo}, {hi}]");
            return Some((lo, hi));
        }
        lo = hi;
        npv_lo = npv_hi;
    }
    None
}

/// NPV and its derivative with respect to the rate.
fn npv_and_derivative(rate: Rate, flows: &[Money]) -> Option<(Money, Money)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let v = Decimal::ONE.checked_div(one_plus_r)?;

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for (t, cf) in flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(v)?;
        }
        let term = cf.checked_mul(discount)?;
        value = value.checked_add(term)?;
        // d/dr cf·(1+r)^-t = -t·cf·(1+r)^-(t+1)
        let slope = term.checked_mul(Decimal::from(t as u64))?.checked_mul(v)?;
        derivative = derivative.checked_sub(slope)?;
    }
    Some((value, derivative))
}

/// Newton-Raphson that falls back to bisection whenever a step leaves the bracket.
fn safeguarded_newton(flows: &[Money], mut lo: Rate, mut hi: Rate) -> RealtyFinanceResult<(Rate, u32)> {
    if lo == hi {
        return Ok((lo, 0));
    }
    let npv_lo = npv_at(flows, lo)?;
    let mut rate = (lo + hi) / dec!(2);
    let mut last_delta = Decimal::MAX;

    for iter in 1..=NEWTON_MAX_ITER {
        let (value, derivative) = npv_and_derivative(rate, flows).ok_or_else(|| {
            RealtyFinanceError::Convergence {
                function: "CET".into(),
                iterations: iter,
                last_delta,
            }
        })?;
        last_delta = value;

        if value.is_zero() {
            return Ok((rate, iter));
        }
        if !opposite_signs(value, npv_lo) {
            lo = rate;
        } else {
            hi = rate;
        }

        let newton = if derivative.is_zero() {
            None
        } else {
            value.checked_div(derivative).map(|step| rate - step)
        };
        let next = match newton {
            Some(candidate) if candidate > lo && candidate < hi => candidate,
            _ => (lo + hi) / dec!(2),
        };

        trace!("CET newton iter={iter} rate={rate} npv={value} next={next}");

        if (next - rate).abs() < RATE_TOLERANCE || (hi - lo).abs() < RATE_TOLERANCE {
            return Ok((next, iter));
        }
        rate = next;
    }

    warn!("CET newton exhausted {NEWTON_MAX_ITER} iterations");
    Err(RealtyFinanceError::Convergence {
        function: "CET".into(),
        iterations: NEWTON_MAX_ITER,
        last_delta,
    })
}

fn bisection(flows: &[Money], mut lo: Rate, mut hi: Rate) -> RealtyFinanceResult<(Rate, u32)> {
    if lo == hi {
        return Ok((lo, 0));
    }
    let mut npv_lo = npv_at(flows, lo)?;
    let mut last_delta = npv_lo;

    for iter in 1..=BISECTION_MAX_ITER {
        let mid = (lo + hi) / dec!(2);
        if mid == lo || mid == hi {
            // Bracket cannot shrink further at Decimal precision
            debug!("CET bisection hit precision floor with npv={last_delta}");
            return Ok((mid, iter));
        }
        let npv_mid = npv_at(flows, mid)?;
        last_delta = npv_mid;

        trace!("CET bisection iter={iter} bracket=[{lo}, {hi}] npv={npv_mid}");

        if npv_mid.abs() < NPV_TOLERANCE {
            return Ok((mid, iter));
        }
        if opposite_signs(npv_lo, npv_mid) {
            hi = mid;
        } else {
            lo = mid;
            npv_lo = npv_mid;
        }
    }

    warn!("CET bisection exhausted {BISECTION_MAX_ITER} iterations");
    Err(RealtyFinanceError::Convergence {
        function: "CET".into(),
        iterations: BISECTION_MAX_ITER,
        last_delta: last_delta.abs(),
    })
}

fn opposite_signs(a: Money, b: Money) -> bool {
    !a.is_zero() && !b.is_zero() && a.is_sign_positive() != b.is_sign_positive()
}

fn npv_at(flows: &[Money], rate: Rate) -> RealtyFinanceResult<Money> {
    checked_npv(rate, flows).ok_or_else(|| RealtyFinanceError::Convergence {
        function: "CET".into(),
        iterations: 0,
        last_delta: Decimal::MAX,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
