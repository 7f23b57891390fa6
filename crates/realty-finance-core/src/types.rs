use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RealtyFinanceError;
use crate::time_value::checked_sum;
use crate::RealtyFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.01 = 1%). Never as percentages.
pub type Rate = Decimal;

/// Longest plan accepted, in months (50 years).
pub const MAX_TERM_MONTHS: u32 = 600;

/// Which financing mechanism produced a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Financing,
    Consortium,
}

/// A single month of a plan's cash flows, seen from the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    /// Month number (1-indexed).
    pub month: u32,
    /// Total paid by the buyer this month (installment plus fees).
    pub outflow: Money,
    /// Amount received by the buyer this month (consortium credit draw).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflow: Option<Money>,
    /// Amortization breakdown; only financing schedules carry it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<AmortizationBreakdown>,
}

impl CashFlowEntry {
    /// Outflow minus inflow: positive when the buyer pays.
    pub fn net_outflow(&self) -> Money {
        self.outflow - self.inflow.unwrap_or(Decimal::ZERO)
    }
}

/// PRICE table columns for one financing month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationBreakdown {
    pub opening_balance: Money,
    pub interest: Money,
    pub amortization: Money,
    pub insurance: Money,
    pub fees: Money,
    pub closing_balance: Money,
}

/// Monthly cash-flow schedule for one plan. Length equals the plan term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub plan: PlanKind,
    /// Amount financed, or the consortium credit letter value.
    pub principal: Money,
    /// Month-0 outflow (upfront fee or initial bid), zero when none.
    pub upfront_charge: Money,
    /// Own funds put into the purchase at signing. Paid by the buyer but not
    /// part of the financed cost, so the CET leaves it out.
    #[serde(default, skip_serializing_if = "Decimal::is_zero")]
    pub down_payment: Money,
    /// Monthly rate when the schedule is a fee-free annuity at that rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_rate: Option<Rate>,
    pub entries: Vec<CashFlowEntry>,
}

impl CashFlowSchedule {
    pub fn term(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Sum of every outflow including the month-0 charge and down payment.
    pub fn total_paid(&self) -> RealtyFinanceResult<Money> {
        let installments = self.installment_total()?;
        self.month_zero_outflow()
            .and_then(|m0| m0.checked_add(installments))
            .ok_or_else(|| RealtyFinanceError::overflow("total_paid"))
    }

    /// Mean monthly outflow, excluding month 0.
    pub fn average_installment(&self) -> RealtyFinanceResult<Money> {
        if self.entries.is_empty() {
            return Ok(Decimal::ZERO);
        }
        Ok(self.installment_total()? / Decimal::from(self.term()))
    }

    /// Everything paid at signing: down payment plus upfront charge.
    pub fn month_zero_outflow(&self) -> Option<Money> {
        self.down_payment.checked_add(self.upfront_charge)
    }

    fn installment_total(&self) -> RealtyFinanceResult<Money> {
        checked_sum(self.entries.iter().map(|e| e.outflow))
            .ok_or_else(|| RealtyFinanceError::overflow("total_paid"))
    }

    /// Buyer-side signed flows for months 0..=term (payments negative).
    pub fn signed_flows(&self) -> RealtyFinanceResult<Vec<Money>> {
        let month_zero = self
            .month_zero_outflow()
            .ok_or_else(|| RealtyFinanceError::overflow("down_payment"))?;
        let mut flows = Vec::with_capacity(self.entries.len() + 1);
        flows.push(-month_zero);
        flows.extend(self.entries.iter().map(|e| -e.net_outflow()));
        Ok(flows)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
