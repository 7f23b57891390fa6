use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::RealtyFinanceError;
use crate::types::{Money, Rate};
use crate::RealtyFinanceResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly periodic rate from a nominal annual rate (annual / 12).
pub fn monthly_from_nominal(annual_rate: Rate) -> Rate {
    annual_rate / MONTHS_PER_YEAR
}

/// Nominal annual rate from a monthly rate (monthly × 12).
pub fn nominal_from_monthly(monthly_rate: Rate) -> Rate {
    monthly_rate * MONTHS_PER_YEAR
}

/// Effective annual rate compounding a monthly rate: (1 + m)^12 - 1.
pub fn effective_from_monthly(monthly_rate: Rate) -> RealtyFinanceResult<Rate> {
    let growth = compound(Decimal::ONE + monthly_rate, 12).ok_or_else(|| {
        RealtyFinanceError::invalid("monthly_rate", "Compounded growth overflows")
    })?;
    Ok(growth - Decimal::ONE)
}

/// Monthly rate equivalent to an effective annual rate: (1 + a)^(1/12) - 1.
pub fn monthly_from_effective(annual_rate: Rate) -> RealtyFinanceResult<Rate> {
    if annual_rate <= dec!(-1) {
        return Err(RealtyFinanceError::invalid(
            "annual_rate",
            "Annual rate must be greater than -100%",
        ));
    }
    if annual_rate.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let root = (Decimal::ONE + annual_rate)
        .checked_powd(Decimal::ONE / MONTHS_PER_YEAR)
        .ok_or_else(|| RealtyFinanceError::invalid("annual_rate", "Twelfth root overflows"))?;
    Ok(root - Decimal::ONE)
}

/// base^n by repeated multiplication; None on overflow.
pub fn compound(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

/// Discount factor (1 + r)^-n.
pub fn discount_factor(rate: Rate, n: u32) -> RealtyFinanceResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(RealtyFinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    Decimal::ONE
        .checked_div(Decimal::ONE + rate)
        .and_then(|v| compound(v, n))
        .ok_or_else(|| RealtyFinanceError::invalid("rate", "Discount factor overflows"))
}

/// Level installment amortizing `principal` over `periods` at `rate` per period
/// (PRICE system): P·r / (1 - (1 + r)^-n), or P / n at a zero rate.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> RealtyFinanceResult<Money> {
    if periods == 0 {
        return Err(RealtyFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let denom = Decimal::ONE - discount_factor(rate, periods)?;
    if denom.is_zero() {
        return Err(RealtyFinanceError::invalid(
            "rate",
            "Annuity factor is zero for this rate",
        ));
    }
    principal
        .checked_mul(rate)
        .and_then(|x| x.checked_div(denom))
        .ok_or_else(|| RealtyFinanceError::overflow("principal"))
}

/// Sum of amounts, None on overflow.
pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(x))
}

/// Net Present Value of periodic cash flows, index 0 undiscounted.
///
/// Uses checked arithmetic so trial rates far from the root cannot overflow;
/// returns None when they do.
pub fn checked_npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let v = Decimal::ONE.checked_div(one_plus_r)?;

    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(v)?;
        }
        result = result.checked_add(cf.checked_mul(discount)?)?;
    }
    Some(result)
}

/// Net Present Value of periodic cash flows, index 0 undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RealtyFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(RealtyFinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    checked_npv(rate, cash_flows)
        .ok_or_else(|| RealtyFinanceError::invalid("rate", "NPV overflows at this rate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(dec!(0.0), &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(npv(dec!(-1), &[dec!(1)]).is_err());
    }

    #[test]
    fn test_checked_npv_overflow_is_none() {
        let cfs = vec![dec!(1_000_000); 600];
        assert!(checked_npv(dec!(-0.9), &cfs).is_none());
    }

    #[test]
    fn test_annuity_payment_known_answer() {
        // 100k at 1% monthly over 360 months ≈ 1028.61
        let pmt = annuity_payment(dec!(100_000), dec!(0.01), 360).unwrap();
        assert!((pmt - dec!(1028.61)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let pmt = annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods() {
        assert!(annuity_payment(dec!(1200), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_annuity_payment_overflow_is_error() {
        let result = annuity_payment(dec!(10_000_000_000_000_000_000_000_000_000), dec!(10), 12);
        assert!(matches!(
            result,
            Err(RealtyFinanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum(vec![dec!(1.5), dec!(2.5)]), Some(dec!(4)));
        assert_eq!(checked_sum(vec![Decimal::MAX, Decimal::ONE]), None);
    }

    #[test]
    fn test_effective_from_monthly() {
        let eff = effective_from_monthly(dec!(0.01)).unwrap();
        assert!((eff - dec!(0.126825)).abs() < dec!(0.000001), "got {eff}");
    }

    #[test]
    fn test_monthly_from_effective_inverts() {
        let m = monthly_from_effective(dec!(0.10)).unwrap();
        let back = effective_from_monthly(m).unwrap();
        assert!((back - dec!(0.10)).abs() < dec!(0.0000001), "got {back}");
    }

    #[test]
    fn test_nominal_conversions() {
        assert_eq!(monthly_from_nominal(dec!(0.12)), dec!(0.01));
        assert_eq!(nominal_from_monthly(dec!(0.01)), dec!(0.12));
    }
}
