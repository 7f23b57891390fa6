//! Brazilian-locale rendering: `R$ 1.234.567,89` and `12,34%`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Money, Rate};

/// Render an amount as Brazilian reais with two decimals.
pub fn brl(amount: Money) -> String {
    format!("R$ {}", group_br(amount, 2))
}

/// Render a decimal rate (0.1234) as a percentage (`12,34%`).
pub fn percent_br(rate: Rate, decimals: u32) -> String {
    format!("{}%", group_br(rate * Decimal::ONE_HUNDRED, decimals))
}

/// Dot thousands separator, comma decimal separator.
fn group_br(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", decimals as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_brl_grouping() {
        assert_eq!(brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(brl(dec!(999)), "R$ 999,00");
        assert_eq!(brl(dec!(1000)), "R$ 1.000,00");
        assert_eq!(brl(Decimal::ZERO), "R$ 0,00");
    }

    #[test]
    fn test_brl_negative() {
        assert_eq!(brl(dec!(-4800.5)), "R$ -4.800,50");
    }

    #[test]
    fn test_percent_br() {
        assert_eq!(percent_br(dec!(0.1234), 2), "12,34%");
        assert_eq!(percent_br(dec!(0.12682503), 4), "12,6825%");
        assert_eq!(percent_br(dec!(0.09), 0), "9%");
    }
}
