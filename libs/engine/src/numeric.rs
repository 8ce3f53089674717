//! Decimal arithmetic helpers
//!
//! All arithmetic is performed in arbitrary-precision decimal with HALF_UP
//! rounding at the configured scale. Addition and subtraction are exact;
//! multiplication and division round after the operation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Default rounding scale (decimal places)
pub const DEFAULT_SCALE: u32 = 10;

/// HALF_UP at the given scale.
pub fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

pub fn mul(a: Decimal, b: Decimal, scale: u32) -> Decimal {
    round_to_scale(a * b, scale)
}

/// Checked division; `None` when the divisor is zero.
pub fn div(a: Decimal, b: Decimal, scale: u32) -> Option<Decimal> {
    if b.is_zero() {
        return None;
    }
    a.checked_div(b).map(|q| round_to_scale(q, scale))
}

pub fn rem(a: Decimal, b: Decimal) -> Option<Decimal> {
    if b.is_zero() {
        return None;
    }
    a.checked_rem(b)
}

/// Exponentiation. Integer exponents multiply exactly; fractional exponents
/// fall back to binary doubles, which the caller reports as precision loss.
pub fn pow(base: Decimal, exponent: Decimal, scale: u32) -> Option<(Decimal, bool)> {
    if exponent.fract().is_zero() {
        let exp = exponent.trunc().to_i64()?;
        let result = pow_integer(base, exp, scale)?;
        return Some((result, false));
    }

    let base_f = base.to_f64()?;
    let exp_f = exponent.to_f64()?;
    let result = base_f.powf(exp_f);
    if !result.is_finite() {
        return None;
    }
    Decimal::from_f64(result).map(|d| (round_to_scale(d, scale), true))
}

fn pow_integer(base: Decimal, exponent: i64, scale: u32) -> Option<Decimal> {
    if exponent == 0 {
        return Some(Decimal::ONE);
    }
    let negative = exponent < 0;
    let mut remaining = exponent.unsigned_abs();
    let mut result = Decimal::ONE;
    let mut factor = base;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.checked_mul(factor)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            factor = factor.checked_mul(factor)?;
        }
    }
    if negative {
        div(Decimal::ONE, result, scale)
    } else {
        Some(round_to_scale(result, scale))
    }
}

/// Square root through binary doubles (reported as precision loss).
pub fn sqrt(value: Decimal, scale: u32) -> Option<Decimal> {
    if value < Decimal::ZERO {
        return None;
    }
    let f = value.to_f64()?;
    Decimal::from_f64(f.sqrt()).map(|d| round_to_scale(d, scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn test_half_up_rounding() {
        assert_eq!(round_to_scale(d("0.00000000005"), 10), d("0.0000000001"));
        assert_eq!(round_to_scale(d("-0.00000000005"), 10), d("-0.0000000001"));
        assert_eq!(round_to_scale(d("1.25"), 1), d("1.3"));
    }

    #[test]
    fn test_division_rounds_at_scale() {
        let q = div(d("1"), d("3"), 10).unwrap();
        assert_eq!(q, d("0.3333333333"));
        assert!(div(d("1"), Decimal::ZERO, 10).is_none());
    }

    #[test]
    fn test_addition_is_exact() {
        // a + b - a == b for decimals within scale
        let a = d("0.1");
        let b = d("0.2");
        assert_eq!(a + b - a, b);
    }

    #[test]
    fn test_integer_power_is_exact() {
        let (result, lossy) = pow(d("2"), d("10"), 10).unwrap();
        assert_eq!(result, d("1024"));
        assert!(!lossy);

        let (result, lossy) = pow(d("2"), d("-2"), 10).unwrap();
        assert_eq!(result, d("0.25"));
        assert!(!lossy);
    }

    #[test]
    fn test_fractional_power_reports_loss() {
        let (result, lossy) = pow(d("9"), d("0.5"), 10).unwrap();
        assert!(lossy);
        assert_eq!(result, d("3"));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(sqrt(d("144"), 10).unwrap(), d("12"));
        assert!(sqrt(d("-1"), 10).is_none());
    }
}
