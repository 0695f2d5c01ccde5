//! Token amounts.
//!
//! Whitelist prices arrive as integer strings in the payment token's
//! smallest unit. They stay integers here; only [`Display`](fmt::Display)
//! turns them into a decimal string, so no precision is lost to floats.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("token decimals {0} exceed the supported maximum of 38")]
    TooManyDecimals(u32),
}

/// An amount of the payment token, in base units, with its precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    pub base_units: u128,
    pub decimals: u32,
}

impl TokenAmount {
    pub fn new(base_units: u128, decimals: u32) -> Result<Self, PriceError> {
        if decimals > 38 {
            return Err(PriceError::TooManyDecimals(decimals));
        }
        Ok(Self { base_units, decimals })
    }

    fn divisor(&self) -> u128 {
        10u128.pow(self.decimals)
    }

    #[must_use]
    pub fn whole(&self) -> u128 {
        self.base_units / self.divisor()
    }

    #[must_use]
    pub fn fraction(&self) -> u128 {
        self.base_units % self.divisor()
    }

    /// Total for `quantity` units, saturating at `u128::MAX`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            base_units: self.base_units.saturating_mul(u128::from(quantity)),
            decimals: self.decimals,
        }
    }
}

impl fmt::Display for TokenAmount {
    /// Decimal rendering with trailing zeros trimmed: `0.5`, `1`, `12.25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.whole();
        let fraction = self.fraction();
        if fraction == 0 {
            return write!(f, "{}", whole);
        }
        let padded = format!("{:0width$}", fraction, width = self.decimals as usize);
        write!(f, "{}.{}", whole, padded.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_token_at_twelve_decimals() {
        let p = TokenAmount::new(500_000_000_000, 12).unwrap();
        assert_eq!(p.to_string(), "0.5");
        assert_eq!(p.whole(), 0);
    }

    #[test]
    fn same_raw_amount_differs_by_precision() {
        // 10^9 and 10^12 give prices three orders apart.
        let raw = 1_000_000_000_000;
        assert_eq!(TokenAmount::new(raw, 12).unwrap().to_string(), "1");
        assert_eq!(TokenAmount::new(raw, 9).unwrap().to_string(), "1000");
    }

    #[test]
    fn small_fractions_keep_leading_zeros() {
        assert_eq!(TokenAmount::new(1250, 6).unwrap().to_string(), "0.00125");
        assert_eq!(TokenAmount::new(12_250_000, 6).unwrap().to_string(), "12.25");
    }

    #[test]
    fn zero_decimals() {
        assert_eq!(TokenAmount::new(42, 0).unwrap().to_string(), "42");
    }

    #[test]
    fn rejects_excess_precision() {
        assert_eq!(TokenAmount::new(1, 39), Err(PriceError::TooManyDecimals(39)));
        assert!(TokenAmount::new(1, 38).is_ok());
    }

    #[test]
    fn multiplies_by_quantity() {
        let p = TokenAmount::new(500_000_000_000, 12).unwrap();
        assert_eq!(p.times(3).to_string(), "1.5");
    }
}
