//! Parcel weight in kilograms.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Weight`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WeightError {
    /// The input is not a decimal number.
    #[error("weight must be a number")]
    NotANumber,
    /// The value is below zero.
    #[error("weight cannot be negative")]
    Negative,
    /// The value does not fit the stored precision.
    #[error("weight cannot exceed 99999999.99 kg")]
    TooLarge,
}

/// A non-negative weight in kilograms.
///
/// Stored as `NUMERIC(10, 2)`; values are rounded to two decimal places on
/// construction so what is shown matches what is persisted.
///
/// ```
/// use logistik_core::Weight;
///
/// let w = Weight::parse("2.505").unwrap();
/// assert_eq!(w.to_string(), "2.51");
/// assert!(Weight::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(Decimal);

impl Weight {
    /// Decimal places kept.
    pub const SCALE: u32 = 2;

    /// Largest storable weight, `99_999_999.99` kg.
    pub const MAX: Self = Self(Decimal::from_parts(
        (9_999_999_999_u64 & 0xFFFF_FFFF) as u32,
        (9_999_999_999_u64 >> 32) as u32,
        0,
        false,
        Self::SCALE,
    ));

    /// Build a weight from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`WeightError::Negative`] for values below zero and
    /// [`WeightError::TooLarge`] above [`Self::MAX`] once rounded.
    pub fn new(kg: Decimal) -> Result<Self, WeightError> {
        if kg.is_zero() {
            return Ok(Self(Decimal::ZERO));
        }
        if kg.is_sign_negative() {
            return Err(WeightError::Negative);
        }
        let rounded = kg.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Self::MAX.0 {
            return Err(WeightError::TooLarge);
        }
        Ok(Self(rounded))
    }

    /// Parse a weight from user input such as `"12.5"`.
    ///
    /// # Errors
    ///
    /// Returns [`WeightError`] when the input is not a number or is out of range.
    pub fn parse(s: &str) -> Result<Self, WeightError> {
        let kg: Decimal = s.trim().parse().map_err(|_| WeightError::NotANumber)?;
        Self::new(kg)
    }

    #[must_use]
    pub const fn kilograms(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl TryFrom<Decimal> for Weight {
    type Error = WeightError;

    fn try_from(kg: Decimal) -> Result<Self, Self::Error> {
        Self::new(kg)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_valid_weights() {
        assert_eq!(Weight::parse("0").unwrap().kilograms(), Decimal::ZERO);
        assert_eq!(
            Weight::parse(" 12.5 ").unwrap().kilograms(),
            Decimal::from_str("12.5").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Weight::parse("-0.01"), Err(WeightError::Negative));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Weight::parse("heavy"), Err(WeightError::NotANumber));
        assert_eq!(Weight::parse(""), Err(WeightError::NotANumber));
    }

    #[test]
    fn test_upper_bound() {
        let max = Weight::parse("99999999.99").unwrap();
        assert_eq!(max, Weight::MAX);
        assert_eq!(max.to_string(), "99999999.99");
        assert_eq!(Weight::parse("99999999.994").unwrap(), Weight::MAX);

        assert_eq!(Weight::parse("99999999.995"), Err(WeightError::TooLarge));
        assert_eq!(Weight::parse("100000000"), Err(WeightError::TooLarge));
        assert_eq!(Weight::parse("1000000000"), Err(WeightError::TooLarge));
    }

    #[test]
    fn test_rounds_to_two_places() {
        let w = Weight::parse("1.234").unwrap();
        assert_eq!(w.kilograms(), Decimal::from_str("1.23").unwrap());
    }

    #[test]
    fn test_display_drops_trailing_zeros() {
        assert_eq!(Weight::parse("3.50").unwrap().to_string(), "3.5");
        assert_eq!(Weight::parse("4.00").unwrap().to_string(), "4");
    }
}
