use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// A receipt amount, always held at exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Rounds half away from zero to cents and pins the scale to 2, so
    /// `3.5` and `3.50` produce identical values and identical output.
    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut d = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        d.rescale(2);
        if d.is_zero() {
            d.set_sign_positive(true);
        }
        Money(d)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn fractional_digits(self) -> u32 {
        self.0.scale()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money::from_decimal(-self.0)
    }
}
