use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the zero-padded amount column in an EFT record.
pub const AMOUNT_WIDTH: usize = 11;

/// Fixed surcharge applied to billed totals before they become debit amounts.
pub fn markup_rate() -> Decimal {
    Decimal::new(115, 2)
}

/// An amount in minor units (cents).
///
/// Amounts live as integers everywhere inside the engine; the 11-digit
/// zero-padded text form only exists at the EFT serialization boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts a billed total in currency units to a debit amount:
    /// `total * 1.15 * 100`, truncated toward zero. `None` when the result
    /// does not fit in minor units.
    pub fn from_billed_total(total: Decimal) -> Option<Self> {
        total
            .checked_mul(markup_rate())?
            .checked_mul(Decimal::ONE_HUNDRED)?
            .trunc()
            .to_i64()
            .map(Cents)
    }

    pub fn checked_add(self, rhs: Cents) -> Option<Cents> {
        self.0.checked_add(rhs.0).map(Cents)
    }

    /// Sum of `amounts`, or `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Cents>>(amounts: I) -> Option<Cents> {
        amounts.into_iter().try_fold(Cents::ZERO, Cents::checked_add)
    }

    /// Currency-unit value with two fraction digits.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// The 11-character zero-padded form written into EFT records.
    pub fn to_fixed_width(self) -> String {
        format!("{:0width$}", self.0, width = AMOUNT_WIDTH)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}
