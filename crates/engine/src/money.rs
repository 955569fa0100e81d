use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **whole rupiah**.
///
/// Use this type for **all** monetary values in the engine (journal line
/// amounts, report balances, totals) to avoid floating-point drift. Rupiah
/// carries no fractional unit, so the raw value is the display value.
///
/// The value is signed:
/// - positive = debit-side increase / income
/// - negative = credit-side increase / decrease
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(110_000);
/// assert_eq!(amount.amount(), 110_000);
/// assert_eq!(amount.to_string(), "Rp110.000");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as thousands separator):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("100000".parse::<Money>().unwrap().amount(), 100_000);
/// assert_eq!("100.000".parse::<Money>().unwrap().amount(), 100_000);
/// assert!("1.00".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from whole rupiah.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns the raw signed value.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        let offset = digits.len() % 3;
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - offset) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}Rp{grouped}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a rupiah string into a signed amount.
    ///
    /// Accepts an optional leading `+`/`-`, an optional `Rp` prefix, and `.`
    /// or `,` as thousands separator.
    ///
    /// Validation rules:
    /// - separator groups after the first must be exactly 3 digits
    ///   (rejects `1.00`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        let rest = rest
            .strip_prefix("Rp")
            .or_else(|| rest.strip_prefix("rp"))
            .unwrap_or(rest)
            .trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut groups = rest.split('.');
        let head = groups.next().ok_or_else(invalid)?;
        if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let mut digits = head.to_string();
        for group in groups {
            if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            digits.push_str(group);
        }

        let amount: i64 = digits.parse().map_err(|_| overflow())?;

        let signed = if sign < 0 {
            amount.checked_neg().ok_or_else(overflow)?
        } else {
            amount
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_rupiah() {
        assert_eq!(Money::new(0).to_string(), "Rp0");
        assert_eq!(Money::new(1).to_string(), "Rp1");
        assert_eq!(Money::new(100).to_string(), "Rp100");
        assert_eq!(Money::new(1000).to_string(), "Rp1.000");
        assert_eq!(Money::new(110_000).to_string(), "Rp110.000");
        assert_eq!(Money::new(1_000_000).to_string(), "Rp1.000.000");
        assert_eq!(Money::new(-50_000).to_string(), "-Rp50.000");
    }

    #[test]
    fn parse_accepts_separators_and_prefix() {
        assert_eq!("100000".parse::<Money>().unwrap().amount(), 100_000);
        assert_eq!("100.000".parse::<Money>().unwrap().amount(), 100_000);
        assert_eq!("1,000,000".parse::<Money>().unwrap().amount(), 1_000_000);
        assert_eq!("Rp50.000".parse::<Money>().unwrap().amount(), 50_000);
        assert_eq!("-10.000".parse::<Money>().unwrap().amount(), -10_000);
        assert_eq!("  +500 ".parse::<Money>().unwrap().amount(), 500);
    }

    #[test]
    fn parse_rejects_malformed_groups() {
        assert!("1.00".parse::<Money>().is_err());
        assert!("1.0000".parse::<Money>().is_err());
        assert!(".000".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }
}
