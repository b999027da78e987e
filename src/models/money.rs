//! Money type for representing currency amounts
//!
//! Internally stores a `Decimal` so sums of many lines never drift. The
//! formatted string form (`"€ 1234,50"`) only exists at the storage and
//! display boundary.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::config::Settings;

/// Symbol used when neither the caller, the project nor the user chose one
pub const DEFAULT_CURRENCY_SYMBOL: &str = "€";

/// A signed monetary amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create a Money amount from hundredths of the currency unit
    ///
    /// # Examples
    /// ```
    /// use budget_planner::models::Money;
    /// let amount = Money::from_cents(1050); // 10,50
    /// assert_eq!(amount.format_with_symbol("€"), "€ 10,50");
    /// ```
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Parse a formatted amount, degrading to zero on anything unparsable
    ///
    /// A `-` before the first digit makes the amount negative. Every other
    /// character outside `[0-9,.]` is discarded, commas act as decimal
    /// separators, and the longest leading number is kept. The result is
    /// rounded to cents, half away from zero.
    ///
    /// # Examples
    /// ```
    /// use budget_planner::models::Money;
    /// assert_eq!(Money::parse_lenient("€ 1 234,56"), Money::from_cents(123456));
    /// assert_eq!(Money::parse_lenient("-€ 50,00"), Money::from_cents(-5000));
    /// assert_eq!(Money::parse_lenient("n/a"), Money::zero());
    /// ```
    pub fn parse_lenient(text: &str) -> Self {
        let mut negative = false;
        let mut seen_digit = false;
        let mut cleaned = String::with_capacity(text.len());

        for ch in text.chars() {
            match ch {
                '0'..='9' => {
                    seen_digit = true;
                    cleaned.push(ch);
                }
                ',' | '.' => cleaned.push('.'),
                '-' if !seen_digit => negative = true,
                _ => {}
            }
        }

        // Keep digits up to the second separator
        let mut end = 0;
        let mut seen_point = false;
        for (i, ch) in cleaned.char_indices() {
            if ch == '.' {
                if seen_point {
                    break;
                }
                seen_point = true;
            }
            end = i + 1;
        }

        let number = cleaned[..end].trim_end_matches('.');
        if !number.bytes().any(|b| b.is_ascii_digit()) {
            return Self::zero();
        }

        let number = if number.starts_with('.') {
            format!("0{}", number)
        } else {
            number.to_string()
        };

        let value = match Decimal::from_str(&number) {
            Ok(value) => value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            Err(_) => return Self::zero(),
        };

        if negative {
            Self(-value)
        } else {
            Self(value)
        }
    }

    /// Format with a currency symbol: two decimals, comma separator
    ///
    /// # Examples
    /// ```
    /// use budget_planner::models::Money;
    /// let amount = Money::parse_lenient("1234.5");
    /// assert_eq!(amount.format_with_symbol("€"), "€ 1234,50");
    /// ```
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.2}", rounded.abs()).replace('.', ",");

        if rounded < Decimal::ZERO {
            format!("-{} {}", symbol, digits)
        } else {
            format!("{} {}", symbol, digits)
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol(DEFAULT_CURRENCY_SYMBOL))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Pick the display symbol for an amount
///
/// Priority: explicit override, the project's recorded currency, the user's
/// preference, then [`DEFAULT_CURRENCY_SYMBOL`]. Blank values are skipped.
pub fn resolve_currency_symbol<'a>(
    explicit: Option<&'a str>,
    project_currency: Option<&'a str>,
    settings: Option<&'a Settings>,
) -> &'a str {
    let preference = settings.map(|s| s.currency_symbol.as_str());

    [explicit, project_currency, preference]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CURRENCY_SYMBOL)
}
