use crate::types::PaychanError;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// Number of fractional units in one whole unit.
pub const FRAC_UNIT: i64 = 1_000_000_000;

const FRAC_DIGITS: usize = 9;

/// Fixed-point amount of a single currency.
///
/// `whole` and `fractional` never carry opposite signs and `fractional` stays
/// within `(-FRAC_UNIT, FRAC_UNIT)`, so every amount has exactly one
/// representation and derived equality is amount equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    #[serde(default)]
    pub whole: i64,
    #[serde(default)]
    pub fractional: i64,
    pub ticker: String,
}

impl Coin {
    pub fn new(whole: i64, fractional: i64, ticker: impl Into<String>) -> Self {
        Self {
            whole,
            fractional,
            ticker: ticker.into(),
        }
    }

    pub fn zero(ticker: impl Into<String>) -> Self {
        Self::new(0, 0, ticker)
    }

    pub fn validate(&self) -> Result<(), PaychanError> {
        if !is_valid_ticker(&self.ticker) {
            return Err(PaychanError::InvalidCoin(format!(
                "invalid ticker {:?}",
                self.ticker
            )));
        }
        if self.fractional <= -FRAC_UNIT || self.fractional >= FRAC_UNIT {
            return Err(PaychanError::InvalidCoin(format!(
                "fractional part {} out of range",
                self.fractional
            )));
        }
        if (self.whole > 0 && self.fractional < 0) || (self.whole < 0 && self.fractional > 0) {
            return Err(PaychanError::InvalidCoin(
                "whole and fractional parts have opposite signs".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_positive(&self) -> bool {
        self.units() > 0
    }

    pub fn is_zero(&self) -> bool {
        self.units() == 0
    }

    pub fn same_type(&self, other: &Coin) -> bool {
        self.ticker == other.ticker
    }

    pub fn compare(&self, other: &Coin) -> Result<Ordering, PaychanError> {
        self.ensure_same_type(other)?;
        Ok(self.units().cmp(&other.units()))
    }

    pub fn checked_add(&self, other: &Coin) -> Result<Coin, PaychanError> {
        self.ensure_same_type(other)?;
        Self::from_units(self.units() + other.units(), &self.ticker)
    }

    pub fn checked_sub(&self, other: &Coin) -> Result<Coin, PaychanError> {
        self.ensure_same_type(other)?;
        Self::from_units(self.units() - other.units(), &self.ticker)
    }

    fn ensure_same_type(&self, other: &Coin) -> Result<(), PaychanError> {
        if self.same_type(other) {
            Ok(())
        } else {
            Err(PaychanError::CurrencyMismatch {
                expected: self.ticker.clone(),
                got: other.ticker.clone(),
            })
        }
    }

    fn units(&self) -> i128 {
        self.whole as i128 * FRAC_UNIT as i128 + self.fractional as i128
    }

    // Division truncates toward zero, so both parts keep the sign of `units`.
    fn from_units(units: i128, ticker: &str) -> Result<Coin, PaychanError> {
        let whole = i64::try_from(units / FRAC_UNIT as i128)
            .map_err(|_| PaychanError::InvalidCoin(format!("amount overflow in {}", ticker)))?;
        let fractional = (units % FRAC_UNIT as i128) as i64;
        Ok(Coin::new(whole, fractional, ticker))
    }
}

fn is_valid_ticker(ticker: &str) -> bool {
    (3..=4).contains(&ticker.len()) && ticker.bytes().all(|b| b.is_ascii_uppercase())
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.units();
        let sign = if units < 0 { "-" } else { "" };
        let abs = units.unsigned_abs();
        let whole = abs / FRAC_UNIT as u128;
        let frac = abs % FRAC_UNIT as u128;
        if frac == 0 {
            write!(f, "{}{} {}", sign, whole, self.ticker)
        } else {
            let digits = format!("{:0width$}", frac, width = FRAC_DIGITS);
            write!(
                f,
                "{}{}.{} {}",
                sign,
                whole,
                digits.trim_end_matches('0'),
                self.ticker
            )
        }
    }
}

impl FromStr for Coin {
    type Err = PaychanError;

    /// Parses `"2.50 DOGE"`, `"10 DOGE"` or `"-0.5 IOV"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PaychanError::InvalidCoin(format!("cannot parse {:?}", s));

        let mut parts = s.split_whitespace();
        let (amount, ticker) = match (parts.next(), parts.next(), parts.next()) {
            (Some(amount), Some(ticker), None) => (amount, ticker),
            _ => return Err(invalid()),
        };

        let (negative, amount) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
        if whole.is_empty()
            || frac.len() > FRAC_DIGITS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fractional: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = FRAC_DIGITS)
                .parse()
                .map_err(|_| invalid())?
        };

        let coin = if negative {
            Coin::new(-whole, -fractional, ticker)
        } else {
            Coin::new(whole, fractional, ticker)
        };
        coin.validate()?;
        Ok(coin)
    }
}
