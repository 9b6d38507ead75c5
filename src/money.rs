//! Decimal rounding context for monetary outputs
//!
//! All engine arithmetic runs on `rust_decimal::Decimal` (28 significant digits).
//! Rounding is applied only where results leave the engine, using an explicit
//! context value rather than process-wide state.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::LoadError;
use crate::rates::CostRange;

/// Rounding rule applied to monetary outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyContext {
    /// Number of fractional digits kept
    pub scale: u32,
    /// Tie-breaking rule
    pub strategy: RoundingStrategy,
}

impl MoneyContext {
    /// Two fractional digits, banker's rounding
    pub const STANDARD: MoneyContext = MoneyContext {
        scale: 2,
        strategy: RoundingStrategy::MidpointNearestEven,
    };

    /// Round to `scale` digits, padding so the output always carries exactly `scale` digits
    pub fn round(&self, value: Decimal) -> Decimal {
        let mut rounded = value.round_dp_with_strategy(self.scale, self.strategy);
        rounded.rescale(self.scale);
        rounded
    }

    pub fn round_range(&self, range: CostRange) -> CostRange {
        CostRange {
            low: self.round(range.low),
            average: self.round(range.average),
            high: self.round(range.high),
        }
    }
}

impl Default for MoneyContext {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Round with the standard monetary context
pub fn round_money(value: Decimal) -> Decimal {
    MoneyContext::STANDARD.round(value)
}

/// Parse an amount from file input, accepting "$1,250.00" style formatting
pub fn parse_amount(text: &str) -> Result<Decimal, LoadError> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    Decimal::from_str(&cleaned).map_err(|source| LoadError::Decimal {
        value: text.to_string(),
        source,
    })
}
