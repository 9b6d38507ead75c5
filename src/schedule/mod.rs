//! Care schedules: recurrence parsing, duration resolution and age brackets

mod frequency;
mod duration;

pub use frequency::{parse_frequency, is_one_time_text, Frequency};
pub use duration::{parse_duration, DurationSpec, DEFAULT_LIFE_EXPECTANCY};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An age bracket with its own recurrence
///
/// Only brackets with `end_age > start_age` take part in projections;
/// degenerate brackets are skipped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeIncrement {
    pub start_age: Decimal,
    pub end_age: Decimal,
    #[serde(rename = "frequency", alias = "frequencyText")]
    pub frequency_text: String,
    #[serde(default)]
    pub is_one_time: bool,
}

impl AgeIncrement {
    pub fn new(start_age: Decimal, end_age: Decimal, frequency_text: impl Into<String>) -> Self {
        Self {
            start_age,
            end_age,
            frequency_text: frequency_text.into(),
            is_one_time: false,
        }
    }

    /// Mark the bracket as a single occurrence regardless of its text
    pub fn one_time(mut self) -> Self {
        self.is_one_time = true;
        self
    }

    /// Width of the bracket in years (may be zero or negative); `None` on overflow
    pub fn span(&self) -> Option<Decimal> {
        self.end_age.checked_sub(self.start_age)
    }

    pub fn is_valid(&self) -> bool {
        self.end_age > self.start_age
    }
}

/// Total years covered by the valid brackets; `None` on overflow
pub fn total_duration(increments: &[AgeIncrement]) -> Option<Decimal> {
    increments
        .iter()
        .filter(|inc| inc.is_valid())
        .try_fold(Decimal::ZERO, |total, inc| total.checked_add(inc.span()?))
}
