//! Recurrence text parsing ("2x per year", "every 3 months", "3-5 times per year")

use std::str::FromStr;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Parsed recurrence of a care item, in occurrences per year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frequency {
    /// Incurred exactly once; never contributes to annual cost
    OneTime,
    /// Recurring between `low` and `high` times per year (`low <= high`)
    Recurring { low: Decimal, high: Decimal },
}

impl Frequency {
    fn fixed(per_year: Decimal) -> Self {
        Frequency::Recurring { low: per_year, high: per_year }
    }

    pub fn is_one_time(&self) -> bool {
        matches!(self, Frequency::OneTime)
    }

    /// Lower occurrence rate (1 for one-time items)
    pub fn low(&self) -> Decimal {
        match self {
            Frequency::OneTime => Decimal::ONE,
            Frequency::Recurring { low, .. } => *low,
        }
    }

    /// Upper occurrence rate (1 for one-time items)
    pub fn high(&self) -> Decimal {
        match self {
            Frequency::OneTime => Decimal::ONE,
            Frequency::Recurring { high, .. } => *high,
        }
    }

}

type Extractor = fn(&Captures<'_>, &str) -> Result<Frequency, ParseError>;

/// A single ordered matching rule
struct FrequencyRule {
    pattern: Regex,
    extract: Extractor,
}

fn rule(pattern: &str, extract: Extractor) -> FrequencyRule {
    FrequencyRule {
        pattern: Regex::new(pattern).expect("frequency pattern is valid"),
        extract,
    }
}

/// Rules in priority order; first match wins.
///
/// The single-count "times per year" rule refuses a count preceded by a digit
/// or dash so that "3-5 times per year" falls through to the range rule.
fn frequency_rules() -> &'static [FrequencyRule] {
    static RULES: OnceLock<Vec<FrequencyRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            rule(r"one time|once", |_, _| Ok(Frequency::OneTime)),
            rule(r"(\d+(?:\.\d+)?)\s*x\s+per\s+year", |caps, text| {
                Ok(Frequency::fixed(capture_decimal(caps, 1, text)?))
            }),
            rule(r"(?:^|[^\d.\-])(\d+(?:\.\d+)?)\s+times?\s+per\s+year", |caps, text| {
                Ok(Frequency::fixed(capture_decimal(caps, 1, text)?))
            }),
            rule(r"every\s+(\d+(?:\.\d+)?)\s+months?", |caps, text| {
                let months = capture_decimal(caps, 1, text)?;
                if months.is_zero() {
                    return Err(ParseError::ZeroInterval(text.to_string()));
                }
                dec!(12)
                    .checked_div(months)
                    .map(Frequency::fixed)
                    .ok_or_else(|| ParseError::UnrecognizedFrequency(text.to_string()))
            }),
            rule(r"monthly", |_, _| Ok(Frequency::fixed(dec!(12)))),
            rule(r"weekly", |_, _| Ok(Frequency::fixed(dec!(52)))),
            rule(r"daily", |_, _| Ok(Frequency::fixed(dec!(365)))),
            rule(r"(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)\s+times?\s+per\s+year", |caps, text| {
                let a = capture_decimal(caps, 1, text)?;
                let b = capture_decimal(caps, 2, text)?;
                Ok(Frequency::Recurring { low: a.min(b), high: a.max(b) })
            }),
        ]
    })
}

/// Read a numeric capture group as an exact decimal
pub(crate) fn capture_decimal(caps: &Captures<'_>, group: usize, text: &str) -> Result<Decimal, ParseError> {
    caps.get(group)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
        .ok_or_else(|| ParseError::UnrecognizedFrequency(text.to_string()))
}

/// True when the text describes a single occurrence
pub fn is_one_time_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("one time") || lower.contains("once")
}

/// Parse a recurrence description into an annual occurrence range
pub fn parse_frequency(text: &str) -> Result<Frequency, ParseError> {
    if text.is_empty() {
        return Err(ParseError::EmptyFrequency);
    }

    let lower = text.to_lowercase();
    for rule in frequency_rules() {
        if let Some(caps) = rule.pattern.captures(&lower) {
            return (rule.extract)(&caps, text);
        }
    }

    Err(ParseError::UnrecognizedFrequency(text.to_string()))
}
