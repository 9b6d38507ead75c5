//! Duration resolution: explicit age window, one-time, duration clause, or
//! remaining life expectancy

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::frequency::{capture_decimal, is_one_time_text};
use crate::error::ParseError;

/// Life expectancy used when none is supplied (years)
pub const DEFAULT_LIFE_EXPECTANCY: Decimal = dec!(30.5);

/// Years of applicability, `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSpec {
    pub low: Decimal,
    pub high: Decimal,
}

impl DurationSpec {
    pub fn fixed(years: Decimal) -> Self {
        Self { low: years, high: years }
    }

}

fn fixed_years_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"for\s+(\d+(?:\.\d+)?)\s+years?").expect("duration pattern is valid"))
}

fn range_years_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"for\s+(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)\s+years?").expect("duration pattern is valid")
    })
}

/// Resolve how many years an item applies for.
///
/// An explicit `start_age`/`end_age` pair takes precedence over the text.
/// Without a recognized duration clause the remaining life expectancy is used.
pub fn parse_duration(
    text: &str,
    current_age: Decimal,
    life_expectancy: Option<Decimal>,
    start_age: Option<Decimal>,
    end_age: Option<Decimal>,
) -> Result<DurationSpec, ParseError> {
    if text.is_empty() {
        return Err(ParseError::EmptyFrequency);
    }

    if let (Some(start), Some(end)) = (start_age, end_age) {
        if start > end {
            return Err(ParseError::InvalidAgeRange { start, end });
        }
        let years = end.checked_sub(start).ok_or(ParseError::Overflow)?;
        return Ok(DurationSpec::fixed(years));
    }

    if is_one_time_text(text) {
        return Ok(DurationSpec::fixed(Decimal::ONE));
    }

    let life_expectancy = life_expectancy.unwrap_or(DEFAULT_LIFE_EXPECTANCY);
    let mut remaining = life_expectancy
        .checked_sub(current_age)
        .ok_or(ParseError::Overflow)?;
    if remaining.is_sign_negative() {
        warn!(
            "Current age {} exceeds life expectancy {}, using zero remaining years",
            current_age, life_expectancy
        );
        remaining = Decimal::ZERO;
    }

    let lower = text.to_lowercase();

    if let Some(caps) = fixed_years_pattern().captures(&lower) {
        return Ok(DurationSpec::fixed(capture_decimal(&caps, 1, text)?));
    }

    if let Some(caps) = range_years_pattern().captures(&lower) {
        let a = capture_decimal(&caps, 1, text)?;
        let b = capture_decimal(&caps, 2, text)?;
        return Ok(DurationSpec { low: a.min(b), high: a.max(b) });
    }

    if lower.contains("lifetime") {
        return Ok(DurationSpec::fixed(remaining));
    }

    debug!("No duration clause in '{}', using remaining years {}", text, remaining);
    Ok(DurationSpec::fixed(remaining))
}
