//! Multi-source quote aggregation with IQR outlier trimming

use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::CostRange;
use crate::money::MoneyContext;

/// Aggregate independently sourced quotes with the standard rounding context
pub fn aggregate(quotes: &[Decimal]) -> CostRange {
    aggregate_quotes(quotes, &MoneyContext::STANDARD)
}

/// Aggregate quotes into low / average / high.
///
/// `low` and `high` are the raw extremes. The average is taken over quotes
/// inside `[q1 - 1.5*iqr, q3 + 1.5*iqr]`, where `q1 = sorted[n/4]` and
/// `q3 = sorted[3n/4]` (nearest rank, no interpolation).
pub fn aggregate_quotes(quotes: &[Decimal], money: &MoneyContext) -> CostRange {
    match try_aggregate(quotes) {
        Some(range) => money.round_range(range),
        None => {
            warn!("Quote aggregation overflowed for {} quotes, returning zero range", quotes.len());
            CostRange::default()
        }
    }
}

/// Unrounded aggregation; `None` only on arithmetic overflow
pub(crate) fn try_aggregate(quotes: &[Decimal]) -> Option<CostRange> {
    if quotes.is_empty() {
        debug!("No quotes supplied, returning zero range");
        return Some(CostRange::default());
    }

    let mut sorted = quotes.to_vec();
    sorted.sort();

    let n = sorted.len();
    let low = sorted[0];
    let high = sorted[n - 1];

    let q1 = sorted[n / 4];
    let q3 = sorted[(n * 3) / 4];
    let iqr = q3.checked_sub(q1)?;
    let fence = iqr.checked_mul(dec!(1.5))?;
    let lower_bound = q1.checked_sub(fence)?;
    let upper_bound = q3.checked_add(fence)?;

    let mut total = Decimal::ZERO;
    let mut count = 0u32;
    for quote in sorted.iter().filter(|q| **q >= lower_bound && **q <= upper_bound) {
        total = total.checked_add(*quote)?;
        count += 1;
    }

    let average = if count == 0 {
        Decimal::ZERO
    } else {
        total.checked_div(Decimal::from(count))?
    };

    debug!(
        "Aggregated {} quotes: q1={} q3={} bounds=[{}, {}] kept={}",
        n, q1, q3, lower_bound, upper_bound, count
    );

    Some(CostRange { low, average, high })
}
