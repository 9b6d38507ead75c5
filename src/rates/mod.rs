//! Unit-cost resolution: procedure-code fee schedules, location adjustment
//! factors and multi-source quote aggregation

mod quotes;
mod resolver;
pub mod loader;

pub use quotes::{aggregate, aggregate_quotes};
pub use resolver::RateResolver;
pub use loader::{RateTables, DEFAULT_REFERENCE_PATH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Low / average / high unit cost
///
/// `low <= average <= high` is intended but not enforced; values keep the
/// order in which they were assigned from their source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub low: Decimal,
    pub average: Decimal,
    pub high: Decimal,
}

impl CostRange {
    /// All three values equal
    pub fn flat(value: Decimal) -> Self {
        Self { low: value, average: value, high: value }
    }

    /// Multiply every value, `None` on overflow
    pub fn checked_scale(&self, factor: Decimal) -> Option<Self> {
        Some(Self {
            low: self.low.checked_mul(factor)?,
            average: self.average.checked_mul(factor)?,
            high: self.high.checked_mul(factor)?,
        })
    }
}

/// Fee schedule row for a procedure (CPT) code
///
/// Two percentile families are carried: `mfu_*` (medical fee) and `pfr_*`
/// (professional fee). Cost resolution reads only the professional family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRate {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub mfu_50th: Decimal,
    pub mfu_75th: Decimal,
    pub mfu_90th: Decimal,
    pub pfr_50th: Decimal,
    pub pfr_75th: Decimal,
    pub pfr_90th: Decimal,
}

impl ProcedureRate {
    /// Professional-fee percentiles as low (50th) / average (75th) / high (90th)
    pub fn professional_range(&self) -> CostRange {
        CostRange {
            low: self.pfr_50th,
            average: self.pfr_75th,
            high: self.pfr_90th,
        }
    }
}

/// Geographic adjustment factors for a location (ZIP) code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFactor {
    pub zip: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Medical fee factor (not applied to unit costs)
    pub mfr_factor: Decimal,
    /// Professional fee factor
    pub pfr_factor: Decimal,
}

/// Point lookup of procedure fee schedules; a missing code is `None`, never an error
pub trait ProcedureRateLookup: Send + Sync {
    fn lookup_procedure_rate(&self, code: &str) -> Option<ProcedureRate>;
}

/// Point lookup of location factors; a missing code is `None`, never an error
pub trait LocationFactorLookup: Send + Sync {
    fn lookup_location_factor(&self, location_code: &str) -> Option<LocationFactor>;
}

/// Reference source that answers "not found" for everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceData;

impl ProcedureRateLookup for NoReferenceData {
    fn lookup_procedure_rate(&self, _code: &str) -> Option<ProcedureRate> {
        None
    }
}

impl LocationFactorLookup for NoReferenceData {
    fn lookup_location_factor(&self, _location_code: &str) -> Option<LocationFactor> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_professional_range_uses_pfr_only() {
        let rate = ProcedureRate {
            code: "99213".into(),
            description: String::new(),
            mfu_50th: dec!(1),
            mfu_75th: dec!(2),
            mfu_90th: dec!(3),
            pfr_50th: dec!(80),
            pfr_75th: dec!(110),
            pfr_90th: dec!(150),
        };
        assert_eq!(
            rate.professional_range(),
            CostRange { low: dec!(80), average: dec!(110), high: dec!(150) }
        );
    }

    #[test]
    fn test_checked_scale() {
        let range = CostRange::flat(dec!(100)).checked_scale(dec!(1.25)).unwrap();
        assert_eq!(range, CostRange::flat(dec!(125)));
        assert!(CostRange::flat(Decimal::MAX).checked_scale(dec!(2)).is_none());
    }

    #[test]
    fn test_no_reference_data() {
        assert!(NoReferenceData.lookup_procedure_rate("99213").is_none());
        assert!(NoReferenceData.lookup_location_factor("90210").is_none());
    }
}
