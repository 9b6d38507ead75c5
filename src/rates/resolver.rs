//! Best-effort unit-cost resolution
//!
//! Rate adjustment never fails: missing reference rows fall back to the
//! unadjusted value, and any arithmetic failure falls back to the base rate.

use log::{debug, warn};
use rust_decimal::Decimal;

use super::quotes::try_aggregate;
use super::{CostRange, LocationFactorLookup, ProcedureRateLookup};
use crate::money::MoneyContext;

/// Resolves a base rate into a low / average / high unit cost
pub struct RateResolver<'a, R: ?Sized> {
    reference: &'a R,
    money: MoneyContext,
}

impl<'a, R> RateResolver<'a, R>
where
    R: ProcedureRateLookup + LocationFactorLookup + ?Sized,
{
    pub fn new(reference: &'a R) -> Self {
        Self {
            reference,
            money: MoneyContext::STANDARD,
        }
    }

    pub fn with_money(mut self, money: MoneyContext) -> Self {
        self.money = money;
        self
    }

    /// Resolve a unit cost range.
    ///
    /// Non-empty `quotes` take over entirely and the other inputs are ignored.
    /// Otherwise the base rate is replaced by the procedure's professional-fee
    /// percentiles (when the code is known) and then scaled by the location's
    /// professional-fee factor (when the location is known).
    pub fn resolve(
        &self,
        base_rate: Decimal,
        procedure_code: Option<&str>,
        location_code: Option<&str>,
        quotes: &[Decimal],
    ) -> CostRange {
        let resolved = if quotes.is_empty() {
            self.adjust(base_rate, procedure_code, location_code)
        } else {
            debug!("Resolving rate from {} quotes", quotes.len());
            try_aggregate(quotes)
        };

        match resolved {
            Some(range) => self.money.round_range(range),
            None => {
                warn!("Rate adjustment failed for base rate {}, using base rate", base_rate);
                CostRange::flat(base_rate)
            }
        }
    }

    fn adjust(
        &self,
        base_rate: Decimal,
        procedure_code: Option<&str>,
        location_code: Option<&str>,
    ) -> Option<CostRange> {
        let mut range = CostRange::flat(base_rate);

        if let Some(code) = non_blank(procedure_code) {
            match self.reference.lookup_procedure_rate(code) {
                Some(rate) => {
                    debug!("Using professional fee percentiles for procedure {}", code);
                    range = rate.professional_range();
                }
                None => warn!("No fee schedule for procedure code {}, using base rate", code),
            }
        }

        if let Some(location) = non_blank(location_code) {
            match self.reference.lookup_location_factor(location) {
                Some(factor) => {
                    debug!("Applying location factor {} for {}", factor.pfr_factor, location);
                    range = range.checked_scale(factor.pfr_factor)?;
                }
                None => warn!("No location factor for {}, leaving costs unadjusted", location),
            }
        }

        Some(range)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
