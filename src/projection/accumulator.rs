//! Running totals for age-bracketed projections

use rust_decimal::Decimal;

use super::result::ItemCostResult;
use crate::money::MoneyContext;
use crate::rates::CostRange;

/// Totals folded over the age brackets of one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BracketTotals {
    /// Duration-weighted average annual cost
    pub annual: Decimal,
    pub lifetime_low: Decimal,
    pub lifetime_high: Decimal,
    pub lifetime_average: Decimal,
    /// Brackets that contributed
    pub brackets: usize,
}

impl BracketTotals {
    /// Add one occurrence of the unit cost, without duration weighting.
    /// Each one-time bracket contributes again, even when several overlap.
    pub fn add_one_time(&mut self, rate: &CostRange) -> Option<()> {
        let next = Self {
            annual: self.annual,
            lifetime_low: self.lifetime_low.checked_add(rate.low)?,
            lifetime_high: self.lifetime_high.checked_add(rate.high)?,
            lifetime_average: self.lifetime_average.checked_add(rate.average)?,
            brackets: self.brackets + 1,
        };
        *self = next;
        Some(())
    }

    /// Add a recurring bracket's annual costs over `duration` years.
    /// The annual total is weighted by `duration / total_duration`; a zero
    /// total duration leaves it untouched.
    pub fn add_recurring(
        &mut self,
        annual: &CostRange,
        duration: Decimal,
        total_duration: Decimal,
    ) -> Option<()> {
        let annual_total = if total_duration.is_zero() {
            self.annual
        } else {
            let weighted = annual
                .average
                .checked_mul(duration)?
                .checked_div(total_duration)?;
            self.annual.checked_add(weighted)?
        };

        let next = Self {
            annual: annual_total,
            lifetime_low: self.lifetime_low.checked_add(annual.low.checked_mul(duration)?)?,
            lifetime_high: self.lifetime_high.checked_add(annual.high.checked_mul(duration)?)?,
            lifetime_average: self
                .lifetime_average
                .checked_add(annual.average.checked_mul(duration)?)?,
            brackets: self.brackets + 1,
        };
        *self = next;
        Some(())
    }

    pub fn finish(&self, money: &MoneyContext) -> ItemCostResult {
        let lifetime = money.round(self.lifetime_average);
        ItemCostResult {
            annual: money.round(self.annual),
            lifetime,
            low: money.round(self.lifetime_low),
            high: money.round(self.lifetime_high),
            average: lifetime,
            is_one_time: false,
        }
    }
}
