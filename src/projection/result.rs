//! Projection output structures

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::plan::CareCategory;

/// Projected cost of one line item; monetary fields carry 2 fractional digits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCostResult {
    /// Average annual recurring cost (always 0 for one-time items)
    pub annual: Decimal,
    /// Average lifetime cost
    pub lifetime: Decimal,
    /// Low lifetime cost
    pub low: Decimal,
    /// High lifetime cost
    pub high: Decimal,
    /// Average lifetime cost (same value as `lifetime`)
    pub average: Decimal,
    pub is_one_time: bool,
}

/// Result for a successfully projected plan item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemProjection {
    pub id: String,
    pub category: CareCategory,
    pub service: String,
    pub result: ItemCostResult,
}

/// A plan item that could not be projected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: String,
    pub category: CareCategory,
    pub error: String,
}

/// Per-category subtotal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub items: usize,
    pub annual: Decimal,
    pub lifetime: Decimal,
    pub low: Decimal,
    pub high: Decimal,
}

impl CategoryTotals {
    fn add(&mut self, result: &ItemCostResult) {
        self.items += 1;
        self.annual = self.annual.saturating_add(result.annual);
        self.lifetime = self.lifetime.saturating_add(result.lifetime);
        self.low = self.low.saturating_add(result.low);
        self.high = self.high.saturating_add(result.high);
    }
}

/// Complete plan projection, in plan item order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanProjection {
    pub items: Vec<ItemProjection>,
    pub failures: Vec<ItemFailure>,
}

impl PlanProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: ItemProjection) {
        self.items.push(item);
    }

    pub fn add_failure(&mut self, failure: ItemFailure) {
        self.failures.push(failure);
    }

    /// Plan totals; failed items are excluded
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            item_count: self.items.len(),
            failed_count: self.failures.len(),
            ..Default::default()
        };

        for item in &self.items {
            let result = &item.result;
            summary.total_annual = summary.total_annual.saturating_add(result.annual);
            summary.total_lifetime = summary.total_lifetime.saturating_add(result.lifetime);
            summary.total_low = summary.total_low.saturating_add(result.low);
            summary.total_high = summary.total_high.saturating_add(result.high);
            if result.is_one_time {
                summary.one_time_total = summary.one_time_total.saturating_add(result.lifetime);
            } else {
                summary.recurring_lifetime_total = summary.recurring_lifetime_total.saturating_add(result.lifetime);
            }
            summary.by_category.entry(item.category).or_default().add(result);
        }

        summary
    }
}

/// Summary statistics for a plan; totals saturate at the decimal range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub item_count: usize,
    pub failed_count: usize,
    pub total_annual: Decimal,
    pub total_lifetime: Decimal,
    pub total_low: Decimal,
    pub total_high: Decimal,
    pub one_time_total: Decimal,
    pub recurring_lifetime_total: Decimal,
    pub by_category: BTreeMap<CareCategory, CategoryTotals>,
}
