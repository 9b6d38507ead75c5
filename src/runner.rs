//! Plan runner for batch projections
//!
//! Loads reference data once, then projects every line item of a plan in
//! parallel. Results come back in plan item order.

use std::io::Write;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CalculationError, LoadError};
use crate::plan::{CareItem, CarePlan};
use crate::projection::{CostProjector, EngineConfig, ItemCostResult, ItemFailure, ItemProjection, PlanProjection};
use crate::rates::{LocationFactorLookup, ProcedureRateLookup, RateTables};

/// Projects whole care plans against one set of reference data
pub struct PlanRunner<R> {
    projector: CostProjector<R>,
}

impl PlanRunner<RateTables> {
    /// Runner backed by the reference tables under `path`
    pub fn from_reference_dir<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self, LoadError> {
        let tables = RateTables::load_from(path.as_ref())?;
        Ok(Self::new(CostProjector::new(tables, config)))
    }
}

impl<R> PlanRunner<R>
where
    R: ProcedureRateLookup + LocationFactorLookup,
{
    pub fn new(projector: CostProjector<R>) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &CostProjector<R> {
        &self.projector
    }

    /// Project a single item
    pub fn run_item(&self, item: &CareItem) -> Result<ItemCostResult, CalculationError> {
        self.projector.project(&item.request)
    }

    /// Project every item of a plan; failures are collected, not fatal
    pub fn run(&self, plan: &CarePlan) -> PlanProjection {
        let items = plan.resolved_items();

        let outcomes: Vec<(&CareItem, Result<ItemCostResult, CalculationError>)> = items
            .par_iter()
            .map(|item| (item, self.run_item(item)))
            .collect();

        let mut projection = PlanProjection::new();
        for (item, outcome) in outcomes {
            match outcome {
                Ok(result) => projection.add_item(ItemProjection {
                    id: item.id.clone(),
                    category: item.category,
                    service: item.service.clone(),
                    result,
                }),
                Err(e) => {
                    warn!("Item {} failed: {}", item.id, e);
                    projection.add_failure(ItemFailure {
                        id: item.id.clone(),
                        category: item.category,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Projected {} items ({} failed)",
            projection.items.len(),
            projection.failures.len()
        );
        projection
    }
}

/// Flat CSV output row
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    id: &'a str,
    category: &'a str,
    service: &'a str,
    annual: Decimal,
    lifetime: Decimal,
    low: Decimal,
    high: Decimal,
    average: Decimal,
    is_one_time: bool,
}

/// Write successful item results as CSV, one row per item
pub fn write_csv<W: Write>(projection: &PlanProjection, writer: W) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for item in &projection.items {
        let result = &item.result;
        wtr.serialize(OutputRow {
            id: &item.id,
            category: item.category.as_str(),
            service: &item.service,
            annual: result.annual,
            lifetime: result.lifetime,
            low: result.low,
            high: result.high,
            average: result.average,
            is_one_time: result.is_one_time,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    projection: &'a PlanProjection,
    summary: crate::projection::PlanSummary,
}

/// Write items, failures and the plan summary as pretty JSON
pub fn write_json<W: Write>(projection: &PlanProjection, writer: W) -> Result<(), LoadError> {
    let report = JsonReport {
        projection,
        summary: projection.summary(),
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}
