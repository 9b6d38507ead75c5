//! Lifetime cost projection for care plan line items

mod accumulator;
mod engine;
mod result;

pub use accumulator::BracketTotals;
pub use engine::{CostProjector, EngineConfig, DEFAULT_INCREMENT_FREQUENCY};
pub use result::{CategoryTotals, ItemCostResult, ItemFailure, ItemProjection, PlanProjection, PlanSummary};
