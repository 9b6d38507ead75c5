//! Care Cost Engine - lifetime cost projection for life care plan line items
//!
//! This library provides:
//! - Recurrence and duration parsing from free-text care schedules
//! - Unit-cost resolution from fee schedules, location factors and quotes
//! - Single-window and age-bracketed lifetime cost projection
//! - Parallel whole-plan projection with per-category summaries

pub mod error;
pub mod money;
pub mod schedule;
pub mod rates;
pub mod plan;
pub mod projection;
pub mod runner;

// Re-export commonly used types
pub use error::{CalculationError, LoadError, ParseError};
pub use money::{round_money, MoneyContext};
pub use schedule::{parse_duration, parse_frequency, AgeIncrement, DurationSpec, Frequency};
pub use rates::{CostRange, LocationFactorLookup, NoReferenceData, ProcedureRateLookup, RateTables};
pub use plan::{CareCategory, CareItem, CarePlan, CostComputationRequest, Evaluee};
pub use projection::{CostProjector, EngineConfig, ItemCostResult, PlanProjection, PlanSummary};
pub use runner::PlanRunner;
