//! Care plan data structures and plan file loading

mod data;
pub mod loader;

pub use data::{CareCategory, CareItem, CarePlan, CostComputationRequest, Evaluee};
pub use loader::{load_plan, load_plan_csv, load_plan_csv_from_reader, load_plan_json, load_plan_json_from_reader};
