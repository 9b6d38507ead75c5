//! Care plan data structures

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule::AgeIncrement;

/// Care plan category of a line item
///
/// Serializes as snake_case; deserializes through [`CareCategory::from_label`]
/// so any label spelling is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CareCategory {
    Medical,
    Therapy,
    Medication,
    Equipment,
    Supplies,
    Surgical,
    Interventional,
    Diagnostic,
    Transportation,
    HomeCare,
    HomeModification,
    Other,
}

impl CareCategory {
    /// Parse a category label case-insensitively; unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "medical" | "physician" | "evaluation" | "physicianevaluation" | "physicianfollowup" => {
                CareCategory::Medical
            }
            "therapy" | "therapies" | "therapyevaluation" | "therapyfollowup" => CareCategory::Therapy,
            "medication" | "medications" | "pharmacy" => CareCategory::Medication,
            "equipment" | "dme" => CareCategory::Equipment,
            "supplies" | "supply" => CareCategory::Supplies,
            "surgical" | "surgery" => CareCategory::Surgical,
            "interventional" => CareCategory::Interventional,
            "diagnostic" | "diagnostics" | "imaging" | "lab" => CareCategory::Diagnostic,
            "transportation" => CareCategory::Transportation,
            "homecare" | "homehealth" | "attendantcare" => CareCategory::HomeCare,
            "homemodification" | "homemodifications" => CareCategory::HomeModification,
            _ => CareCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CareCategory::Medical => "medical",
            CareCategory::Therapy => "therapy",
            CareCategory::Medication => "medication",
            CareCategory::Equipment => "equipment",
            CareCategory::Supplies => "supplies",
            CareCategory::Surgical => "surgical",
            CareCategory::Interventional => "interventional",
            CareCategory::Diagnostic => "diagnostic",
            CareCategory::Transportation => "transportation",
            CareCategory::HomeCare => "home_care",
            CareCategory::HomeModification => "home_modification",
            CareCategory::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for CareCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CareCategory::from_label(&label))
    }
}

impl Default for CareCategory {
    fn default() -> Self {
        CareCategory::Other
    }
}

/// Everything the engine needs to cost one line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComputationRequest {
    /// Unit cost before any adjustment
    pub base_rate: Decimal,

    /// Recurrence text, e.g. "2x per year"
    #[serde(default)]
    pub frequency: String,

    /// Procedure (CPT) code for fee-schedule override
    #[serde(default, alias = "cptCode")]
    pub procedure_code: Option<String>,

    /// Location (ZIP) code for geographic adjustment
    #[serde(default, alias = "zipCode")]
    pub location_code: Option<String>,

    #[serde(default)]
    pub start_age: Option<Decimal>,

    #[serde(default)]
    pub end_age: Option<Decimal>,

    /// Defaults to 0 when unknown
    #[serde(default)]
    pub current_age: Option<Decimal>,

    /// Falls back to the engine default when unknown
    #[serde(default)]
    pub life_expectancy: Option<Decimal>,

    /// Independently sourced unit-cost quotes
    #[serde(default, alias = "costResources")]
    pub quotes: Vec<Decimal>,

    /// Age brackets with their own recurrence
    #[serde(default, alias = "ageIncrements")]
    pub increments: Vec<AgeIncrement>,
}

impl CostComputationRequest {
    pub fn new(base_rate: Decimal, frequency: impl Into<String>) -> Self {
        Self {
            base_rate,
            frequency: frequency.into(),
            procedure_code: None,
            location_code: None,
            start_age: None,
            end_age: None,
            current_age: None,
            life_expectancy: None,
            quotes: Vec::new(),
            increments: Vec::new(),
        }
    }

    pub fn with_procedure_code(mut self, code: impl Into<String>) -> Self {
        self.procedure_code = Some(code.into());
        self
    }

    pub fn with_location(mut self, location_code: impl Into<String>) -> Self {
        self.location_code = Some(location_code.into());
        self
    }

    pub fn with_age_window(mut self, start_age: Decimal, end_age: Decimal) -> Self {
        self.start_age = Some(start_age);
        self.end_age = Some(end_age);
        self
    }

    pub fn with_ages(mut self, current_age: Decimal, life_expectancy: Decimal) -> Self {
        self.current_age = Some(current_age);
        self.life_expectancy = Some(life_expectancy);
        self
    }

    pub fn with_quotes(mut self, quotes: Vec<Decimal>) -> Self {
        self.quotes = quotes;
        self
    }

    pub fn with_increments(mut self, increments: Vec<AgeIncrement>) -> Self {
        self.increments = increments;
        self
    }

    pub fn has_increments(&self) -> bool {
        !self.increments.is_empty()
    }
}

/// A single line item of a care plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareItem {
    /// Identifier unique within the plan
    pub id: String,

    #[serde(default)]
    pub category: CareCategory,

    /// Description of the service or product
    #[serde(default)]
    pub service: String,

    #[serde(flatten)]
    pub request: CostComputationRequest,
}

/// The person a plan is written for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluee {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,

    /// Explicit current age; takes precedence over date of birth
    #[serde(default)]
    pub current_age: Option<Decimal>,

    /// Remaining statistical lifespan horizon used as life expectancy
    #[serde(default)]
    pub life_expectancy: Option<Decimal>,

    #[serde(default)]
    pub zip_code: Option<String>,
}

impl Evaluee {
    /// Age in whole years on the given date, if a date of birth is known
    pub fn age_on(&self, as_of: NaiveDate) -> Option<Decimal> {
        let dob = self.date_of_birth?;
        if as_of < dob {
            return Some(Decimal::ZERO);
        }
        let mut years = as_of.year() - dob.year();
        if (as_of.month(), as_of.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        Some(Decimal::from(years))
    }

    /// Explicit current age, else age derived from date of birth
    pub fn current_age(&self, as_of: NaiveDate) -> Option<Decimal> {
        self.current_age.or_else(|| self.age_on(as_of))
    }
}

/// A complete care plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlan {
    #[serde(default)]
    pub evaluee: Evaluee,

    /// Valuation date for age calculations (defaults to today)
    #[serde(default)]
    pub as_of: Option<NaiveDate>,

    #[serde(default)]
    pub items: Vec<CareItem>,
}

impl CarePlan {
    pub fn new(evaluee: Evaluee, items: Vec<CareItem>) -> Self {
        Self { evaluee, as_of: None, items }
    }

    fn valuation_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Items with evaluee-level age, life expectancy and location filled in
    /// wherever the item leaves them unset
    pub fn resolved_items(&self) -> Vec<CareItem> {
        let current_age = self.evaluee.current_age(self.valuation_date());
        self.items
            .iter()
            .cloned()
            .map(|mut item| {
                let request = &mut item.request;
                if request.current_age.is_none() {
                    request.current_age = current_age;
                }
                if request.life_expectancy.is_none() {
                    request.life_expectancy = self.evaluee.life_expectancy;
                }
                if request.location_code.is_none() {
                    request.location_code = self.evaluee.zip_code.clone();
                }
                item
            })
            .collect()
    }
}
