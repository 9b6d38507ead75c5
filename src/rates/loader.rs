//! CSV-backed reference tables
//!
//! Loads procedure fee schedules and location factors from CSV files in
//! data/reference/ and serves them as in-memory point lookups.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{LocationFactor, LocationFactorLookup, ProcedureRate, ProcedureRateLookup};
use crate::error::LoadError;
use crate::money::parse_amount;

/// Default path to the reference data directory
pub const DEFAULT_REFERENCE_PATH: &str = "data/reference";

const PROCEDURE_RATES_FILE: &str = "procedure_rates.csv";
const LOCATION_FACTORS_FILE: &str = "location_factors.csv";

/// Raw row of procedure_rates.csv
#[derive(Debug, Deserialize)]
struct ProcedureRow {
    code: String,
    #[serde(default)]
    code_description: String,
    mfu_50th: String,
    mfu_75th: String,
    mfu_90th: String,
    pfr_50th: String,
    pfr_75th: String,
    pfr_90th: String,
}

impl ProcedureRow {
    fn into_rate(self) -> Result<ProcedureRate, LoadError> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(LoadError::Invalid("procedure rate row has an empty code".into()));
        }
        Ok(ProcedureRate {
            code,
            description: self.code_description,
            mfu_50th: parse_amount(&self.mfu_50th)?,
            mfu_75th: parse_amount(&self.mfu_75th)?,
            mfu_90th: parse_amount(&self.mfu_90th)?,
            pfr_50th: parse_amount(&self.pfr_50th)?,
            pfr_75th: parse_amount(&self.pfr_75th)?,
            pfr_90th: parse_amount(&self.pfr_90th)?,
        })
    }
}

/// Raw row of location_factors.csv; missing factors default to 1.0
#[derive(Debug, Deserialize)]
struct LocationRow {
    zip: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "state_name")]
    state: Option<String>,
    #[serde(default)]
    mfr_factor: String,
    #[serde(default)]
    pfr_factor: String,
}

impl LocationRow {
    fn into_factor(self) -> Result<LocationFactor, LoadError> {
        let zip = self.zip.trim().to_string();
        if zip.is_empty() {
            return Err(LoadError::Invalid("location factor row has an empty zip".into()));
        }
        Ok(LocationFactor {
            zip,
            city: self.city.filter(|c| !c.is_empty()),
            state: self.state.filter(|s| !s.is_empty()),
            mfr_factor: parse_factor(&self.mfr_factor)?,
            pfr_factor: parse_factor(&self.pfr_factor)?,
        })
    }
}

fn parse_factor(value: &str) -> Result<Decimal, LoadError> {
    if value.trim().is_empty() {
        Ok(Decimal::ONE)
    } else {
        parse_amount(value)
    }
}

/// In-memory procedure and location tables
#[derive(Debug, Clone, Default)]
pub struct RateTables {
    procedures: HashMap<String, ProcedureRate>,
    locations: HashMap<String, LocationFactor>,
}

impl RateTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both tables from the default path
    pub fn load_default() -> Result<Self, LoadError> {
        Self::load_from(Path::new(DEFAULT_REFERENCE_PATH))
    }

    /// Load both tables from a directory; a missing file yields an empty table
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let mut tables = Self::new();

        let procedures = path.join(PROCEDURE_RATES_FILE);
        if procedures.exists() {
            tables.load_procedures(File::open(&procedures)?)?;
        } else {
            info!("No {} in {}, procedure lookups will miss", PROCEDURE_RATES_FILE, path.display());
        }

        let locations = path.join(LOCATION_FACTORS_FILE);
        if locations.exists() {
            tables.load_locations(File::open(&locations)?)?;
        } else {
            info!("No {} in {}, location lookups will miss", LOCATION_FACTORS_FILE, path.display());
        }

        info!(
            "Loaded {} procedure rates and {} location factors",
            tables.procedures.len(),
            tables.locations.len()
        );
        Ok(tables)
    }

    /// Read procedure rates from any CSV source; later rows replace earlier ones
    pub fn load_procedures<R: Read>(&mut self, reader: R) -> Result<usize, LoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;
        for result in csv_reader.deserialize() {
            let row: ProcedureRow = result?;
            self.insert_procedure(row.into_rate()?);
            count += 1;
        }
        Ok(count)
    }

    /// Read location factors from any CSV source; later rows replace earlier ones
    pub fn load_locations<R: Read>(&mut self, reader: R) -> Result<usize, LoadError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut count = 0;
        for result in csv_reader.deserialize() {
            let row: LocationRow = result?;
            self.insert_location(row.into_factor()?);
            count += 1;
        }
        Ok(count)
    }

    pub fn insert_procedure(&mut self, rate: ProcedureRate) {
        self.procedures.insert(rate.code.clone(), rate);
    }

    pub fn insert_location(&mut self, factor: LocationFactor) {
        self.locations.insert(factor.zip.clone(), factor);
    }

    pub fn procedure_count(&self) -> usize {
        self.procedures.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

impl ProcedureRateLookup for RateTables {
    fn lookup_procedure_rate(&self, code: &str) -> Option<ProcedureRate> {
        self.procedures.get(code.trim()).cloned()
    }
}

impl LocationFactorLookup for RateTables {
    fn lookup_location_factor(&self, location_code: &str) -> Option<LocationFactor> {
        self.locations.get(location_code.trim()).cloned()
    }
}
