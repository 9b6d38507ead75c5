//! Load care plans from JSON or CSV files

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::Reader;
use log::info;
use rust_decimal::Decimal;

use super::{CareCategory, CareItem, CarePlan, CostComputationRequest, Evaluee};
use crate::error::LoadError;
use crate::money::parse_amount;

/// Raw CSV row; one line item per row (age brackets and quotes need JSON)
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    service: String,
    frequency: String,
    base_rate: String,
    #[serde(default)]
    cpt_code: String,
    #[serde(default)]
    zip_code: String,
    #[serde(default)]
    start_age: String,
    #[serde(default)]
    end_age: String,
    #[serde(default)]
    current_age: String,
    #[serde(default)]
    life_expectancy: String,
}

impl CsvRow {
    fn to_item(self) -> Result<CareItem, LoadError> {
        if self.id.trim().is_empty() {
            return Err(LoadError::Invalid("care item row has an empty id".into()));
        }

        let mut request = CostComputationRequest::new(parse_amount(&self.base_rate)?, self.frequency);
        request.procedure_code = non_empty(self.cpt_code);
        request.location_code = non_empty(self.zip_code);
        request.start_age = optional_decimal(&self.start_age)?;
        request.end_age = optional_decimal(&self.end_age)?;
        request.current_age = optional_decimal(&self.current_age)?;
        request.life_expectancy = optional_decimal(&self.life_expectancy)?;

        Ok(CareItem {
            id: self.id.trim().to_string(),
            category: CareCategory::from_label(&self.category),
            service: self.service,
            request,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn optional_decimal(value: &str) -> Result<Option<Decimal>, LoadError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_amount(value).map(Some)
    }
}

/// Load line items from a CSV file into a plan with an empty evaluee
pub fn load_plan_csv<P: AsRef<Path>>(path: P) -> Result<CarePlan, LoadError> {
    load_plan_csv_from_reader(File::open(path)?)
}

/// Load line items from any CSV source
pub fn load_plan_csv_from_reader<R: Read>(reader: R) -> Result<CarePlan, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut items = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        items.push(row.to_item()?);
    }

    info!("Loaded {} care items from CSV", items.len());
    Ok(CarePlan::new(Evaluee::default(), items))
}

/// Load a full plan (evaluee, items, brackets, quotes) from a JSON file
pub fn load_plan_json<P: AsRef<Path>>(path: P) -> Result<CarePlan, LoadError> {
    load_plan_json_from_reader(BufReader::new(File::open(path)?))
}

/// Load a full plan from any JSON source
pub fn load_plan_json_from_reader<R: Read>(reader: R) -> Result<CarePlan, LoadError> {
    let plan: CarePlan = serde_json::from_reader(reader)?;
    info!("Loaded {} care items from JSON", plan.items.len());
    Ok(plan)
}

/// Load a plan, choosing the format from the file extension
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<CarePlan, LoadError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("json") => load_plan_json(path),
        Some("csv") => load_plan_csv(path),
        _ => Err(LoadError::Invalid(format!(
            "unsupported plan file type: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PLAN_CSV: &str = r#"id,category,service,frequency,base_rate,cpt_code,zip_code,start_age,end_age,current_age,life_expectancy
1,Therapy,Physical therapy,2x per year,100.00,97110,,40,70,,
2,Medication,Analgesic,monthly,"$1,250.00",,,,,55,80
3,Surgical,Knee replacement,one time,45000,,10001,,,,
"#;

    #[test]
    fn test_load_plan_csv() {
        let plan = load_plan_csv_from_reader(PLAN_CSV.as_bytes()).unwrap();
        assert_eq!(plan.items.len(), 3);

        let first = &plan.items[0];
        assert_eq!(first.category, CareCategory::Therapy);
        assert_eq!(first.request.procedure_code.as_deref(), Some("97110"));
        assert_eq!(first.request.location_code, None);
        assert_eq!(first.request.start_age, Some(dec!(40)));
        assert_eq!(first.request.end_age, Some(dec!(70)));

        let third = &plan.items[2];
        assert_eq!(third.request.base_rate, dec!(45000));
        assert_eq!(third.request.location_code.as_deref(), Some("10001"));
    }

    #[test]
    fn test_load_plan_json() {
        let json = r#"{
            "evaluee": {"name": "J. Doe", "currentAge": 45, "lifeExpectancy": 78.5, "zipCode": "10001"},
            "items": [
                {
                    "id": "ot",
                    "category": "therapy",
                    "baseRate": 150,
                    "frequency": "weekly",
                    "ageIncrements": [
                        {"startAge": 45, "endAge": 55, "frequency": "weekly"},
                        {"startAge": 55, "endAge": 78, "frequency": "2x per year"}
                    ]
                },
                {
                    "id": "mri",
                    "category": "diagnostic",
                    "baseRate": 0,
                    "frequency": "every 24 months",
                    "quotes": ["900.00", "950.00", "1000.00"]
                }
            ]
        }"#;
        let plan = load_plan_json_from_reader(json.as_bytes()).unwrap();
        assert_eq!(plan.evaluee.current_age, Some(dec!(45)));
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].request.increments.len(), 2);
        assert_eq!(plan.items[1].request.quotes, vec![dec!(900), dec!(950), dec!(1000)]);
    }

    #[test]
    fn test_load_plan_json_category_labels() {
        let json = r#"{
            "items": [
                {"id": "a", "category": "physicianFollowUp", "baseRate": 100, "frequency": "monthly"},
                {"id": "b", "category": "homeCare", "baseRate": 100, "frequency": "weekly"},
                {"id": "c", "category": "Therapy", "baseRate": 100, "frequency": "weekly"},
                {"id": "d", "category": "home care", "baseRate": 100, "frequency": "weekly"},
                {"id": "e", "category": "diagnostics", "baseRate": 100, "frequency": "one time"},
                {"id": "f", "category": "homeModification", "baseRate": 100, "frequency": "one time"},
                {"id": "g", "category": "acupuncture", "baseRate": 100, "frequency": "monthly"}
            ]
        }"#;
        let plan = load_plan_json_from_reader(json.as_bytes()).unwrap();
        let categories: Vec<CareCategory> = plan.items.iter().map(|i| i.category).collect();
        assert_eq!(
            categories,
            vec![
                CareCategory::Medical,
                CareCategory::HomeCare,
                CareCategory::Therapy,
                CareCategory::HomeCare,
                CareCategory::Diagnostic,
                CareCategory::HomeModification,
                CareCategory::Other,
            ]
        );
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(load_plan("plan.xlsx"), Err(LoadError::Invalid(_))));
    }
}
