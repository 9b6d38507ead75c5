//! Care Cost CLI
//!
//! Command-line interface for projecting lifetime costs of a care plan

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use care_cost_engine::plan::load_plan;
use care_cost_engine::rates::DEFAULT_REFERENCE_PATH;
use care_cost_engine::runner::{write_csv, write_json};
use care_cost_engine::{EngineConfig, PlanRunner, PlanSummary};
use clap::{Parser, ValueEnum};
use log::info;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(
    name = "care-cost",
    version,
    about = "Project lifetime costs for the line items of a care plan",
    long_about = "Project lifetime costs for the line items of a care plan.\n\
                  \n\
                  Examples:\n\
                    care-cost --plan plan.json                       # Summary to terminal\n\
                    care-cost --plan plan.csv --output costs.csv     # Per-item CSV\n\
                    care-cost --plan plan.json --format json         # JSON report to stdout"
)]
struct Cli {
    /// Care plan file (.json or .csv)
    #[arg(long)]
    plan: PathBuf,

    /// Directory holding procedure_rates.csv and location_factors.csv
    #[arg(long, default_value = DEFAULT_REFERENCE_PATH)]
    reference_dir: PathBuf,

    /// Write per-item results here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Output format for per-item results
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Location (ZIP) code applied to the evaluee
    #[arg(long)]
    zip: Option<String>,

    /// Life expectancy used when neither item nor evaluee has one
    #[arg(long)]
    default_life_expectancy: Option<Decimal>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut plan = load_plan(&cli.plan).with_context(|| format!("failed to load plan {}", cli.plan.display()))?;
    if let Some(zip) = cli.zip {
        plan.evaluee.zip_code = Some(zip);
    }

    let mut config = EngineConfig::default();
    if let Some(life_expectancy) = cli.default_life_expectancy {
        config.default_life_expectancy = life_expectancy;
    }

    let runner = PlanRunner::from_reference_dir(&cli.reference_dir, config)
        .with_context(|| format!("failed to load reference data from {}", cli.reference_dir.display()))?;
    let tables = runner.projector().reference();
    info!(
        "Using {} procedure rates and {} location factors, default life expectancy {}",
        tables.procedure_count(),
        tables.location_count(),
        runner.projector().config().default_life_expectancy
    );
    let projection = runner.run(&plan);
    let summary = projection.summary();

    match &cli.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("unable to create {}", path.display()))?;
            let writer = BufWriter::new(file);
            match cli.format {
                OutputFormat::Csv => write_csv(&projection, writer)?,
                OutputFormat::Json => write_json(&projection, writer)?,
            }
            info!("Results written to {}", path.display());
            let mut stdout = io::stdout().lock();
            print_summary(&mut stdout, &plan.evaluee.name, &summary)?;
            writeln!(stdout, "\nFull results written to: {}", path.display())?;
        }
        None => {
            // results own stdout, so the table goes to stderr
            match cli.format {
                OutputFormat::Csv => write_csv(&projection, io::stdout().lock())?,
                OutputFormat::Json => write_json(&projection, io::stdout().lock())?,
            }
            print_summary(&mut io::stderr().lock(), &plan.evaluee.name, &summary)?;
        }
    }

    for failure in &projection.failures {
        eprintln!("warning: item {} not projected: {}", failure.id, failure.error);
    }

    Ok(())
}

fn print_summary<W: Write>(out: &mut W, name: &str, summary: &PlanSummary) -> io::Result<()> {
    writeln!(out, "Care Cost Projection")?;
    writeln!(out, "====================\n")?;
    if !name.is_empty() {
        writeln!(out, "Evaluee: {}\n", name)?;
    }

    writeln!(
        out,
        "{:<18} {:>6} {:>14} {:>16} {:>16} {:>16}",
        "Category", "Items", "Annual", "Lifetime", "Low", "High"
    )?;
    for (category, totals) in &summary.by_category {
        writeln!(
            out,
            "{:<18} {:>6} {:>14} {:>16} {:>16} {:>16}",
            category.as_str(),
            totals.items,
            totals.annual,
            totals.lifetime,
            totals.low,
            totals.high,
        )?;
    }

    writeln!(out, "\nSummary:")?;
    writeln!(out, "  Items Projected: {}", summary.item_count)?;
    writeln!(out, "  Items Failed: {}", summary.failed_count)?;
    writeln!(out, "  Total Annual: ${}", summary.total_annual)?;
    writeln!(out, "  Total Lifetime: ${}", summary.total_lifetime)?;
    writeln!(out, "  Lifetime Range: ${} - ${}", summary.total_low, summary.total_high)?;
    writeln!(out, "  One-Time Total: ${}", summary.one_time_total)?;
    writeln!(out, "  Recurring Lifetime: ${}", summary.recurring_lifetime_total)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_cost_engine::plan::load_plan_json_from_reader;
    use care_cost_engine::{CostProjector, NoReferenceData};

    #[test]
    fn test_print_summary_to_any_writer() {
        let json = r#"{
            "evaluee": {"name": "J. Doe", "currentAge": 60, "lifeExpectancy": 70},
            "items": [
                {"id": "pt", "category": "therapyFollowUp", "baseRate": 100, "frequency": "2x per year"},
                {"id": "mri", "category": "diagnostics", "baseRate": 900, "frequency": "one time"}
            ]
        }"#;
        let plan = load_plan_json_from_reader(json.as_bytes()).unwrap();
        let runner = PlanRunner::new(CostProjector::new(NoReferenceData, EngineConfig::default()));
        let summary = runner.run(&plan).summary();

        let mut out = Vec::new();
        print_summary(&mut out, &plan.evaluee.name, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Evaluee: J. Doe"));
        assert!(text.lines().any(|l| l.starts_with("therapy") && l.contains("2000.00")));
        assert!(text.lines().any(|l| l.starts_with("diagnostic") && l.contains("900.00")));
        assert!(text.contains("Total Lifetime: $2900.00"));
    }
}
