//! Cost projection engine for single-window and age-bracketed care items

use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::accumulator::BracketTotals;
use super::result::ItemCostResult;
use crate::error::{CalculationError, ParseError};
use crate::money::MoneyContext;
use crate::plan::CostComputationRequest;
use crate::rates::{CostRange, LocationFactorLookup, ProcedureRateLookup, RateResolver};
use crate::schedule::{
    parse_duration, parse_frequency, total_duration, DurationSpec, Frequency, DEFAULT_LIFE_EXPECTANCY,
};

/// Frequency assumed for an age-bracketed item that has no brackets
pub const DEFAULT_INCREMENT_FREQUENCY: &str = "1x per year";

/// Configuration for the projection engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Life expectancy used when a request has none
    pub default_life_expectancy: Decimal,

    /// Frequency text used when a bracketed item has no brackets
    pub default_increment_frequency: String,

    /// Rounding applied to outputs
    pub money: MoneyContext,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_life_expectancy: DEFAULT_LIFE_EXPECTANCY,
            default_increment_frequency: DEFAULT_INCREMENT_FREQUENCY.to_string(),
            money: MoneyContext::STANDARD,
        }
    }
}

/// Annual low / average / high cost at the given unit cost and frequency.
///
/// low = rate.low * freq.low, high = rate.high * freq.high,
/// average = rate.average * (freq.low + freq.high) / 2.
fn annual_cost(rate: &CostRange, frequency: &Frequency) -> Option<CostRange> {
    Some(CostRange {
        low: rate.low.checked_mul(frequency.low())?,
        average: rate
            .average
            .checked_mul(frequency.low().checked_add(frequency.high())?)?
            .checked_div(dec!(2))?,
        high: rate.high.checked_mul(frequency.high())?,
    })
}

/// Lifetime cost of an annual range over a duration range
fn lifetime_cost(annual: &CostRange, duration: &DurationSpec) -> Option<CostRange> {
    Some(CostRange {
        low: annual.low.checked_mul(duration.low)?,
        average: annual
            .average
            .checked_mul(duration.low.checked_add(duration.high)?)?
            .checked_div(dec!(2))?,
        high: annual.high.checked_mul(duration.high)?,
    })
}

/// Main projection engine
///
/// Holds no mutable state; one engine can serve any number of threads.
pub struct CostProjector<R> {
    reference: R,
    config: EngineConfig,
}

impl<R> CostProjector<R>
where
    R: ProcedureRateLookup + LocationFactorLookup,
{
    /// Create a new engine with the given reference data and config
    pub fn new(reference: R, config: EngineConfig) -> Self {
        Self { reference, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reference(&self) -> &R {
        &self.reference
    }

    pub fn parse_frequency(&self, text: &str) -> Result<Frequency, ParseError> {
        parse_frequency(text)
    }

    pub fn parse_duration(
        &self,
        text: &str,
        current_age: Decimal,
        life_expectancy: Option<Decimal>,
        start_age: Option<Decimal>,
        end_age: Option<Decimal>,
    ) -> Result<DurationSpec, ParseError> {
        let life_expectancy = life_expectancy.unwrap_or(self.config.default_life_expectancy);
        parse_duration(text, current_age, Some(life_expectancy), start_age, end_age)
    }

    /// Resolve a unit cost range; never fails
    pub fn resolve_rate(
        &self,
        base_rate: Decimal,
        procedure_code: Option<&str>,
        location_code: Option<&str>,
        quotes: &[Decimal],
    ) -> CostRange {
        RateResolver::new(&self.reference)
            .with_money(self.config.money)
            .resolve(base_rate, procedure_code, location_code, quotes)
    }

    /// Aggregate quotes with the engine's rounding
    pub fn aggregate(&self, quotes: &[Decimal]) -> CostRange {
        crate::rates::aggregate_quotes(quotes, &self.config.money)
    }

    fn resolve_request_rate(&self, request: &CostComputationRequest) -> CostRange {
        self.resolve_rate(
            request.base_rate,
            request.procedure_code.as_deref(),
            request.location_code.as_deref(),
            &request.quotes,
        )
    }

    /// Project a request, using its age brackets when it has any
    pub fn project(&self, request: &CostComputationRequest) -> Result<ItemCostResult, CalculationError> {
        if request.has_increments() {
            Ok(self.project_item_with_increments(request))
        } else {
            self.project_item(request)
        }
    }

    /// Project an item over a single age window
    pub fn project_item(&self, request: &CostComputationRequest) -> Result<ItemCostResult, CalculationError> {
        let frequency = self
            .parse_frequency(&request.frequency)
            .map_err(CalculationError::Frequency)?;

        let duration = self
            .parse_duration(
                &request.frequency,
                request.current_age.unwrap_or(Decimal::ZERO),
                request.life_expectancy,
                request.start_age,
                request.end_age,
            )
            .map_err(CalculationError::duration)?;

        let rate = self.resolve_request_rate(request);
        self.cost_single_window(&rate, &frequency, &duration)
    }

    fn cost_single_window(
        &self,
        rate: &CostRange,
        frequency: &Frequency,
        duration: &DurationSpec,
    ) -> Result<ItemCostResult, CalculationError> {
        let money = &self.config.money;
        if frequency.is_one_time() {
            debug!("One-time item at {:?}", rate);
            let once = money.round_range(*rate);
            return Ok(ItemCostResult {
                annual: money.round(Decimal::ZERO),
                lifetime: once.average,
                low: once.low,
                high: once.high,
                average: once.average,
                is_one_time: true,
            });
        }

        let overflow = || CalculationError::Overflow;
        let annual = annual_cost(rate, frequency).ok_or_else(overflow)?;
        let lifetime = lifetime_cost(&annual, duration).ok_or_else(overflow)?;
        debug!(
            "Annual {:?} over {}-{} years gives lifetime {:?}",
            annual, duration.low, duration.high, lifetime
        );

        let average = money.round(lifetime.average);
        Ok(ItemCostResult {
            annual: money.round(annual.average),
            lifetime: average,
            low: money.round(lifetime.low),
            high: money.round(lifetime.high),
            average,
            is_one_time: false,
        })
    }

    fn project_default_frequency(
        &self,
        request: &CostComputationRequest,
        rate: &CostRange,
    ) -> Result<ItemCostResult, CalculationError> {
        let text = &self.config.default_increment_frequency;
        let frequency = self.parse_frequency(text).map_err(CalculationError::Frequency)?;
        let duration = self
            .parse_duration(
                text,
                request.current_age.unwrap_or(Decimal::ZERO),
                request.life_expectancy,
                request.start_age,
                request.end_age,
            )
            .map_err(CalculationError::duration)?;
        self.cost_single_window(rate, &frequency, &duration)
    }

    /// Project an item whose recurrence changes across age brackets.
    ///
    /// Brackets with unparseable frequencies or non-positive spans are
    /// skipped. Without any brackets the item is projected over its own
    /// window at the default once-per-year frequency.
    pub fn project_item_with_increments(&self, request: &CostComputationRequest) -> ItemCostResult {
        let rate = self.resolve_request_rate(request);

        if request.increments.is_empty() {
            warn!("No age increments supplied, projecting at the default frequency");
            return self.project_default_frequency(request, &rate).unwrap_or_else(|e| {
                error!("Default projection failed: {}", e);
                ItemCostResult::default()
            });
        }

        let total = total_duration(&request.increments).unwrap_or_else(|| {
            warn!("Total bracket duration overflowed, annual cost will not be weighted");
            Decimal::ZERO
        });
        let mut totals = BracketTotals::default();

        for increment in &request.increments {
            let frequency = match self.parse_frequency(&increment.frequency_text) {
                Ok(frequency) => frequency,
                Err(e) => {
                    warn!(
                        "Skipping age increment {}-{}: {}",
                        increment.start_age, increment.end_age, e
                    );
                    continue;
                }
            };

            let Some(duration) = increment.span() else {
                warn!(
                    "Skipping age increment {}-{}: duration overflow",
                    increment.start_age, increment.end_age
                );
                continue;
            };
            if duration <= Decimal::ZERO {
                warn!(
                    "Skipping age increment {}-{}: non-positive duration",
                    increment.start_age, increment.end_age
                );
                continue;
            }

            let added = if increment.is_one_time || frequency.is_one_time() {
                totals.add_one_time(&rate)
            } else {
                annual_cost(&rate, &frequency)
                    .and_then(|annual| totals.add_recurring(&annual, duration, total))
            };

            if added.is_none() {
                warn!(
                    "Skipping age increment {}-{}: cost overflow",
                    increment.start_age, increment.end_age
                );
            }
        }

        debug!("Folded {} of {} age increments", totals.brackets, request.increments.len());
        totals.finish(&self.config.money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{LocationFactor, NoReferenceData, ProcedureRate};
    use crate::schedule::AgeIncrement;

    fn engine() -> CostProjector<NoReferenceData> {
        CostProjector::new(NoReferenceData, EngineConfig::default())
    }

    struct Tables;

    impl ProcedureRateLookup for Tables {
        fn lookup_procedure_rate(&self, code: &str) -> Option<ProcedureRate> {
            (code == "97110").then(|| ProcedureRate {
                code: code.into(),
                description: String::new(),
                mfu_50th: dec!(1),
                mfu_75th: dec!(1),
                mfu_90th: dec!(1),
                pfr_50th: dec!(40),
                pfr_75th: dec!(50),
                pfr_90th: dec!(60),
            })
        }
    }

    impl LocationFactorLookup for Tables {
        fn lookup_location_factor(&self, location_code: &str) -> Option<LocationFactor> {
            (location_code == "10001").then(|| LocationFactor {
                zip: location_code.into(),
                city: None,
                state: None,
                mfr_factor: dec!(9),
                pfr_factor: dec!(1.5),
            })
        }
    }

    #[test]
    fn test_recurring_explicit_window() {
        let request = CostComputationRequest::new(dec!(100), "2x per year").with_age_window(dec!(40), dec!(70));
        let result = engine().project_item(&request).unwrap();
        assert_eq!(
            result,
            ItemCostResult {
                annual: dec!(200.00),
                lifetime: dec!(6000.00),
                low: dec!(6000.00),
                high: dec!(6000.00),
                average: dec!(6000.00),
                is_one_time: false,
            }
        );
    }

    #[test]
    fn test_one_time_item() {
        let request = CostComputationRequest::new(dec!(500), "one time");
        let result = engine().project_item(&request).unwrap();
        assert_eq!(
            result,
            ItemCostResult {
                annual: dec!(0.00),
                lifetime: dec!(500.00),
                low: dec!(500.00),
                high: dec!(500.00),
                average: dec!(500.00),
                is_one_time: true,
            }
        );
    }

    #[test]
    fn test_one_time_annual_always_zero() {
        let request = CostComputationRequest::new(dec!(500), "once, for 5 years")
            .with_age_window(dec!(40), dec!(70))
            .with_ages(dec!(40), dec!(80));
        let result = engine().project_item(&request).unwrap();
        assert_eq!(result.annual, Decimal::ZERO);
        assert_eq!(result.lifetime, dec!(500));
        assert!(result.is_one_time);
    }

    #[test]
    fn test_frequency_range_over_remaining_life() {
        let request = CostComputationRequest::new(dec!(50), "3-5 times per year").with_ages(dec!(60), dec!(70));
        let projector = engine();

        let duration = projector
            .parse_duration(&request.frequency, dec!(60), Some(dec!(70)), None, None)
            .unwrap();
        assert_eq!(duration, DurationSpec::fixed(dec!(10)));

        let rate = projector.resolve_rate(dec!(50), None, None, &[]);
        let annual = annual_cost(&rate, &projector.parse_frequency(&request.frequency).unwrap()).unwrap();
        assert_eq!(annual, CostRange { low: dec!(150), average: dec!(200), high: dec!(250) });

        let result = projector.project_item(&request).unwrap();
        assert_eq!(result.annual, dec!(200.00));
        assert_eq!(result.low, dec!(1500.00));
        assert_eq!(result.high, dec!(2500.00));
        assert_eq!(result.average, dec!(2000.00));
        assert_eq!(result.lifetime, dec!(2000.00));
    }

    #[test]
    fn test_default_life_expectancy_from_config() {
        let config = EngineConfig {
            default_life_expectancy: dec!(10),
            ..Default::default()
        };
        let projector = CostProjector::new(NoReferenceData, config);
        let request = CostComputationRequest::new(dec!(10), "monthly");
        let result = projector.project_item(&request).unwrap();
        assert_eq!(result.lifetime, dec!(1200));
    }

    #[test]
    fn test_frequency_error_is_wrapped() {
        let request = CostComputationRequest::new(dec!(100), "as needed");
        let err = engine().project_item(&request).unwrap_err();
        assert_eq!(
            err,
            CalculationError::Frequency(ParseError::UnrecognizedFrequency("as needed".into()))
        );

        let err = engine().project_item(&CostComputationRequest::new(dec!(100), "")).unwrap_err();
        assert_eq!(err, CalculationError::Frequency(ParseError::EmptyFrequency));
    }

    #[test]
    fn test_inverted_window_is_duration_error() {
        let request = CostComputationRequest::new(dec!(100), "monthly").with_age_window(dec!(70), dec!(40));
        let err = engine().project_item(&request).unwrap_err();
        assert!(matches!(err, CalculationError::Duration(ParseError::InvalidAgeRange { .. })));
    }

    #[test]
    fn test_overflow_is_error() {
        let request = CostComputationRequest::new(Decimal::MAX, "daily").with_age_window(dec!(0), dec!(10));
        assert_eq!(engine().project_item(&request), Err(CalculationError::Overflow));
    }

    #[test]
    fn test_extreme_age_window_is_overflow() {
        let request = CostComputationRequest::new(dec!(100), "monthly").with_age_window(Decimal::MIN, Decimal::MAX);
        assert_eq!(engine().project_item(&request), Err(CalculationError::Overflow));

        let request = CostComputationRequest::new(dec!(100), "monthly").with_ages(Decimal::MIN, Decimal::MAX);
        assert_eq!(engine().project_item(&request), Err(CalculationError::Overflow));
    }

    #[test]
    fn test_extreme_increment_is_skipped() {
        let request = CostComputationRequest::new(dec!(100), "ignored")
            .with_increments(vec![AgeIncrement::new(Decimal::MIN, Decimal::MAX, "monthly")]);
        let result = engine().project_item_with_increments(&request);
        assert_eq!(result.lifetime, Decimal::ZERO);
        assert_eq!(result.annual, Decimal::ZERO);

        // the overflowing total leaves annual unweighted; lifetime still counts the sane bracket
        let request = CostComputationRequest::new(dec!(100), "ignored").with_increments(vec![
            AgeIncrement::new(Decimal::MIN, Decimal::MAX, "monthly"),
            AgeIncrement::new(dec!(40), dec!(50), "1x per year"),
        ]);
        let result = engine().project_item_with_increments(&request);
        assert_eq!(result.lifetime, dec!(1000));
        assert_eq!(result.annual, Decimal::ZERO);
    }

    #[test]
    fn test_adjusted_rate_flows_through() {
        let projector = CostProjector::new(Tables, EngineConfig::default());
        let request = CostComputationRequest::new(dec!(999), "monthly")
            .with_procedure_code("97110")
            .with_location("10001")
            .with_age_window(dec!(50), dec!(52));
        // rate 60 / 75 / 90, annual 720 / 900 / 1080, 2 years
        let result = projector.project_item(&request).unwrap();
        assert_eq!(result.annual, dec!(900));
        assert_eq!(result.low, dec!(1440));
        assert_eq!(result.high, dec!(2160));
        assert_eq!(result.lifetime, dec!(1800));
    }

    #[test]
    fn test_quotes_drive_rate() {
        let request = CostComputationRequest::new(dec!(1), "1x per year")
            .with_age_window(dec!(40), dec!(41))
            .with_quotes(vec![dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(1000)]);
        let result = engine().project_item(&request).unwrap();
        assert_eq!(result.low, dec!(100));
        assert_eq!(result.average, dec!(100));
        assert_eq!(result.high, dec!(1000));
    }

    #[test]
    fn test_increments_weighted() {
        let request = CostComputationRequest::new(dec!(100), "ignored").with_increments(vec![
            AgeIncrement::new(dec!(40), dec!(50), "monthly"),
            AgeIncrement::new(dec!(50), dec!(70), "2x per year"),
        ]);
        let result = engine().project_item_with_increments(&request);
        // annual: 1200 * 10/30 + 200 * 20/30 = 400 + 133.333...
        assert_eq!(result.annual, dec!(533.33));
        // lifetime: 1200*10 + 200*20
        assert_eq!(result.lifetime, dec!(16000));
        assert_eq!(result.low, dec!(16000));
        assert_eq!(result.high, dec!(16000));
        assert_eq!(result.average, result.lifetime);
        assert!(!result.is_one_time);
    }

    #[test]
    fn test_increments_with_range_frequency() {
        let request = CostComputationRequest::new(dec!(50), "ignored")
            .with_increments(vec![AgeIncrement::new(dec!(60), dec!(70), "3-5 times per year")]);
        let result = engine().project_item_with_increments(&request);
        assert_eq!(result.annual, dec!(200));
        assert_eq!(result.low, dec!(1500));
        assert_eq!(result.high, dec!(2500));
        assert_eq!(result.lifetime, dec!(2000));
    }

    #[test]
    fn test_increments_skip_bad_brackets() {
        let request = CostComputationRequest::new(dec!(100), "ignored").with_increments(vec![
            AgeIncrement::new(dec!(40), dec!(50), "as needed"),
            AgeIncrement::new(dec!(50), dec!(50), "monthly"),
            AgeIncrement::new(dec!(60), dec!(55), "monthly"),
            AgeIncrement::new(dec!(50), dec!(60), "1x per year"),
        ]);
        let result = engine().project_item_with_increments(&request);
        // total duration counts the unparseable 40-50 bracket too: 10 + 10 = 20
        assert_eq!(result.annual, dec!(50));
        assert_eq!(result.lifetime, dec!(1000));
    }

    #[test]
    fn test_one_time_increments_each_count() {
        let request = CostComputationRequest::new(dec!(500), "ignored").with_increments(vec![
            AgeIncrement::new(dec!(40), dec!(41), "one time"),
            AgeIncrement::new(dec!(60), dec!(61), "2x per year").one_time(),
            AgeIncrement::new(dec!(41), dec!(60), "1x per year"),
        ]);
        let result = engine().project_item_with_increments(&request);
        // two one-time hits plus 19 years at 500/yr
        assert_eq!(result.lifetime, dec!(10500));
        // annual only from the recurring bracket: 500 * 19/21
        assert_eq!(result.annual, dec!(452.38));
        assert!(!result.is_one_time);
    }

    #[test]
    fn test_no_increments_falls_back_to_once_per_year() {
        let request = CostComputationRequest::new(dec!(100), "weekly").with_ages(dec!(50), dec!(60));
        let result = engine().project_item_with_increments(&request);
        assert_eq!(result.annual, dec!(100));
        assert_eq!(result.lifetime, dec!(1000));
        assert!(!result.is_one_time);
    }

    #[test]
    fn test_project_dispatch() {
        let projector = engine();
        let simple = CostComputationRequest::new(dec!(100), "2x per year").with_age_window(dec!(40), dec!(70));
        assert_eq!(projector.project(&simple).unwrap().lifetime, dec!(6000));

        let bracketed = simple
            .clone()
            .with_increments(vec![AgeIncrement::new(dec!(40), dec!(50), "monthly")]);
        assert_eq!(projector.project(&bracketed).unwrap().lifetime, dec!(12000));
    }
}
