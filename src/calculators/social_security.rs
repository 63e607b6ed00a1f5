//! Social Security claiming-age optimization
//!
//! The benefit at a claiming age is the PIA scaled by an early-claiming
//! reduction or a delayed-retirement credit. Each candidate age produces a
//! yearly real-terms benefit stream from the earliest claiming age through the
//! horizon age, and the optimizer picks the age with the highest present value.

use serde::{Deserialize, Serialize};

use crate::breakeven::find_crossover_period;
use crate::error::{EngineError, Result};
use crate::optimizer::{maximize, OptimizationResult};
use crate::projection::CashFlowStream;
use crate::rate::{real_rate, Rate};
use crate::scenario::{sweep, FieldVariation, ScenarioSweepResult, SweepInputs};
use crate::time_value::Discounter;

pub const EARLIEST_CLAIMING_AGE: u32 = 62;
pub const LATEST_CLAIMING_AGE: u32 = 70;

/// Bend points are published for 2023 and indexed forward from there
const BEND_POINT_BASE_YEAR: i32 = 2023;
const FIRST_BEND_POINT: f64 = 1115.0;
const SECOND_BEND_POINT: f64 = 6721.0;
const BEND_POINT_INDEXING: f64 = 0.025;

/// Early reduction per month, in percent: 5/9 for the first 36 months, 5/12 after
const EARLY_REDUCTION_FIRST_36: f64 = 5.0 / 9.0;
const EARLY_REDUCTION_BEYOND_36: f64 = 5.0 / 12.0;

/// Delayed credit of 2/3% per month, for at most 48 months
const DELAYED_CREDIT_PER_MONTH: f64 = 2.0 / 3.0;
const MAX_DELAYED_MONTHS: u32 = 48;

/// Spousal reduction per early month, in percent
const SPOUSAL_REDUCTION_PER_MONTH: f64 = 25.0 / 36.0;

/// Full retirement age in years for a birth year
pub fn full_retirement_age(birth_year: i32) -> f64 {
    match birth_year {
        i32::MIN..=1937 => 65.0,
        1938..=1954 => 66.0,
        1955..=1959 => 66.0 + (birth_year - 1954) as f64 * 2.0 / 12.0,
        _ => 67.0,
    }
}

/// First and second PIA bend points for `year`
pub fn bend_points(year: i32) -> (f64, f64) {
    let factor = (1.0 + BEND_POINT_INDEXING).powi(year - BEND_POINT_BASE_YEAR);
    (FIRST_BEND_POINT * factor, SECOND_BEND_POINT * factor)
}

/// PIA from average indexed monthly earnings: 90% up to the first bend
/// point, 32% up to the second, 15% above. Rounded to the cent.
pub fn primary_insurance_amount(aime: f64, year: i32) -> f64 {
    let (first, second) = bend_points(year);
    let aime = aime.max(0.0);

    let pia = aime.min(first) * 0.90
        + (aime.min(second) - first).max(0.0) * 0.32
        + (aime - second).max(0.0) * 0.15;

    (pia * 100.0).round() / 100.0
}

/// Multiplier applied to the PIA when claiming at `claiming_age`
pub fn claiming_adjustment(full_retirement_age: f64, claiming_age: f64) -> f64 {
    let months = ((claiming_age - full_retirement_age) * 12.0).round() as i64;

    if months < 0 {
        let early = months.unsigned_abs() as f64;
        let reduction = early.min(36.0) * EARLY_REDUCTION_FIRST_36
            + (early - 36.0).max(0.0) * EARLY_REDUCTION_BEYOND_36;
        1.0 - reduction / 100.0
    } else {
        let delayed = (months as u32).min(MAX_DELAYED_MONTHS) as f64;
        1.0 + delayed * DELAYED_CREDIT_PER_MONTH / 100.0
    }
}

/// Monthly benefit when claiming at `claiming_age`
pub fn monthly_benefit_at(pia: f64, full_retirement_age: f64, claiming_age: f64) -> f64 {
    pia * claiming_adjustment(full_retirement_age, claiming_age)
}

/// Spousal benefit: half the worker's PIA, reduced for early claiming, or the
/// spouse's own PIA if that is larger
pub fn spousal_benefit(
    worker_pia: f64,
    spouse_pia: f64,
    spouse_claiming_age: f64,
    full_retirement_age: f64,
) -> f64 {
    let mut spousal = worker_pia * 0.5;
    if spouse_claiming_age < full_retirement_age {
        let months_early = ((full_retirement_age - spouse_claiming_age) * 12.0).round();
        spousal *= 1.0 - months_early * SPOUSAL_REDUCTION_PER_MONTH / 100.0;
    }
    spousal.max(spouse_pia)
}

/// Claiming analysis inputs. Rates are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimingInputs {
    /// Monthly benefit at full retirement age
    pub pia: f64,
    pub full_retirement_age: f64,
    /// Last age at which a benefit is received
    pub horizon_age: u32,
    pub discount_rate_pct: f64,
    /// Benefits are cost-of-living adjusted at this rate
    pub inflation_rate_pct: f64,
    /// Spouse's own PIA; set to include a spousal benefit
    pub spouse_pia: Option<f64>,
    pub spouse_claiming_age: f64,
}

impl Default for ClaimingInputs {
    fn default() -> Self {
        Self {
            pia: 2000.0,
            full_retirement_age: 67.0,
            horizon_age: 85,
            discount_rate_pct: 3.0,
            inflation_rate_pct: 2.5,
            spouse_pia: None,
            spouse_claiming_age: 67.0,
        }
    }
}

impl SweepInputs for ClaimingInputs {
    fn field_mut(&mut self, field: &str) -> Option<&mut f64> {
        match field {
            "pia" => Some(&mut self.pia),
            "discount_rate_pct" => Some(&mut self.discount_rate_pct),
            "inflation_rate_pct" => Some(&mut self.inflation_rate_pct),
            _ => None,
        }
    }
}

/// Recommended claiming age with supporting figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimingRecommendation {
    pub optimal_age: u32,
    pub monthly_benefit: f64,
    pub present_value: f64,
    /// Present value gained over claiming at the earliest age
    pub advantage_over_earliest: f64,
    /// Age at which the optimal strategy has paid out as much as claiming
    /// at the earliest age; infinite if it never does within the horizon
    pub break_even_age: f64,
    pub spousal: Option<SpousalBenefits>,
    pub optimization: OptimizationResult,
}

/// Household view when a spouse claims on the worker's record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpousalBenefits {
    pub spousal_benefit: f64,
    /// Worker's benefit at the optimal age plus the spousal benefit
    pub combined_monthly: f64,
}

/// Prepared claiming comparison
#[derive(Debug, Clone)]
pub struct ClaimingAnalysis {
    pia: f64,
    full_retirement_age: f64,
    horizon_age: u32,
    spouse: Option<(f64, f64)>,
    discounter: Discounter,
}

impl ClaimingAnalysis {
    pub fn new(inputs: &ClaimingInputs) -> Result<Self> {
        if !inputs.pia.is_finite() || inputs.pia < 0.0 {
            return Err(EngineError::InvalidInput {
                field: "pia",
                reason: "must be a non-negative amount",
            });
        }
        if let Some(spouse_pia) = inputs.spouse_pia {
            if !spouse_pia.is_finite() || spouse_pia < 0.0 {
                return Err(EngineError::InvalidInput {
                    field: "spouse_pia",
                    reason: "must be a non-negative amount",
                });
            }
        }
        if inputs.horizon_age < EARLIEST_CLAIMING_AGE {
            return Err(EngineError::InvalidInput {
                field: "horizon_age",
                reason: "must be at least the earliest claiming age",
            });
        }

        // COLA-indexed benefits discounted in real terms
        let real = real_rate(
            Rate::from_percent(inputs.discount_rate_pct),
            Rate::from_percent(inputs.inflation_rate_pct),
        );

        Ok(Self {
            pia: inputs.pia,
            full_retirement_age: inputs.full_retirement_age,
            horizon_age: inputs.horizon_age,
            spouse: inputs
                .spouse_pia
                .map(|spouse_pia| (spouse_pia, inputs.spouse_claiming_age)),
            discounter: Discounter::new(real)?,
        })
    }

    pub fn monthly_benefit(&self, claiming_age: u32) -> f64 {
        monthly_benefit_at(self.pia, self.full_retirement_age, claiming_age as f64)
    }

    /// Yearly benefits in today's money; period 0 is the earliest claiming age
    pub fn benefit_stream(&self, claiming_age: u32) -> CashFlowStream {
        let annual = self.monthly_benefit(claiming_age) * 12.0;
        CashFlowStream::new(
            (EARLIEST_CLAIMING_AGE..=self.horizon_age)
                .map(|age| if age >= claiming_age { annual } else { 0.0 })
                .collect(),
        )
    }

    /// Present value of claiming at `claiming_age`
    pub fn npv_at(&self, claiming_age: u32) -> f64 {
        self.discounter.present_value(&self.benefit_stream(claiming_age))
    }

    /// Age at which cumulative benefits from `delayed_age` catch up with
    /// those from `early_age`
    pub fn break_even_age(&self, early_age: u32, delayed_age: u32) -> f64 {
        let crossover = find_crossover_period(
            &self.benefit_stream(early_age),
            &self.benefit_stream(delayed_age),
        );
        EARLIEST_CLAIMING_AGE as f64 + crossover
    }

    /// Monthly spousal benefit, `None` without a spouse
    pub fn monthly_spousal_benefit(&self) -> Option<f64> {
        self.spouse.map(|(spouse_pia, claiming_age)| {
            spousal_benefit(self.pia, spouse_pia, claiming_age, self.full_retirement_age)
        })
    }

    /// Search claiming ages 62 through 70
    pub fn optimize(&self) -> Result<ClaimingRecommendation> {
        let optimization = maximize(
            EARLIEST_CLAIMING_AGE as i64..=LATEST_CLAIMING_AGE as i64,
            |age| self.npv_at(age as u32),
        )?;

        let optimal_age = optimization.best_decision_value as u32;
        let advantage_over_earliest = optimization
            .advantage_over(EARLIEST_CLAIMING_AGE as i64)
            .unwrap_or(0.0);

        log::debug!(
            "claiming at {} beats {} by {:.2}",
            optimal_age,
            EARLIEST_CLAIMING_AGE,
            advantage_over_earliest
        );

        let monthly_benefit = self.monthly_benefit(optimal_age);
        let spousal = self.monthly_spousal_benefit().map(|spousal_benefit| SpousalBenefits {
            spousal_benefit,
            combined_monthly: monthly_benefit + spousal_benefit,
        });

        Ok(ClaimingRecommendation {
            optimal_age,
            monthly_benefit,
            present_value: optimization.best_objective_value,
            advantage_over_earliest,
            break_even_age: self.break_even_age(EARLIEST_CLAIMING_AGE, optimal_age),
            spousal,
            optimization,
        })
    }
}

/// Sensitivity of the best claiming NPV to the discount and inflation rates
pub fn sensitivity(inputs: &ClaimingInputs, steps_pct: &[f64]) -> Result<ScenarioSweepResult> {
    let variations = ["discount_rate_pct", "inflation_rate_pct"]
        .map(|field| FieldVariation::symmetric(field, steps_pct));

    sweep(inputs, &variations, |scenario| {
        ClaimingAnalysis::new(scenario)
            .and_then(|analysis| analysis.optimize())
            .map(|recommendation| recommendation.present_value)
            .unwrap_or(f64::NAN)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_full_retirement_age_by_birth_year() {
        assert_eq!(full_retirement_age(1930), 65.0);
        assert_eq!(full_retirement_age(1950), 66.0);
        assert_abs_diff_eq!(full_retirement_age(1957), 66.5, epsilon = 1e-12);
        assert_eq!(full_retirement_age(1960), 67.0);
        assert_eq!(full_retirement_age(1985), 67.0);
    }

    #[test]
    fn test_primary_insurance_amount() {
        // 0.9 * 1115 + 0.32 * (5000 - 1115)
        assert_abs_diff_eq!(primary_insurance_amount(5000.0, 2023), 2246.7, epsilon = 1e-9);
        // 0.9 * 1115 + 0.32 * 5606 + 0.15 * 1279
        assert_abs_diff_eq!(primary_insurance_amount(8000.0, 2023), 2989.27, epsilon = 1e-9);
        assert_eq!(primary_insurance_amount(0.0, 2023), 0.0);

        let (first, _) = bend_points(2024);
        assert_relative_eq!(first, 1115.0 * 1.025, max_relative = 1e-12);
    }

    #[test]
    fn test_claiming_adjustment() {
        assert_abs_diff_eq!(claiming_adjustment(67.0, 62.0), 0.70, epsilon = 1e-12);
        assert_abs_diff_eq!(claiming_adjustment(67.0, 64.0), 0.80, epsilon = 1e-12);
        assert_eq!(claiming_adjustment(67.0, 67.0), 1.0);
        assert_abs_diff_eq!(claiming_adjustment(67.0, 70.0), 1.24, epsilon = 1e-12);
        // Credit stops after 48 months
        assert_abs_diff_eq!(claiming_adjustment(66.0, 70.0), 1.32, epsilon = 1e-12);
        assert_abs_diff_eq!(claiming_adjustment(65.0, 70.0), 1.32, epsilon = 1e-12);
    }

    #[test]
    fn test_spousal_benefit() {
        assert_abs_diff_eq!(spousal_benefit(2000.0, 0.0, 67.0, 67.0), 1000.0, epsilon = 1e-9);
        // 36 months early: 25% reduction
        assert_abs_diff_eq!(spousal_benefit(2000.0, 0.0, 64.0, 67.0), 750.0, epsilon = 1e-9);
        assert_eq!(spousal_benefit(2000.0, 1200.0, 67.0, 67.0), 1200.0);
    }

    #[test]
    fn test_benefit_stream_shape() {
        let analysis = ClaimingAnalysis::new(&ClaimingInputs::default()).unwrap();
        let stream = analysis.benefit_stream(65);

        assert_eq!(stream.len(), 24); // ages 62..=85
        assert_eq!(stream.amount(2), 0.0);
        // 24 months early: 13 1/3% reduction
        assert_relative_eq!(stream.amount(3), 20_800.0, max_relative = 1e-12);
        assert_relative_eq!(stream.amount(23), analysis.monthly_benefit(65) * 12.0);
    }

    #[test]
    fn test_delaying_to_seventy_wins() {
        let analysis = ClaimingAnalysis::new(&ClaimingInputs::default()).unwrap();
        let recommendation = analysis.optimize().unwrap();

        assert_eq!(recommendation.optimal_age, 70);
        assert_abs_diff_eq!(recommendation.monthly_benefit, 2480.0, epsilon = 1e-9);
        assert!(recommendation.advantage_over_earliest > 0.0);
        assert_eq!(recommendation.optimization.evaluated_points.len(), 9);

        // 29,760/yr from 70 catches 16,800/yr from 62 between ages 79 and 80
        assert_abs_diff_eq!(
            recommendation.break_even_age,
            62.0 + 17.0 + 4800.0 / 12_960.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_short_horizon_favors_early_claiming() {
        let inputs = ClaimingInputs {
            horizon_age: 72,
            ..Default::default()
        };
        let recommendation = ClaimingAnalysis::new(&inputs).unwrap().optimize().unwrap();
        assert_eq!(recommendation.optimal_age, 62);
        assert_eq!(recommendation.advantage_over_earliest, 0.0);
    }

    #[test]
    fn test_rejects_unusable_inputs() {
        let inputs = ClaimingInputs {
            horizon_age: 60,
            ..Default::default()
        };
        assert!(matches!(
            ClaimingAnalysis::new(&inputs),
            Err(EngineError::InvalidInput { field: "horizon_age", .. })
        ));

        let inputs = ClaimingInputs {
            discount_rate_pct: -150.0,
            inflation_rate_pct: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            ClaimingAnalysis::new(&inputs),
            Err(EngineError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_sensitivity_to_real_rate() {
        let inputs = ClaimingInputs::default();
        let result = sensitivity(&inputs, &[10.0]).unwrap();
        let base = ClaimingAnalysis::new(&inputs).unwrap().optimize().unwrap();

        assert_relative_eq!(result.base_objective, base.present_value, max_relative = 1e-12);
        assert_eq!(result.scenarios.len(), 4);
        // Real rates: 0.2% and 0.8% for the discount offsets, 0.75% and 0.25%
        // for the inflation offsets
        assert_eq!(result.best_case.scenario_label, "discount_rate_pct -10%");
        assert_eq!(result.worst_case.scenario_label, "discount_rate_pct +10%");
    }

    #[test]
    fn test_recommendation_includes_spousal_benefit() {
        let inputs = ClaimingInputs {
            spouse_pia: Some(600.0),
            spouse_claiming_age: 64.0,
            ..Default::default()
        };
        let recommendation = ClaimingAnalysis::new(&inputs).unwrap().optimize().unwrap();
        let spousal = recommendation.spousal.unwrap();

        // Half of 2000, reduced 25% for claiming 36 months early
        assert_abs_diff_eq!(spousal.spousal_benefit, 750.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spousal.combined_monthly, 2480.0 + 750.0, epsilon = 1e-9);

        let single = ClaimingAnalysis::new(&ClaimingInputs::default()).unwrap();
        assert!(single.optimize().unwrap().spousal.is_none());

        let inputs = ClaimingInputs {
            spouse_pia: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            ClaimingAnalysis::new(&inputs),
            Err(EngineError::InvalidInput { field: "spouse_pia", .. })
        ));
    }
}
