//! Multi-year projection of a recurring cash flow
//!
//! Year `t` starts from `base * (1 + growth)^t` and then passes through each
//! adjustment in order. That is the gross rent -> effective gross income ->
//! NOI pipeline shared by the real-estate and business-valuation calculators:
//! occupancy, operating-expense ratio and tax are all multiplicative factors.

use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use super::cashflows::{CashFlowStream, ProjectionResult, ProjectionRow};

/// Per-year multiplicative factor for one adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactorSchedule {
    /// Same factor every year
    Constant(f64),
    /// Factor for year `t` is `factors[t]`; the last entry carries forward.
    /// An empty list is a no-op (factor 1).
    PerYear(Vec<f64>),
}

impl FactorSchedule {
    pub fn factor(&self, year: u32) -> f64 {
        match self {
            FactorSchedule::Constant(f) => *f,
            FactorSchedule::PerYear(factors) => factors
                .get(year as usize)
                .or_else(|| factors.last())
                .copied()
                .unwrap_or(1.0),
        }
    }
}

/// A labelled multiplicative adjustment (occupancy, expense ratio, tax, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub label: String,
    pub schedule: FactorSchedule,
}

impl Adjustment {
    pub fn new(label: impl Into<String>, schedule: FactorSchedule) -> Self {
        Self {
            label: label.into(),
            schedule,
        }
    }

    /// Keep `rate` of the amount, e.g. 95% occupancy
    pub fn retain(label: impl Into<String>, rate: Rate) -> Self {
        Self::new(label, FactorSchedule::Constant(rate.as_fraction()))
    }

    /// Remove `rate` of the amount, e.g. a 35% operating-expense ratio or a tax
    pub fn deduct(label: impl Into<String>, rate: Rate) -> Self {
        Self::new(label, FactorSchedule::Constant(1.0 - rate.as_fraction()))
    }
}

/// Configuration for a projection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Last projected year; the projection covers years `0..=horizon_years`
    pub horizon_years: u32,

    /// Annual growth of the base amount
    pub growth_rate: Rate,

    /// Applied in order after growth
    pub adjustments: Vec<Adjustment>,

    /// When set, each row's `real_net` is deflated by `(1 + inflation)^t`
    pub inflation: Option<Rate>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_years: 10,
            growth_rate: Rate::ZERO,
            adjustments: Vec::new(),
            inflation: None,
        }
    }
}

/// Yearly cash flow projector
#[derive(Debug, Clone)]
pub struct CashFlowProjector {
    config: ProjectionConfig,
}

impl CashFlowProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Project `base_amount` with a row per year
    pub fn project(&self, base_amount: f64) -> ProjectionResult {
        let labels = self
            .config
            .adjustments
            .iter()
            .map(|a| a.label.clone())
            .collect();
        let mut result = ProjectionResult::new(labels);

        for year in 0..=self.config.horizon_years {
            result.add_row(self.project_year(base_amount, year));
        }

        log::trace!(
            "projected {} years from base {:.2} at {}",
            result.rows.len(),
            base_amount,
            self.config.growth_rate
        );
        result
    }

    fn project_year(&self, base_amount: f64, year: u32) -> ProjectionRow {
        let mut row = ProjectionRow::new(year);

        row.gross = base_amount * self.config.growth_rate.growth_factor(year);

        row.factors = self
            .config
            .adjustments
            .iter()
            .map(|a| a.schedule.factor(year))
            .collect();
        row.net = row.factors.iter().fold(row.gross, |amount, f| amount * f);

        row.real_net = match self.config.inflation {
            Some(inflation) => row.net / inflation.growth_factor(year),
            None => row.net,
        };

        row
    }
}

/// Project `base_amount` over years `0..=horizon_years` and return the net stream
pub fn project_annual(
    base_amount: f64,
    growth_rate: Rate,
    horizon_years: u32,
    adjustments: &[Adjustment],
) -> CashFlowStream {
    CashFlowProjector::new(ProjectionConfig {
        horizon_years,
        growth_rate,
        adjustments: adjustments.to_vec(),
        inflation: None,
    })
    .project(base_amount)
    .stream()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_growth_only() {
        let stream = project_annual(1000.0, Rate::from_percent(3.0), 2, &[]);
        assert_eq!(stream.len(), 3);
        assert_relative_eq!(stream.amount(0), 1000.0);
        assert_relative_eq!(stream.amount(1), 1030.0, max_relative = 1e-12);
        assert_relative_eq!(stream.amount(2), 1060.9, max_relative = 1e-12);
    }

    #[test]
    fn test_rent_to_noi_pipeline() {
        let adjustments = vec![
            Adjustment::retain("occupancy", Rate::from_percent(95.0)),
            Adjustment::deduct("operating expenses", Rate::from_percent(35.0)),
        ];
        let stream = project_annual(100_000.0, Rate::ZERO, 1, &adjustments);

        // 100,000 * 0.95 * 0.65
        assert_relative_eq!(stream.amount(0), 61_750.0, max_relative = 1e-12);
        assert_relative_eq!(stream.amount(1), 61_750.0, max_relative = 1e-12);
    }

    #[test]
    fn test_per_year_factor_carries_forward() {
        let lease_up = Adjustment::new(
            "occupancy",
            FactorSchedule::PerYear(vec![0.5, 0.8, 0.95]),
        );
        let stream = project_annual(100.0, Rate::ZERO, 4, &[lease_up]);
        for (actual, expected) in stream.amounts().iter().zip([50.0, 80.0, 95.0, 95.0, 95.0]) {
            assert_relative_eq!(*actual, expected, max_relative = 1e-12);
        }

        assert_eq!(FactorSchedule::PerYear(Vec::new()).factor(3), 1.0);
    }

    #[test]
    fn test_inflation_deflates_real_rows() {
        let projector = CashFlowProjector::new(ProjectionConfig {
            horizon_years: 2,
            growth_rate: Rate::from_percent(2.0),
            adjustments: vec![Adjustment::deduct("tax", Rate::from_percent(25.0))],
            inflation: Some(Rate::from_percent(2.0)),
        });
        let result = projector.project(1000.0);

        for row in &result.rows {
            assert_relative_eq!(row.real_net, 750.0, max_relative = 1e-12);
        }
        assert_eq!(result.labels, vec!["tax".to_string()]);

        let summary = result.summary();
        assert_eq!(summary.total_years, 3);
        assert_relative_eq!(summary.total_real_net, 2250.0, max_relative = 1e-12);
        assert_relative_eq!(result.gross_stream().amount(2), 1040.4, max_relative = 1e-12);
    }
}
