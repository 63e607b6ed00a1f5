//! Cash flow streams and projection output structures

use serde::{Deserialize, Serialize};

/// One period of a cash flow stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub period: u32,
    pub amount: f64,
}

/// Ordered per-period cash flows from period 0 (now) to the horizon.
///
/// Periods are contiguous and ascending; the constructors are the only way in,
/// so the `period` of each entry always equals its index.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CashFlowStream {
    flows: Vec<CashFlow>,
}

impl CashFlowStream {
    /// Build a stream where `amounts[t]` is the cash flow in period `t`
    pub fn new(amounts: Vec<f64>) -> Self {
        let flows = amounts
            .into_iter()
            .enumerate()
            .map(|(t, amount)| CashFlow {
                period: t as u32,
                amount,
            })
            .collect();
        Self { flows }
    }

    /// All-zero stream covering periods `0..=horizon`
    pub fn zeros(horizon: u32) -> Self {
        Self::new(vec![0.0; horizon as usize + 1])
    }

    /// Same amount in every period `0..=horizon`
    pub fn level(amount: f64, horizon: u32) -> Self {
        Self::new(vec![amount; horizon as usize + 1])
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Index of the final period, `None` for an empty stream
    pub fn horizon(&self) -> Option<u32> {
        self.flows.last().map(|cf| cf.period)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CashFlow> {
        self.flows.iter()
    }

    /// Amount in `period`; periods past the horizon carry nothing
    pub fn amount(&self, period: u32) -> f64 {
        self.flows
            .get(period as usize)
            .map(|cf| cf.amount)
            .unwrap_or(0.0)
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.flows.iter().map(|cf| cf.amount).collect()
    }

    pub fn final_amount(&self) -> Option<f64> {
        self.flows.last().map(|cf| cf.amount)
    }

    pub fn total(&self) -> f64 {
        self.flows.iter().map(|cf| cf.amount).sum()
    }

    /// Running total through each period
    pub fn cumulative(&self) -> Vec<f64> {
        self.flows
            .iter()
            .scan(0.0, |acc, cf| {
                *acc += cf.amount;
                Some(*acc)
            })
            .collect()
    }

    /// Copy of the stream with `amount` added to `period`, extending the
    /// horizon with zero periods if needed
    pub fn with_added(&self, period: u32, amount: f64) -> Self {
        let mut amounts = self.amounts();
        if amounts.len() <= period as usize {
            amounts.resize(period as usize + 1, 0.0);
        }
        amounts[period as usize] += amount;
        Self::new(amounts)
    }

    /// Period-by-period `self - other` over the longer of the two horizons
    pub fn minus(&self, other: &CashFlowStream) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &CashFlowStream, f: impl Fn(f64, f64) -> f64) -> Self {
        let len = self.len().max(other.len());
        Self::new(
            (0..len as u32)
                .map(|t| f(self.amount(t), other.amount(t)))
                .collect(),
        )
    }
}

impl From<Vec<f64>> for CashFlowStream {
    fn from(amounts: Vec<f64>) -> Self {
        Self::new(amounts)
    }
}

/// A single year of a detailed projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: u32,

    /// Amount after growth, before any adjustment
    pub gross: f64,

    /// Factor applied by each adjustment this year, in adjustment order
    pub factors: Vec<f64>,

    /// Amount after all adjustments
    pub net: f64,

    /// `net` deflated to today's money (equals `net` without an inflation rate)
    pub real_net: f64,
}

impl ProjectionRow {
    pub fn new(year: u32) -> Self {
        Self {
            year,
            gross: 0.0,
            factors: Vec::new(),
            net: 0.0,
            real_net: 0.0,
        }
    }
}

/// Complete projection result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Adjustment labels, parallel to each row's `factors`
    pub labels: Vec<String>,

    /// Yearly rows, year 0 first
    pub rows: Vec<ProjectionRow>,
}

impl ProjectionResult {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: ProjectionRow) {
        self.rows.push(row);
    }

    /// Nominal net amounts as a cash flow stream
    pub fn stream(&self) -> CashFlowStream {
        CashFlowStream::new(self.rows.iter().map(|r| r.net).collect())
    }

    /// Pre-adjustment amounts as a cash flow stream
    pub fn gross_stream(&self) -> CashFlowStream {
        CashFlowStream::new(self.rows.iter().map(|r| r.gross).collect())
    }

    pub fn summary(&self) -> ProjectionSummary {
        let total_gross: f64 = self.rows.iter().map(|r| r.gross).sum();
        let total_net: f64 = self.rows.iter().map(|r| r.net).sum();
        let total_real_net: f64 = self.rows.iter().map(|r| r.real_net).sum();

        ProjectionSummary {
            total_years: self.rows.len() as u32,
            total_gross,
            total_net,
            total_real_net,
            final_net: self.rows.last().map(|r| r.net).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_years: u32,
    pub total_gross: f64,
    pub total_net: f64,
    pub total_real_net: f64,
    pub final_net: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_periods_follow_index() {
        let stream = CashFlowStream::new(vec![-100.0, 30.0, 40.0, 50.0]);
        let periods: Vec<u32> = stream.iter().map(|cf| cf.period).collect();
        assert_eq!(periods, vec![0, 1, 2, 3]);
        assert_eq!(stream.horizon(), Some(3));
        assert_eq!(stream.amount(7), 0.0);
    }

    #[test]
    fn test_cumulative() {
        let stream = CashFlowStream::new(vec![-100.0, 30.0, 40.0, 50.0]);
        assert_eq!(stream.cumulative(), vec![-100.0, -70.0, -30.0, 20.0]);
        assert_abs_diff_eq!(stream.total(), 20.0);
    }

    #[test]
    fn test_minus_extends_to_longer_horizon() {
        let noi = CashFlowStream::new(vec![0.0, 100.0, 110.0]);
        let debt = CashFlowStream::level(60.0, 1);
        assert_eq!(noi.minus(&debt).amounts(), vec![-60.0, 40.0, 110.0]);
    }

    #[test]
    fn test_with_added_extends_horizon() {
        let stream = CashFlowStream::zeros(1).with_added(3, 5.0);
        assert_eq!(stream.amounts(), vec![0.0, 0.0, 0.0, 5.0]);
        assert!(CashFlowStream::default().horizon().is_none());
    }
}
