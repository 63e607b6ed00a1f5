//! Rate value type
//!
//! Calculator inputs arrive as percentages (7 for 7%) while some quantities
//! are naturally fractions (an advance rate of 0.8). Both enter the engine
//! through one of the two constructors below and are stored as a fraction;
//! primitives never accept a bare `f64` rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A per-period interest, return, discount, growth or inflation rate
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(f64);

impl Rate {
    pub const ZERO: Rate = Rate(0.0);

    /// Rate from a percentage: `from_percent(7.0)` is 7%
    pub fn from_percent(percent: f64) -> Self {
        Rate(percent / 100.0)
    }

    /// Rate from a decimal fraction: `from_fraction(0.07)` is 7%
    pub fn from_fraction(fraction: f64) -> Self {
        Rate(fraction)
    }

    pub fn as_fraction(self) -> f64 {
        self.0
    }

    pub fn as_percent(self) -> f64 {
        self.0 * 100.0
    }

    /// Split an annual rate into `periods_per_year` equal nominal pieces
    /// (5% annual -> 5%/12 monthly)
    pub fn per_period(self, periods_per_year: u32) -> Self {
        if periods_per_year == 0 {
            return self;
        }
        Rate(self.0 / periods_per_year as f64)
    }

    /// `(1 + r)^periods`
    pub fn growth_factor(self, periods: u32) -> f64 {
        (1.0 + self.0).powi(periods as i32)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}%", self.as_percent())
    }
}

/// Real rate as `nominal - inflation`.
///
/// Linear simplification of the Fisher relation. [`real_rate_exact`] gives
/// `(1 + n) / (1 + i) - 1`.
pub fn real_rate(nominal: Rate, inflation: Rate) -> Rate {
    Rate(nominal.0 - inflation.0)
}

/// Exact Fisher real rate `(1 + n) / (1 + i) - 1`
pub fn real_rate_exact(nominal: Rate, inflation: Rate) -> Rate {
    Rate((1.0 + nominal.0) / (1.0 + inflation.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_percent_and_fraction_agree() {
        assert_eq!(Rate::from_percent(7.0), Rate::from_fraction(0.07));
        assert_abs_diff_eq!(Rate::from_fraction(0.0475).as_percent(), 4.75, epsilon = 1e-12);
    }

    #[test]
    fn test_per_period() {
        let monthly = Rate::from_percent(6.0).per_period(12);
        assert_abs_diff_eq!(monthly.as_fraction(), 0.005, epsilon = 1e-15);
    }

    #[test]
    fn test_real_rate_is_simple_difference() {
        let real = real_rate(Rate::from_percent(3.0), Rate::from_percent(2.5));
        assert_abs_diff_eq!(real.as_fraction(), 0.005, epsilon = 1e-15);

        let exact = real_rate_exact(Rate::from_percent(3.0), Rate::from_percent(2.5));
        assert!(exact.as_fraction() < real.as_fraction());
        assert_abs_diff_eq!(exact.as_fraction(), 1.03 / 1.025 - 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_growth_factor() {
        assert_abs_diff_eq!(Rate::from_percent(10.0).growth_factor(2), 1.21, epsilon = 1e-12);
        assert_eq!(Rate::ZERO.growth_factor(30), 1.0);
    }
}
