//! Discounting and compounding primitives

use crate::error::{EngineError, Result};
use crate::projection::CashFlowStream;
use crate::rate::Rate;

/// Discounting at a single per-period rate.
///
/// The rate is checked once on construction; every discount factor after that
/// is well defined, so the loops that use it cannot fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discounter {
    rate: Rate,
}

impl Discounter {
    /// Fails with `InvalidRate` when `1 + rate <= 0` (or the rate is not a number)
    pub fn new(rate: Rate) -> Result<Self> {
        let r = rate.as_fraction();
        if r.is_nan() || r <= -1.0 {
            return Err(EngineError::InvalidRate {
                rate: r,
                reason: "discount rate must exceed -100%",
            });
        }
        Ok(Self { rate })
    }

    /// `1 / (1 + r)^period`
    pub fn discount_factor(&self, period: u32) -> f64 {
        (1.0 + self.rate.as_fraction()).powi(-(period as i32))
    }

    /// Sum of `amount[t] / (1 + r)^t`.
    ///
    /// A stream whose period-0 entry is the (negative) initial outlay yields
    /// the NPV directly.
    pub fn present_value(&self, stream: &CashFlowStream) -> f64 {
        stream
            .iter()
            .map(|cf| cf.amount * self.discount_factor(cf.period))
            .sum()
    }
}

/// Present value of `stream` at `rate` per period
pub fn present_value(stream: &CashFlowStream, rate: Rate) -> Result<f64> {
    Ok(Discounter::new(rate)?.present_value(stream))
}

/// Balance after `periods` of compounding `principal` plus a level
/// `contribution` made at the start of every period.
///
/// The contribution made at the start of period `i` compounds for the
/// `periods - i` periods that remain. A zero rate reduces to the plain sum
/// `principal + contribution * periods`.
pub fn future_value(principal: f64, contribution: f64, rate: Rate, periods: u32) -> f64 {
    let principal_fv = principal * rate.growth_factor(periods);

    let contributions_fv: f64 = (0..periods)
        .map(|i| contribution * rate.growth_factor(periods - i))
        .sum();

    principal_fv + contributions_fv
}
