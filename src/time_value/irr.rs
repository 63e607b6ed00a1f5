//! Internal rate of return and payback period
//!
//! The pro-forma reports the IRR and payback of its levered equity flows
//! (equity out in year 0, sale proceeds in the final hold year), and the `npv`
//! command does the same for whatever stream it loads at its own
//! periods-per-year. Rates are solved per period and annualized on the way out.

use crate::breakeven::find_crossover_period;
use crate::projection::CashFlowStream;
use crate::rate::Rate;

const TOLERANCE: f64 = 1e-10;
const MAX_STEPS: usize = 1000;
/// Search interval for the periodic rate: -99% to +1000% per period
const RATE_FLOOR: f64 = -0.99;
const RATE_CEILING: f64 = 10.0;

/// Effective annual rate at which the present value of `stream` is zero.
///
/// `None` when the stream never changes sign, or when no root lies inside the
/// periodic search interval. An all-zero stream returns zero.
pub fn internal_rate_of_return(stream: &CashFlowStream, periods_per_year: u32) -> Option<Rate> {
    let periods_per_year = periods_per_year.max(1);
    let npv = PeriodicNpv {
        flows: stream.amounts(),
    };
    if npv.flows.is_empty() {
        return None;
    }

    let inflow = npv.flows.iter().any(|&cf| cf > TOLERANCE);
    let outflow = npv.flows.iter().any(|&cf| cf < -TOLERANCE);
    let periodic = match (inflow, outflow) {
        (false, false) => return Some(Rate::ZERO),
        (true, true) => npv
            .newton(0.05 / periods_per_year as f64)
            .or_else(|| npv.bisect())?,
        _ => return None,
    };

    Some(Rate::from_fraction(
        (1.0 + periodic).powi(periods_per_year as i32) - 1.0,
    ))
}

/// Periods until the running total of `stream` first reaches zero, interpolated
/// within the period where it turns. `f64::INFINITY` if it never pays back.
///
/// This is the break-even of the stream against doing nothing.
pub fn payback_period(stream: &CashFlowStream) -> f64 {
    find_crossover_period(&CashFlowStream::default(), stream)
}

/// Present value of a flow vector as a function of the periodic rate
struct PeriodicNpv {
    flows: Vec<f64>,
}

impl PeriodicNpv {
    fn value(&self, rate: f64) -> f64 {
        self.flows
            .iter()
            .enumerate()
            .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
            .sum()
    }

    /// d(value)/d(rate)
    fn slope(&self, rate: f64) -> f64 {
        self.flows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(t, cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
            .sum()
    }

    /// Newton-Raphson from `guess`, clamped to the search interval. `None` on a
    /// flat slope or when it fails to settle.
    fn newton(&self, guess: f64) -> Option<f64> {
        let mut rate = guess;
        for _ in 0..MAX_STEPS {
            let slope = self.slope(rate);
            if slope.abs() < 1e-20 {
                return None;
            }
            let next = (rate - self.value(rate) / slope).clamp(RATE_FLOOR, RATE_CEILING);
            if (next - rate).abs() < TOLERANCE {
                return Some(next);
            }
            rate = next;
        }
        None
    }

    fn bisect(&self) -> Option<f64> {
        let (mut low, mut high) = (RATE_FLOOR, RATE_CEILING);
        let mut value_low = self.value(low);
        if value_low * self.value(high) > 0.0 {
            return None;
        }

        for _ in 0..MAX_STEPS {
            let mid = 0.5 * (low + high);
            let value_mid = self.value(mid);
            if value_mid.abs() < TOLERANCE || (high - low) / 2.0 < TOLERANCE {
                return Some(mid);
            }
            if value_mid * value_low < 0.0 {
                high = mid;
            } else {
                low = mid;
                value_low = value_mid;
            }
        }
        None
    }
}
