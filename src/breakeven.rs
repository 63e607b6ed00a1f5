//! Break-even between two competing cash flow streams
//!
//! One contract serves both loan-forgiveness break-even and early-versus-delayed
//! claiming comparisons: the first (possibly fractional) period at which the
//! running total of stream B has caught up with that of stream A.

use crate::projection::CashFlowStream;

/// Smallest period `t` at which `cumulative(b) >= cumulative(a)`.
///
/// When B catches up between integer periods `t - 1` and `t`, the crossing is
/// linearly interpolated between them. Streams of different length are
/// compared over the longer horizon, with missing periods contributing
/// nothing. Returns `f64::INFINITY` when B never catches up: that is the
/// ordinary "never breaks even" outcome, not a failure.
pub fn find_crossover_period(a: &CashFlowStream, b: &CashFlowStream) -> f64 {
    let horizon = a.len().max(b.len());
    if horizon == 0 {
        return 0.0;
    }

    let mut cum_a = 0.0;
    let mut cum_b = 0.0;
    let mut prev_gap = 0.0;

    for t in 0..horizon as u32 {
        cum_a += a.amount(t);
        cum_b += b.amount(t);
        let gap = cum_b - cum_a;

        if gap >= 0.0 {
            if t == 0 {
                return 0.0;
            }
            // prev_gap < 0 <= gap, so the denominator is strictly positive
            let fraction = -prev_gap / (gap - prev_gap);
            return (t - 1) as f64 + fraction;
        }

        prev_gap = gap;
    }

    f64::INFINITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_stream_breaks_even_with_itself_immediately() {
        for stream in [
            CashFlowStream::new(vec![-500.0, 100.0, 900.0]),
            CashFlowStream::new(vec![250.0]),
            CashFlowStream::zeros(10),
            CashFlowStream::default(),
        ] {
            assert_eq!(find_crossover_period(&stream, &stream), 0.0);
        }
    }

    #[test]
    fn test_interpolates_between_periods() {
        // Early claim: 100 every period. Delayed: nothing for 2 periods, then 250.
        let early = CashFlowStream::level(100.0, 9);
        let mut delayed_amounts = vec![250.0; 10];
        delayed_amounts[..2].fill(0.0);
        let delayed = CashFlowStream::new(delayed_amounts);

        // Gaps: -100, -200, -50, +100 -> crossing a third of the way from 2 to 3
        let t = find_crossover_period(&early, &delayed);
        assert_abs_diff_eq!(t, 2.0 + 50.0 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_crossing_lands_on_integer_period() {
        let a = CashFlowStream::new(vec![10.0, 10.0, 10.0]);
        let b = CashFlowStream::new(vec![0.0, 10.0, 20.0]);
        // Gaps: -10, -10, 0
        assert_abs_diff_eq!(find_crossover_period(&a, &b), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_never_crosses() {
        let a = CashFlowStream::level(100.0, 5);
        let b = CashFlowStream::level(50.0, 5);
        assert!(find_crossover_period(&a, &b).is_infinite());
    }

    #[test]
    fn test_unequal_lengths() {
        // A stops paying after period 1; B keeps paying
        let a = CashFlowStream::new(vec![100.0, 100.0]);
        let b = CashFlowStream::level(50.0, 5);
        // Gaps: -50, -100, -50, 0
        assert_abs_diff_eq!(find_crossover_period(&a, &b), 3.0, epsilon = 1e-12);
    }
}
