//! Required-minimum-distribution style divisor withdrawals

/// First age at which a distribution is required
pub const RMD_START_AGE: u32 = 72;

const BASE_DIVISOR: f64 = 27.4;
const DIVISOR_STEP: f64 = 0.4;

/// Simplified distribution period for `age`.
///
/// Starts at 27.4 at age 72 and shrinks by 0.4 per year, never below 1.
/// Returns 0 below the start age, meaning no distribution is required.
pub fn required_minimum_divisor(age: u32) -> f64 {
    if age < RMD_START_AGE {
        return 0.0;
    }
    (BASE_DIVISOR - (age - RMD_START_AGE) as f64 * DIVISOR_STEP).max(1.0)
}

/// Minimum withdrawal from `balance` at `age`; 0 below the start age
pub fn required_minimum_distribution(balance: f64, age: u32) -> f64 {
    let divisor = required_minimum_divisor(age);
    if divisor <= 0.0 || balance <= 0.0 {
        return 0.0;
    }
    balance / divisor
}
