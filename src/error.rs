//! Errors the engine can return.
//!
//! Every numeric-precondition violation is detected where a value enters a
//! primitive and is handed back to the caller. A stream that never breaks even
//! is not an error: [`find_crossover_period`] reports it as `f64::INFINITY`.
//!
//! [`find_crossover_period`]: crate::breakeven::find_crossover_period

use thiserror::Error;

/// Engine errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A rate would make a discount denominator zero or negative.
    #[error("invalid rate {rate}: {reason}")]
    InvalidRate { rate: f64, reason: &'static str },

    /// Exit cap rate must be strictly positive.
    #[error("invalid cap rate {0}: must be greater than zero")]
    InvalidCapRate(f64),

    /// Non-positive principal or term handed to amortization.
    #[error("invalid loan terms (principal {principal}, term {term_years} years): {reason}")]
    InvalidTerm {
        principal: f64,
        term_years: u32,
        reason: &'static str,
    },

    /// Optimizer handed an empty or inverted decision range.
    #[error("invalid decision domain [{start}, {end}]")]
    InvalidDomain { start: i64, end: i64 },

    /// Scenario sweep referenced a field the inputs do not carry.
    #[error("\"{0}\" is not a sweepable input field")]
    UnknownField(String),

    /// Scenario sweep produced no scenarios to rank.
    #[error("scenario sweep has no offsets to evaluate")]
    EmptySweep,

    /// Operation needs at least one period.
    #[error("cash flow stream is empty")]
    EmptyStream,

    /// A calculator input outside the range its formula is defined on.
    #[error("invalid input {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = EngineError::InvalidRate {
            rate: -1.0,
            reason: "discount rate must exceed -100%",
        };
        assert_eq!(
            err.to_string(),
            "invalid rate -1: discount rate must exceed -100%"
        );
        assert_eq!(
            EngineError::UnknownField("rent".into()).to_string(),
            "\"rent\" is not a sweepable input field"
        );
    }
}
