//! Terminal (exit/reversion) value at the end of a projection

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::rate::Rate;
use super::cashflows::CashFlowStream;

/// How the final-period metric is capitalized into a sale value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitValuation {
    /// Final-year NOI divided by a capitalization rate
    CapRate(Rate),
    /// Final-year metric (EBITDA, revenue, ...) times a multiple
    Multiple(f64),
}

/// Value of selling at the end of `stream`
pub fn exit_value(stream: &CashFlowStream, valuation: ExitValuation) -> Result<f64> {
    let final_metric = stream.final_amount().ok_or(EngineError::EmptyStream)?;

    match valuation {
        ExitValuation::CapRate(cap_rate) => {
            if cap_rate.as_fraction() <= 0.0 {
                return Err(EngineError::InvalidCapRate(cap_rate.as_fraction()));
            }
            Ok(final_metric / cap_rate.as_fraction())
        }
        ExitValuation::Multiple(multiple) => Ok(final_metric * multiple),
    }
}

/// Copy of `stream` with the exit value added to its final period
pub fn apply_exit_value(
    stream: &CashFlowStream,
    valuation: ExitValuation,
) -> Result<CashFlowStream> {
    let value = exit_value(stream, valuation)?;
    let horizon = stream.horizon().ok_or(EngineError::EmptyStream)?;
    Ok(stream.with_added(horizon, value))
}
