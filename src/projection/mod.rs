//! Cash flow streams and the yearly cash flow projector

mod cashflows;
mod engine;
mod exit;

pub use cashflows::{CashFlow, CashFlowStream, ProjectionResult, ProjectionRow, ProjectionSummary};
pub use engine::{project_annual, Adjustment, CashFlowProjector, FactorSchedule, ProjectionConfig};
pub use exit::{apply_exit_value, exit_value, ExitValuation};
