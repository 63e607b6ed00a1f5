//! Time-value-of-money and decision-optimization engine
//!
//! This library provides:
//! - Rate handling with a single percent/fraction boundary
//! - Discounting, compounding, IRR and payback
//! - Loan amortization schedules and divisor-based withdrawals
//! - Multi-year cash flow projection with growth and multiplicative adjustments
//! - Exhaustive discrete optimization, break-even solving and sensitivity sweeps
//! - Social Security claiming, development pro-forma and retirement calculators

pub mod amortization;
pub mod breakeven;
pub mod calculators;
pub mod error;
pub mod loader;
pub mod optimizer;
pub mod projection;
pub mod rate;
pub mod scenario;
pub mod time_value;

// Re-export commonly used types
pub use amortization::{build_schedule, monthly_payment, AmortizationSchedule, ScheduleOptions};
pub use breakeven::find_crossover_period;
pub use error::{EngineError, Result};
pub use optimizer::{maximize, maximize_par, OptimizationResult};
pub use projection::{CashFlowProjector, CashFlowStream, ProjectionConfig};
pub use rate::Rate;
pub use scenario::{sweep, sweep_par, FieldVariation, ScenarioSweepResult, SweepInputs};
pub use time_value::{future_value, present_value, Discounter};
