//! Loan amortization and divisor-based withdrawals

mod rmd;
mod schedule;

pub use rmd::{required_minimum_distribution, required_minimum_divisor, RMD_START_AGE};
pub use schedule::{
    build_schedule, monthly_payment, AmortizationEntry, AmortizationSchedule, PeriodUnit,
    ScheduleOptions, ScheduleStatus,
};
