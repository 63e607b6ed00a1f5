//! Time-value-of-money primitives: compounding, discounting, IRR, payback

mod discount;
mod irr;

pub use discount::{future_value, present_value, Discounter};
pub use irr::{internal_rate_of_return, payback_period};
