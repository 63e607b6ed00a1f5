//! Calculators built on the engine primitives
//!
//! Each calculator validates its inputs once in its constructor, so the
//! objectives handed to the optimizer and the sweeper are plain `f64`
//! functions.

pub mod proforma;
pub mod retirement;
pub mod social_security;

pub use proforma::{DevelopmentProForma, ProFormaInputs, ProFormaSummary};
pub use retirement::{AccountType, RetirementInputs, RetirementProjection, RetirementProjector};
pub use social_security::{ClaimingAnalysis, ClaimingInputs, ClaimingRecommendation};
