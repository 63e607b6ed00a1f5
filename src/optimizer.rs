//! Exhaustive search over a small integer decision variable
//!
//! Decision domains here are short (claiming ages 62-70, hold periods of a
//! few years) and the objectives have kinks (full retirement age, the
//! delayed-credit cap), so every point is evaluated rather than following a
//! gradient.

use std::ops::RangeInclusive;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Relative tolerance under which two objective values count as tied
pub const OBJECTIVE_TOLERANCE: f64 = 1e-9;

/// One evaluated decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPoint {
    pub decision_value: i64,
    pub objective_value: f64,
}

/// Outcome of a search, with every evaluation in domain-scan order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_decision_value: i64,
    pub best_objective_value: f64,
    pub evaluated_points: Vec<EvaluatedPoint>,
}

impl OptimizationResult {
    /// Objective recorded for `decision_value`, if it was in the domain
    pub fn objective_at(&self, decision_value: i64) -> Option<f64> {
        self.evaluated_points
            .iter()
            .find(|p| p.decision_value == decision_value)
            .map(|p| p.objective_value)
    }

    /// Best objective minus the objective at `decision_value`
    pub fn advantage_over(&self, decision_value: i64) -> Option<f64> {
        self.objective_at(decision_value)
            .map(|v| self.best_objective_value - v)
    }
}

/// Evaluate `objective` at every integer in `domain` and keep the maximum.
///
/// Ties (within [`OBJECTIVE_TOLERANCE`]) go to the smallest decision value,
/// the earliest and least committal choice. NaN objectives are recorded but
/// never win unless nothing else was evaluated.
pub fn maximize<F>(domain: RangeInclusive<i64>, objective: F) -> Result<OptimizationResult>
where
    F: Fn(i64) -> f64,
{
    check_domain(&domain)?;

    let points: Vec<EvaluatedPoint> = domain
        .map(|d| EvaluatedPoint {
            decision_value: d,
            objective_value: objective(d),
        })
        .collect();

    Ok(select_best(points))
}

/// [`maximize`] with the evaluations spread across the rayon pool.
///
/// Selection happens after all points are collected in domain order, so the
/// result is identical to the sequential search.
pub fn maximize_par<F>(domain: RangeInclusive<i64>, objective: F) -> Result<OptimizationResult>
where
    F: Fn(i64) -> f64 + Sync + Send,
{
    check_domain(&domain)?;

    let points: Vec<EvaluatedPoint> = domain
        .into_par_iter()
        .map(|d| EvaluatedPoint {
            decision_value: d,
            objective_value: objective(d),
        })
        .collect();

    Ok(select_best(points))
}

fn check_domain(domain: &RangeInclusive<i64>) -> Result<()> {
    if domain.is_empty() {
        return Err(EngineError::InvalidDomain {
            start: *domain.start(),
            end: *domain.end(),
        });
    }
    Ok(())
}

fn is_better(candidate: &EvaluatedPoint, best: &EvaluatedPoint) -> bool {
    let (c, b) = (candidate.objective_value, best.objective_value);

    if c.is_nan() {
        return false;
    }
    if b.is_nan() {
        return true;
    }

    let tolerance = OBJECTIVE_TOLERANCE * b.abs().max(1.0);
    if (c - b).abs() <= tolerance {
        return candidate.decision_value < best.decision_value;
    }
    c > b
}

fn select_best(points: Vec<EvaluatedPoint>) -> OptimizationResult {
    let mut best = points[0];
    for point in &points[1..] {
        if is_better(point, &best) {
            best = *point;
        }
    }

    log::debug!(
        "evaluated {} decisions, best {} -> {:.4}",
        points.len(),
        best.decision_value,
        best.objective_value
    );

    OptimizationResult {
        best_decision_value: best.decision_value,
        best_objective_value: best.objective_value,
        evaluated_points: points,
    }
}
