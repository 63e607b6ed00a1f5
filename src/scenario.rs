//! One-at-a-time sensitivity sweeps
//!
//! Each named input is scaled by a list of percentage offsets while every
//! other input keeps its base value, matching the single-variable
//! sensitivity tables the calculators render. Fields are never varied
//! together.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Inputs whose numeric fields can be looked up by name and perturbed
pub trait SweepInputs: Clone {
    /// Mutable access to `field`, `None` if the inputs have no such field
    fn field_mut(&mut self, field: &str) -> Option<&mut f64>;
}

impl SweepInputs for BTreeMap<String, f64> {
    fn field_mut(&mut self, field: &str) -> Option<&mut f64> {
        self.get_mut(field)
    }
}

impl SweepInputs for HashMap<String, f64> {
    fn field_mut(&mut self, field: &str) -> Option<&mut f64> {
        self.get_mut(field)
    }
}

/// Offsets to try for one field, in percent (`-10.0` scales the field by 0.9)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVariation {
    pub field: String,
    pub percent_offsets: Vec<f64>,
}

impl FieldVariation {
    pub fn new(field: impl Into<String>, percent_offsets: &[f64]) -> Self {
        Self {
            field: field.into(),
            percent_offsets: percent_offsets.to_vec(),
        }
    }

    /// Symmetric offsets `-p..., +p...` for each `p` in `steps`
    pub fn symmetric(field: impl Into<String>, steps: &[f64]) -> Self {
        let mut offsets: Vec<f64> = steps.iter().rev().map(|p| -p.abs()).collect();
        offsets.extend(steps.iter().map(|p| p.abs()));
        Self {
            field: field.into(),
            percent_offsets: offsets,
        }
    }
}

/// Objective value for one perturbed input set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_label: String,
    pub field: String,
    pub percent_offset: f64,
    pub objective_value: f64,
}

/// Every scenario of a sweep plus the extremes across all of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSweepResult {
    /// Objective at the unperturbed inputs; not ranked with the scenarios
    pub base_objective: f64,
    /// Scenarios in field order, then offset order
    pub scenarios: Vec<ScenarioResult>,
    pub best_case: ScenarioResult,
    pub worst_case: ScenarioResult,
}

impl ScenarioSweepResult {
    /// `best - worst`, the width of the sensitivity band
    pub fn spread(&self) -> f64 {
        self.best_case.objective_value - self.worst_case.objective_value
    }

    /// Scenarios that varied `field`
    pub fn for_field<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a ScenarioResult> + 'a {
        self.scenarios.iter().filter(move |s| s.field == field)
    }
}

struct PlannedScenario<I> {
    label: String,
    field: String,
    offset: f64,
    inputs: I,
}

/// Vary each field by each of its offsets, one at a time, and rank the results
pub fn sweep<I, F>(
    base_inputs: &I,
    variations: &[FieldVariation],
    objective: F,
) -> Result<ScenarioSweepResult>
where
    I: SweepInputs,
    F: Fn(&I) -> f64,
{
    let planned = plan(base_inputs, variations)?;
    let base_objective = objective(base_inputs);

    let scenarios = planned
        .into_iter()
        .map(|p| ScenarioResult {
            objective_value: objective(&p.inputs),
            scenario_label: p.label,
            field: p.field,
            percent_offset: p.offset,
        })
        .collect();

    rank(base_objective, scenarios)
}

/// [`sweep`] with scenario evaluations spread across the rayon pool.
/// Scenario order and the ranking match the sequential sweep.
pub fn sweep_par<I, F>(
    base_inputs: &I,
    variations: &[FieldVariation],
    objective: F,
) -> Result<ScenarioSweepResult>
where
    I: SweepInputs + Send + Sync,
    F: Fn(&I) -> f64 + Sync + Send,
{
    let planned = plan(base_inputs, variations)?;
    let base_objective = objective(base_inputs);

    let scenarios = planned
        .into_par_iter()
        .map(|p| ScenarioResult {
            objective_value: objective(&p.inputs),
            scenario_label: p.label,
            field: p.field,
            percent_offset: p.offset,
        })
        .collect();

    rank(base_objective, scenarios)
}

/// Clone and perturb the inputs for every (field, offset) pair up front, so
/// unknown fields fail before any objective runs
fn plan<I: SweepInputs>(
    base_inputs: &I,
    variations: &[FieldVariation],
) -> Result<Vec<PlannedScenario<I>>> {
    let mut planned = Vec::new();

    for variation in variations {
        for &offset in &variation.percent_offsets {
            let mut inputs = base_inputs.clone();
            let value = inputs
                .field_mut(&variation.field)
                .ok_or_else(|| EngineError::UnknownField(variation.field.clone()))?;
            *value *= 1.0 + offset / 100.0;

            planned.push(PlannedScenario {
                label: format!("{} {:+}%", variation.field, offset),
                field: variation.field.clone(),
                offset,
                inputs,
            });
        }
    }

    if planned.is_empty() {
        return Err(EngineError::EmptySweep);
    }
    Ok(planned)
}

fn rank(base_objective: f64, scenarios: Vec<ScenarioResult>) -> Result<ScenarioSweepResult> {
    let first = scenarios.first().ok_or(EngineError::EmptySweep)?;
    // NaN objectives never rank; an all-NaN sweep reports the first scenario
    let seed = scenarios
        .iter()
        .find(|s| !s.objective_value.is_nan())
        .unwrap_or(first);
    let mut best = seed;
    let mut worst = seed;

    for scenario in &scenarios {
        if scenario.objective_value.is_nan() {
            continue;
        }
        if scenario.objective_value > best.objective_value {
            best = scenario;
        }
        if scenario.objective_value < worst.objective_value {
            worst = scenario;
        }
    }

    log::debug!(
        "swept {} scenarios: worst {} ({:.2}), best {} ({:.2})",
        scenarios.len(),
        worst.scenario_label,
        worst.objective_value,
        best.scenario_label,
        best.objective_value
    );

    let (best_case, worst_case) = (best.clone(), worst.clone());
    Ok(ScenarioSweepResult {
        base_objective,
        scenarios,
        best_case,
        worst_case,
    })
}
