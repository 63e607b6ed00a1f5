//! Real-estate development pro-forma
//!
//! Costs are funded by equity and a construction loan whose interest is
//! capitalized into the permanent loan. Stabilized rent runs through the
//! projector (occupancy, operating expenses) to NOI; the levered equity
//! stream is NOI less debt service, with the sale at the exit cap rate net of
//! the loan payoff in the final hold year.

use serde::{Deserialize, Serialize};

use crate::amortization::{build_schedule, AmortizationSchedule, ScheduleOptions};
use crate::error::{EngineError, Result};
use crate::optimizer::{maximize, OptimizationResult};
use crate::projection::{
    apply_exit_value, exit_value, project_annual, Adjustment, CashFlowStream, ExitValuation,
};
use crate::rate::Rate;
use crate::scenario::{sweep, FieldVariation, ScenarioSweepResult, SweepInputs};
use crate::time_value::{internal_rate_of_return, payback_period, Discounter};

/// Pro-forma inputs. Rates and shares are percentages; rents are annual per sq ft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProFormaInputs {
    pub land_cost: f64,
    pub construction_cost_per_sqft: f64,
    pub total_sqft: f64,
    pub soft_costs_pct: f64,
    pub contingency_pct: f64,
    pub equity_pct: f64,
    pub interest_rate_pct: f64,
    pub loan_term_years: u32,
    pub construction_period_months: u32,
    pub interest_only_months: u32,
    pub rent_per_sqft: f64,
    pub occupancy_pct: f64,
    pub rent_growth_pct: f64,
    pub operating_expense_ratio_pct: f64,
    pub hold_period_years: u32,
    pub exit_cap_rate_pct: f64,
    pub discount_rate_pct: f64,
}

impl Default for ProFormaInputs {
    fn default() -> Self {
        Self {
            land_cost: 2_000_000.0,
            construction_cost_per_sqft: 200.0,
            total_sqft: 50_000.0,
            soft_costs_pct: 15.0,
            contingency_pct: 5.0,
            equity_pct: 30.0,
            interest_rate_pct: 5.0,
            loan_term_years: 25,
            construction_period_months: 12,
            interest_only_months: 24,
            rent_per_sqft: 30.0,
            occupancy_pct: 95.0,
            rent_growth_pct: 3.0,
            operating_expense_ratio_pct: 35.0,
            hold_period_years: 5,
            exit_cap_rate_pct: 6.0,
            discount_rate_pct: 8.0,
        }
    }
}

impl SweepInputs for ProFormaInputs {
    fn field_mut(&mut self, field: &str) -> Option<&mut f64> {
        match field {
            "land_cost" => Some(&mut self.land_cost),
            "construction_cost_per_sqft" => Some(&mut self.construction_cost_per_sqft),
            "rent_per_sqft" => Some(&mut self.rent_per_sqft),
            "occupancy_pct" => Some(&mut self.occupancy_pct),
            "rent_growth_pct" => Some(&mut self.rent_growth_pct),
            "operating_expense_ratio_pct" => Some(&mut self.operating_expense_ratio_pct),
            "interest_rate_pct" => Some(&mut self.interest_rate_pct),
            "exit_cap_rate_pct" => Some(&mut self.exit_cap_rate_pct),
            "discount_rate_pct" => Some(&mut self.discount_rate_pct),
            _ => None,
        }
    }
}

/// Development budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentCosts {
    pub land_cost: f64,
    pub construction_cost: f64,
    pub soft_costs: f64,
    pub contingency: f64,
    pub total: f64,
    pub cost_per_sqft: f64,
}

/// Capital stack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Financing {
    pub equity: f64,
    pub construction_loan: f64,
    /// Construction interest rolled into the permanent loan
    pub capitalized_interest: f64,
    pub permanent_loan: f64,
    pub loan_to_cost_pct: f64,
}

/// Headline results for one hold period
#[derive(Debug, Clone, Serialize)]
pub struct ProFormaSummary {
    pub costs: DevelopmentCosts,
    pub financing: Financing,
    pub hold_period_years: u32,
    pub first_year_noi: f64,
    pub first_year_debt_service: f64,
    pub debt_service_coverage: f64,
    pub cash_on_cash_pct: f64,
    pub exit_value: f64,
    pub loan_payoff: f64,
    pub npv: f64,
    pub irr_pct: Option<f64>,
    pub payback_years: f64,
    pub equity_multiple: f64,
    pub equity_cash_flows: CashFlowStream,
}

/// A validated pro-forma ready to evaluate
#[derive(Debug, Clone)]
pub struct DevelopmentProForma {
    inputs: ProFormaInputs,
    costs: DevelopmentCosts,
    financing: Financing,
    loan: AmortizationSchedule,
    discounter: Discounter,
}

impl DevelopmentProForma {
    pub fn new(inputs: ProFormaInputs) -> Result<Self> {
        validate(&inputs)?;

        let costs = development_costs(&inputs);
        let financing = financing(&inputs, &costs);

        let loan = build_schedule(
            financing.permanent_loan,
            Rate::from_percent(inputs.interest_rate_pct),
            inputs.loan_term_years,
            &ScheduleOptions {
                interest_only_periods: inputs.interest_only_months,
                ..Default::default()
            },
        )?;
        let discounter = Discounter::new(Rate::from_percent(inputs.discount_rate_pct))?;

        Ok(Self {
            inputs,
            costs,
            financing,
            loan,
            discounter,
        })
    }

    pub fn inputs(&self) -> &ProFormaInputs {
        &self.inputs
    }

    pub fn costs(&self) -> &DevelopmentCosts {
        &self.costs
    }

    pub fn financing(&self) -> &Financing {
        &self.financing
    }

    pub fn loan(&self) -> &AmortizationSchedule {
        &self.loan
    }

    /// NOI by year with period 0 empty (construction) and stabilized year 1
    /// at the input rent
    pub fn noi_stream(&self, hold_years: u32) -> CashFlowStream {
        let gross_rent = self.inputs.total_sqft * self.inputs.rent_per_sqft;
        let adjustments = [
            Adjustment::retain("occupancy", Rate::from_percent(self.inputs.occupancy_pct)),
            Adjustment::deduct(
                "operating expenses",
                Rate::from_percent(self.inputs.operating_expense_ratio_pct),
            ),
        ];

        let stabilized = project_annual(
            gross_rent,
            Rate::from_percent(self.inputs.rent_growth_pct),
            hold_years.saturating_sub(1),
            &adjustments,
        );

        let mut amounts = vec![0.0];
        amounts.extend(stabilized.amounts());
        CashFlowStream::new(amounts)
    }

    /// Levered equity cash flows for selling after `hold_years`
    pub fn equity_stream(&self, hold_years: u32) -> Result<CashFlowStream> {
        let noi = self.noi_stream(hold_years);
        let with_sale = apply_exit_value(&noi, self.exit_valuation())?;

        let debt_service = self.debt_service(hold_years);
        let payoff = self.loan.balance_after_year(hold_years);

        Ok(with_sale
            .minus(&debt_service)
            .with_added(hold_years, -payoff)
            .with_added(0, -self.financing.equity))
    }

    /// NPV of the equity stream at the discount rate
    pub fn npv(&self, hold_years: u32) -> Result<f64> {
        Ok(self.discounter.present_value(&self.equity_stream(hold_years)?))
    }

    pub fn summary(&self) -> Result<ProFormaSummary> {
        let hold = self.inputs.hold_period_years;
        let noi = self.noi_stream(hold);
        let debt_service = self.debt_service(hold);
        let equity_cash_flows = self.equity_stream(hold)?;

        let first_year_noi = noi.amount(1);
        let first_year_debt_service = debt_service.amount(1);
        let equity = self.financing.equity;

        let distributions: f64 = equity_cash_flows
            .iter()
            .filter(|cf| cf.period > 0 && cf.amount > 0.0)
            .map(|cf| cf.amount)
            .sum();

        Ok(ProFormaSummary {
            costs: self.costs,
            financing: self.financing,
            hold_period_years: hold,
            first_year_noi,
            first_year_debt_service,
            debt_service_coverage: ratio(first_year_noi, first_year_debt_service),
            cash_on_cash_pct: ratio(first_year_noi - first_year_debt_service, equity) * 100.0,
            exit_value: exit_value(&noi, self.exit_valuation())?,
            loan_payoff: self.loan.balance_after_year(hold),
            npv: self.discounter.present_value(&equity_cash_flows),
            irr_pct: internal_rate_of_return(&equity_cash_flows, 1).map(|r| r.as_percent()),
            payback_years: payback_period(&equity_cash_flows),
            equity_multiple: ratio(distributions, equity),
            equity_cash_flows,
        })
    }

    /// Hold period in `min_years..=max_years` with the highest equity NPV
    pub fn best_hold_period(&self, min_years: u32, max_years: u32) -> Result<OptimizationResult> {
        maximize(min_years.max(1) as i64..=max_years as i64, |years| {
            self.npv(years as u32).unwrap_or(f64::NAN)
        })
    }

    fn exit_valuation(&self) -> ExitValuation {
        ExitValuation::CapRate(Rate::from_percent(self.inputs.exit_cap_rate_pct))
    }

    fn debt_service(&self, hold_years: u32) -> CashFlowStream {
        let by_year = self.loan.debt_service_by_year();
        CashFlowStream::new((0..=hold_years).map(|t| by_year.amount(t)).collect())
    }
}

/// Equity NPV sensitivity to rent, occupancy, exit cap rate and construction cost
pub fn sensitivity(inputs: &ProFormaInputs, steps_pct: &[f64]) -> Result<ScenarioSweepResult> {
    let variations = [
        "rent_per_sqft",
        "occupancy_pct",
        "exit_cap_rate_pct",
        "construction_cost_per_sqft",
    ]
    .map(|field| FieldVariation::symmetric(field, steps_pct));

    sweep(inputs, &variations, |scenario| {
        let mut scenario = scenario.clone();
        // +10% on 95% occupancy means full occupancy, not 104.5%
        scenario.occupancy_pct = scenario.occupancy_pct.clamp(0.0, 100.0);
        let hold_period = scenario.hold_period_years;
        DevelopmentProForma::new(scenario)
            .and_then(|model| model.npv(hold_period))
            .unwrap_or(f64::NAN)
    })
}

pub fn development_costs(inputs: &ProFormaInputs) -> DevelopmentCosts {
    let construction_cost = inputs.construction_cost_per_sqft * inputs.total_sqft;
    let hard_costs = inputs.land_cost + construction_cost;
    let soft_costs = hard_costs * Rate::from_percent(inputs.soft_costs_pct).as_fraction();
    let contingency = hard_costs * Rate::from_percent(inputs.contingency_pct).as_fraction();
    let total = hard_costs + soft_costs + contingency;

    DevelopmentCosts {
        land_cost: inputs.land_cost,
        construction_cost,
        soft_costs,
        contingency,
        total,
        cost_per_sqft: ratio(total, inputs.total_sqft),
    }
}

pub fn financing(inputs: &ProFormaInputs, costs: &DevelopmentCosts) -> Financing {
    let equity = costs.total * Rate::from_percent(inputs.equity_pct).as_fraction();
    let construction_loan = costs.total - equity;
    let capitalized_interest = construction_loan
        * Rate::from_percent(inputs.interest_rate_pct).as_fraction()
        * inputs.construction_period_months as f64
        / 12.0;

    Financing {
        equity,
        construction_loan,
        capitalized_interest,
        permanent_loan: construction_loan + capitalized_interest,
        loan_to_cost_pct: ratio(construction_loan, costs.total) * 100.0,
    }
}

fn validate(inputs: &ProFormaInputs) -> Result<()> {
    let invalid = |field, reason| Err(EngineError::InvalidInput { field, reason });

    if !(inputs.total_sqft > 0.0) {
        return invalid("total_sqft", "must be positive");
    }
    if inputs.land_cost < 0.0 || inputs.construction_cost_per_sqft < 0.0 {
        return invalid("costs", "cannot be negative");
    }
    if !(0.0..=100.0).contains(&inputs.equity_pct) {
        return invalid("equity_pct", "must be between 0 and 100");
    }
    if !(0.0..=100.0).contains(&inputs.occupancy_pct) {
        return invalid("occupancy_pct", "must be between 0 and 100");
    }
    if inputs.hold_period_years == 0 {
        return invalid("hold_period_years", "must be at least one year");
    }
    if inputs.exit_cap_rate_pct <= 0.0 {
        return Err(EngineError::InvalidCapRate(
            Rate::from_percent(inputs.exit_cap_rate_pct).as_fraction(),
        ));
    }
    Ok(())
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < 1e-12 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::present_value;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn model() -> DevelopmentProForma {
        DevelopmentProForma::new(ProFormaInputs::default()).unwrap()
    }

    #[test]
    fn test_budget_and_capital_stack() {
        let model = model();
        let costs = model.costs();
        // 2M land + 10M construction, 15% soft, 5% contingency
        assert_relative_eq!(costs.total, 14_400_000.0, max_relative = 1e-12);
        assert_relative_eq!(costs.cost_per_sqft, 288.0, max_relative = 1e-12);

        let financing = model.financing();
        assert_relative_eq!(financing.equity, 4_320_000.0, max_relative = 1e-12);
        assert_relative_eq!(financing.construction_loan, 10_080_000.0, max_relative = 1e-12);
        // One year of 5% construction interest
        assert_relative_eq!(financing.capitalized_interest, 504_000.0, max_relative = 1e-12);
        assert_relative_eq!(financing.permanent_loan, 10_584_000.0, max_relative = 1e-12);
        assert_abs_diff_eq!(financing.loan_to_cost_pct, 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_noi_pipeline() {
        let noi = model().noi_stream(5);
        assert_eq!(noi.len(), 6);
        assert_eq!(noi.amount(0), 0.0);
        // 1.5M gross * 0.95 * 0.65
        assert_relative_eq!(noi.amount(1), 926_250.0, max_relative = 1e-12);
        assert_relative_eq!(noi.amount(5), 926_250.0 * 1.03_f64.powi(4), max_relative = 1e-12);
    }

    #[test]
    fn test_interest_only_years_then_amortization() {
        let model = model();
        let debt_service = model.loan().debt_service_by_year();
        // Two interest-only years at 5% on 10.584M
        assert_relative_eq!(debt_service.amount(1), 529_200.0, max_relative = 1e-9);
        assert_relative_eq!(debt_service.amount(2), 529_200.0, max_relative = 1e-9);
        assert!(debt_service.amount(3) > debt_service.amount(2));
        assert_relative_eq!(model.loan().balance_after_year(2), 10_584_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_equity_stream_composition() {
        let model = model();
        let stream = model.equity_stream(5).unwrap();
        let noi = model.noi_stream(5);
        let debt = model.loan().debt_service_by_year();

        assert_eq!(stream.len(), 6);
        assert_relative_eq!(stream.amount(0), -4_320_000.0, max_relative = 1e-12);
        assert_relative_eq!(stream.amount(1), noi.amount(1) - debt.amount(1), max_relative = 1e-9);

        let sale = noi.amount(5) / 0.06;
        let payoff = model.loan().balance_after_year(5);
        let expected_final = noi.amount(5) - debt.amount(5) + sale - payoff;
        assert_relative_eq!(stream.amount(5), expected_final, max_relative = 1e-9);
    }

    #[test]
    fn test_summary_metrics_are_consistent() {
        let model = model();
        let summary = model.summary().unwrap();

        assert_relative_eq!(
            summary.debt_service_coverage,
            926_250.0 / 529_200.0,
            max_relative = 1e-9
        );
        let npv = present_value(&summary.equity_cash_flows, Rate::from_percent(8.0)).unwrap();
        assert_relative_eq!(summary.npv, npv, max_relative = 1e-12);

        let irr = summary.irr_pct.unwrap();
        let at_irr = present_value(&summary.equity_cash_flows, Rate::from_percent(irr)).unwrap();
        assert_abs_diff_eq!(at_irr, 0.0, epsilon = 1e-2);

        assert!(summary.equity_multiple > 1.0);
        assert!(summary.payback_years > 0.0);
    }

    #[test]
    fn test_best_hold_period_reports_every_year() {
        let model = model();
        let result = model.best_hold_period(3, 10).unwrap();

        assert_eq!(result.evaluated_points.len(), 8);
        for point in &result.evaluated_points {
            assert!(point.objective_value <= result.best_objective_value);
            assert_relative_eq!(
                point.objective_value,
                model.npv(point.decision_value as u32).unwrap(),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_sensitivity_moves_the_right_way() {
        let inputs = ProFormaInputs::default();
        let result = sensitivity(&inputs, &[10.0]).unwrap();

        assert_eq!(result.scenarios.len(), 8);
        let base = DevelopmentProForma::new(inputs).unwrap().npv(5).unwrap();
        assert_relative_eq!(result.base_objective, base, max_relative = 1e-12);

        let value = |label: &str| {
            result
                .scenarios
                .iter()
                .find(|s| s.scenario_label == label)
                .map(|s| s.objective_value)
                .unwrap()
        };
        for scenario in &result.scenarios {
            assert!(scenario.objective_value.is_finite(), "{}", scenario.scenario_label);
        }
        assert!(value("occupancy_pct +10%") > base);
        assert!(value("occupancy_pct -10%") < base);
        assert!(value("rent_per_sqft +10%") > base);
        assert!(value("exit_cap_rate_pct +10%") < base);
        assert!(value("construction_cost_per_sqft +10%") < base);
        assert!(result.worst_case.objective_value <= result.best_case.objective_value);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let inputs = ProFormaInputs {
            exit_cap_rate_pct: 0.0,
            ..Default::default()
        };
        assert_eq!(
            DevelopmentProForma::new(inputs).unwrap_err(),
            EngineError::InvalidCapRate(0.0)
        );

        let inputs = ProFormaInputs {
            total_sqft: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            DevelopmentProForma::new(inputs),
            Err(EngineError::InvalidInput { field: "total_sqft", .. })
        ));
    }
}
