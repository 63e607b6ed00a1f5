//! Tax-advantaged retirement account projection
//!
//! One row per year of age. Contributions (employee plus capped employer
//! match) land at the start of each working year and the whole balance then
//! earns the annual return. After retirement the account pays out the larger
//! of the planned withdrawal rate and the required minimum distribution.

use serde::{Deserialize, Serialize};

use crate::amortization::required_minimum_distribution;
use crate::error::{EngineError, Result};
use crate::rate::Rate;

/// Account wrapper; decides whether minimum distributions apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Traditional401k,
    TraditionalIra,
    Roth401k,
    RothIra,
    Hsa,
}

impl AccountType {
    pub fn requires_minimum_distributions(self) -> bool {
        matches!(self, AccountType::Traditional401k | AccountType::TraditionalIra)
    }

    /// Only employer plans carry a match
    pub fn has_employer_match(self) -> bool {
        matches!(self, AccountType::Traditional401k | AccountType::Roth401k)
    }

    /// Minimum distribution for this account at `age`
    pub fn minimum_distribution(self, balance: f64, age: u32) -> f64 {
        if self.requires_minimum_distributions() {
            required_minimum_distribution(balance, age)
        } else {
            0.0
        }
    }
}

/// Projection inputs; rates and shares are percentages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetirementInputs {
    pub account_type: AccountType,
    pub current_age: u32,
    pub retirement_age: u32,
    /// Last age projected, inclusive
    pub end_age: u32,
    pub current_balance: f64,
    pub annual_salary: f64,
    pub salary_growth_pct: f64,
    pub contribution_pct: f64,
    /// Employer matches this share of each contributed dollar...
    pub employer_match_pct: f64,
    /// ...up to this share of salary
    pub match_limit_pct: f64,
    pub annual_return_pct: f64,
    pub inflation_pct: f64,
    /// Planned withdrawal as a share of the start-of-year balance in retirement
    pub withdrawal_rate_pct: f64,
}

impl Default for RetirementInputs {
    fn default() -> Self {
        Self {
            account_type: AccountType::Traditional401k,
            current_age: 35,
            retirement_age: 65,
            end_age: 90,
            current_balance: 50_000.0,
            annual_salary: 80_000.0,
            salary_growth_pct: 3.0,
            contribution_pct: 10.0,
            employer_match_pct: 50.0,
            match_limit_pct: 6.0,
            annual_return_pct: 7.0,
            inflation_pct: 2.5,
            withdrawal_rate_pct: 4.0,
        }
    }
}

/// A single year of the projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementRow {
    pub age: u32,
    pub beginning_balance: f64,
    pub employee_contribution: f64,
    pub employer_contribution: f64,
    pub investment_return: f64,
    pub withdrawal: f64,
    /// Portion of `withdrawal` forced by the minimum distribution rule
    pub required_minimum: f64,
    pub ending_balance: f64,
    /// `ending_balance` in today's money
    pub real_ending_balance: f64,
}

impl RetirementRow {
    pub fn new(age: u32, beginning_balance: f64) -> Self {
        Self {
            age,
            beginning_balance,
            employee_contribution: 0.0,
            employer_contribution: 0.0,
            investment_return: 0.0,
            withdrawal: 0.0,
            required_minimum: 0.0,
            ending_balance: 0.0,
            real_ending_balance: 0.0,
        }
    }

    pub fn total_contribution(&self) -> f64 {
        self.employee_contribution + self.employer_contribution
    }
}

/// Complete projection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetirementProjection {
    pub rows: Vec<RetirementRow>,
}

impl RetirementProjection {
    pub fn add_row(&mut self, row: RetirementRow) {
        self.rows.push(row);
    }

    /// Ending balance in the year before `age`, i.e. the balance at the start of `age`
    pub fn balance_at(&self, age: u32) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.age == age)
            .map(|r| r.beginning_balance)
    }

    pub fn summary(&self, retirement_age: u32) -> RetirementSummary {
        let last = self.rows.last();
        RetirementSummary {
            balance_at_retirement: self
                .balance_at(retirement_age)
                .or_else(|| last.map(|r| r.ending_balance))
                .unwrap_or(0.0),
            total_contributions: self.rows.iter().map(|r| r.total_contribution()).sum(),
            total_employer_contributions: self.rows.iter().map(|r| r.employer_contribution).sum(),
            total_returns: self.rows.iter().map(|r| r.investment_return).sum(),
            total_withdrawals: self.rows.iter().map(|r| r.withdrawal).sum(),
            final_balance: last.map(|r| r.ending_balance).unwrap_or(0.0),
            final_real_balance: last.map(|r| r.real_ending_balance).unwrap_or(0.0),
            depletion_age: self
                .rows
                .iter()
                .find(|r| r.age >= retirement_age && r.ending_balance <= 0.0)
                .map(|r| r.age),
        }
    }
}

/// Headline figures for a projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementSummary {
    pub balance_at_retirement: f64,
    pub total_contributions: f64,
    pub total_employer_contributions: f64,
    pub total_returns: f64,
    pub total_withdrawals: f64,
    pub final_balance: f64,
    pub final_real_balance: f64,
    /// First retirement age at which the account runs dry
    pub depletion_age: Option<u32>,
}

/// Year-by-year account projector
#[derive(Debug, Clone)]
pub struct RetirementProjector {
    inputs: RetirementInputs,
}

impl RetirementProjector {
    pub fn new(inputs: RetirementInputs) -> Result<Self> {
        if inputs.retirement_age < inputs.current_age {
            return Err(EngineError::InvalidInput {
                field: "retirement_age",
                reason: "must not precede current age",
            });
        }
        if inputs.end_age < inputs.retirement_age {
            return Err(EngineError::InvalidInput {
                field: "end_age",
                reason: "must not precede retirement age",
            });
        }
        if inputs.current_balance < 0.0 || inputs.annual_salary < 0.0 {
            return Err(EngineError::InvalidInput {
                field: "balances",
                reason: "cannot be negative",
            });
        }
        if Rate::from_percent(inputs.annual_return_pct).as_fraction() <= -1.0 {
            return Err(EngineError::InvalidRate {
                rate: Rate::from_percent(inputs.annual_return_pct).as_fraction(),
                reason: "annual return must exceed -100%",
            });
        }
        Ok(Self { inputs })
    }

    pub fn inputs(&self) -> &RetirementInputs {
        &self.inputs
    }

    pub fn project(&self) -> RetirementProjection {
        let inputs = &self.inputs;
        let growth = 1.0 + Rate::from_percent(inputs.annual_return_pct).as_fraction();
        let inflation = Rate::from_percent(inputs.inflation_pct);
        let salary_growth = Rate::from_percent(inputs.salary_growth_pct);

        let mut projection = RetirementProjection::default();
        let mut balance = inputs.current_balance;

        for age in inputs.current_age..=inputs.end_age {
            let year = age - inputs.current_age;
            let mut row = RetirementRow::new(age, balance);

            if age < inputs.retirement_age {
                let salary = inputs.annual_salary * salary_growth.growth_factor(year);
                let contribution_rate = Rate::from_percent(inputs.contribution_pct);
                row.employee_contribution = salary * contribution_rate.as_fraction();
                row.employer_contribution = self.employer_match(salary, row.employee_contribution);
                balance += row.total_contribution();
            } else {
                let withdrawal_rate = Rate::from_percent(inputs.withdrawal_rate_pct);
                let planned = balance * withdrawal_rate.as_fraction();
                let minimum = inputs.account_type.minimum_distribution(balance, age);
                row.withdrawal = planned.max(minimum).min(balance);
                row.required_minimum = (minimum - planned).max(0.0).min(row.withdrawal);
                balance -= row.withdrawal;
            }

            row.investment_return = balance * (growth - 1.0);
            balance += row.investment_return;

            row.ending_balance = balance;
            row.real_ending_balance = balance / inflation.growth_factor(year + 1);
            projection.add_row(row);
        }

        log::debug!(
            "projected {:?} account from age {} to {}, final balance {:.2}",
            inputs.account_type,
            inputs.current_age,
            inputs.end_age,
            balance
        );
        projection
    }

    fn employer_match(&self, salary: f64, employee_contribution: f64) -> f64 {
        if !self.inputs.account_type.has_employer_match() {
            return 0.0;
        }
        let match_rate = Rate::from_percent(self.inputs.employer_match_pct).as_fraction();
        let match_limit = Rate::from_percent(self.inputs.match_limit_pct).as_fraction();
        (employee_contribution * match_rate).min(salary * match_limit * match_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::future_value;
    use approx::assert_relative_eq;

    fn level_saver() -> RetirementInputs {
        RetirementInputs {
            account_type: AccountType::TraditionalIra,
            current_age: 30,
            retirement_age: 60,
            end_age: 60,
            current_balance: 10_000.0,
            annual_salary: 100_000.0,
            salary_growth_pct: 0.0,
            contribution_pct: 6.0,
            employer_match_pct: 0.0,
            match_limit_pct: 0.0,
            annual_return_pct: 6.0,
            inflation_pct: 2.0,
            withdrawal_rate_pct: 4.0,
        }
    }

    #[test]
    fn test_contribution_phase_matches_future_value() {
        let inputs = level_saver();
        let projection = RetirementProjector::new(inputs).unwrap().project();

        let expected = future_value(10_000.0, 6_000.0, Rate::from_percent(6.0), 30);
        let at_retirement = projection.balance_at(60).unwrap();
        assert_relative_eq!(at_retirement, expected, max_relative = 1e-10);
    }

    #[test]
    fn test_employer_match_is_capped() {
        let inputs = RetirementInputs {
            account_type: AccountType::Traditional401k,
            salary_growth_pct: 0.0,
            contribution_pct: 10.0,
            employer_match_pct: 50.0,
            match_limit_pct: 6.0,
            ..Default::default()
        };
        let projection = RetirementProjector::new(inputs).unwrap().project();
        let first = &projection.rows[0];

        assert_relative_eq!(first.employee_contribution, 8_000.0, max_relative = 1e-12);
        // 50% match on at most 6% of 80,000
        assert_relative_eq!(first.employer_contribution, 2_400.0, max_relative = 1e-12);

        let ira = RetirementInputs {
            account_type: AccountType::RothIra,
            ..Default::default()
        };
        let projection = RetirementProjector::new(ira).unwrap().project();
        assert_eq!(projection.rows[0].employer_contribution, 0.0);
    }

    #[test]
    fn test_minimum_distribution_overrides_low_withdrawal_rate() {
        let inputs = RetirementInputs {
            account_type: AccountType::TraditionalIra,
            current_age: 70,
            retirement_age: 70,
            end_age: 73,
            current_balance: 274_000.0,
            withdrawal_rate_pct: 1.0,
            annual_return_pct: 0.0,
            ..Default::default()
        };
        let projection = RetirementProjector::new(inputs).unwrap().project();

        // Ages 70 and 71 withdraw the planned 1%
        assert_relative_eq!(projection.rows[0].withdrawal, 2_740.0, max_relative = 1e-12);
        assert_eq!(projection.rows[1].required_minimum, 0.0);

        // At 72 the divisor of 27.4 forces a larger withdrawal
        let at_72 = &projection.rows[2];
        assert_eq!(at_72.age, 72);
        assert_relative_eq!(
            at_72.withdrawal,
            at_72.beginning_balance / 27.4,
            max_relative = 1e-12
        );
        assert!(at_72.required_minimum > 0.0);
    }

    #[test]
    fn test_roth_has_no_minimum_distribution() {
        assert!(!AccountType::RothIra.requires_minimum_distributions());
        assert_eq!(AccountType::Hsa.minimum_distribution(100_000.0, 80), 0.0);
        assert!(AccountType::Traditional401k.requires_minimum_distributions());
        assert!(AccountType::TraditionalIra.minimum_distribution(274_000.0, 72) > 0.0);
    }

    #[test]
    fn test_real_balance_deflates_by_inflation() {
        let inputs = level_saver();
        let projection = RetirementProjector::new(inputs).unwrap().project();
        let row = &projection.rows[4];
        assert_relative_eq!(
            row.real_ending_balance,
            row.ending_balance / 1.02_f64.powi(5),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_depletion_age() {
        let inputs = RetirementInputs {
            account_type: AccountType::RothIra,
            current_age: 65,
            retirement_age: 65,
            end_age: 70,
            current_balance: 100_000.0,
            withdrawal_rate_pct: 100.0,
            ..Default::default()
        };
        let projection = RetirementProjector::new(inputs).unwrap().project();
        let summary = projection.summary(65);
        assert_eq!(summary.depletion_age, Some(65));
        assert_relative_eq!(summary.total_withdrawals, 100_000.0, max_relative = 1e-12);
        assert_eq!(summary.final_balance, 0.0);
    }

    #[test]
    fn test_rejects_inverted_ages() {
        let inputs = RetirementInputs {
            current_age: 70,
            retirement_age: 65,
            ..Default::default()
        };
        assert!(matches!(
            RetirementProjector::new(inputs),
            Err(EngineError::InvalidInput { field: "retirement_age", .. })
        ));
    }
}
