//! Level-payment loan schedules

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::projection::CashFlowStream;
use crate::rate::Rate;

/// Balance below which a loan counts as paid off
const BALANCE_TOLERANCE: f64 = 1e-6;

const MONTHS_PER_YEAR: u32 = 12;

/// Granularity of schedule entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodUnit {
    #[default]
    Monthly,
    /// Twelve monthly periods aggregated per entry
    Annual,
}

/// Optional schedule features
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub period_unit: PeriodUnit,

    /// Leading months in which only interest is paid (construction financing)
    pub interest_only_periods: u32,

    /// Monthly payment to use instead of the level payment once amortization starts
    pub payment_override: Option<f64>,
}

/// One period of an amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// 1-based month (or year for annual schedules)
    pub period: u32,
    pub beginning_balance: f64,
    pub payment: f64,
    pub interest_portion: f64,
    pub principal_portion: f64,
    pub ending_balance: f64,
}

/// How the schedule ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// Balance reached zero at or before the stated term
    Amortized,
    /// Balance remains at term (interest-only through term, or a payment
    /// between interest and the level payment)
    Balloon { balance: f64 },
    /// Payment fell below the interest due; the shortfall is not capitalized
    /// and the balance never declined as scheduled
    InterestShortfall { balance: f64 },
}

/// A full schedule with its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub period_unit: PeriodUnit,
    pub entries: Vec<AmortizationEntry>,
    pub status: ScheduleStatus,
}

impl AmortizationSchedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn final_balance(&self) -> f64 {
        self.entries.last().map(|e| e.ending_balance).unwrap_or(0.0)
    }

    pub fn total_interest(&self) -> f64 {
        self.entries.iter().map(|e| e.interest_portion).sum()
    }

    pub fn total_paid(&self) -> f64 {
        self.entries.iter().map(|e| e.payment).sum()
    }

    pub fn is_fully_amortized(&self) -> bool {
        self.status == ScheduleStatus::Amortized
    }

    /// Total payments per loan year as a stream with period 0 empty and loan
    /// year `y` at period `y`
    pub fn debt_service_by_year(&self) -> CashFlowStream {
        let per_year = match self.period_unit {
            PeriodUnit::Monthly => MONTHS_PER_YEAR as usize,
            PeriodUnit::Annual => 1,
        };

        let mut amounts = vec![0.0];
        amounts.extend(
            self.entries
                .chunks(per_year)
                .map(|year| year.iter().map(|e| e.payment).sum::<f64>()),
        );
        CashFlowStream::new(amounts)
    }

    /// Balance outstanding after `year` full loan years
    pub fn balance_after_year(&self, year: u32) -> f64 {
        if year == 0 {
            return self.entries.first().map(|e| e.beginning_balance).unwrap_or(0.0);
        }
        let per_year = match self.period_unit {
            PeriodUnit::Monthly => MONTHS_PER_YEAR,
            PeriodUnit::Annual => 1,
        };
        let index = (year * per_year) as usize - 1;
        self.entries
            .get(index)
            .map(|e| e.ending_balance)
            .unwrap_or_else(|| self.final_balance())
    }
}

/// Level monthly payment on `principal` over `term_years`.
///
/// `P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate and
/// `n = 12 * term_years`; `P / n` when the rate is zero. A zero principal
/// needs no payment. A negative principal or a zero term is `InvalidTerm`.
pub fn monthly_payment(principal: f64, annual_rate: Rate, term_years: u32) -> Result<f64> {
    validate_terms(principal, term_years)?;
    let monthly_rate = monthly_rate(annual_rate)?;

    Ok(level_payment(principal, monthly_rate, term_years * MONTHS_PER_YEAR))
}

/// Month-by-month amortization schedule, optionally aggregated by year
pub fn build_schedule(
    principal: f64,
    annual_rate: Rate,
    term_years: u32,
    options: &ScheduleOptions,
) -> Result<AmortizationSchedule> {
    validate_terms(principal, term_years)?;
    let r = monthly_rate(annual_rate)?;

    if let Some(payment) = options.payment_override {
        if !payment.is_finite() || payment < 0.0 {
            return Err(EngineError::InvalidTerm {
                principal,
                term_years,
                reason: "payment must be a non-negative amount",
            });
        }
    }

    let total_months = term_years * MONTHS_PER_YEAR;
    let interest_only = options.interest_only_periods.min(total_months);
    let amortizing_months = total_months - interest_only;
    let scheduled_payment = options
        .payment_override
        .unwrap_or_else(|| level_payment(principal, r, amortizing_months));

    let mut entries = Vec::with_capacity(total_months as usize);
    let mut balance = principal;
    let mut shortfall = false;

    for month in 1..=total_months {
        let beginning_balance = balance;
        let interest_due = beginning_balance * r;

        let (interest_portion, principal_portion) = if month <= interest_only {
            (interest_due, 0.0)
        } else if options.payment_override.is_none() && month == total_months {
            // Final level payment absorbs accumulated rounding
            (interest_due, beginning_balance)
        } else if scheduled_payment < interest_due {
            shortfall = true;
            (scheduled_payment, 0.0)
        } else {
            let toward_principal = (scheduled_payment - interest_due).min(beginning_balance);
            (interest_due, toward_principal)
        };

        balance = beginning_balance - principal_portion;
        entries.push(AmortizationEntry {
            period: month,
            beginning_balance,
            payment: interest_portion + principal_portion,
            interest_portion,
            principal_portion,
            ending_balance: balance,
        });

        // An overpaying override retires the loan early
        if balance <= BALANCE_TOLERANCE && principal > 0.0 {
            break;
        }
    }

    let status = if balance <= BALANCE_TOLERANCE {
        ScheduleStatus::Amortized
    } else if shortfall {
        ScheduleStatus::InterestShortfall { balance }
    } else {
        ScheduleStatus::Balloon { balance }
    };

    if status != ScheduleStatus::Amortized {
        log::debug!("schedule for {principal:.2} over {term_years} years ends {status:?}");
    }

    let entries = match options.period_unit {
        PeriodUnit::Monthly => entries,
        PeriodUnit::Annual => aggregate_annual(&entries),
    };

    Ok(AmortizationSchedule {
        period_unit: options.period_unit,
        entries,
        status,
    })
}

fn validate_terms(principal: f64, term_years: u32) -> Result<()> {
    if !principal.is_finite() || principal < 0.0 {
        return Err(EngineError::InvalidTerm {
            principal,
            term_years,
            reason: "principal must be a non-negative amount",
        });
    }
    if term_years == 0 {
        return Err(EngineError::InvalidTerm {
            principal,
            term_years,
            reason: "term must be at least one year",
        });
    }
    Ok(())
}

fn monthly_rate(annual_rate: Rate) -> Result<f64> {
    let r = annual_rate.per_period(MONTHS_PER_YEAR).as_fraction();
    if r.is_nan() || r <= -1.0 {
        return Err(EngineError::InvalidRate {
            rate: annual_rate.as_fraction(),
            reason: "loan rate must exceed -1200% per year",
        });
    }
    Ok(r)
}

fn level_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if principal == 0.0 || months == 0 {
        return 0.0;
    }
    if monthly_rate.abs() < 1e-15 {
        return principal / months as f64;
    }
    let growth = (1.0 + monthly_rate).powi(months as i32);
    principal * monthly_rate * growth / (growth - 1.0)
}

fn aggregate_annual(monthly: &[AmortizationEntry]) -> Vec<AmortizationEntry> {
    monthly
        .chunks(MONTHS_PER_YEAR as usize)
        .enumerate()
        .map(|(i, months)| {
            let first = months[0];
            let last = months[months.len() - 1];
            AmortizationEntry {
                period: i as u32 + 1,
                beginning_balance: first.beginning_balance,
                payment: months.iter().map(|m| m.payment).sum(),
                interest_portion: months.iter().map(|m| m.interest_portion).sum(),
                principal_portion: months.iter().map(|m| m.principal_portion).sum(),
                ending_balance: last.ending_balance,
            }
        })
        .collect()
}
