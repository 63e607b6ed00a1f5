//! Financial calculator CLI
//!
//! Runs the engine's calculators from the command line. Calculator inputs come
//! from JSON files (missing fields take defaults); `--json` prints results as
//! JSON instead of tables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use serde::Serialize;

use tvm_engine::amortization::{build_schedule, PeriodUnit, ScheduleOptions};
use tvm_engine::calculators::proforma::{self, DevelopmentProForma, ProFormaInputs};
use tvm_engine::calculators::retirement::{RetirementInputs, RetirementProjector};
use tvm_engine::calculators::social_security::{
    self, full_retirement_age, primary_insurance_amount, ClaimingAnalysis, ClaimingInputs,
};
use tvm_engine::loader::{load_cash_flows, load_json_inputs, write_schedule_csv};
use tvm_engine::scenario::ScenarioSweepResult;
use tvm_engine::time_value::{internal_rate_of_return, payback_period, present_value};
use tvm_engine::Rate;

#[derive(Parser, Debug)]
#[command(name = "tvm_engine")]
#[command(about = "Time-value-of-money calculators", version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Level-payment loan schedule
    Amortize {
        #[arg(long)]
        principal: f64,
        /// Annual rate in percent
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        years: u32,
        /// Leading interest-only months
        #[arg(long, default_value_t = 0)]
        interest_only_months: u32,
        /// Fixed monthly payment instead of the level payment
        #[arg(long)]
        payment: Option<f64>,
        /// Report one row per year
        #[arg(long)]
        annual: bool,
        /// Write every row to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Rows to print
        #[arg(long, default_value_t = 12)]
        rows: usize,
    },

    /// NPV, IRR and payback of a `period,amount` cash flow file
    Npv {
        file: PathBuf,
        /// Discount rate per period in percent
        #[arg(long)]
        rate: f64,
        /// Periods per year, used to annualize the IRR
        #[arg(long, default_value_t = 1)]
        periods_per_year: u32,
    },

    /// Social Security claiming age optimization
    Claiming {
        /// JSON claiming inputs
        #[arg(long)]
        input: Option<PathBuf>,
        /// Derive the PIA from average indexed monthly earnings
        #[arg(long)]
        aime: Option<f64>,
        /// Derive full retirement age from the birth year
        #[arg(long)]
        birth_year: Option<i32>,
        /// Spouse's own PIA, to include a spousal benefit
        #[arg(long)]
        spouse_pia: Option<f64>,
        /// Age at which the spouse claims
        #[arg(long)]
        spouse_claiming_age: Option<f64>,
        /// Sensitivity steps in percent
        #[arg(long, value_delimiter = ',')]
        sensitivity: Vec<f64>,
    },

    /// Real-estate development pro-forma
    Proforma {
        /// JSON pro-forma inputs
        #[arg(long)]
        input: Option<PathBuf>,
        /// Search hold periods up to this many years
        #[arg(long)]
        max_hold: Option<u32>,
        /// Sensitivity steps in percent
        #[arg(long, value_delimiter = ',')]
        sensitivity: Vec<f64>,
    },

    /// Retirement account projection
    Retirement {
        /// JSON retirement inputs
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Amortize {
            principal,
            rate,
            years,
            interest_only_months,
            payment,
            annual,
            csv,
            rows,
        } => {
            let options = ScheduleOptions {
                period_unit: if annual { PeriodUnit::Annual } else { PeriodUnit::Monthly },
                interest_only_periods: interest_only_months,
                payment_override: payment,
            };
            let schedule = build_schedule(principal, Rate::from_percent(rate), years, &options)
                .context("failed to build amortization schedule")?;

            if let Some(path) = &csv {
                write_schedule_csv(path, &schedule)
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }

            if cli.json {
                return print_json(&schedule);
            }

            println!("Amortization: {:.2} at {}% over {} years", principal, rate, years);
            println!(
                "{:>6} {:>14} {:>12} {:>12} {:>12} {:>14}",
                "Period", "Beginning", "Payment", "Interest", "Principal", "Ending"
            );
            println!("{}", "-".repeat(75));
            for entry in schedule.entries.iter().take(rows) {
                println!(
                    "{:>6} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                    entry.period,
                    entry.beginning_balance,
                    entry.payment,
                    entry.interest_portion,
                    entry.principal_portion,
                    entry.ending_balance
                );
            }
            if schedule.len() > rows {
                println!("  ... {} more rows", schedule.len() - rows);
            }
            println!();
            println!("Total paid:     {:>14.2}", schedule.total_paid());
            println!("Total interest: {:>14.2}", schedule.total_interest());
            println!("Final balance:  {:>14.2}", schedule.final_balance());
            println!("Status:         {:?}", schedule.status);
        }

        Command::Npv {
            file,
            rate,
            periods_per_year,
        } => {
            let stream = load_cash_flows(&file)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("failed to load {}", file.display()))?;

            let npv = present_value(&stream, Rate::from_percent(rate))?;
            let irr = internal_rate_of_return(&stream, periods_per_year);
            let payback = payback_period(&stream);

            if cli.json {
                return print_json(&NpvReport {
                    periods: stream.len(),
                    npv,
                    irr_pct: irr.map(|r| r.as_percent()),
                    payback_periods: payback.is_finite().then_some(payback),
                });
            }

            println!("Periods: {}", stream.len());
            println!("NPV at {}%: {:.2}", rate, npv);
            match irr {
                Some(irr) => println!("IRR: {}", irr),
                None => println!("IRR: none"),
            }
            if payback.is_finite() {
                println!("Payback: {:.2} periods", payback);
            } else {
                println!("Payback: never");
            }
        }

        Command::Claiming {
            input,
            aime,
            birth_year,
            spouse_pia,
            spouse_claiming_age,
            sensitivity,
        } => {
            let mut inputs: ClaimingInputs = read_inputs(input.as_ref())?;
            if let Some(aime) = aime {
                inputs.pia = primary_insurance_amount(aime, chrono::Local::now().year());
            }
            if let Some(birth_year) = birth_year {
                inputs.full_retirement_age = full_retirement_age(birth_year);
            }
            if spouse_pia.is_some() {
                inputs.spouse_pia = spouse_pia;
            }
            if let Some(age) = spouse_claiming_age {
                inputs.spouse_claiming_age = age;
            }

            let analysis = ClaimingAnalysis::new(&inputs).context("invalid claiming inputs")?;
            let recommendation = analysis.optimize()?;
            let sweep = if sensitivity.is_empty() {
                None
            } else {
                Some(social_security::sensitivity(&inputs, &sensitivity)?)
            };

            if cli.json {
                return print_json(&(recommendation, sweep));
            }

            println!(
                "PIA {:.2}, full retirement age {:.2}, horizon {}",
                inputs.pia, inputs.full_retirement_age, inputs.horizon_age
            );
            println!("{:>4} {:>12} {:>16}", "Age", "Monthly", "Present value");
            for point in &recommendation.optimization.evaluated_points {
                println!(
                    "{:>4} {:>12.2} {:>16.2}",
                    point.decision_value,
                    analysis.monthly_benefit(point.decision_value as u32),
                    point.objective_value
                );
            }
            println!();
            println!("Optimal claiming age: {}", recommendation.optimal_age);
            println!("Monthly benefit:      {:.2}", recommendation.monthly_benefit);
            println!("Advantage over 62:    {:.2}", recommendation.advantage_over_earliest);
            if recommendation.break_even_age.is_finite() {
                println!("Break-even age:       {:.2}", recommendation.break_even_age);
            }
            if let Some(spousal) = &recommendation.spousal {
                println!("Spousal benefit:      {:.2}", spousal.spousal_benefit);
                println!("Household monthly:    {:.2}", spousal.combined_monthly);
            }
            if let Some(sweep) = &sweep {
                print_sweep(sweep);
            }
        }

        Command::Proforma {
            input,
            max_hold,
            sensitivity,
        } => {
            let inputs: ProFormaInputs = read_inputs(input.as_ref())?;
            let model =
                DevelopmentProForma::new(inputs.clone()).context("invalid pro-forma inputs")?;
            let summary = model.summary()?;

            let hold = match max_hold {
                Some(max) => Some(model.best_hold_period(1, max)?),
                None => None,
            };
            let sweep = if sensitivity.is_empty() {
                None
            } else {
                Some(proforma::sensitivity(&inputs, &sensitivity)?)
            };

            if cli.json {
                return print_json(&(summary, hold, sweep));
            }

            println!("Total development cost: {:>14.2}", summary.costs.total);
            println!("Equity:                 {:>14.2}", summary.financing.equity);
            println!("Permanent loan:         {:>14.2}", summary.financing.permanent_loan);
            println!("Year 1 NOI:             {:>14.2}", summary.first_year_noi);
            println!("Year 1 debt service:    {:>14.2}", summary.first_year_debt_service);
            println!("DSCR:                   {:>14.2}", summary.debt_service_coverage);
            println!("Cash-on-cash:           {:>13.2}%", summary.cash_on_cash_pct);
            println!("Exit value:             {:>14.2}", summary.exit_value);
            println!("Equity NPV:             {:>14.2}", summary.npv);
            match summary.irr_pct {
                Some(irr) => println!("Equity IRR:             {:>13.2}%", irr),
                None => println!("Equity IRR:             {:>14}", "none"),
            }
            println!("Equity multiple:        {:>14.2}", summary.equity_multiple);
            if let Some(hold) = &hold {
                println!(
                    "Best hold period:       {:>11} yrs (NPV {:.2})",
                    hold.best_decision_value, hold.best_objective_value
                );
            }
            if let Some(sweep) = &sweep {
                print_sweep(sweep);
            }
        }

        Command::Retirement { input } => {
            let inputs: RetirementInputs = read_inputs(input.as_ref())?;
            let retirement_age = inputs.retirement_age;
            let projection = RetirementProjector::new(inputs)
                .context("invalid retirement inputs")?
                .project();
            let summary = projection.summary(retirement_age);

            if cli.json {
                return print_json(&(summary, projection));
            }

            println!(
                "{:>4} {:>14} {:>12} {:>12} {:>12} {:>14} {:>14}",
                "Age", "Beginning", "Contrib", "Return", "Withdrawal", "Ending", "Real"
            );
            println!("{}", "-".repeat(90));
            for row in &projection.rows {
                println!(
                    "{:>4} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>14.2}",
                    row.age,
                    row.beginning_balance,
                    row.total_contribution(),
                    row.investment_return,
                    row.withdrawal,
                    row.ending_balance,
                    row.real_ending_balance
                );
            }
            println!();
            println!("Balance at retirement: {:.2}", summary.balance_at_retirement);
            println!("Total contributions:   {:.2}", summary.total_contributions);
            println!("Total withdrawals:     {:.2}", summary.total_withdrawals);
            match summary.depletion_age {
                Some(age) => println!("Depleted at age {}", age),
                None => println!("Final balance:         {:.2}", summary.final_balance),
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct NpvReport {
    periods: usize,
    npv: f64,
    irr_pct: Option<f64>,
    payback_periods: Option<f64>,
}

fn read_inputs<T>(path: Option<&PathBuf>) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match path {
        Some(path) => load_json_inputs(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to read inputs from {}", path.display())),
        None => Ok(T::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn print_sweep(sweep: &ScenarioSweepResult) {
    println!();
    println!("Sensitivity (base {:.2})", sweep.base_objective);
    for scenario in &sweep.scenarios {
        println!(
            "  {:<36} {:>14.2} {:>+14.2}",
            scenario.scenario_label,
            scenario.objective_value,
            scenario.objective_value - sweep.base_objective
        );
    }
    println!(
        "  best: {}, worst: {}",
        sweep.best_case.scenario_label, sweep.worst_case.scenario_label
    );
}
