//! CSV and JSON file loading
//!
//! Cash flow files carry a `period,amount` header. Periods may arrive in any
//! order; missing periods are zero and repeated periods accumulate.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::amortization::AmortizationSchedule;
use crate::projection::CashFlowStream;

/// Raw CSV row of a cash flow file
#[derive(Debug, Deserialize)]
struct CashFlowRow {
    period: u32,
    amount: f64,
}

/// Load a cash flow stream from a `period,amount` CSV file
pub fn load_cash_flows(path: &Path) -> Result<CashFlowStream, Box<dyn Error>> {
    let file = File::open(path)?;
    read_cash_flows(file)
}

/// Parse `period,amount` CSV from any reader
pub fn read_cash_flows<R: std::io::Read>(reader: R) -> Result<CashFlowStream, Box<dyn Error>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut amounts: Vec<f64> = Vec::new();

    for result in reader.deserialize() {
        let row: CashFlowRow = result?;
        if !row.amount.is_finite() {
            return Err(format!("non-finite amount in period {}", row.period).into());
        }

        let index = row.period as usize;
        if amounts.len() <= index {
            amounts.resize(index + 1, 0.0);
        }
        amounts[index] += row.amount;
    }

    if amounts.is_empty() {
        return Err("cash flow file has no rows".into());
    }

    log::debug!("loaded {} cash flow periods", amounts.len());
    Ok(CashFlowStream::new(amounts))
}

/// Write every schedule entry as a CSV row
pub fn write_schedule_csv(
    path: &Path,
    schedule: &AmortizationSchedule,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    write_schedule(file, schedule)
}

/// Write schedule entries as CSV to any writer
pub fn write_schedule<W: std::io::Write>(
    writer: W,
    schedule: &AmortizationSchedule,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in &schedule.entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Load calculator inputs from a JSON file; absent fields take their defaults
pub fn load_json_inputs<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let file = File::open(path)?;
    let inputs = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(inputs)
}
