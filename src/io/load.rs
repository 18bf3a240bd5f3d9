//! CSV loaders for the supply stack and the demand schedule.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::market::demand::{DemandPeriod, DemandSchedule};
use crate::market::stack::{SupplyStack, UnitSpec};

/// Supply CSV row: `unit_name,portfolio_name,mw,mc,fixom`.
#[derive(Debug, Deserialize)]
struct SupplyRecord {
    #[serde(alias = "unit_id")]
    unit_name: String,
    portfolio_name: String,
    mw: f64,
    mc: f64,
    #[serde(default)]
    fixom: f64,
}

/// Demand CSV row: `day,hour,load`.
#[derive(Debug, Deserialize)]
struct DemandRecord {
    day: u32,
    hour: u32,
    #[serde(alias = "load_mw")]
    load: f64,
}

/// Reads a supply stack from CSV.
///
/// Rows may be in any order; the stack is sorted and its cumulative
/// capacities are derived here rather than read from the file.
///
/// # Errors
///
/// Returns a CSV error for malformed rows or a
/// [`crate::error::SimError::DataOrdering`] for invalid unit values.
pub fn read_supply(reader: impl Read) -> Result<SupplyStack> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut specs = Vec::new();
    for record in rdr.deserialize() {
        let r: SupplyRecord = record?;
        specs.push(UnitSpec::new(r.unit_name, r.portfolio_name, r.mw, r.mc).with_fixed_om(r.fixom));
    }
    SupplyStack::from_units(specs)
}

/// Reads a demand schedule from CSV.
///
/// # Errors
///
/// Returns a CSV error for malformed rows, or a validation error for a
/// negative load or a day of 0.
pub fn read_demand(reader: impl Read) -> Result<DemandSchedule> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut periods = Vec::new();
    for record in rdr.deserialize() {
        let r: DemandRecord = record?;
        periods.push(DemandPeriod::new(r.day, r.hour, r.load));
    }
    DemandSchedule::new(periods)
}

/// Loads the supply stack from `path`.
///
/// # Errors
///
/// See [`read_supply`]; also fails if the file cannot be opened.
pub fn load_supply(path: &Path) -> Result<SupplyStack> {
    let stack = read_supply(File::open(path)?)?;
    info!(
        path = %path.display(),
        units = stack.len(),
        capacity_mw = stack.total_capacity(),
        "loaded supply stack"
    );
    Ok(stack)
}

/// Loads the demand schedule from `path`.
///
/// # Errors
///
/// See [`read_demand`]; also fails if the file cannot be opened.
pub fn load_demand(path: &Path) -> Result<DemandSchedule> {
    let schedule = read_demand(File::open(path)?)?;
    info!(
        path = %path.display(),
        periods = schedule.len(),
        peak_mw = schedule.peak_load(),
        "loaded demand schedule"
    );
    Ok(schedule)
}
