//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use esg_sim::config::ScenarioConfig;
use esg_sim::io::load::{load_demand, load_supply};
use esg_sim::market::demand::{DemandPeriod, DemandSchedule};
use esg_sim::market::portfolio::PortfolioCosts;
use esg_sim::market::stack::{SupplyStack, UnitSpec};

/// Path of a file shipped with the crate, relative to the manifest.
pub fn repo_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Two units: 50 MW at $10 and 50 MW at $20.
pub fn two_unit_stack() -> SupplyStack {
    SupplyStack::from_units(vec![
        UnitSpec::new("unit_1", "Cheap", 50.0, 10.0),
        UnitSpec::new("unit_2", "Dear", 50.0, 20.0),
    ])
    .expect("fixture stack is valid")
}

/// Costs for [`two_unit_stack`].
pub fn two_unit_costs() -> PortfolioCosts {
    PortfolioCosts::new()
        .with("Cheap", -100.0, 1000.0)
        .with("Dear", -100.0, 1000.0)
}

/// Supply stack from `data/supply.csv`.
pub fn game_stack() -> SupplyStack {
    load_supply(&repo_path("data/supply.csv")).expect("shipped supply data loads")
}

/// Demand schedule from `data/demand.csv`.
pub fn game_schedule() -> DemandSchedule {
    load_demand(&repo_path("data/demand.csv")).expect("shipped demand data loads")
}

/// Baseline portfolio costs.
pub fn game_costs() -> PortfolioCosts {
    ScenarioConfig::baseline().portfolio_costs()
}

/// Four days of four hours with a flat load.
pub fn flat_schedule(load_mw: f64) -> DemandSchedule {
    let periods = (1..=4)
        .flat_map(|day| (1..=4).map(move |hour| DemandPeriod::new(day, hour, load_mw)))
        .collect();
    DemandSchedule::new(periods).expect("fixture schedule is valid")
}
