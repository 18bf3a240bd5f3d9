//! esg-sim entry point: CLI wiring, data loading and report printing.

use std::fs;
use std::path::Path;
use std::process;

use esg_sim::cli::{CliOptions, parse_args, print_usage};
use esg_sim::config::ScenarioConfig;
use esg_sim::finance::cashflow::FinancingReport;
use esg_sim::finance::sensitivity::{SensitivityTable, sweep};
use esg_sim::io::export::{export_financials, export_ledger, export_sensitivity};
use esg_sim::io::load::{load_demand, load_supply};
use esg_sim::market::engine::Engine;
use esg_sim::market::portfolio::PeriodFinancials;
use esg_sim::reporting::MarketReport;
use esg_sim::{Result, SimError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads the scenario from `--scenario`, `--preset`, or the baseline, then applies CLI overrides.
fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig> {
    let mut scenario = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(ref path) = cli.supply {
        scenario.data.supply.clone_from(path);
    }
    if let Some(ref path) = cli.demand {
        scenario.data.demand.clone_from(path);
    }
    if let Some(ref name) = cli.portfolio {
        scenario.financing.focus_portfolio.clone_from(name);
    }
    if let Some(ref offsets) = cli.offsets {
        scenario.sensitivity.offsets.clone_from(offsets);
    }

    let errors = scenario.validate();
    if let Some(first) = errors.first() {
        for e in &errors {
            eprintln!("{e}");
        }
        return Err(SimError::Configuration(format!(
            "{} invalid field(s), first: {}",
            errors.len(),
            first.field
        )));
    }
    Ok(scenario)
}

fn run(cli: &CliOptions) -> Result<()> {
    let scenario = load_scenario(cli)?;
    let stack = load_supply(&scenario.data.supply)?;
    let schedule = load_demand(&scenario.data.demand)?;
    let costs = scenario.portfolio_costs();

    let engine = Engine::new(&stack, &costs)?.with_price_offset(scenario.market.price_offset);
    let rows = engine.run(&schedule)?;

    let report = MarketReport::from_run(&stack, &rows);
    println!("{report}");

    let focus = &scenario.financing.focus_portfolio;
    let financing = FinancingReport::from_rows(
        &rows,
        focus,
        costs.overhead(focus)?,
        scenario.financing.daily_rate,
    )?;
    println!("\n{financing}");

    let table = sweep(&stack, &schedule, &costs, &scenario.sensitivity.offsets)?;
    println!("\n{table}");

    if let Some(ref dir) = cli.out_dir {
        export_all(dir, &rows, &financing, &table)?;
    }
    Ok(())
}

fn export_all(
    dir: &Path,
    rows: &[PeriodFinancials],
    financing: &FinancingReport,
    table: &SensitivityTable,
) -> Result<()> {
    fs::create_dir_all(dir)?;
    export_financials(rows, &dir.join("period_financials.csv"))?;
    export_ledger(
        &financing.ledger,
        &dir.join(format!("ledger_{}.csv", financing.portfolio_name)),
    )?;
    export_sensitivity(table, &dir.join("sensitivity.csv"))?;
    info!(dir = %dir.display(), "tables written");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
