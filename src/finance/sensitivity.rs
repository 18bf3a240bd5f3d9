//! Profit sensitivity to clearing-price markups.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use crate::error::Result;
use crate::market::demand::DemandSchedule;
use crate::market::engine::Engine;
use crate::market::portfolio::{PortfolioCosts, total_profit_by_portfolio};
use crate::market::stack::SupplyStack;

/// Total profit per portfolio at each price offset.
///
/// Column 0 is always the baseline (offset 0).
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityTable {
    offsets: Vec<f64>,
    profits: BTreeMap<String, Vec<f64>>,
}

impl SensitivityTable {
    /// Offsets in column order.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Rows keyed by portfolio name, one value per offset.
    pub fn rows(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.profits
    }

    /// Total profit of `portfolio_name` at column `column`.
    pub fn profit(&self, portfolio_name: &str, column: usize) -> Option<f64> {
        self.profits.get(portfolio_name)?.get(column).copied()
    }
}

impl fmt::Display for SensitivityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Profit vs. price offset ---")?;
        write!(f, "{:<14}", "portfolio")?;
        for offset in &self.offsets {
            write!(f, " {:>14}", format!("{offset:+.2}"))?;
        }
        for (name, profits) in &self.profits {
            writeln!(f)?;
            write!(f, "{name:<14}")?;
            for p in profits {
                write!(f, " {p:>14.2}")?;
            }
        }
        Ok(())
    }
}

/// Re-runs the full market for each offset and tabulates total profit.
///
/// Each offset gets its own engine; nothing is shared between iterations
/// other than the read-only inputs. A baseline column at offset 0 is
/// prepended when `offsets` does not already start with it.
///
/// # Errors
///
/// Propagates the first market error from any iteration.
pub fn sweep(
    stack: &SupplyStack,
    schedule: &DemandSchedule,
    costs: &PortfolioCosts,
    offsets: &[f64],
) -> Result<SensitivityTable> {
    let mut columns = Vec::with_capacity(offsets.len() + 1);
    if offsets.first() != Some(&0.0) {
        columns.push(0.0);
    }
    columns.extend_from_slice(offsets);

    let base = Engine::new(stack, costs)?;
    let mut profits: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for &offset in &columns {
        let rows = base.with_price_offset(offset).run(schedule)?;
        for (name, profit) in total_profit_by_portfolio(&rows) {
            profits.entry(name).or_default().push(profit);
        }
    }

    info!(offsets = columns.len(), portfolios = profits.len(), "sensitivity sweep complete");
    Ok(SensitivityTable {
        offsets: columns,
        profits,
    })
}
