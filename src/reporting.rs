//! Post-run summary of the market simulation.

use std::fmt;

use crate::market::portfolio::{FinancialTotals, GroupKey, PeriodFinancials, aggregate_across};
use crate::market::stack::{PortfolioProfile, SupplyStack};

/// Fleet description and run totals for every portfolio.
///
/// Computed post-hoc from the period table so the printed totals always
/// agree with the exported rows.
#[derive(Debug, Clone)]
pub struct MarketReport {
    /// Static fleet description, one entry per portfolio.
    pub profiles: Vec<PortfolioProfile>,
    /// Revenue, cost and profit summed over all periods.
    pub totals: Vec<(String, FinancialTotals)>,
    /// Number of distinct (day, hour) periods in the run.
    pub period_count: usize,
}

impl MarketReport {
    pub fn from_run(stack: &SupplyStack, rows: &[PeriodFinancials]) -> Self {
        let totals = aggregate_across(rows, GroupKey::Portfolio)
            .into_iter()
            .map(|(id, t)| (id.portfolio_name, t))
            .collect();

        let mut periods: Vec<(u32, u32)> = rows.iter().map(|r| (r.day, r.hour)).collect();
        periods.sort_unstable();
        periods.dedup();

        Self {
            profiles: stack.portfolio_summaries(),
            totals,
            period_count: periods.len(),
        }
    }

    /// Portfolio with the highest total profit.
    pub fn most_profitable(&self) -> Option<&str> {
        self.totals
            .iter()
            .max_by(|a, b| a.1.profit.total_cmp(&b.1.profit))
            .map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for MarketReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Portfolios ---")?;
        for p in &self.profiles {
            writeln!(f, "{p}")?;
        }
        writeln!(f)?;
        writeln!(f, "--- Profit over {} periods ---", self.period_count)?;
        for (name, t) in &self.totals {
            writeln!(
                f,
                "{name:<14} revenue={:>13.2}  cost={:>12.2}  profit={:>13.2}",
                t.revenue, t.cost, t.profit
            )?;
        }
        write!(
            f,
            "Most profitable:       {}",
            self.most_profitable().unwrap_or("-")
        )
    }
}
