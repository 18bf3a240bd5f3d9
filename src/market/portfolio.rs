//! Portfolio-level aggregation of dispatch outcomes.

use std::collections::BTreeMap;

use crate::error::{Result, SimError};

use super::dispatch::DispatchResult;
use super::stack::SupplyStack;

/// Per-portfolio financial terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioTerms {
    /// Fixed cost charged every hour regardless of dispatch. Signed, normally negative.
    pub hourly_cost: f64,
    /// Financing principal owed at the start of the horizon.
    pub overhead: f64,
}

/// Cost and financing configuration for every portfolio in a scenario.
///
/// Passed explicitly to each component so several scenarios can be
/// evaluated side by side. Lookups never fall back to a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioCosts {
    terms: BTreeMap<String, PortfolioTerms>,
}

impl PortfolioCosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the terms of one portfolio.
    pub fn insert(&mut self, portfolio_name: impl Into<String>, terms: PortfolioTerms) {
        self.terms.insert(portfolio_name.into(), terms);
    }

    /// Builder-style [`PortfolioCosts::insert`].
    pub fn with(mut self, portfolio_name: impl Into<String>, hourly_cost: f64, overhead: f64) -> Self {
        self.insert(
            portfolio_name,
            PortfolioTerms {
                hourly_cost,
                overhead,
            },
        );
        self
    }

    /// Terms for `portfolio_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the portfolio is unknown.
    pub fn terms(&self, portfolio_name: &str) -> Result<&PortfolioTerms> {
        self.terms.get(portfolio_name).ok_or_else(|| {
            SimError::Configuration(format!("no cost entry for portfolio \"{portfolio_name}\""))
        })
    }

    /// Hourly fixed cost for `portfolio_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the portfolio is unknown.
    pub fn hourly_cost(&self, portfolio_name: &str) -> Result<f64> {
        self.terms(portfolio_name).map(|t| t.hourly_cost)
    }

    /// Financing overhead for `portfolio_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if the portfolio is unknown.
    pub fn overhead(&self, portfolio_name: &str) -> Result<f64> {
        self.terms(portfolio_name).map(|t| t.overhead)
    }

    /// Checks that every portfolio in the stack has terms.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] naming the first missing portfolio.
    pub fn ensure_covers(&self, stack: &SupplyStack) -> Result<()> {
        for name in stack.portfolio_names() {
            self.terms(name)?;
        }
        Ok(())
    }
}

/// One portfolio's result for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioPeriodSummary {
    /// Sum of unit revenues.
    pub revenue: f64,
    /// Hourly fixed cost (signed).
    pub fixed_cost: f64,
    /// `revenue + fixed_cost`.
    pub profit: f64,
}

/// Rolls unit results up to one summary per portfolio.
///
/// Revenues are summed in merit order, which fixes the floating-point
/// reduction order. Portfolios with zero output still appear, carrying only
/// their fixed cost.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if a portfolio has no hourly cost.
pub fn aggregate_period(
    results: &[DispatchResult<'_>],
    costs: &PortfolioCosts,
) -> Result<BTreeMap<String, PortfolioPeriodSummary>> {
    let mut revenue: BTreeMap<&str, f64> = BTreeMap::new();
    for r in results {
        *revenue.entry(r.unit.portfolio_name.as_str()).or_default() += r.unit_revenue;
    }

    revenue
        .into_iter()
        .map(|(name, revenue)| -> Result<(String, PortfolioPeriodSummary)> {
            let fixed_cost = costs.hourly_cost(name)?;
            Ok((
                name.to_string(),
                PortfolioPeriodSummary {
                    revenue,
                    fixed_cost,
                    profit: revenue + fixed_cost,
                },
            ))
        })
        .collect()
}

/// One row of the per-period financial table.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodFinancials {
    pub day: u32,
    pub hour: u32,
    pub portfolio_name: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// Grouping used by [`aggregate_across`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// One total per portfolio over the whole run.
    Portfolio,
    /// One total per (day, portfolio).
    DayPortfolio,
}

/// Identity of an aggregated group. `day` is `None` for [`GroupKey::Portfolio`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId {
    pub day: Option<u32>,
    pub portfolio_name: String,
}

/// Summed revenue, cost and profit of a group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FinancialTotals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

impl FinancialTotals {
    fn add(&mut self, row: &PeriodFinancials) {
        self.revenue += row.revenue;
        self.cost += row.cost;
        self.profit += row.profit;
    }
}

/// Sums period rows by the requested key.
///
/// Rows are folded in slice order; the map is ordered by day, then portfolio.
pub fn aggregate_across(rows: &[PeriodFinancials], key: GroupKey) -> BTreeMap<GroupId, FinancialTotals> {
    let mut groups: BTreeMap<GroupId, FinancialTotals> = BTreeMap::new();
    for row in rows {
        let id = GroupId {
            day: match key {
                GroupKey::Portfolio => None,
                GroupKey::DayPortfolio => Some(row.day),
            },
            portfolio_name: row.portfolio_name.clone(),
        };
        groups.entry(id).or_default().add(row);
    }
    groups
}

/// Total profit per portfolio, keyed by name.
pub fn total_profit_by_portfolio(rows: &[PeriodFinancials]) -> BTreeMap<String, f64> {
    aggregate_across(rows, GroupKey::Portfolio)
        .into_iter()
        .map(|(id, totals)| (id.portfolio_name, totals.profit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dispatch::dispatch;
    use crate::market::stack::UnitSpec;

    fn stack() -> SupplyStack {
        SupplyStack::from_units(vec![
            UnitSpec::new("a1", "A", 50.0, 10.0),
            UnitSpec::new("b1", "B", 50.0, 20.0),
            UnitSpec::new("a2", "A", 50.0, 30.0),
            UnitSpec::new("c1", "C", 50.0, 40.0),
        ])
        .expect("valid stack")
    }

    fn costs() -> PortfolioCosts {
        PortfolioCosts::new()
            .with("A", -100.0, 1000.0)
            .with("B", -200.0, 1000.0)
            .with("C", -300.0, 1000.0)
    }

    fn row(day: u32, hour: u32, name: &str, revenue: f64, cost: f64) -> PeriodFinancials {
        PeriodFinancials {
            day,
            hour,
            portfolio_name: name.to_string(),
            revenue,
            cost,
            profit: revenue + cost,
        }
    }

    #[test]
    fn period_summary_includes_idle_portfolios() {
        let stack = stack();
        let d = dispatch(&stack, 120.0, 0.0).expect("within capacity");
        let summary = aggregate_period(&d.results, &costs()).expect("costs cover stack");

        // price = 30: a1 50*(30-10)=1000, b1 50*(30-20)=500, a2 marginal 0, c1 idle
        assert_eq!(summary.len(), 3);
        assert_eq!(summary["A"].revenue, 1000.0);
        assert_eq!(summary["A"].profit, 900.0);
        assert_eq!(summary["B"].revenue, 500.0);
        assert_eq!(summary["C"].revenue, 0.0);
        assert_eq!(summary["C"].profit, -300.0);
    }

    #[test]
    fn missing_cost_entry_fails_fast() {
        let stack = stack();
        let d = dispatch(&stack, 10.0, 0.0).expect("within capacity");
        let partial = PortfolioCosts::new().with("A", -1.0, 0.0).with("B", -1.0, 0.0);
        let err = aggregate_period(&d.results, &partial).unwrap_err();
        assert!(matches!(err, SimError::Configuration(ref m) if m.contains("\"C\"")));
        assert!(partial.ensure_covers(&stack).is_err());
        assert!(costs().ensure_covers(&stack).is_ok());
    }

    #[test]
    fn aggregate_by_portfolio_and_day() {
        let rows = vec![
            row(1, 1, "A", 10.0, -1.0),
            row(1, 2, "A", 20.0, -1.0),
            row(1, 1, "B", 5.0, -2.0),
            row(2, 1, "A", 40.0, -1.0),
        ];

        let by_portfolio = aggregate_across(&rows, GroupKey::Portfolio);
        let a = by_portfolio[&GroupId {
            day: None,
            portfolio_name: "A".into(),
        }];
        assert_eq!(a.revenue, 70.0);
        assert_eq!(a.cost, -3.0);
        assert_eq!(a.profit, 67.0);

        let by_day = aggregate_across(&rows, GroupKey::DayPortfolio);
        assert_eq!(by_day.len(), 3);
        let keys: Vec<(Option<u32>, &str)> = by_day
            .keys()
            .map(|k| (k.day, k.portfolio_name.as_str()))
            .collect();
        assert_eq!(keys, vec![(Some(1), "A"), (Some(1), "B"), (Some(2), "A")]);
        assert_eq!(
            by_day[&GroupId {
                day: Some(1),
                portfolio_name: "A".into()
            }]
            .profit,
            28.0
        );

        let totals = total_profit_by_portfolio(&rows);
        assert_eq!(totals["B"], 3.0);
    }

    #[test]
    fn unknown_portfolio_lookup_is_an_error() {
        assert!(costs().overhead("Z").is_err());
        assert_eq!(costs().overhead("A").ok(), Some(1000.0));
    }
}
