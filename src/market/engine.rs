//! Period-by-period market engine: dispatch, then portfolio settlement.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;

use super::demand::{DemandPeriod, DemandSchedule};
use super::dispatch::dispatch;
use super::portfolio::{PeriodFinancials, PortfolioCosts, aggregate_period};
use super::stack::SupplyStack;

/// Market engine over a fixed supply stack and cost configuration.
///
/// The engine only borrows its inputs. Periods are independent of each
/// other, so the same engine can be run repeatedly or with different price
/// offsets without any state carrying over.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    stack: &'a SupplyStack,
    costs: &'a PortfolioCosts,
    price_offset: f64,
}

impl<'a> Engine<'a> {
    /// Creates an engine with no price offset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::Configuration`] if a portfolio of
    /// the stack has no cost entry.
    pub fn new(stack: &'a SupplyStack, costs: &'a PortfolioCosts) -> Result<Self> {
        costs.ensure_covers(stack)?;
        Ok(Self {
            stack,
            costs,
            price_offset: 0.0,
        })
    }

    /// Returns a copy of this engine that adds `price_offset` to every clearing price.
    #[must_use]
    pub fn with_price_offset(mut self, price_offset: f64) -> Self {
        self.price_offset = price_offset;
        self
    }

    pub fn price_offset(&self) -> f64 {
        self.price_offset
    }

    /// Clears one period and returns one row per portfolio.
    ///
    /// # Errors
    ///
    /// Propagates dispatch and aggregation errors for this period.
    pub fn step(&self, period: &DemandPeriod) -> Result<Vec<PeriodFinancials>> {
        let cleared = dispatch(self.stack, period.load_mw, self.price_offset)?;
        debug!(day = period.day, hour = period.hour, "{cleared}");

        let summaries = aggregate_period(&cleared.results, self.costs)?;
        Ok(summaries
            .into_iter()
            .map(|(portfolio_name, s)| PeriodFinancials {
                day: period.day,
                hour: period.hour,
                portfolio_name,
                revenue: s.revenue,
                cost: s.fixed_cost,
                profit: s.profit,
            })
            .collect())
    }

    /// Clears every period of the schedule, in schedule order.
    ///
    /// # Errors
    ///
    /// Fails on the first period that cannot be cleared; no partial table is
    /// returned.
    pub fn run(&self, schedule: &DemandSchedule) -> Result<Vec<PeriodFinancials>> {
        #[cfg(feature = "parallel")]
        let per_period: Vec<Vec<PeriodFinancials>> = schedule
            .periods()
            .par_iter()
            .map(|p| self.step(p))
            .collect::<Result<_>>()?;

        #[cfg(not(feature = "parallel"))]
        let per_period: Vec<Vec<PeriodFinancials>> = schedule
            .periods()
            .iter()
            .map(|p| self.step(p))
            .collect::<Result<_>>()?;

        let rows: Vec<PeriodFinancials> = per_period.into_iter().flatten().collect();
        info!(
            periods = schedule.len(),
            rows = rows.len(),
            price_offset = self.price_offset,
            "market run complete"
        );
        Ok(rows)
    }
}
