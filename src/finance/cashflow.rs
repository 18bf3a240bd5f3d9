//! Daily financing: debt amortization, cash flow and return on investment.

use std::fmt;

use tracing::{info, warn};

use crate::error::{Result, SimError};
use crate::market::portfolio::{GroupKey, PeriodFinancials, aggregate_across};

/// Profit realised by one portfolio on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyProfit {
    pub day: u32,
    pub profit: f64,
}

/// One day of the financing ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub day: u32,
    /// Profit that flowed in on this day.
    pub inflow: f64,
    /// Balance after the day's interest accrued (>= 0).
    pub owed_begin_of_day: f64,
    /// Amount applied to the debt (0 <= payment <= owed_begin_of_day).
    pub payment: f64,
    /// Net cash kept by the owner. Negative on loss-making days.
    pub cash_flow: f64,
    /// Balance carried into the next day.
    pub owed_end_of_day: f64,
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day={:>2} | owed={:>12.2}  payment={:>11.2}  cash_flow={:>11.2}",
            self.day, self.owed_begin_of_day, self.payment, self.cash_flow
        )
    }
}

/// Extracts the daily profit series of one portfolio from the period table.
///
/// Periods are summed per day and the series is returned in ascending day
/// order, whatever order the rows arrive in. Gaps in the day keys are left
/// for [`amortize`] to reject.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if the portfolio never appears.
pub fn daily_profit(rows: &[PeriodFinancials], portfolio_name: &str) -> Result<Vec<DailyProfit>> {
    let series: Vec<DailyProfit> = aggregate_across(rows, GroupKey::DayPortfolio)
        .into_iter()
        .filter(|(id, _)| id.portfolio_name == portfolio_name)
        .filter_map(|(id, totals)| {
            id.day.map(|day| DailyProfit {
                day,
                profit: totals.profit,
            })
        })
        .collect();

    if series.is_empty() {
        return Err(SimError::Configuration(format!(
            "portfolio \"{portfolio_name}\" has no results"
        )));
    }
    Ok(series)
}

/// Runs the daily debt recurrence over `series`.
///
/// The balance starts at `overhead`. Each day interest accrues first, then
/// the day's profit is applied:
///
/// 1. a loss adds to the debt and is the day's cash flow;
/// 2. a profit up to the balance goes entirely to the debt;
/// 3. a profit above a positive balance retires it and the rest is cash;
/// 4. once the balance is zero, profit is cash.
///
/// # Errors
///
/// * [`SimError::Sequence`] unless days run `1, 2, ..., N` in order.
/// * [`SimError::Configuration`] for a negative or non-finite overhead, or a
///   rate that is not finite or is <= -1.
///
/// # Examples
///
/// ```
/// use esg_sim::finance::cashflow::{DailyProfit, amortize};
///
/// let ledger = amortize(&[DailyProfit { day: 1, profit: -9250.0 }], 225_000.0, 0.05).unwrap();
/// assert_eq!(ledger[0].owed_begin_of_day, 236_250.0);
/// assert_eq!(ledger[0].owed_end_of_day, 245_500.0);
/// ```
pub fn amortize(series: &[DailyProfit], overhead: f64, daily_rate: f64) -> Result<Vec<LedgerEntry>> {
    if !(overhead.is_finite() && overhead >= 0.0) {
        return Err(SimError::Configuration(format!(
            "overhead must be finite and >= 0, got {overhead}"
        )));
    }
    if !(daily_rate.is_finite() && daily_rate > -1.0) {
        return Err(SimError::Configuration(format!(
            "daily rate must be finite and > -1, got {daily_rate}"
        )));
    }

    let mut owed = overhead;
    let mut ledger = Vec::with_capacity(series.len());

    for (expected, entry) in (1_u32..).zip(series) {
        if entry.day != expected {
            return Err(SimError::Sequence {
                expected,
                found: entry.day,
            });
        }

        owed *= 1.0 + daily_rate;
        let owed_begin_of_day = owed;
        let inflow = entry.profit;

        let (payment, cash_flow) = if inflow < 0.0 {
            owed -= inflow;
            (0.0, inflow)
        } else if inflow <= owed {
            owed -= inflow;
            (inflow, 0.0)
        } else if owed > 0.0 {
            let payment = owed;
            owed = 0.0;
            (payment, inflow - payment)
        } else {
            (0.0, inflow)
        };

        ledger.push(LedgerEntry {
            day: entry.day,
            inflow,
            owed_begin_of_day,
            payment,
            cash_flow,
            owed_end_of_day: owed,
        });
    }

    Ok(ledger)
}

/// Return on investment in percent: total cash flow over `overhead`.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if `overhead` is zero or not finite.
pub fn roi(ledger: &[LedgerEntry], overhead: f64) -> Result<f64> {
    if !overhead.is_finite() || overhead == 0.0 {
        return Err(SimError::Configuration(format!(
            "ROI needs a non-zero finite overhead, got {overhead}"
        )));
    }
    let total: f64 = ledger.iter().map(|e| e.cash_flow).sum();
    Ok(total / overhead * 100.0)
}

/// Ledger and ROI of one portfolio over the financing horizon.
#[derive(Debug, Clone)]
pub struct FinancingReport {
    pub portfolio_name: String,
    pub overhead: f64,
    pub daily_rate: f64,
    pub ledger: Vec<LedgerEntry>,
    pub roi_pct: f64,
}

impl FinancingReport {
    /// Builds the ledger for `portfolio_name` from the period table.
    ///
    /// # Errors
    ///
    /// Propagates [`daily_profit`], [`amortize`] and [`roi`] errors.
    pub fn from_rows(
        rows: &[PeriodFinancials],
        portfolio_name: &str,
        overhead: f64,
        daily_rate: f64,
    ) -> Result<Self> {
        let series = daily_profit(rows, portfolio_name)?;
        let ledger = amortize(&series, overhead, daily_rate)?;
        let roi_pct = roi(&ledger, overhead)?;

        let outstanding = ledger.last().map_or(overhead, |e| e.owed_end_of_day);
        if outstanding > 0.0 {
            warn!(portfolio = portfolio_name, outstanding, "debt not retired within horizon");
        }
        info!(portfolio = portfolio_name, days = ledger.len(), roi_pct, "financing ledger built");

        Ok(Self {
            portfolio_name: portfolio_name.to_string(),
            overhead,
            daily_rate,
            ledger,
            roi_pct,
        })
    }

    /// Debt left after the final day.
    pub fn outstanding(&self) -> f64 {
        self.ledger.last().map_or(self.overhead, |e| e.owed_end_of_day)
    }

    /// Total cash flow over the horizon.
    pub fn total_cash_flow(&self) -> f64 {
        self.ledger.iter().map(|e| e.cash_flow).sum()
    }
}

impl fmt::Display for FinancingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Financing: {} (overhead {:.2}, rate {:.2}%/day) ---",
            self.portfolio_name,
            self.overhead,
            self.daily_rate * 100.0
        )?;
        for entry in &self.ledger {
            writeln!(f, "{entry}")?;
        }
        writeln!(f, "Outstanding debt:      {:.2}", self.outstanding())?;
        writeln!(f, "Total cash flow:       {:.2}", self.total_cash_flow())?;
        write!(f, "ROI:                   {:.2}%", self.roi_pct)
    }
}
