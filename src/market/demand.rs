//! Demand schedule: one load value per simulated hour.

use std::collections::BTreeSet;

use crate::error::{Result, SimError};

/// One simulated hour of demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandPeriod {
    /// Financing-cycle key (>= 1).
    pub day: u32,
    /// Period key within the day.
    pub hour: u32,
    /// Demand to be served (MW, >= 0).
    pub load_mw: f64,
}

impl DemandPeriod {
    pub fn new(day: u32, hour: u32, load_mw: f64) -> Self {
        Self { day, hour, load_mw }
    }
}

/// Ordered list of demand periods.
///
/// Periods keep the order they were supplied in. Each period is dispatched
/// independently, so the order only matters for reporting.
#[derive(Debug, Clone, Default)]
pub struct DemandSchedule {
    periods: Vec<DemandPeriod>,
}

impl DemandSchedule {
    /// Builds a schedule, validating every period.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidLoad`] for a negative or non-finite load,
    /// [`SimError::Sequence`] for a day key of 0 and
    /// [`SimError::Configuration`] when a `(day, hour)` pair appears twice.
    pub fn new(periods: Vec<DemandPeriod>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for p in &periods {
            if !(p.load_mw.is_finite() && p.load_mw >= 0.0) {
                return Err(SimError::InvalidLoad { load_mw: p.load_mw });
            }
            if p.day == 0 {
                return Err(SimError::Sequence {
                    expected: 1,
                    found: 0,
                });
            }
            if !seen.insert((p.day, p.hour)) {
                return Err(SimError::Configuration(format!(
                    "duplicate demand period: day {} hour {}",
                    p.day, p.hour
                )));
            }
        }
        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[DemandPeriod] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Highest load in the schedule (MW), or 0 for an empty schedule.
    pub fn peak_load(&self) -> f64 {
        self.periods.iter().map(|p| p.load_mw).fold(0.0, f64::max)
    }

    /// Distinct day keys in ascending order.
    pub fn days(&self) -> Vec<u32> {
        let mut days: Vec<u32> = self.periods.iter().map(|p| p.day).collect();
        days.sort_unstable();
        days.dedup();
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_load() {
        let err = DemandSchedule::new(vec![DemandPeriod::new(1, 1, -1.0)]).unwrap_err();
        assert!(matches!(err, SimError::InvalidLoad { .. }));
    }

    #[test]
    fn rejects_day_zero() {
        let err = DemandSchedule::new(vec![DemandPeriod::new(0, 1, 10.0)]).unwrap_err();
        assert!(matches!(err, SimError::Sequence { found: 0, .. }));
    }

    #[test]
    fn rejects_repeated_period() {
        let err = DemandSchedule::new(vec![
            DemandPeriod::new(1, 1, 60.0),
            DemandPeriod::new(1, 2, 60.0),
            DemandPeriod::new(1, 1, 60.0),
        ])
        .unwrap_err();
        assert!(matches!(err, SimError::Configuration(ref m) if m.contains("day 1 hour 1")));
    }

    #[test]
    fn same_hour_on_different_days_is_allowed() {
        let schedule = DemandSchedule::new(vec![
            DemandPeriod::new(1, 1, 60.0),
            DemandPeriod::new(2, 1, 60.0),
        ])
        .expect("distinct periods");
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn days_are_distinct_and_sorted() {
        let schedule = DemandSchedule::new(vec![
            DemandPeriod::new(2, 1, 10.0),
            DemandPeriod::new(1, 1, 30.0),
            DemandPeriod::new(1, 2, 20.0),
        ])
        .expect("valid schedule");
        assert_eq!(schedule.days(), vec![1, 2]);
        assert_eq!(schedule.peak_load(), 30.0);
        assert_eq!(schedule.len(), 3);
    }
}
