//! Merit-order supply stack.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SimError};

/// Tolerance used when checking stored cumulative capacities against the
/// prefix sum of unit capacities.
const CUMULATIVE_TOLERANCE_MW: f64 = 1e-6;

/// One generating unit, i.e. one row of the supply stack.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratingUnit {
    /// Unit identity.
    pub unit_id: String,
    /// Owning portfolio.
    pub portfolio_name: String,
    /// Nameplate output (MW, > 0).
    pub capacity_mw: f64,
    /// Cost per MWh. May be negative for must-run units.
    pub marginal_cost: f64,
    /// Fixed operating and maintenance cost. Not used by dispatch.
    pub fixed_om_cost: f64,
    /// Running capacity sum up to and including this unit (MW).
    pub cumulative_capacity: f64,
}

/// Unit description before it is placed into a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub unit_id: String,
    pub portfolio_name: String,
    pub capacity_mw: f64,
    pub marginal_cost: f64,
    pub fixed_om_cost: f64,
}

impl UnitSpec {
    /// Creates a unit description with zero fixed O&M cost.
    pub fn new(
        unit_id: impl Into<String>,
        portfolio_name: impl Into<String>,
        capacity_mw: f64,
        marginal_cost: f64,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            portfolio_name: portfolio_name.into(),
            capacity_mw,
            marginal_cost,
            fixed_om_cost: 0.0,
        }
    }

    /// Sets the fixed O&M cost.
    pub fn with_fixed_om(mut self, fixed_om_cost: f64) -> Self {
        self.fixed_om_cost = fixed_om_cost;
        self
    }
}

/// Supply stack sorted ascending by marginal cost.
///
/// The stack is immutable once built. Both constructors validate the
/// ordering and cumulative-capacity invariants, so dispatch can rely on them
/// without re-checking.
#[derive(Debug, Clone)]
pub struct SupplyStack {
    units: Vec<GeneratingUnit>,
}

impl SupplyStack {
    /// Builds a stack from units that are already in merit order and carry
    /// their own cumulative capacities.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DataOrdering`] if the units are not sorted by
    /// marginal cost, a capacity is not positive, or a cumulative capacity
    /// differs from the prefix sum of capacities.
    pub fn new(units: Vec<GeneratingUnit>) -> Result<Self> {
        let mut running = 0.0_f64;
        let mut prev_cost = f64::NEG_INFINITY;

        for (index, unit) in units.iter().enumerate() {
            check_unit_values(index, &unit.unit_id, unit.capacity_mw, unit.marginal_cost)?;
            if unit.marginal_cost < prev_cost {
                return Err(SimError::DataOrdering {
                    index,
                    message: format!(
                        "marginal cost {} of \"{}\" is below previous unit's {prev_cost}",
                        unit.marginal_cost, unit.unit_id
                    ),
                });
            }
            running += unit.capacity_mw;
            if (unit.cumulative_capacity - running).abs() > CUMULATIVE_TOLERANCE_MW {
                return Err(SimError::DataOrdering {
                    index,
                    message: format!(
                        "cumulative capacity {} of \"{}\" does not match prefix sum {running}",
                        unit.cumulative_capacity, unit.unit_id
                    ),
                });
            }
            prev_cost = unit.marginal_cost;
        }

        Ok(Self { units })
    }

    /// Builds a stack from units in any order.
    ///
    /// Units are stable-sorted by marginal cost, so equal-cost units keep
    /// their input order, then cumulative capacities are computed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DataOrdering`] if a capacity is not positive or a
    /// marginal cost is not finite.
    pub fn from_units(specs: Vec<UnitSpec>) -> Result<Self> {
        for (index, spec) in specs.iter().enumerate() {
            check_unit_values(index, &spec.unit_id, spec.capacity_mw, spec.marginal_cost)?;
        }

        let mut specs = specs;
        specs.sort_by(|a, b| a.marginal_cost.total_cmp(&b.marginal_cost));

        let mut cumulative = 0.0_f64;
        let units = specs
            .into_iter()
            .map(|spec| {
                cumulative += spec.capacity_mw;
                GeneratingUnit {
                    unit_id: spec.unit_id,
                    portfolio_name: spec.portfolio_name,
                    capacity_mw: spec.capacity_mw,
                    marginal_cost: spec.marginal_cost,
                    fixed_om_cost: spec.fixed_om_cost,
                    cumulative_capacity: cumulative,
                }
            })
            .collect();

        Ok(Self { units })
    }

    /// Units in merit order.
    pub fn units(&self) -> &[GeneratingUnit] {
        &self.units
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the stack holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total installed capacity (MW).
    pub fn total_capacity(&self) -> f64 {
        self.units.last().map_or(0.0, |u| u.cumulative_capacity)
    }

    /// Distinct portfolio names, sorted.
    pub fn portfolio_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .units
            .iter()
            .map(|u| u.portfolio_name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Per-portfolio capacity, fixed O&M and capacity-weighted marginal cost.
    pub fn portfolio_summaries(&self) -> Vec<PortfolioProfile> {
        let mut acc: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();
        for u in &self.units {
            let entry = acc.entry(u.portfolio_name.as_str()).or_default();
            entry.0 += u.capacity_mw;
            entry.1 += u.fixed_om_cost;
            entry.2 += u.capacity_mw * u.marginal_cost;
        }

        acc.into_iter()
            .map(|(name, (cap, fixom, weighted))| PortfolioProfile {
                portfolio_name: name.to_string(),
                capacity_mw: cap,
                fixed_om_cost: fixom,
                weighted_marginal_cost: weighted / cap,
            })
            .collect()
    }
}

fn check_unit_values(index: usize, unit_id: &str, capacity_mw: f64, marginal_cost: f64) -> Result<()> {
    if !(capacity_mw.is_finite() && capacity_mw > 0.0) {
        return Err(SimError::DataOrdering {
            index,
            message: format!("capacity of \"{unit_id}\" must be > 0, got {capacity_mw}"),
        });
    }
    if !marginal_cost.is_finite() {
        return Err(SimError::DataOrdering {
            index,
            message: format!("marginal cost of \"{unit_id}\" must be finite"),
        });
    }
    Ok(())
}

/// Static description of one portfolio's generation fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioProfile {
    pub portfolio_name: String,
    /// Sum of unit capacities (MW).
    pub capacity_mw: f64,
    /// Sum of unit fixed O&M costs.
    pub fixed_om_cost: f64,
    /// Capacity-weighted average marginal cost ($/MWh).
    pub weighted_marginal_cost: f64,
}

impl fmt::Display for PortfolioProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} capacity={:>7.0} MW  fixom={:>9.0}  avg_mc={:>6.2} $/MWh",
            self.portfolio_name, self.capacity_mw, self.fixed_om_cost, self.weighted_marginal_cost
        )
    }
}
