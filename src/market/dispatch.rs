//! Merit-order dispatch of a single demand period.

use std::fmt;

use crate::error::{Result, SimError};

use super::stack::{GeneratingUnit, SupplyStack};

/// Outcome for one unit in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult<'a> {
    /// Dispatched unit.
    pub unit: &'a GeneratingUnit,
    /// Output (MW), `0 <= generation_mw <= capacity_mw`.
    pub generation_mw: f64,
    /// `true` for the unit that closes the gap to load.
    pub is_marginal: bool,
    /// `true` for every unit ahead of the marginal unit.
    pub is_inframarginal: bool,
    /// Price paid to every unit this period ($/MWh).
    pub clearing_price: f64,
    /// `generation_mw * (clearing_price - marginal_cost)`.
    pub unit_revenue: f64,
}

/// Cleared market for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodDispatch<'a> {
    /// Load that was cleared (MW).
    pub load_mw: f64,
    /// Marginal unit's cost plus the price offset.
    pub clearing_price: f64,
    /// Position of the marginal unit in the stack.
    pub marginal_index: usize,
    /// One entry per unit, in merit order.
    pub results: Vec<DispatchResult<'a>>,
}

impl<'a> PeriodDispatch<'a> {
    /// The unit that set the clearing price.
    pub fn marginal_unit(&self) -> &'a GeneratingUnit {
        self.results[self.marginal_index].unit
    }

    /// Total dispatched generation (MW).
    pub fn total_generation_mw(&self) -> f64 {
        self.results.iter().map(|r| r.generation_mw).sum()
    }
}

impl fmt::Display for PeriodDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "load={:>8.1} MW | price={:>7.2} $/MWh | marginal={} ({})",
            self.load_mw,
            self.clearing_price,
            self.marginal_unit().unit_id,
            self.marginal_unit().portfolio_name,
        )
    }
}

/// Clears `load_mw` against the supply stack.
///
/// The marginal unit is the first whose cumulative capacity reaches the
/// load. Units ahead of it run at full capacity, the marginal unit covers
/// the residual and everything behind it stays off. The clearing price is
/// the marginal unit's cost shifted by `price_offset`.
///
/// # Errors
///
/// * [`SimError::InvalidLoad`] if `load_mw` is negative or not finite.
/// * [`SimError::InsufficientCapacity`] if `load_mw` exceeds the total
///   capacity of the stack (including an empty stack).
/// * [`SimError::Configuration`] if `price_offset` is not finite.
///
/// # Examples
///
/// ```
/// use esg_sim::market::dispatch::dispatch;
/// use esg_sim::market::stack::{SupplyStack, UnitSpec};
///
/// let stack = SupplyStack::from_units(vec![
///     UnitSpec::new("coal", "A", 50.0, 10.0),
///     UnitSpec::new("gas", "B", 50.0, 20.0),
/// ])
/// .unwrap();
/// let cleared = dispatch(&stack, 70.0, 0.0).unwrap();
/// assert_eq!(cleared.clearing_price, 20.0);
/// assert_eq!(cleared.results[0].unit_revenue, 500.0);
/// ```
pub fn dispatch(stack: &SupplyStack, load_mw: f64, price_offset: f64) -> Result<PeriodDispatch<'_>> {
    if !(load_mw.is_finite() && load_mw >= 0.0) {
        return Err(SimError::InvalidLoad { load_mw });
    }
    if !price_offset.is_finite() {
        return Err(SimError::Configuration(format!(
            "price offset must be finite, got {price_offset}"
        )));
    }

    let units = stack.units();
    let marginal_index = units.partition_point(|u| u.cumulative_capacity < load_mw);
    let Some(marginal) = units.get(marginal_index) else {
        return Err(SimError::InsufficientCapacity {
            load_mw,
            capacity_mw: stack.total_capacity(),
        });
    };

    let clearing_price = marginal.marginal_cost + price_offset;

    let results = units
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            let generation_mw = match i.cmp(&marginal_index) {
                std::cmp::Ordering::Less => unit.capacity_mw,
                std::cmp::Ordering::Equal => unit.capacity_mw - (unit.cumulative_capacity - load_mw),
                std::cmp::Ordering::Greater => 0.0,
            };
            DispatchResult {
                unit,
                generation_mw,
                is_marginal: i == marginal_index,
                is_inframarginal: i < marginal_index,
                clearing_price,
                unit_revenue: generation_mw * (clearing_price - unit.marginal_cost),
            }
        })
        .collect();

    Ok(PeriodDispatch {
        load_mw,
        clearing_price,
        marginal_index,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::stack::UnitSpec;

    fn two_unit_stack() -> SupplyStack {
        SupplyStack::from_units(vec![
            UnitSpec::new("u1", "A", 50.0, 10.0),
            UnitSpec::new("u2", "B", 50.0, 20.0),
        ])
        .expect("valid stack")
    }

    fn five_unit_stack() -> SupplyStack {
        SupplyStack::from_units(vec![
            UnitSpec::new("hydro", "A", 40.0, -2.0),
            UnitSpec::new("coal", "A", 120.0, 18.5),
            UnitSpec::new("ccgt", "B", 80.0, 32.0),
            UnitSpec::new("peaker", "C", 30.0, 75.0),
            UnitSpec::new("oil", "C", 25.0, 110.0),
        ])
        .expect("valid stack")
    }

    #[test]
    fn clears_partial_marginal_unit() {
        let stack = two_unit_stack();
        let d = dispatch(&stack, 70.0, 0.0).expect("within capacity");

        assert_eq!(d.results[0].generation_mw, 50.0);
        assert_eq!(d.results[1].generation_mw, 20.0);
        assert_eq!(d.clearing_price, 20.0);
        assert_eq!(d.results[0].unit_revenue, 500.0);
        assert_eq!(d.results[1].unit_revenue, 0.0);
        assert!(d.results[0].is_inframarginal);
        assert!(d.results[1].is_marginal);
        assert_eq!(d.marginal_unit().unit_id, "u2");
    }

    #[test]
    fn rejects_load_above_capacity() {
        let stack = two_unit_stack();
        let err = dispatch(&stack, 120.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            SimError::InsufficientCapacity { load_mw, capacity_mw } if load_mw == 120.0 && capacity_mw == 100.0
        ));
    }

    #[test]
    fn rejects_negative_load() {
        let stack = two_unit_stack();
        assert!(matches!(
            dispatch(&stack, -1.0, 0.0),
            Err(SimError::InvalidLoad { .. })
        ));
    }

    #[test]
    fn empty_stack_has_no_capacity() {
        let stack = SupplyStack::from_units(Vec::new()).expect("empty stack is valid");
        assert!(matches!(
            dispatch(&stack, 0.0, 0.0),
            Err(SimError::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn zero_load_marks_first_unit_marginal() {
        let stack = five_unit_stack();
        let d = dispatch(&stack, 0.0, 0.0).expect("zero load");
        assert_eq!(d.marginal_index, 0);
        assert_eq!(d.clearing_price, -2.0);
        assert!(d.results.iter().all(|r| r.generation_mw == 0.0));
        assert!(d.results.iter().all(|r| !r.is_inframarginal));
    }

    #[test]
    fn load_at_total_capacity_is_served() {
        let stack = five_unit_stack();
        let d = dispatch(&stack, stack.total_capacity(), 0.0).expect("exactly full");
        assert_eq!(d.marginal_index, stack.len() - 1);
        assert!((d.total_generation_mw() - stack.total_capacity()).abs() < 1e-9);
    }

    #[test]
    fn load_on_unit_boundary_picks_lower_unit() {
        let stack = two_unit_stack();
        let d = dispatch(&stack, 50.0, 0.0).expect("boundary");
        assert_eq!(d.marginal_index, 0);
        assert_eq!(d.results[0].generation_mw, 50.0);
        assert_eq!(d.results[1].generation_mw, 0.0);
        assert_eq!(d.clearing_price, 10.0);
    }

    #[test]
    fn generation_sums_to_load_with_single_marginal() {
        let stack = five_unit_stack();
        let mut load = 0.0;
        while load <= stack.total_capacity() {
            let d = dispatch(&stack, load, 0.0).expect("within capacity");
            assert!((d.total_generation_mw() - load).abs() < 1e-9, "load={load}");
            assert_eq!(d.results.iter().filter(|r| r.is_marginal).count(), 1);
            for r in &d.results {
                assert!(r.generation_mw >= 0.0 && r.generation_mw <= r.unit.capacity_mw);
            }
            load += 7.5;
        }
    }

    #[test]
    fn generation_is_monotonic_in_load() {
        let stack = five_unit_stack();
        let mut prev = dispatch(&stack, 0.0, 0.0).expect("zero load");
        let mut load = 5.0;
        while load <= stack.total_capacity() {
            let next = dispatch(&stack, load, 0.0).expect("within capacity");
            for (a, b) in prev.results.iter().zip(&next.results) {
                assert!(b.generation_mw >= a.generation_mw - 1e-12);
            }
            prev = next;
            load += 5.0;
        }
    }

    #[test]
    fn price_offset_shifts_revenue_by_generation() {
        let stack = five_unit_stack();
        let base = dispatch(&stack, 210.0, 0.0).expect("base");
        let marked_up = dispatch(&stack, 210.0, 12.5).expect("offset");
        assert_eq!(marked_up.clearing_price, base.clearing_price + 12.5);
        for (a, b) in base.results.iter().zip(&marked_up.results) {
            assert_eq!(a.generation_mw, b.generation_mw);
            let expected = a.unit_revenue + a.generation_mw * 12.5;
            assert!((b.unit_revenue - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let stack = two_unit_stack();
        for offset in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                dispatch(&stack, 70.0, offset),
                Err(SimError::Configuration(_))
            ));
        }
    }

    #[test]
    fn display_names_marginal_unit() {
        let stack = two_unit_stack();
        let d = dispatch(&stack, 70.0, 0.0).expect("within capacity");
        assert!(format!("{d}").contains("marginal=u2 (B)"));
    }
}
