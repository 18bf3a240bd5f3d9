//! Merit-order electricity market simulator with portfolio financing.
//!
//! The [`market`] modules clear each demand period against a supply stack
//! and settle portfolio profit; [`finance`] turns the resulting profit
//! series into a debt ledger, ROI and price-markup sensitivity.

pub mod cli;
pub mod config;
pub mod error;
pub mod finance;
pub mod io;
/// Supply stack, dispatch, and portfolio settlement.
pub mod market;
pub mod reporting;

pub use error::{Result, SimError};
