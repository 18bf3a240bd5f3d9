//! CSV loading and export for the market and financing tables.

pub mod export;
/// Supply and demand CSV readers.
pub mod load;
