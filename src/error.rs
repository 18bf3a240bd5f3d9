//! Error taxonomy shared by the dispatch, aggregation and finance layers.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the simulator core and its loaders.
///
/// Every variant is fatal for the operation that produced it. Computations
/// are deterministic, so none of these are worth retrying.
#[derive(Debug, Error)]
pub enum SimError {
    /// Requested load exceeds the total capacity of the supply stack.
    #[error("insufficient capacity: load {load_mw} MW exceeds total supply {capacity_mw} MW")]
    InsufficientCapacity { load_mw: f64, capacity_mw: f64 },

    /// A portfolio is referenced without a matching cost or overhead entry,
    /// or a configuration value is out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Supply stack is not sorted by marginal cost, or its cumulative
    /// capacities disagree with the unit capacities.
    #[error("supply stack ordering error at unit {index}: {message}")]
    DataOrdering { index: usize, message: String },

    /// Day keys are not contiguous ascending integers starting at 1.
    #[error("day sequence error: expected day {expected}, found day {found}")]
    Sequence { expected: u32, found: u32 },

    /// Load is negative or not a finite number.
    #[error("invalid load {load_mw} MW")]
    InvalidLoad { load_mw: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(format!("{}: {}", err.field, err.message))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SimError> = std::result::Result<T, E>;
