//! Financing and market-power analysis built on top of market runs.

/// Daily debt amortization and return on investment.
pub mod cashflow;
pub mod sensitivity;
