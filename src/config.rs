//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::market::portfolio::{PortfolioCosts, PortfolioTerms};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Input data locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Market clearing parameters.
    #[serde(default)]
    pub market: MarketConfig,
    /// Debt financing parameters.
    #[serde(default)]
    pub financing: FinancingConfig,
    /// Price-offset sweep parameters.
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    /// Per-portfolio costs keyed by portfolio name.
    #[serde(default = "default_portfolios")]
    pub portfolios: BTreeMap<String, PortfolioConfig>,
}

/// Input data locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Supply stack CSV.
    pub supply: PathBuf,
    /// Demand schedule CSV.
    pub demand: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            supply: PathBuf::from("data/supply.csv"),
            demand: PathBuf::from("data/demand.csv"),
        }
    }
}

/// Market clearing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Offset added to every clearing price in the main run ($/MWh).
    pub price_offset: f64,
}

/// Debt financing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancingConfig {
    /// Interest accrued on the outstanding balance each day.
    pub daily_rate: f64,
    /// Overhead used for portfolios without their own `overhead`.
    pub default_overhead: f64,
    /// Portfolio whose ledger is reported.
    pub focus_portfolio: String,
}

impl Default for FinancingConfig {
    fn default() -> Self {
        Self {
            daily_rate: 0.05,
            default_overhead: 225_000.0,
            focus_portfolio: "Fossil_Light".to_string(),
        }
    }
}

/// Price-offset sweep parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensitivityConfig {
    /// Offsets to evaluate ($/MWh). A zero baseline is always included.
    pub offsets: Vec<f64>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            offsets: vec![0.0, 5.0, 10.0, 25.0, 50.0],
        }
    }
}

/// Costs of a single portfolio.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioConfig {
    /// Fixed cost per hour, signed (normally negative).
    pub hourly_cost: f64,
    /// Financing principal. Falls back to `financing.default_overhead`.
    #[serde(default)]
    pub overhead: Option<f64>,
}

impl PortfolioConfig {
    fn hourly(hourly_cost: f64) -> Self {
        Self {
            hourly_cost,
            overhead: None,
        }
    }
}

/// The seven portfolios of the baseline game and their hourly costs.
fn default_portfolios() -> BTreeMap<String, PortfolioConfig> {
    [
        ("Bay_Views", -5500.0),
        ("Beachfront", -6750.0),
        ("Big_Coal", -5000.0),
        ("Big_Gas", -2000.0),
        ("East_Bay", -4000.0),
        ("Fossil_Light", -9250.0),
        ("Old_Timers", -11250.0),
    ]
    .into_iter()
    .map(|(name, cost)| (name.to_string(), PortfolioConfig::hourly(cost)))
    .collect()
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"financing.daily_rate"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: seven portfolios, 225000 overhead, 5% daily rate.
    pub fn baseline() -> Self {
        Self {
            data: DataConfig::default(),
            market: MarketConfig::default(),
            financing: FinancingConfig::default(),
            sensitivity: SensitivityConfig::default(),
            portfolios: default_portfolios(),
        }
    }

    /// Returns the high-rate preset: baseline market financed at 10% per day.
    pub fn high_rate() -> Self {
        Self {
            financing: FinancingConfig {
                daily_rate: 0.10,
                ..FinancingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the markup preset: every clearing price raised by $10/MWh.
    pub fn markup() -> Self {
        Self {
            market: MarketConfig { price_offset: 10.0 },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_rate", "markup"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_rate" => Ok(Self::high_rate()),
            "markup" => Ok(Self::markup()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Overhead of `name`, falling back to the scenario default.
    pub fn overhead_of(&self, name: &str) -> Option<f64> {
        self.portfolios
            .get(name)
            .map(|p| p.overhead.unwrap_or(self.financing.default_overhead))
    }

    /// Builds the runtime cost table passed to the market and finance layers.
    pub fn portfolio_costs(&self) -> PortfolioCosts {
        let mut costs = PortfolioCosts::new();
        for (name, p) in &self.portfolios {
            costs.insert(
                name.clone(),
                PortfolioTerms {
                    hourly_cost: p.hourly_cost,
                    overhead: p.overhead.unwrap_or(self.financing.default_overhead),
                },
            );
        }
        costs
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !self.market.price_offset.is_finite() {
            errors.push(ConfigError {
                field: "market.price_offset".into(),
                message: "must be finite".into(),
            });
        }

        let fin = &self.financing;
        if !(fin.daily_rate.is_finite() && fin.daily_rate > -1.0) {
            errors.push(ConfigError {
                field: "financing.daily_rate".into(),
                message: "must be finite and > -1".into(),
            });
        }
        if !(fin.default_overhead.is_finite() && fin.default_overhead > 0.0) {
            errors.push(ConfigError {
                field: "financing.default_overhead".into(),
                message: "must be > 0".into(),
            });
        }
        if !self.portfolios.contains_key(&fin.focus_portfolio) {
            errors.push(ConfigError {
                field: "financing.focus_portfolio".into(),
                message: format!("\"{}\" is not a configured portfolio", fin.focus_portfolio),
            });
        }

        if self.sensitivity.offsets.iter().any(|o| !o.is_finite()) {
            errors.push(ConfigError {
                field: "sensitivity.offsets".into(),
                message: "all offsets must be finite".into(),
            });
        }

        if self.portfolios.is_empty() {
            errors.push(ConfigError {
                field: "portfolios".into(),
                message: "at least one portfolio is required".into(),
            });
        }
        for (name, p) in &self.portfolios {
            if !p.hourly_cost.is_finite() {
                errors.push(ConfigError {
                    field: format!("portfolios.{name}.hourly_cost"),
                    message: "must be finite".into(),
                });
            }
            if let Some(overhead) = p.overhead
                && !(overhead.is_finite() && overhead > 0.0)
            {
                errors.push(ConfigError {
                    field: format!("portfolios.{name}.overhead"),
                    message: "must be > 0".into(),
                });
            }
        }

        errors
    }
}
