//! Simulation parameters.
//!
//! Every field has a default, so a TOML file only needs the keys it overrides:
//!
//! ```toml
//! dollar_risk = 250.0
//! ma_period = 20
//! liquidity_floor = 500000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Parameters of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Money put at risk per entry; the order size is `floor(dollar_risk / adr)`.
    pub dollar_risk: f64,
    /// Window of the moving average of close (also used for the volume average).
    pub ma_period: usize,
    /// Window of the average daily range.
    pub adr_period: usize,
    /// Entry price offset above the moving average, in ADR units.
    pub entry_offset_multiplier: f64,
    /// Distance of the partial target above entry, in ADR units.
    pub partial_target_multiplier: f64,
    /// Distance of the full target above entry, in ADR units.
    pub full_target_multiplier: f64,
    /// Average volume must be strictly above this floor for a signal to fire.
    pub liquidity_floor: u64,
    /// Smallest order size worth placing. Must allow a half split.
    pub min_order_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dollar_risk: 100.0,
            ma_period: 10,
            adr_period: 10,
            entry_offset_multiplier: 0.0,
            partial_target_multiplier: 1.0,
            full_target_multiplier: 3.0,
            liquidity_floor: 0,
            min_order_size: 2,
        }
    }
}

impl Config {
    /// Number of bars that must exist before a signal can be evaluated.
    pub fn warmup(&self) -> usize {
        self.ma_period.max(self.adr_period)
    }

    /// Checks that every parameter is usable by the simulator.
    pub fn validate(&self) -> Result<()> {
        if self.ma_period == 0 || self.adr_period == 0 {
            return Err(Error::InvalidConfig(format!(
                "periods must be positive (ma: {}, adr: {})",
                self.ma_period, self.adr_period
            )));
        }
        if !self.dollar_risk.is_finite() || self.dollar_risk <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "dollar_risk must be positive (got: {})",
                self.dollar_risk
            )));
        }
        if !self.entry_offset_multiplier.is_finite() || self.entry_offset_multiplier < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "entry_offset_multiplier must not be negative (got: {})",
                self.entry_offset_multiplier
            )));
        }
        if !(self.partial_target_multiplier > 0.0 && self.partial_target_multiplier.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "partial_target_multiplier must be positive (got: {})",
                self.partial_target_multiplier
            )));
        }
        if !self.full_target_multiplier.is_finite() || self.full_target_multiplier < self.partial_target_multiplier {
            return Err(Error::InvalidConfig(format!(
                "full_target_multiplier ({}) must not be below partial_target_multiplier ({})",
                self.full_target_multiplier, self.partial_target_multiplier
            )));
        }
        if self.min_order_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "min_order_size must be at least 2 (got: {})",
                self.min_order_size
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!(config_path = %path.as_ref().display(), "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup(), 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("dollar_risk = 250.0\nadr_period = 14\n").unwrap();
        assert_eq!(config.dollar_risk, 250.0);
        assert_eq!(config.adr_period, 14);
        assert_eq!(config.ma_period, 10);
        assert_eq!(config.warmup(), 14);
        assert_eq!(config.min_order_size, 2);
    }

    #[test]
    fn rejects_zero_period() {
        let config = Config {
            ma_period: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_targets() {
        let config = Config {
            partial_target_multiplier: 2.0,
            full_target_multiplier: 1.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unsplittable_order_size() {
        let err = Config::from_toml_str("min_order_size = 1").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::from_toml_str("dollar_risk = \"lots\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
