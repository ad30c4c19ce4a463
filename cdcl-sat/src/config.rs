//! Solver configuration.
use serde::Deserialize;

use crate::error::SolverError;

/// Configurable parameters used during solving.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Multiplicative decay for the VSIDS decision heuristic.
    pub vsids_decay: f32,

    /// Number of conflicts between two decay steps.
    pub decay_interval: u64,

    /// Seed for the polarity selection RNG. When unset, phase saving alone decides the
    /// polarity of a decision and ties at a variable's first assignment go false.
    pub polarity_seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            vsids_decay: 0.95,
            decay_interval: 100,
            polarity_seed: None,
        }
    }
}

impl SolverConfig {
    /// Parses a `key = value` TOML document into a config, falling back to defaults for absent
    /// keys.
    pub fn from_toml(input: &str) -> Result<SolverConfig, SolverError> {
        Ok(toml::from_str(input)?)
    }

    /// Applies a single `key=value` override, as accepted by the `--config-option` CLI flag.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<(), SolverError> {
        match key {
            "vsids_decay" => self.vsids_decay = parse_value(key, value)?,
            "decay_interval" => self.decay_interval = parse_value(key, value)?,
            "polarity_seed" => self.polarity_seed = Some(parse_value(key, value)?),
            _ => return Err(SolverError::UnknownConfigKey(key.to_owned())),
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SolverError> {
    value.parse().map_err(|_| SolverError::InvalidConfigValue {
        key: key.to_owned(),
        value: value.to_owned(),
        reason: format!("expected a {}", std::any::type_name::<T>()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.vsids_decay, 0.95);
        assert_eq!(config.decay_interval, 100);
        assert_eq!(config.polarity_seed, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SolverConfig::from_toml("vsids_decay = 0.8").unwrap();
        assert_eq!(config.vsids_decay, 0.8);
        assert_eq!(config.decay_interval, 100);
    }

    #[test]
    fn set_option_overrides() {
        let mut config = SolverConfig::default();
        config.set_option("decay_interval", "50").unwrap();
        assert_eq!(config.decay_interval, 50);

        assert!(config.set_option("not_a_key", "1").is_err());
        assert!(config.set_option("decay_interval", "nope").is_err());
    }
}
