//! Simulator configuration, loaded from a TOML file.
//!
//! Everything has a sensible default so the simulator runs with no config
//! file at all; a missing file is not an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hardware::{PinFunction, PinMap};
use crate::log_warn;

/// Default fixed-step rate of the simulator driver.
pub const DEFAULT_TICK_HZ: f64 = 20.0;
/// Default number of ticks a run executes.
pub const DEFAULT_TICKS: u64 = 200;

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Standalone,
    File,
    Full,
}

fn default_tick_hz() -> f64 {
    DEFAULT_TICK_HZ
}

fn default_ticks() -> u64 {
    DEFAULT_TICKS
}

/// The simulator configuration file model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed-step tick rate in Hz.
    pub tick_hz: f64,
    /// Number of ticks to run before reporting.
    pub ticks: u64,
    /// Logger destination.
    pub log: LogMode,
    /// Pin-map overrides: canonical function name → pin number.
    pub pins: BTreeMap<String, u8>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            tick_hz: default_tick_hz(),
            ticks: default_ticks(),
            log: LogMode::default(),
            pins: BTreeMap::new(),
        }
    }
}

impl SimConfig {
    /// The conventional config location: `<config dir>/trundle/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trundle").join("config.toml"))
    }

    /// Loads configuration from `path`, or from the conventional location
    /// when `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<SimConfig, CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(SimConfig::default()),
            },
        };
        if !path.exists() {
            return Ok(SimConfig::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Applies the configured pin overrides to a pin map. Unknown function
    /// names are skipped with a diagnostic.
    pub fn apply_pins(&self, pin_map: &mut PinMap) {
        for (name, pin) in &self.pins {
            match PinFunction::from_name(name) {
                Some(function) => pin_map.assign(*pin, function),
                None => log_warn!("Unknown pin function '{}' in config, skipping", name),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: SimConfig = toml::from_str("tick_hz = 50.0").unwrap();
        assert_eq!(config.tick_hz, 50.0);
        assert_eq!(config.ticks, DEFAULT_TICKS);
        assert_eq!(config.log, LogMode::Standalone);
    }

    #[test]
    fn pin_overrides_parse_and_apply() {
        let config: SimConfig =
            toml::from_str("[pins]\nleftMotorForward = 11\n").unwrap();
        let mut map = PinMap::new();
        config.apply_pins(&mut map);
        assert_eq!(map.function_for(11), Some(PinFunction::LeftMotorForward));
    }
}
