//! The pin mapping: numbered pins to canonical peripheral functions, with
//! dynamic re-mapping inferred from a program's variables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::variable::VariableStore;
use crate::{log_info, log_warn};

/// The canonical capability names the vehicle exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PinFunction {
    LeftSensor,
    RightSensor,
    LeftMotorForward,
    LeftMotorBackward,
    RightMotorForward,
    RightMotorBackward,
}

impl PinFunction {
    pub fn from_name(name: &str) -> Option<PinFunction> {
        match name {
            "leftSensor" => Some(PinFunction::LeftSensor),
            "rightSensor" => Some(PinFunction::RightSensor),
            "leftMotorForward" => Some(PinFunction::LeftMotorForward),
            "leftMotorBackward" => Some(PinFunction::LeftMotorBackward),
            "rightMotorForward" => Some(PinFunction::RightMotorForward),
            "rightMotorBackward" => Some(PinFunction::RightMotorBackward),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PinFunction::LeftSensor => "leftSensor",
            PinFunction::RightSensor => "rightSensor",
            PinFunction::LeftMotorForward => "leftMotorForward",
            PinFunction::LeftMotorBackward => "leftMotorBackward",
            PinFunction::RightMotorForward => "rightMotorForward",
            PinFunction::RightMotorBackward => "rightMotorBackward",
        }
    }
}

impl fmt::Display for PinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed default mapping of canonical pin numbers to functions.
pub const DEFAULT_PIN_MAP: [(u8, PinFunction); 6] = [
    (2, PinFunction::LeftSensor),
    (3, PinFunction::RightSensor),
    (5, PinFunction::LeftMotorBackward),
    (6, PinFunction::RightMotorBackward),
    (9, PinFunction::LeftMotorForward),
    (10, PinFunction::RightMotorForward),
];

/// Routes a numeric pin to a peripheral function.
///
/// Lookups consult the override table first and fall back to the defaults,
/// so any canonical pin not touched by a variable keeps its default
/// function. The map mutates only at load time and is read-only for the
/// remainder of a run.
#[derive(Debug, Clone)]
pub struct PinMap {
    defaults: BTreeMap<u8, PinFunction>,
    overrides: BTreeMap<u8, PinFunction>,
}

impl PinMap {
    pub fn new() -> PinMap {
        PinMap {
            defaults: DEFAULT_PIN_MAP.into_iter().collect(),
            overrides: BTreeMap::new(),
        }
    }

    /// Translates a pin to its function, overrides first, defaults second.
    pub fn function_for(&self, pin: u8) -> Option<PinFunction> {
        self.overrides
            .get(&pin)
            .or_else(|| self.defaults.get(&pin))
            .copied()
    }

    /// Reassigns a pin's function in the base table (configuration
    /// overrides). Base assignments survive the per-load variable remap.
    pub fn assign(&mut self, pin: u8, function: PinFunction) {
        self.defaults.insert(pin, function);
    }

    /// Re-derives the live mapping from a program's variable snapshot: any
    /// variable whose value equals a default-mapped pin number registers
    /// that pin's function under the value. Returns how many canonical pins
    /// the variables referenced; every canonical pin stays mapped either
    /// way, so partial reference coverage is a diagnostic, not an error.
    pub fn remap_from_variables(&mut self, variables: &VariableStore) -> usize {
        self.overrides.clear();
        let mut referenced: Vec<u8> = Vec::new();
        for (name, value) in variables.iter() {
            if value < 0.0 || value > u8::MAX as f64 || value.fract() != 0.0 {
                continue;
            }
            let pin = value as u8;
            let Some(function) = self.defaults.get(&pin).copied() else {
                continue;
            };
            self.overrides.insert(pin, function);
            if !referenced.contains(&pin) {
                referenced.push(pin);
            }
            crate::log_debug!("Variable '{}' pins {} to '{}'", name, pin, function);
        }

        let total = self.defaults.len();
        let count = referenced.len();
        if count < total {
            log_warn!("{}/{} canonical pins referenced by program variables", count, total);
        } else {
            log_info!("All {} canonical pins referenced by program variables", total);
        }
        count
    }

    /// The canonical pin count (the denominator of the remap diagnostic).
    pub fn canonical_len(&self) -> usize {
        self.defaults.len()
    }

    /// Every live (pin, function) route, overrides merged over defaults.
    pub fn routes(&self) -> Vec<(u8, PinFunction)> {
        let mut merged = self.defaults.clone();
        merged.extend(self.overrides.iter().map(|(k, v)| (*k, *v)));
        merged.into_iter().collect()
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::new()
    }
}
