use std::{error, fmt};

use serde::{Deserialize, Serialize};

/// Represents an error raised at one of the genuinely fallible edges of the
/// core: configuration loading, program-file I/O, lowered-program JSON.
///
/// The block pipeline itself never fails hard: malformed chunks are skipped
/// and unresolvable references degrade to defaults with a diagnostic, so
/// this type only travels on the paths where an operation cannot produce a
/// plausible result at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreError {
    /// The pipeline stage or subsystem the error originated from.
    pub stage: String,
    /// A detailed message describing the error.
    pub info: String,
}

impl CoreError {
    pub fn new<S, I>(stage: S, info: I) -> Self
    where
        S: ToString,
        I: ToString,
    {
        Self {
            stage: stage.to_string(),
            info: info.to_string(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.stage, self.info)
    }
}

impl error::Error for CoreError {}

/// Converts an I/O error into a `CoreError`.
impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::new("io", err)
    }
}

/// Converts a Serde JSON error into a `CoreError`.
impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::new("json", err)
    }
}

/// Converts a TOML deserialization error into a `CoreError`.
impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::new("config", err)
    }
}
