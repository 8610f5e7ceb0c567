//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::error::TransitError;

/// Global switches for the orchestrator. JSON uses the camelCase field names
/// (`enabled`, `useTransitionEnd`, `speeds._default`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Master switch. When off every step applies its end state immediately.
    pub enabled: bool,
    /// Prefer the native transition-finished signal over a fallback timer.
    pub use_transition_end: bool,
    pub speeds: Speeds,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Speeds {
    /// Duration in milliseconds used when a step does not name one.
    #[serde(rename = "_default")]
    pub default: f64,
}

impl Default for Speeds {
    fn default() -> Self {
        Self { default: 1000.0 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            use_transition_end: true,
            speeds: Speeds::default(),
        }
    }
}

impl Config {
    /// Read a config from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TransitError> {
        Ok(serde_json::from_str(json)?)
    }
}
