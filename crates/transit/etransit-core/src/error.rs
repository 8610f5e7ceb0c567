//! Error types for etransit.
//!
//! Orchestrator operations never return these; they degrade to a best-effort
//! visual state instead. Errors only come out of parsing surfaces and element
//! lookup.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TransitError {
    /// A string target did not resolve to an element.
    #[error("Element not found: {id}")]
    ElementNotFound { id: String },

    /// Duration/delay text could not be read as milliseconds.
    #[error("Invalid timing value: {value}")]
    InvalidTiming { value: String },

    /// Easing text is neither a known keyword nor a timing function.
    #[error("Invalid easing: {value}")]
    InvalidEasing { value: String },

    /// Bezier continuation could not be solved for the given curve.
    #[error("Degenerate bezier continuation for {points:?} at ratio {ratio}: {reason}")]
    DegenerateBezier {
        points: [f64; 4],
        ratio: f64,
        reason: String,
    },

    /// Configuration could not be read.
    #[error("Config error: {reason}")]
    Config { reason: String },
}

impl TransitError {
    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "lookup",
            Self::InvalidTiming { .. } | Self::InvalidEasing { .. } => "validation",
            Self::DegenerateBezier { .. } => "curve",
            Self::Config { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for TransitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}
