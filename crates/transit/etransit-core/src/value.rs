//! Style values, property sets and step timing.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TransitError;
use crate::units::{format_number, parse_float};

/// A requested or sampled style value. Numbers get unit handling from the
/// style layer (`px` unless the property is unitless); text is written as is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl CssValue {
    /// Leading numeric part of the value (`"50px"` -> 50). `NaN` for non-numeric text.
    pub fn as_f64(&self) -> f64 {
        match self {
            CssValue::Number(n) => *n,
            CssValue::Text(s) => parse_float(s),
        }
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssValue::Number(n) => f.write_str(&format_number(*n)),
            CssValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CssValue {
    fn from(n: f64) -> Self {
        CssValue::Number(n)
    }
}

impl From<i32> for CssValue {
    fn from(n: i32) -> Self {
        CssValue::Number(n as f64)
    }
}

impl From<&str> for CssValue {
    fn from(s: &str) -> Self {
        CssValue::Text(s.to_string())
    }
}

impl From<String> for CssValue {
    fn from(s: String) -> Self {
        CssValue::Text(s)
    }
}

/// Ordered property name -> value map. Insertion order is the order styles are
/// written and transitions are listed.
pub type Properties = IndexMap<String, CssValue>;

/// Build a [`Properties`] map from pairs.
///
/// ```
/// use etransit_core::value::properties;
/// let props = properties([("x", 100.into()), ("opacity", 0.5.into())]);
/// assert_eq!(props.len(), 2);
/// ```
pub fn properties<I, K>(pairs: I) -> Properties
where
    I: IntoIterator<Item = (K, CssValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Duration and delay of one step, in milliseconds. A missing duration takes
/// the configured default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub delay: f64,
}

impl Timing {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            delay: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    /// Resolve against the configured default duration. Negative or non-finite
    /// parts collapse to zero.
    pub fn resolve(&self, default_ms: f64) -> (f64, f64) {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        (clean(self.duration.unwrap_or(default_ms)), clean(self.delay))
    }
}

impl From<f64> for Timing {
    fn from(duration: f64) -> Self {
        Timing::new(duration)
    }
}

impl From<u32> for Timing {
    fn from(duration: u32) -> Self {
        Timing::new(duration as f64)
    }
}

impl From<i32> for Timing {
    fn from(duration: i32) -> Self {
        Timing::new(duration as f64)
    }
}

impl From<Option<f64>> for Timing {
    fn from(duration: Option<f64>) -> Self {
        Timing {
            duration,
            delay: 0.0,
        }
    }
}

/// Read a single time value: `"250ms"`, `"0.25s"` or a bare `"250"`.
pub fn parse_millis(text: &str) -> Result<f64, TransitError> {
    let t = text.trim();
    let invalid = || TransitError::InvalidTiming {
        value: text.to_string(),
    };
    let (number, scale) = if let Some(ms) = t.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = t.strip_suffix('s') {
        (s, 1000.0)
    } else {
        (t, 1.0)
    };
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value * scale)
}

impl FromStr for Timing {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Timing::new(parse_millis(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_parses_units() {
        assert_eq!("250ms".parse::<Timing>().unwrap().duration, Some(250.0));
        assert_eq!("0.25s".parse::<Timing>().unwrap().duration, Some(250.0));
        assert_eq!("250".parse::<Timing>().unwrap().duration, Some(250.0));
        assert!("soon".parse::<Timing>().is_err());
    }

    #[test]
    fn timing_resolves_defaults() {
        assert_eq!(Timing::default().resolve(1000.0), (1000.0, 0.0));
        assert_eq!(Timing::new(200.0).with_delay(50.0).resolve(1000.0), (200.0, 50.0));
        assert_eq!(Timing::new(-5.0).resolve(1000.0), (0.0, 0.0));
    }

    #[test]
    fn css_values_display_and_parse() {
        assert_eq!(CssValue::from(100).to_string(), "100");
        assert_eq!(CssValue::from("50px").as_f64(), 50.0);
        assert!(CssValue::from("auto").as_f64().is_nan());
    }

    #[test]
    fn untagged_json_values() {
        let props: Properties = serde_json::from_str(r#"{"x": 100, "opacity": "0.5"}"#).unwrap();
        assert_eq!(props["x"], CssValue::Number(100.0));
        assert_eq!(props["opacity"], CssValue::Text("0.5".into()));
        assert_eq!(props.get_index(0).map(|(k, _)| k.as_str()), Some("x"));
    }
}
