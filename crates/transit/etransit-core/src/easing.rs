//! Named easing keywords and their control points.
//!
//! Two tables are kept side by side: keyword -> CSS timing-function text, and
//! keyword -> cubic-bezier control points. They must agree numerically; the
//! pause/resume math reads the points while the style engine reads the text.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::bezier::CubicBezier;
use crate::error::TransitError;
use crate::units::format_number;

/// Keyword used when a step names no easing, or names one we cannot read.
pub const DEFAULT_EASING: &str = "ease";

static CSS_EASE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from_iter([
        ("_default", "ease"),
        ("in", "ease-in"),
        ("out", "ease-out"),
        ("in-out", "ease-in-out"),
        ("snap", "cubic-bezier(0,1,.5,1)"),
        // Penner equations
        ("easeInCubic", "cubic-bezier(.550,.055,.675,.190)"),
        ("easeOutCubic", "cubic-bezier(.215,.61,.355,1)"),
        ("easeInOutCubic", "cubic-bezier(.645,.045,.355,1)"),
        ("easeInCirc", "cubic-bezier(.6,.04,.98,.335)"),
        ("easeOutCirc", "cubic-bezier(.075,.82,.165,1)"),
        ("easeInOutCirc", "cubic-bezier(.785,.135,.15,.86)"),
        ("easeInExpo", "cubic-bezier(.95,.05,.795,.035)"),
        ("easeOutExpo", "cubic-bezier(.19,1,.22,1)"),
        ("easeInOutExpo", "cubic-bezier(1,0,0,1)"),
        ("easeInQuad", "cubic-bezier(.55,.085,.68,.53)"),
        ("easeOutQuad", "cubic-bezier(.25,.46,.45,.94)"),
        ("easeInOutQuad", "cubic-bezier(.455,.03,.515,.955)"),
        ("easeInQuart", "cubic-bezier(.895,.03,.685,.22)"),
        ("easeOutQuart", "cubic-bezier(.165,.84,.44,1)"),
        ("easeInOutQuart", "cubic-bezier(.77,0,.175,1)"),
        ("easeInQuint", "cubic-bezier(.755,.05,.855,.06)"),
        ("easeOutQuint", "cubic-bezier(.23,1,.32,1)"),
        ("easeInOutQuint", "cubic-bezier(.86,0,.07,1)"),
        ("easeInSine", "cubic-bezier(.47,0,.745,.715)"),
        ("easeOutSine", "cubic-bezier(.39,.575,.565,1)"),
        ("easeInOutSine", "cubic-bezier(.445,.05,.55,.95)"),
        ("easeInBack", "cubic-bezier(.6,-.28,.735,.045)"),
        ("easeOutBack", "cubic-bezier(.175, .885,.32,1.275)"),
        ("easeInOutBack", "cubic-bezier(.68,-.55,.265,1.55)"),
    ])
});

static EASING_POINTS: Lazy<HashMap<&'static str, [f64; 4]>> = Lazy::new(|| {
    HashMap::from_iter([
        ("linear", [0.25, 0.25, 0.75, 0.75]),
        ("ease", [0.25, 0.1, 0.25, 1.0]),
        ("ease-in", [0.42, 0.0, 1.0, 1.0]),
        ("ease-out", [0.0, 0.0, 0.58, 1.0]),
        ("ease-in-out", [0.42, 0.0, 0.58, 1.0]),
        ("in", [0.42, 0.0, 1.0, 1.0]),
        ("out", [0.0, 0.0, 0.58, 1.0]),
        ("in-out", [0.42, 0.0, 0.58, 1.0]),
        ("snap", [0.0, 1.0, 0.5, 1.0]),
        ("easeInCubic", [0.550, 0.055, 0.675, 0.190]),
        ("easeOutCubic", [0.215, 0.61, 0.355, 1.0]),
        ("easeInOutCubic", [0.645, 0.045, 0.355, 1.0]),
        ("easeInCirc", [0.6, 0.04, 0.98, 0.335]),
        ("easeOutCirc", [0.075, 0.82, 0.165, 1.0]),
        ("easeInOutCirc", [0.785, 0.135, 0.15, 0.86]),
        ("easeInExpo", [0.95, 0.05, 0.795, 0.035]),
        ("easeOutExpo", [0.19, 1.0, 0.22, 1.0]),
        ("easeInOutExpo", [1.0, 0.0, 0.0, 1.0]),
        ("easeInQuad", [0.55, 0.085, 0.68, 0.53]),
        ("easeOutQuad", [0.25, 0.46, 0.45, 0.94]),
        ("easeInOutQuad", [0.455, 0.03, 0.515, 0.955]),
        ("easeInQuart", [0.895, 0.03, 0.685, 0.22]),
        ("easeOutQuart", [0.165, 0.84, 0.44, 1.0]),
        ("easeInOutQuart", [0.77, 0.0, 0.175, 1.0]),
        ("easeInQuint", [0.755, 0.05, 0.855, 0.06]),
        ("easeOutQuint", [0.23, 1.0, 0.32, 1.0]),
        ("easeInOutQuint", [0.86, 0.0, 0.07, 1.0]),
        ("easeInSine", [0.47, 0.0, 0.745, 0.715]),
        ("easeOutSine", [0.39, 0.575, 0.565, 1.0]),
        ("easeInOutSine", [0.445, 0.05, 0.55, 0.95]),
        ("easeInBack", [0.6, -0.28, 0.735, 0.045]),
        ("easeOutBack", [0.175, 0.885, 0.32, 1.275]),
        ("easeInOutBack", [0.68, -0.55, 0.265, 1.55]),
    ])
});

/// Keyword timing functions the style engine understands without a table entry.
const CSS_KEYWORDS: [&str; 7] = [
    "linear",
    "ease",
    "ease-in",
    "ease-out",
    "ease-in-out",
    "step-start",
    "step-end",
];

/// Control points for a named keyword.
pub fn named_points(name: &str) -> Option<[f64; 4]> {
    EASING_POINTS.get(name).copied()
}

/// CSS timing-function text for a named keyword.
pub fn named_css(name: &str) -> Option<&'static str> {
    CSS_EASE.get(name).copied()
}

/// Easing requested for one step.
///
/// Deserializes from four control points or from easing text, which goes
/// through [`Easing::parse_or_default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "EasingRepr")]
pub enum Easing {
    /// Four control points `(x1, y1, x2, y2)`.
    Bezier([f64; 4]),
    /// A keyword from the easing tables (`ease`, `in-out`, `easeOutBack`, ...).
    Named(String),
    /// Any other CSS timing function text (`cubic-bezier(...)`, `steps(4)`).
    Css(String),
}

/// Wire form of [`Easing`].
#[derive(Deserialize)]
#[serde(untagged)]
enum EasingRepr {
    Points([f64; 4]),
    Text(String),
}

impl From<EasingRepr> for Easing {
    fn from(repr: EasingRepr) -> Self {
        match repr {
            EasingRepr::Points(p) => Easing::Bezier(p),
            EasingRepr::Text(text) => Easing::parse_or_default(&text),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Named(DEFAULT_EASING.to_string())
    }
}

impl Easing {
    /// Read easing text, falling back to the default curve when it is malformed.
    pub fn parse_or_default(text: &str) -> Self {
        text.parse().unwrap_or_else(|err: TransitError| {
            log::warn!("{err}; falling back to '{DEFAULT_EASING}'");
            Easing::default()
        })
    }

    /// Timing-function text for the `transition` property.
    pub fn css(&self) -> String {
        match self {
            Easing::Bezier(p) => bezier_css(p),
            Easing::Named(name) => named_css(name).unwrap_or(name.as_str()).to_string(),
            Easing::Css(text) => text.clone(),
        }
    }

    /// Control points of this easing, if it is a cubic bezier at all
    /// (`steps(...)` is not).
    pub fn points(&self) -> Option<[f64; 4]> {
        match self {
            Easing::Bezier(p) => Some(*p),
            Easing::Named(name) => named_points(name),
            Easing::Css(text) => parse_cubic_bezier(text),
        }
    }

    /// The curve used for pause-time interpolation. Non-bezier timing functions
    /// are approximated by the linear curve.
    pub fn curve(&self) -> CubicBezier {
        let p = self
            .points()
            .or_else(|| named_points("linear"))
            .unwrap_or([0.25, 0.25, 0.75, 0.75]);
        CubicBezier::from_points(p)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

impl FromStr for Easing {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if CSS_EASE.contains_key(text) || EASING_POINTS.contains_key(text) {
            return Ok(Easing::Named(text.to_string()));
        }
        if CSS_KEYWORDS.contains(&text) {
            return Ok(Easing::Css(text.to_string()));
        }
        if text.starts_with("cubic-bezier(") {
            return parse_cubic_bezier(text)
                .map(Easing::Bezier)
                .ok_or_else(|| TransitError::InvalidEasing {
                    value: s.to_string(),
                });
        }
        if text.starts_with("steps(") && text.ends_with(')') {
            return Ok(Easing::Css(text.to_string()));
        }
        Err(TransitError::InvalidEasing {
            value: s.to_string(),
        })
    }
}

impl From<[f64; 4]> for Easing {
    fn from(p: [f64; 4]) -> Self {
        Easing::Bezier(p)
    }
}

impl From<&str> for Easing {
    fn from(text: &str) -> Self {
        Easing::parse_or_default(text)
    }
}

/// `[0.25, 0.1, 0.25, 1.0]` -> `"cubic-bezier(0.25,0.1,0.25,1)"`.
pub fn bezier_css(p: &[f64; 4]) -> String {
    format!(
        "cubic-bezier({},{},{},{})",
        format_number(p[0]),
        format_number(p[1]),
        format_number(p[2]),
        format_number(p[3])
    )
}

/// Read the four numbers out of `cubic-bezier(a, b, c, d)`.
pub fn parse_cubic_bezier(text: &str) -> Option<[f64; 4]> {
    let inner = text
        .trim()
        .strip_prefix("cubic-bezier(")?
        .strip_suffix(')')?;
    let mut out = [0.0; 4];
    let mut count = 0;
    for part in inner.split(',') {
        if count == 4 {
            return None;
        }
        let v: f64 = part.trim().parse().ok()?;
        if !v.is_finite() {
            return None;
        }
        out[count] = v;
        count += 1;
    }
    (count == 4).then_some(out)
}
