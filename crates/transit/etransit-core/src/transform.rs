//! Composite `transform` value of one element.
//!
//! Individual transform functions (`rotate`, `scale`, `x`, ...) are animated as
//! if they were separate style properties; this model merges them back into a
//! single `transform` string.
//!
//! ```
//! use etransit_core::transform::TransformState;
//! let mut t = TransformState::parse("rotate(90) scale(4)");
//! assert_eq!(t.raw("rotate"), Some("90deg"));
//! assert_eq!(t.raw("scale"), Some("4,4"));
//! t.set_from_str("x", "10");
//! assert_eq!(t.to_string(), "rotate(90deg) scale(4,4) translate(10px,0)");
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::units::{format_number, parse_float, unit};
use crate::value::CssValue;

/// Transform functions that can be addressed as style properties.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformFn {
    Rotate,
    RotateX,
    RotateY,
    Rotate3d,
    Scale,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
    Perspective,
    Translate,
    X,
    Y,
}

impl TransformFn {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "rotate" => TransformFn::Rotate,
            "rotateX" => TransformFn::RotateX,
            "rotateY" => TransformFn::RotateY,
            "rotate3d" => TransformFn::Rotate3d,
            "scale" => TransformFn::Scale,
            "scaleX" => TransformFn::ScaleX,
            "scaleY" => TransformFn::ScaleY,
            "skewX" => TransformFn::SkewX,
            "skewY" => TransformFn::SkewY,
            "perspective" => TransformFn::Perspective,
            "translate" => TransformFn::Translate,
            "x" => TransformFn::X,
            "y" => TransformFn::Y,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformFn::Rotate => "rotate",
            TransformFn::RotateX => "rotateX",
            TransformFn::RotateY => "rotateY",
            TransformFn::Rotate3d => "rotate3d",
            TransformFn::Scale => "scale",
            TransformFn::ScaleX => "scaleX",
            TransformFn::ScaleY => "scaleY",
            TransformFn::SkewX => "skewX",
            TransformFn::SkewY => "skewY",
            TransformFn::Perspective => "perspective",
            TransformFn::Translate => "translate",
            TransformFn::X => "x",
            TransformFn::Y => "y",
        }
    }

    /// Numbers written to `x`/`y` get a `px` suffix from the style layer; every
    /// other function receives bare numbers and applies its own unit.
    pub fn takes_pixels(&self) -> bool {
        matches!(self, TransformFn::X | TransformFn::Y)
    }
}

/// Fields that only make sense with 3-D transform support.
const THREE_D_ONLY: [&str; 4] = ["rotateX", "rotateY", "perspective", "transformOrigin"];

/// Value read back from a [`TransformState`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// Non-uniform scale.
    Pair(f64, f64),
    Rotate3d { axis: [f64; 3], angle: String },
}

impl FieldValue {
    /// As a style value that can be written back through the same field.
    pub fn to_css_value(&self) -> CssValue {
        match self {
            FieldValue::Number(n) => CssValue::Number(*n),
            FieldValue::Text(s) => CssValue::Text(s.clone()),
            FieldValue::Pair(x, y) => {
                CssValue::Text(format!("{},{}", format_number(*x), format_number(*y)))
            }
            FieldValue::Rotate3d { axis, angle } => CssValue::Text(format!(
                "{},{},{},{}",
                format_number(axis[0]),
                format_number(axis[1]),
                format_number(axis[2]),
                angle
            )),
        }
    }
}

/// Per-element transform functions in first-set order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    fields: IndexMap<String, String>,
    translate_x: Option<String>,
    translate_y: Option<String>,
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from transform text. Text that does not match `name(args)` yields
    /// an empty state.
    pub fn parse(text: &str) -> Self {
        let mut state = Self::new();
        for (name, args) in scan_functions(text) {
            state.set_from_str(name, args);
        }
        state
    }

    /// `("scale", "2,4")` -> `set("scale", ["2", "4"])`.
    pub fn set_from_str(&mut self, name: &str, value: &str) {
        let args: Vec<&str> = value.split(',').map(str::trim).collect();
        self.set(name, &args);
    }

    pub fn set_value(&mut self, name: &str, value: &CssValue) {
        match value {
            CssValue::Number(n) => self.set(name, &[&format_number(*n)]),
            CssValue::Text(s) => self.set_from_str(name, s),
        }
    }

    /// Set a field through its function's rules; unknown names store the joined
    /// arguments verbatim.
    pub fn set(&mut self, name: &str, args: &[&str]) {
        match TransformFn::from_name(name) {
            Some(f) => self.apply(f, args),
            None => self.store(name, args.join(",")),
        }
    }

    pub fn apply(&mut self, f: TransformFn, args: &[&str]) {
        let first = args.first().copied().unwrap_or("");
        match f {
            TransformFn::Rotate
            | TransformFn::RotateX
            | TransformFn::RotateY
            | TransformFn::SkewX
            | TransformFn::SkewY => self.store(f.name(), unit(first, "deg")),
            TransformFn::Perspective => self.store(f.name(), unit(first, "px")),
            TransformFn::Scale => {
                let y = args.get(1).copied().unwrap_or(first);
                self.store(f.name(), format!("{first},{y}"));
            }
            TransformFn::X => self.set_translate(Some(first), None),
            TransformFn::Y => self.set_translate(None, Some(first)),
            TransformFn::Translate => self.set_translate(Some(first), args.get(1).copied()),
            TransformFn::Rotate3d | TransformFn::ScaleX | TransformFn::ScaleY => {
                self.store(f.name(), args.join(","))
            }
        }
    }

    /// Update one or both translate axes; the other axis keeps its last value.
    fn set_translate(&mut self, x: Option<&str>, y: Option<&str>) {
        if let Some(x) = x {
            self.translate_x = Some(unit(x, "px"));
        }
        if let Some(y) = y {
            self.translate_y = Some(unit(y, "px"));
        }
        let x = self.translate_x.get_or_insert_with(|| "0".to_string()).clone();
        let y = self.translate_y.get_or_insert_with(|| "0".to_string()).clone();
        self.store("translate", format!("{x},{y}"));
    }

    fn store(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), value);
    }

    /// Stored text of a field.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Read a field, computing `x`, `y`, `scale` and `rotate3d`; other fields are
    /// returned as stored, and unset fields read as 0.
    pub fn get(&self, name: &str) -> FieldValue {
        match name {
            "x" => axis_value(self.translate_x.as_deref()),
            "y" => axis_value(self.translate_y.as_deref()),
            "scale" => {
                let raw = self.raw("scale").unwrap_or("1,1");
                let mut parts = raw.split(',').map(parse_float);
                let sx = parts.next().unwrap_or(1.0);
                let sy = parts.next().unwrap_or(sx);
                if sx == sy {
                    FieldValue::Number(sx)
                } else {
                    FieldValue::Pair(sx, sy)
                }
            }
            "rotate3d" => {
                let raw = self.raw("rotate3d").unwrap_or("0,0,0,0deg");
                let mut parts = raw.split(',');
                let mut axis = [0.0; 3];
                for slot in axis.iter_mut() {
                    *slot = parts.next().map(parse_float).unwrap_or(0.0);
                }
                let angle = parts.next().map(parse_float).unwrap_or(0.0);
                FieldValue::Rotate3d {
                    axis,
                    angle: unit(&format_number(angle), "deg"),
                }
            }
            _ => self
                .raw(name)
                .map_or(FieldValue::Number(0.0), |s| FieldValue::Text(s.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to transform text. `use_3d` emits `scale3d`/`translate3d`;
    /// without `support_3d` the 3-D-only functions are dropped.
    pub fn to_css(&self, use_3d: bool, support_3d: bool) -> String {
        let mut out = Vec::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            if !support_3d && THREE_D_ONLY.contains(&name.as_str()) {
                continue;
            }
            match name.as_str() {
                "scale" if use_3d => out.push(format!("scale3d({value},1)")),
                "translate" if use_3d => out.push(format!("translate3d({value},0)")),
                _ => out.push(format!("{name}({value})")),
            }
        }
        out.join(" ")
    }
}

impl fmt::Display for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css(false, true))
    }
}

fn axis_value(v: Option<&str>) -> FieldValue {
    match v {
        Some(s) if s != "0" => FieldValue::Text(s.to_string()),
        _ => FieldValue::Number(0.0),
    }
}

/// Find every `identifier(args)` group, where the identifier is ASCII
/// alphanumeric and args run to the first closing parenthesis.
fn scan_functions(text: &str) -> Vec<(&str, &str)> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('(') {
        let head = &rest[..open];
        let name_start = head
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_alphanumeric())
            .last()
            .map_or(open, |(i, _)| i);
        let after = &rest[open + 1..];
        let Some(close) = after.find(')') else {
            break;
        };
        if name_start < open {
            found.push((&rest[name_start..open], &after[..close]));
            rest = &after[close + 1..];
        } else {
            rest = after;
        }
    }
    found
}
