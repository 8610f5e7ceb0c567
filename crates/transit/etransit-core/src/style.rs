//! Style access layer: property hooks, unit policy, vendor names and the
//! per-element transform cache.
//!
//! Writes go through [`StyleAccess::set`], which
//! - resolves the vendor-prefixed name,
//! - resolves relative `"+=N"` / `"-=N"` values against the current value,
//! - skips non-finite numbers,
//! - suffixes `px` on numbers unless the property is unitless,
//! - dispatches transform functions, `transform`, `filter` and
//!   `transformOrigin` to their hooks.

use hashbrown::HashMap;

use crate::host::StyleHost;
use crate::ids::ElementId;
use crate::support::{vendor_property_name, Support};
use crate::transform::{FieldValue, TransformFn, TransformState};
use crate::units::{camel_case, capitalize, format_number, parse_float, to_ms, uncamel};
use crate::value::{CssValue, Properties};

/// Properties whose numbers are written without a unit.
const CSS_NUMBER: [&str; 12] = [
    "columnCount",
    "fillOpacity",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "opacity",
    "order",
    "orphans",
    "widows",
    "zIndex",
    "zoom",
];

/// Prefixes tried when reading a computed value.
const COMPUTED_PREFIXES: [&str; 4] = ["webkit", "moz", "ms", "o"];

/// Names that belong to the `transform` family.
const TRANSFORM_PROPERTIES: [&str; 23] = [
    "scale",
    "scale3d",
    "translate",
    "translate3d",
    "rotate",
    "rotate3d",
    "rotation",
    "skew",
    "scaleX",
    "scaleY",
    "scaleZ",
    "translateX",
    "translateY",
    "translateZ",
    "x",
    "y",
    "z",
    "rotateX",
    "rotateY",
    "rotateZ",
    "skewX",
    "skewY",
    "perspective",
];

pub fn is_transform_property(name: &str) -> bool {
    TRANSFORM_PROPERTIES.contains(&name)
}

/// Custom handler attached to a property name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Hook {
    /// One function of the composite transform.
    TransformFn(TransformFn),
    /// The whole `transform` value; replaces the cached state.
    Transform,
    Filter,
    TransformOrigin,
}

impl Hook {
    pub fn for_name(name: &str) -> Option<Self> {
        if let Some(f) = TransformFn::from_name(name) {
            return Some(Hook::TransformFn(f));
        }
        match name {
            "transform" | "transit:transform" => Some(Hook::Transform),
            "filter" => Some(Hook::Filter),
            "transformOrigin" => Some(Hook::TransformOrigin),
            _ => None,
        }
    }
}

fn is_unitless(name: &str) -> bool {
    CSS_NUMBER.contains(&name)
        || TransformFn::from_name(name).is_some_and(|f| !f.takes_pixels())
}

/// Split `"+=10"` into its signed delta.
fn relative_delta(text: &str) -> Option<f64> {
    let (sign, rest) = if let Some(rest) = text.strip_prefix("+=") {
        (1.0, rest)
    } else if let Some(rest) = text.strip_prefix("-=") {
        (-1.0, rest)
    } else {
        return None;
    };
    let n = parse_float(rest);
    (!n.is_nan()).then_some(sign * n)
}

/// Group a user-facing property name under the name the style engine
/// transitions (`x` -> `transform`, `marginLeft` -> `margin`).
fn mapped_property(key: &str) -> &str {
    if TransformFn::from_name(key).is_some() {
        return "transform";
    }
    match key {
        "marginBottom" | "marginLeft" | "marginRight" | "marginTop" => "margin",
        "paddingBottom" | "paddingLeft" | "paddingRight" | "paddingTop" => "padding",
        "float" => "cssFloat",
        _ => key,
    }
}

/// Style reads/writes for every element the orchestrator touches, with the
/// transform cache keyed by element.
#[derive(Debug)]
pub struct StyleAccess {
    support: Support,
    transforms: HashMap<ElementId, TransformState>,
    computed_names: HashMap<String, String>,
}

impl StyleAccess {
    pub fn new(support: Support) -> Self {
        Self {
            support,
            transforms: HashMap::new(),
            computed_names: HashMap::new(),
        }
    }

    pub fn support(&self) -> &Support {
        &self.support
    }

    pub fn transform_of(&self, elem: ElementId) -> Option<&TransformState> {
        self.transforms.get(&elem)
    }

    /// Swap the cached transform without touching styles.
    pub fn set_transform_cache(&mut self, elem: ElementId, state: Option<TransformState>) {
        match state {
            Some(state) => {
                self.transforms.insert(elem, state);
            }
            None => {
                self.transforms.remove(&elem);
            }
        }
    }

    pub fn forget(&mut self, elem: ElementId) {
        self.transforms.remove(&elem);
    }

    /// Rebuild the transform cache from the element's inline transform.
    pub fn resync_transform<H: StyleHost + ?Sized>(&mut self, host: &H, elem: ElementId) {
        match host.style(elem, &self.support.transform) {
            Some(text) => {
                self.transforms.insert(elem, TransformState::parse(&text));
            }
            None => {
                self.transforms.remove(&elem);
            }
        }
    }

    fn write_transform<H: StyleHost + ?Sized>(&mut self, host: &mut H, elem: ElementId) {
        let text = self
            .transforms
            .get(&elem)
            .map(|t| t.to_css(self.support.force_3d_strings, self.support.transform3d))
            .unwrap_or_default();
        host.set_style(elem, &self.support.transform, &text);
    }

    /// Write every property in order.
    pub fn apply<H: StyleHost + ?Sized>(&mut self, host: &mut H, elem: ElementId, props: &Properties) {
        for (name, value) in props {
            self.set(host, elem, name, value);
        }
    }

    /// Write one property.
    pub fn set<H: StyleHost + ?Sized>(
        &mut self,
        host: &mut H,
        elem: ElementId,
        name: &str,
        value: &CssValue,
    ) {
        let orig = camel_case(name);
        let resolved = self.write_name(host, &orig);
        let hook = Hook::for_name(&resolved).or_else(|| Hook::for_name(&orig));

        let mut value = value.clone();
        if let CssValue::Text(text) = &value {
            if let Some(delta) = relative_delta(text.trim()) {
                let current = self
                    .get(host, elem, &orig)
                    .map_or(f64::NAN, |v| v.as_f64());
                value = CssValue::Number(current + delta);
            }
        }

        let text = match value {
            CssValue::Number(n) if !n.is_finite() => {
                log::warn!("skipping non-finite value for '{orig}' on {elem:?}");
                return;
            }
            CssValue::Number(n) if is_unitless(&orig) => format_number(n),
            CssValue::Number(n) => format!("{}px", format_number(n)),
            CssValue::Text(s) => s,
        };

        if text.is_empty() && !self.support.clear_clone_style && resolved.starts_with("background") {
            host.set_style(elem, &resolved, "inherit");
            return;
        }

        match hook {
            Some(Hook::TransformFn(f)) => {
                self.transforms
                    .entry(elem)
                    .or_default()
                    .set_from_str(f.name(), &text);
                self.write_transform(host, elem);
            }
            Some(Hook::Transform) => {
                self.transforms.insert(elem, TransformState::parse(&text));
                self.write_transform(host, elem);
            }
            Some(Hook::Filter) => {
                let target = self.support.filter.clone().unwrap_or(resolved);
                host.set_style(elem, &target, &text);
            }
            Some(Hook::TransformOrigin) => {
                let target = self.support.transform_origin.clone();
                host.set_style(elem, &target, &text);
            }
            None => host.set_style(elem, &resolved, &text),
        }
    }

    /// Read one property: transform functions from the cache, hooked vendor
    /// properties and everything else from the inline style.
    pub fn get<H: StyleHost + ?Sized>(
        &self,
        host: &H,
        elem: ElementId,
        name: &str,
    ) -> Option<CssValue> {
        let orig = camel_case(name);
        let resolved = self.write_name(host, &orig);
        match Hook::for_name(&resolved).or_else(|| Hook::for_name(&orig)) {
            Some(Hook::TransformFn(f)) => Some(self.transform_field(elem, f.name()).to_css_value()),
            Some(Hook::Transform) => self
                .transforms
                .get(&elem)
                .map(|t| CssValue::Text(t.to_string())),
            Some(Hook::Filter) => {
                let target = self.support.filter.as_deref().unwrap_or(&resolved);
                host.style(elem, target).map(CssValue::Text)
            }
            Some(Hook::TransformOrigin) => host
                .style(elem, &self.support.transform_origin)
                .map(CssValue::Text),
            None => host.style(elem, &resolved).map(CssValue::Text),
        }
    }

    fn transform_field(&self, elem: ElementId, name: &str) -> FieldValue {
        self.transforms
            .get(&elem)
            .map_or(FieldValue::Number(0.0), |t| t.get(name))
    }

    /// Value a step starts from: transform functions read the cache (every
    /// `scale*` reads `scale`, every `rotate*` reads `rotate`), other properties
    /// read computed style.
    pub fn begin_value<H: StyleHost + ?Sized>(
        &mut self,
        host: &H,
        elem: ElementId,
        name: &str,
    ) -> Option<CssValue> {
        if let Some(f) = TransformFn::from_name(name) {
            let field = match f {
                TransformFn::Scale | TransformFn::ScaleX | TransformFn::ScaleY => "scale",
                TransformFn::Rotate
                | TransformFn::RotateX
                | TransformFn::RotateY
                | TransformFn::Rotate3d => "rotate",
                other => other.name(),
            };
            return Some(self.transform_field(elem, field).to_css_value());
        }
        self.computed(host, elem, &camel_case(name))
            .1
            .map(CssValue::Text)
    }

    /// Computed value, trying lowercase vendor prefixes when the bare name is
    /// unknown. Resolved names are cached.
    pub fn computed<H: StyleHost + ?Sized>(
        &mut self,
        host: &H,
        elem: ElementId,
        name: &str,
    ) -> (String, Option<String>) {
        if let Some(value) = host.computed_style(elem, name) {
            return (name.to_string(), Some(value));
        }
        if let Some(known) = self.computed_names.get(name) {
            return (known.clone(), host.computed_style(elem, known));
        }
        let cap = capitalize(name);
        for prefix in COMPUTED_PREFIXES {
            let full = format!("{prefix}{cap}");
            if let Some(value) = host.computed_style(elem, &full) {
                self.computed_names.insert(name.to_string(), full.clone());
                return (full, Some(value));
            }
        }
        (name.to_string(), None)
    }

    fn write_name<H: StyleHost + ?Sized>(&self, host: &H, name: &str) -> String {
        vendor_property_name(host, name).unwrap_or_else(|| name.to_string())
    }

    /// Distinct dasherized property names the style engine transitions for
    /// `props`, in first-seen order.
    pub fn transition_properties(&self, props: &Properties) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(props.len());
        for key in props.keys() {
            let camel = camel_case(key);
            let mapped = mapped_property(&camel);
            let name = match self.support.name_for(mapped) {
                Some(vendor) => uncamel(vendor),
                None => uncamel(mapped),
            };
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// `transition` value for `props`:
    /// `"transform 400ms ease, opacity 400ms ease"`.
    pub fn transition_value(
        &self,
        props: &Properties,
        duration_ms: f64,
        easing_css: &str,
        delay_ms: f64,
    ) -> String {
        let mut attribs = format!("{} {}", to_ms(duration_ms), easing_css);
        if delay_ms.trunc() > 0.0 {
            attribs.push(' ');
            attribs.push_str(&to_ms(delay_ms));
        }
        self.transition_properties(props)
            .iter()
            .map(|name| format!("{name} {attribs}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Current offset of one translate axis from the computed transform matrix.
    pub fn matrix_offset<H: StyleHost + ?Sized>(
        &mut self,
        host: &H,
        elem: ElementId,
        axis: &str,
    ) -> Option<String> {
        let (_, matrix) = self.computed(host, elem, "transform");
        let matrix = matrix?;
        let open = matrix.find('(')?;
        let close = matrix.rfind(')')?;
        let values: Vec<&str> = matrix.get(open + 1..close)?.split(',').map(str::trim).collect();
        let base = if matrix.starts_with("matrix3d") { 12 } else { 4 };
        let offset = match axis {
            "z" => 2,
            "y" => 1,
            _ => 0,
        };
        values.get(base + offset).map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::value::properties;

    fn setup() -> (MemoryHost, ElementId, StyleAccess) {
        let mut host = MemoryHost::new();
        let el = host.create_element(None);
        (host, el, StyleAccess::new(Support::standard()))
    }

    #[test]
    fn numbers_get_pixels_unless_unitless() {
        let (mut host, el, mut style) = setup();
        style.set(&mut host, el, "width", &CssValue::Number(20.0));
        style.set(&mut host, el, "opacity", &CssValue::Number(0.5));
        style.set(&mut host, el, "z-index", &CssValue::Number(3.0));
        assert_eq!(host.inline(el, "width"), Some("20px"));
        assert_eq!(host.inline(el, "opacity"), Some("0.5"));
        assert_eq!(host.inline(el, "zIndex"), Some("3"));
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let (mut host, el, mut style) = setup();
        style.set(&mut host, el, "width", &CssValue::Number(f64::NAN));
        assert_eq!(host.inline(el, "width"), None);
    }

    #[test]
    fn relative_values_use_the_current_value() {
        let (mut host, el, mut style) = setup();
        host.set_style(el, "left", "10px");
        style.set(&mut host, el, "left", &CssValue::from("+=5"));
        assert_eq!(host.inline(el, "left"), Some("15px"));
        style.set(&mut host, el, "rotate", &CssValue::from(30.0));
        style.set(&mut host, el, "rotate", &CssValue::from("-=10"));
        assert_eq!(host.inline(el, "transform"), Some("rotate(20deg)"));
    }

    #[test]
    fn transform_functions_merge_into_one_property() {
        let (mut host, el, mut style) = setup();
        let props = properties([
            ("x", CssValue::from(10.0)),
            ("rotate", CssValue::from(45.0)),
            ("y", CssValue::from("5px")),
        ]);
        style.apply(&mut host, el, &props);
        assert_eq!(
            host.inline(el, "transform"),
            Some("translate(10px,5px) rotate(45deg)")
        );
        assert_eq!(style.get(&host, el, "x"), Some(CssValue::from("10px")));

        style.set(&mut host, el, "transform", &CssValue::from("scale(2)"));
        assert_eq!(host.inline(el, "transform"), Some("scale(2,2)"));
        assert_eq!(style.get(&host, el, "x"), Some(CssValue::Number(0.0)));
    }

    #[test]
    fn webkit_transform_uses_3d_strings() {
        let mut host = MemoryHost::new();
        host.set_supported_properties(["WebkitTransform", "WebkitTransition"]);
        let el = host.create_element(None);
        let mut style = StyleAccess::new(Support::detect(&host));
        style.set(&mut host, el, "scale", &CssValue::from(2.0));
        assert_eq!(host.inline(el, "WebkitTransform"), Some("scale3d(2,2,1)"));
    }

    #[test]
    fn transition_values_group_properties() {
        let (_, _, style) = setup();
        let props = properties([
            ("x", CssValue::from(1.0)),
            ("y", CssValue::from(1.0)),
            ("marginLeft", CssValue::from(1.0)),
            ("opacity", CssValue::from(1.0)),
        ]);
        assert_eq!(
            style.transition_properties(&props),
            vec!["transform", "margin", "opacity"]
        );
        assert_eq!(
            style.transition_value(&props, 400.0, "ease", 0.0),
            "transform 400ms ease, margin 400ms ease, opacity 400ms ease"
        );
        let one = properties([("opacity", CssValue::from(1.0))]);
        assert_eq!(
            style.transition_value(&one, 400.0, "linear", 100.0),
            "opacity 400ms linear 100ms"
        );
    }

    #[test]
    fn computed_lookup_caches_prefixed_names() {
        let (mut host, el, mut style) = setup();
        host.set_computed(el, "webkitFilter", "blur(2px)");
        let (name, value) = style.computed(&host, el, "filter");
        assert_eq!(name, "webkitFilter");
        assert_eq!(value.as_deref(), Some("blur(2px)"));
        assert_eq!(style.computed_names.get("filter").map(String::as_str), Some("webkitFilter"));
    }

    #[test]
    fn matrix_offsets() {
        let (mut host, el, mut style) = setup();
        host.set_computed(el, "transform", "matrix(1, 0, 0, 1, 50, 20)");
        assert_eq!(style.matrix_offset(&host, el, "x").as_deref(), Some("50"));
        assert_eq!(style.matrix_offset(&host, el, "y").as_deref(), Some("20"));
        host.set_computed(
            el,
            "transform",
            "matrix3d(1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 7, 8, 9, 1)",
        );
        assert_eq!(style.matrix_offset(&host, el, "z").as_deref(), Some("9"));
    }

    #[test]
    fn begin_values_collapse_transform_families() {
        let (mut host, el, mut style) = setup();
        style.set(&mut host, el, "scale", &CssValue::from("2"));
        host.set_style(el, "opacity", "1");
        assert_eq!(style.begin_value(&host, el, "scaleX"), Some(CssValue::Number(2.0)));
        assert_eq!(style.begin_value(&host, el, "opacity"), Some(CssValue::from("1")));
        assert_eq!(style.begin_value(&host, el, "x"), Some(CssValue::Number(0.0)));
    }
}
