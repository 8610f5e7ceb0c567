//! Feature table: which style property names and completion event the host
//! engine exposes.

use serde::{Deserialize, Serialize};

use crate::host::StyleHost;
use crate::units::capitalize;

const VENDOR_PREFIXES: [&str; 4] = ["Moz", "Webkit", "O", "ms"];

/// Resolved property names and capabilities of the host engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Support {
    /// Name of the `transition` property, `None` when transitions are unsupported.
    pub transition: Option<String>,
    pub transition_delay: Option<String>,
    pub transform: String,
    pub transform_origin: String,
    pub filter: Option<String>,
    pub transform3d: bool,
    pub clear_clone_style: bool,
    /// Completion event for the detected transition property.
    pub transition_end: Option<String>,
    /// Serialize transforms with `scale3d`/`translate3d` (WebKit transform name on
    /// a non-Chrome engine).
    pub force_3d_strings: bool,
}

impl Default for Support {
    fn default() -> Self {
        Self::standard()
    }
}

impl Support {
    /// Unprefixed modern engine.
    pub fn standard() -> Self {
        Self {
            transition: Some("transition".into()),
            transition_delay: Some("transitionDelay".into()),
            transform: "transform".into(),
            transform_origin: "transformOrigin".into(),
            filter: Some("filter".into()),
            transform3d: true,
            clear_clone_style: true,
            transition_end: event_name_for("transition").map(str::to_string),
            force_3d_strings: false,
        }
    }

    /// Probe the host for vendor-prefixed names and capabilities.
    pub fn detect<H: StyleHost + ?Sized>(host: &H) -> Self {
        let transition = vendor_property_name(host, "transition");
        let transform =
            vendor_property_name(host, "transform").unwrap_or_else(|| "transform".to_string());
        let is_chrome = host
            .user_agent()
            .map(|ua| ua.to_ascii_lowercase().contains("chrome"))
            .unwrap_or(false);
        let force_3d_strings = transform == "WebkitTransform" && !is_chrome;
        Self {
            transition_end: transition
                .as_deref()
                .and_then(event_name_for)
                .map(str::to_string),
            transition,
            transition_delay: vendor_property_name(host, "transitionDelay"),
            transform_origin: vendor_property_name(host, "transformOrigin")
                .unwrap_or_else(|| "transformOrigin".to_string()),
            filter: vendor_property_name(host, "filter"),
            transform3d: host.supports_3d_transforms(),
            clear_clone_style: host.clear_clone_style(),
            transform,
            force_3d_strings,
        }
    }

    /// Vendor name registered for a canonical property key, if the table has one.
    pub fn name_for(&self, key: &str) -> Option<&str> {
        match key {
            "transition" => self.transition.as_deref(),
            "transitionDelay" => self.transition_delay.as_deref(),
            "transform" => Some(self.transform.as_str()),
            "transformOrigin" => Some(self.transform_origin.as_str()),
            "filter" => self.filter.as_deref(),
            _ => None,
        }
    }
}

/// `transition` -> `WebkitTransition` (or whichever prefix the host knows).
pub fn vendor_property_name<H: StyleHost + ?Sized>(host: &H, prop: &str) -> Option<String> {
    if host.supports_property(prop) {
        return Some(prop.to_string());
    }
    let cap = capitalize(prop);
    VENDOR_PREFIXES
        .iter()
        .map(|prefix| format!("{prefix}{cap}"))
        .find(|name| host.supports_property(name))
}

/// Completion event emitted by each transition property spelling.
pub fn event_name_for(transition_prop: &str) -> Option<&'static str> {
    match transition_prop {
        "transition" | "MozTransition" => Some("transitionend"),
        "OTransition" => Some("oTransitionEnd"),
        "WebkitTransition" => Some("webkitTransitionEnd"),
        "msTransition" => Some("MSTransitionEnd"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn standard_names() {
        let s = Support::standard();
        assert_eq!(s.transition.as_deref(), Some("transition"));
        assert_eq!(s.transition_end.as_deref(), Some("transitionend"));
        assert_eq!(s.name_for("transform"), Some("transform"));
        assert_eq!(s.name_for("opacity"), None);
    }

    #[test]
    fn detects_webkit_prefixes() {
        let mut host = MemoryHost::new();
        host.set_supported_properties(["WebkitTransition", "WebkitTransform", "opacity"]);
        let s = Support::detect(&host);
        assert_eq!(s.transition.as_deref(), Some("WebkitTransition"));
        assert_eq!(s.transition_end.as_deref(), Some("webkitTransitionEnd"));
        assert_eq!(s.transform, "WebkitTransform");
        assert!(s.force_3d_strings);
    }

    #[test]
    fn missing_transition_has_no_event() {
        let mut host = MemoryHost::new();
        host.set_supported_properties(["transform"]);
        let s = Support::detect(&host);
        assert_eq!(s.transition, None);
        assert_eq!(s.transition_end, None);
    }
}
