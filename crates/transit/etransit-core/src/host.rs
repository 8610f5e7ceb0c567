//! Host contract: the element style surface the orchestrator drives.
//!
//! Adapters implement [`StyleHost`] over a real document (see the wasm crate);
//! [`MemoryHost`] keeps everything in memory for headless use and tests.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{ElementId, IdAllocator, WatchToken};
use crate::units::{camel_case, uncamel};

/// A delivered transition-finished signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEnd {
    pub element: ElementId,
    /// Token of the watcher the listener was bound for.
    pub token: WatchToken,
    /// Dasherized name of the property that finished, when the host reports it.
    pub property: Option<String>,
}

/// Style read/write and completion-signal plumbing for one document.
///
/// Property names are JS-style camelCase (`opacity`, `marginLeft`,
/// `WebkitTransform`). Unknown elements are ignored by writes and read as
/// `None`.
pub trait StyleHost {
    /// Resolve a string identifier to an element.
    fn lookup(&self, id: &str) -> Option<ElementId>;

    /// Inline style value.
    fn style(&self, elem: ElementId, name: &str) -> Option<String>;
    fn set_style(&mut self, elem: ElementId, name: &str, value: &str);
    fn remove_style(&mut self, elem: ElementId, name: &str);

    /// Computed (rendered) value, which may differ from the inline value while a
    /// transition is running.
    fn computed_style(&self, elem: ElementId, name: &str) -> Option<String>;

    fn css_text(&self, elem: ElementId) -> String;
    fn set_css_text(&mut self, elem: ElementId, text: &str);

    /// Commit pending style writes before a new transition starts.
    fn force_reflow(&mut self, _elem: ElementId) {}

    fn supports_property(&self, _name: &str) -> bool {
        true
    }

    fn supports_3d_transforms(&self) -> bool {
        true
    }

    /// Whether clearing a cloned background property keeps it cleared.
    fn clear_clone_style(&self) -> bool {
        true
    }

    fn user_agent(&self) -> Option<String> {
        None
    }

    /// Bind a listener for `event`. Signals it delivers carry `token`.
    fn listen_transition_end(&mut self, elem: ElementId, event: &str, token: WatchToken);
    fn unlisten_transition_end(&mut self, elem: ElementId, event: &str);

    /// Signals delivered since the previous call.
    fn take_transition_ends(&mut self) -> Vec<TransitionEnd>;
}

#[derive(Debug, Default)]
struct MemoryElement {
    id: Option<String>,
    inline: IndexMap<String, String>,
    computed: HashMap<String, String>,
    listeners: Vec<(String, WatchToken)>,
}

/// In-memory document.
///
/// Computed style falls back to the inline value unless overridden with
/// [`MemoryHost::set_computed`], which stands in for a browser's in-flight
/// interpolation.
#[derive(Debug)]
pub struct MemoryHost {
    ids: IdAllocator,
    elements: HashMap<ElementId, MemoryElement>,
    supported: Option<HashSet<String>>,
    support_3d: bool,
    user_agent: Option<String>,
    pending_ends: Vec<TransitionEnd>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            elements: HashMap::new(),
            supported: None,
            support_3d: true,
            user_agent: None,
            pending_ends: Vec::new(),
        }
    }

    /// Create an element, optionally registered under a string identifier.
    pub fn create_element(&mut self, id: Option<&str>) -> ElementId {
        let elem = self.ids.alloc_element();
        self.elements.insert(
            elem,
            MemoryElement {
                id: id.map(str::to_string),
                ..MemoryElement::default()
            },
        );
        elem
    }

    pub fn remove_element(&mut self, elem: ElementId) {
        self.elements.remove(&elem);
    }

    /// Restrict property support to `names`. Every property is supported until
    /// this is called.
    pub fn set_supported_properties<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported = Some(names.into_iter().map(Into::into).collect());
    }

    pub fn set_supports_3d(&mut self, on: bool) {
        self.support_3d = on;
    }

    pub fn set_user_agent(&mut self, ua: impl Into<String>) {
        self.user_agent = Some(ua.into());
    }

    /// Override the computed value of one property.
    pub fn set_computed(&mut self, elem: ElementId, name: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(&elem) {
            el.computed.insert(name.to_string(), value.to_string());
        }
    }

    pub fn clear_computed(&mut self, elem: ElementId) {
        if let Some(el) = self.elements.get_mut(&elem) {
            el.computed.clear();
        }
    }

    /// Inline value as a borrowed string.
    pub fn inline(&self, elem: ElementId, name: &str) -> Option<&str> {
        self.elements
            .get(&elem)
            .and_then(|el| el.inline.get(name))
            .map(String::as_str)
    }

    pub fn is_listening(&self, elem: ElementId, event: &str) -> bool {
        self.elements
            .get(&elem)
            .is_some_and(|el| el.listeners.iter().any(|(l, _)| l == event))
    }

    pub fn listener_count(&self, elem: ElementId) -> usize {
        self.elements.get(&elem).map_or(0, |el| el.listeners.len())
    }

    /// Deliver a transition-finished signal through the most recently bound
    /// listener. Returns false (and drops the signal) when the element has no
    /// listener bound.
    pub fn fire_transition_end(&mut self, elem: ElementId, property: Option<&str>) -> bool {
        let Some(token) = self
            .elements
            .get(&elem)
            .and_then(|el| el.listeners.last())
            .map(|(_, token)| *token)
        else {
            return false;
        };
        self.pending_ends.push(TransitionEnd {
            element: elem,
            token,
            property: property.map(str::to_string),
        });
        true
    }
}

impl StyleHost for MemoryHost {
    fn lookup(&self, id: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .find(|(_, el)| el.id.as_deref() == Some(id))
            .map(|(elem, _)| *elem)
    }

    fn style(&self, elem: ElementId, name: &str) -> Option<String> {
        self.inline(elem, name).map(str::to_string)
    }

    fn set_style(&mut self, elem: ElementId, name: &str, value: &str) {
        let Some(el) = self.elements.get_mut(&elem) else {
            return;
        };
        if value.is_empty() {
            el.inline.shift_remove(name);
        } else {
            el.inline.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_style(&mut self, elem: ElementId, name: &str) {
        if let Some(el) = self.elements.get_mut(&elem) {
            el.inline.shift_remove(name);
        }
    }

    fn computed_style(&self, elem: ElementId, name: &str) -> Option<String> {
        let el = self.elements.get(&elem)?;
        el.computed
            .get(name)
            .or_else(|| el.inline.get(name))
            .cloned()
    }

    fn css_text(&self, elem: ElementId) -> String {
        self.elements.get(&elem).map_or_else(String::new, |el| {
            el.inline
                .iter()
                .map(|(k, v)| format!("{}: {};", uncamel(k), v))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    fn set_css_text(&mut self, elem: ElementId, text: &str) {
        let Some(el) = self.elements.get_mut(&elem) else {
            return;
        };
        el.inline.clear();
        for decl in text.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let (name, value) = (name.trim(), value.trim());
                if !name.is_empty() && !value.is_empty() {
                    el.inline.insert(camel_case(name), value.to_string());
                }
            }
        }
    }

    fn supports_property(&self, name: &str) -> bool {
        self.supported.as_ref().map_or(true, |set| set.contains(name))
    }

    fn supports_3d_transforms(&self) -> bool {
        self.support_3d
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn listen_transition_end(&mut self, elem: ElementId, event: &str, token: WatchToken) {
        if let Some(el) = self.elements.get_mut(&elem) {
            el.listeners.push((event.to_string(), token));
        }
    }

    fn unlisten_transition_end(&mut self, elem: ElementId, event: &str) {
        if let Some(el) = self.elements.get_mut(&elem) {
            if let Some(pos) = el.listeners.iter().position(|(l, _)| l == event) {
                el.listeners.remove(pos);
            }
        }
    }

    fn take_transition_ends(&mut self) -> Vec<TransitionEnd> {
        std::mem::take(&mut self.pending_ends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_text_round_trip() {
        let mut host = MemoryHost::new();
        let el = host.create_element(Some("box"));
        host.set_style(el, "opacity", "0.5");
        host.set_style(el, "marginLeft", "4px");
        assert_eq!(host.css_text(el), "opacity: 0.5; margin-left: 4px;");

        host.set_css_text(el, "opacity: 1; -webkit-transform: rotate(3deg);");
        assert_eq!(host.inline(el, "opacity"), Some("1"));
        assert_eq!(host.inline(el, "WebkitTransform"), Some("rotate(3deg)"));
        assert_eq!(host.inline(el, "marginLeft"), None);
        assert_eq!(host.lookup("box"), Some(el));
        assert_eq!(host.lookup("nope"), None);
    }

    #[test]
    fn computed_falls_back_to_inline() {
        let mut host = MemoryHost::new();
        let el = host.create_element(None);
        host.set_style(el, "opacity", "1");
        assert_eq!(host.computed_style(el, "opacity").as_deref(), Some("1"));
        host.set_computed(el, "opacity", "0.4");
        assert_eq!(host.computed_style(el, "opacity").as_deref(), Some("0.4"));
        host.set_style(el, "opacity", "");
        assert_eq!(host.inline(el, "opacity"), None);
    }

    #[test]
    fn signals_need_a_listener() {
        let mut host = MemoryHost::new();
        let el = host.create_element(None);
        assert!(!host.fire_transition_end(el, None));
        host.listen_transition_end(el, "transitionend", WatchToken(7));
        assert!(host.fire_transition_end(el, Some("opacity")));
        host.unlisten_transition_end(el, "transitionend");
        assert!(!host.is_listening(el, "transitionend"));
        let ends = host.take_transition_ends();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].property.as_deref(), Some("opacity"));
        assert_eq!(ends[0].token, WatchToken(7));
        assert!(host.take_transition_ends().is_empty());
    }
}
