//! `StyleHost` over the browser DOM.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CssStyleDeclaration, Document, Event, HtmlElement, TransitionEvent, Window};

use etransit_core::{ElementId, StyleHost, TransitionEnd, WatchToken};

/// Elements handed to the engine, by handle. Released slots stay empty so a
/// stale handle never names another element.
#[derive(Default)]
pub struct Registry {
    elements: Vec<Option<HtmlElement>>,
    live: usize,
}

impl Registry {
    /// Handle for `el`, registering it on first sight.
    pub fn register(&mut self, el: &HtmlElement) -> ElementId {
        if let Some(i) = self
            .elements
            .iter()
            .position(|known| known.as_ref() == Some(el))
        {
            return ElementId(i as u32);
        }
        self.elements.push(Some(el.clone()));
        self.live += 1;
        ElementId((self.elements.len() - 1) as u32)
    }

    pub fn element(&self, elem: ElementId) -> Option<&HtmlElement> {
        self.elements.get(elem.0 as usize)?.as_ref()
    }

    /// Drop the element behind `elem`, leaving its slot empty.
    pub fn remove(&mut self, elem: ElementId) -> Option<HtmlElement> {
        let el = self.elements.get_mut(elem.0 as usize)?.take()?;
        self.live -= 1;
        Some(el)
    }

    /// Number of elements still held.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

type Listener = Closure<dyn FnMut(Event)>;

pub struct DomHost {
    window: Window,
    document: Document,
    registry: Rc<RefCell<Registry>>,
    /// Style declaration of a detached element, for property probing.
    probe: Option<CssStyleDeclaration>,
    listeners: HashMap<(ElementId, String), Listener>,
    ends: Rc<RefCell<Vec<TransitionEnd>>>,
}

impl DomHost {
    pub fn new() -> Result<Self, JsError> {
        let window = web_sys::window().ok_or_else(|| JsError::new("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsError::new("no document"))?;
        let probe = document
            .create_element("div")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|el| el.style());
        Ok(Self {
            window,
            document,
            registry: Rc::new(RefCell::new(Registry::default())),
            probe,
            listeners: HashMap::new(),
            ends: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn registry(&self) -> Rc<RefCell<Registry>> {
        self.registry.clone()
    }

    pub fn register(&self, el: &HtmlElement) -> ElementId {
        self.registry.borrow_mut().register(el)
    }

    /// Let go of `elem`: unbind its listeners, drop its undelivered signals and
    /// empty its registry slot.
    pub fn release(&mut self, elem: ElementId) {
        let events: Vec<String> = self
            .listeners
            .keys()
            .filter(|(owner, _)| *owner == elem)
            .map(|(_, event)| event.clone())
            .collect();
        for event in events {
            self.unlisten_transition_end(elem, &event);
        }
        self.ends.borrow_mut().retain(|end| end.element != elem);
        self.registry.borrow_mut().remove(elem);
    }

    fn element(&self, elem: ElementId) -> Option<HtmlElement> {
        self.registry.borrow().element(elem).cloned()
    }

    fn inline_style(&self, elem: ElementId) -> Option<CssStyleDeclaration> {
        self.element(elem).map(|el| el.style())
    }
}

fn read(style: &CssStyleDeclaration, name: &str) -> Option<String> {
    Reflect::get(style, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_string())
        .filter(|v| !v.is_empty())
}

impl StyleHost for DomHost {
    fn lookup(&self, id: &str) -> Option<ElementId> {
        let el = self.document.get_element_by_id(id)?;
        let el = el.dyn_into::<HtmlElement>().ok()?;
        Some(self.register(&el))
    }

    fn style(&self, elem: ElementId, name: &str) -> Option<String> {
        read(&self.inline_style(elem)?, name)
    }

    fn set_style(&mut self, elem: ElementId, name: &str, value: &str) {
        if let Some(style) = self.inline_style(elem) {
            let _ = Reflect::set(&style, &JsValue::from_str(name), &JsValue::from_str(value));
        }
    }

    fn remove_style(&mut self, elem: ElementId, name: &str) {
        self.set_style(elem, name, "");
    }

    fn computed_style(&self, elem: ElementId, name: &str) -> Option<String> {
        let el = self.element(elem)?;
        let computed = self.window.get_computed_style(&el).ok()??;
        read(&computed, name)
    }

    fn css_text(&self, elem: ElementId) -> String {
        self.inline_style(elem)
            .map(|style| style.css_text())
            .unwrap_or_default()
    }

    fn set_css_text(&mut self, elem: ElementId, text: &str) {
        if let Some(style) = self.inline_style(elem) {
            style.set_css_text(text);
        }
    }

    fn force_reflow(&mut self, elem: ElementId) {
        // Reading layout flushes pending style writes.
        if let Some(el) = self.element(elem) {
            let _ = el.offset_width();
        }
    }

    fn supports_property(&self, name: &str) -> bool {
        self.probe
            .as_ref()
            .is_some_and(|style| Reflect::has(style, &JsValue::from_str(name)).unwrap_or(false))
    }

    fn supports_3d_transforms(&self) -> bool {
        self.supports_property("perspective") || self.supports_property("WebkitPerspective")
    }

    fn user_agent(&self) -> Option<String> {
        self.window.navigator().user_agent().ok()
    }

    fn listen_transition_end(&mut self, elem: ElementId, event: &str, token: WatchToken) {
        // A listener left over from an earlier watcher carries its token.
        self.unlisten_transition_end(elem, event);
        let key = (elem, event.to_string());
        let Some(el) = self.element(elem) else {
            return;
        };
        let ends = self.ends.clone();
        let listener: Listener = Closure::wrap(Box::new(move |ev: Event| {
            // Ends bubbling up from descendants are not ours.
            if ev.target() != ev.current_target() {
                return;
            }
            let property = ev
                .dyn_ref::<TransitionEvent>()
                .map(|t| t.property_name())
                .filter(|p| !p.is_empty());
            ends.borrow_mut().push(TransitionEnd {
                element: elem,
                token,
                property,
            });
        }));
        if el
            .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            .is_ok()
        {
            self.listeners.insert(key, listener);
        }
    }

    fn unlisten_transition_end(&mut self, elem: ElementId, event: &str) {
        let Some(listener) = self.listeners.remove(&(elem, event.to_string())) else {
            return;
        };
        if let Some(el) = self.element(elem) {
            let _ = el.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
    }

    fn take_transition_ends(&mut self) -> Vec<TransitionEnd> {
        std::mem::take(&mut *self.ends.borrow_mut())
    }
}
