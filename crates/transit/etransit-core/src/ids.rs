//! Identifiers for animated elements and in-flight steps.

use serde::{Deserialize, Serialize};

/// Opaque handle for a host element. Hosts assign these; the core never
/// interprets the number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Token identifying one armed completion watcher. Host listeners stamp it on
/// the transition-end signals they deliver; a signal with a stale token is
/// ignored.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WatchToken(pub u64);

/// Something that names an element: either a handle or a string identifier the
/// host resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Element(ElementId),
    Id(String),
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Target::Element(id)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Id(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::Id(id)
    }
}

/// Monotonic allocator for element handles and watch tokens.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_element: u32,
    next_token: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element = self.next_element.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_token(&mut self) -> WatchToken {
        let token = WatchToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        token
    }
}
