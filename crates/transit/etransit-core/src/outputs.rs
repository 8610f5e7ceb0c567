//! Events reported by [`crate::Transit::update`].
//!
//! Adapters forward these to their host (the wasm crate hands them to JS as
//! plain objects).

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::job::StepKind;

/// How a started step will be completed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Watcher {
    /// Applied synchronously; nothing to wait for.
    Immediate,
    /// Native transition-finished event with this name.
    Event(String),
    /// Fallback timer due at this clock time (ms).
    Timer { due: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TransitEvent {
    StepStarted {
        element: ElementId,
        kind: StepKind,
        duration: f64,
        delay: f64,
        watcher: Watcher,
    },
    StepCompleted {
        element: ElementId,
        kind: StepKind,
    },
    Paused {
        element: ElementId,
        progress: f64,
    },
    Resumed {
        element: ElementId,
        remaining: f64,
        curve: [f64; 4],
    },
    JobFinished {
        element: ElementId,
    },
    JobAborted {
        element: ElementId,
    },
    Diagnostic {
        message: String,
    },
}

/// Events since the previous update, in the order they happened.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<TransitEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
