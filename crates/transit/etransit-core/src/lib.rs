//! ETransit core (host-agnostic)
//!
//! Chainable CSS transitions for document elements: a FIFO of transition steps
//! per element with pause/resume, reverse, loop and restore, a composite
//! transform model, and the cubic-bezier math that keeps a resumed step on its
//! original curve. The document itself sits behind [`StyleHost`]; adapters
//! (the wasm crate) implement it over a real DOM.

pub mod bezier;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod host;
pub mod ids;
pub mod job;
pub mod outputs;
pub mod queue;
pub mod style;
pub mod support;
pub mod timeline;
pub mod transform;
pub mod units;
pub mod value;

// Re-exports for consumers (adapters)
pub use bezier::{reparameterize, CubicBezier, CurveCache};
pub use config::{Config, Speeds};
pub use easing::{Easing, DEFAULT_EASING};
pub use engine::{Transit, TransitHandle};
pub use error::TransitError;
pub use host::{MemoryHost, StyleHost, TransitionEnd};
pub use ids::{ElementId, Target, WatchToken};
pub use job::{on_complete, Callback, StepCount, StepKind, StepRecord};
pub use outputs::{Outputs, TransitEvent, Watcher};
pub use queue::QueueState;
pub use support::Support;
pub use timeline::Timeline;
pub use transform::{FieldValue, TransformFn, TransformState};
pub use value::{properties, CssValue, Properties, Timing};
