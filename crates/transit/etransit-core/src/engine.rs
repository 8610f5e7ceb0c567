//! Transition orchestrator.
//!
//! [`Transit`] owns the host, one queue per animated element and a millisecond
//! clock. Operations enqueue jobs and start whatever can start right away;
//! [`Transit::update`] advances the clock, delivers completion signals and
//! fires due timers.
//!
//! ```
//! use etransit_core::{on_complete, properties, MemoryHost, Transit};
//!
//! let mut host = MemoryHost::new();
//! let el = host.create_element(Some("box"));
//! let mut transit = Transit::new(host);
//! transit.config_mut().use_transition_end = false;
//!
//! transit
//!     .get("box")
//!     .unwrap()
//!     .transit(properties([("opacity", 0.5.into())]), 400.0, "in", None)
//!     .then(properties([("x", 100.into())]), 200.0, "linear", on_complete(|_| {}));
//!
//! transit.update(400.0);
//! assert_eq!(transit.host().inline(el, "opacity"), Some("0.5"));
//! transit.update(200.0);
//! assert_eq!(transit.host().inline(el, "transform"), Some("translate(100px,0)"));
//! ```

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::bezier::CurveCache;
use crate::config::Config;
use crate::easing::{bezier_css, Easing};
use crate::error::TransitError;
use crate::host::{StyleHost, TransitionEnd};
use crate::ids::{ElementId, IdAllocator, Target, WatchToken};
use crate::job::{Callback, Job, Next, PropertyData, StepCount, StepKind, StepRecord, StepRequest};
use crate::outputs::{Outputs, TransitEvent, Watcher};
use crate::queue::{QueueState, StepQueue};
use crate::style::{is_transform_property, StyleAccess};
use crate::support::Support;
use crate::timeline::Timeline;
use crate::transform::TransformState;
use crate::units::camel_case;
use crate::value::{CssValue, Properties, Timing};

/// Duration of the style reset step.
const RESET_MS: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
enum Watch {
    Event(String),
    Timer { due: f64 },
}

/// The step waiting on a watcher.
#[derive(Debug)]
struct InFlight {
    token: WatchToken,
    watch: Watch,
    kind: StepKind,
    /// Dasherized transitioned properties; empty for the style reset.
    properties: Vec<String>,
}

#[derive(Debug)]
struct PauseSnapshot {
    css_text: String,
    transform: Option<TransformState>,
}

#[derive(Debug)]
struct ElementTransit {
    queue: StepQueue,
    history: Vec<StepRecord>,
    in_flight: Option<InFlight>,
    timeline: Timeline,
    paused: Option<PauseSnapshot>,
    /// Inline style text when the element was first animated.
    original_css: String,
}

/// `-webkit-transform` -> `transform`.
fn unprefixed(name: &str) -> &str {
    for prefix in ["-webkit-", "-moz-", "-ms-", "-o-"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest;
        }
    }
    name
}

/// Shorthands whose longhands finish individually.
const SHORTHANDS: [&str; 12] = [
    "margin",
    "padding",
    "border",
    "border-radius",
    "background",
    "outline",
    "font",
    "flex",
    "grid",
    "columns",
    "list-style",
    "text-decoration",
];

/// Whether a finished-property report belongs to one of `watched`
/// (`margin-left` belongs to `margin`, `transform-origin` is not `transform`).
fn reports_watched(watched: &[String], reported: &str) -> bool {
    let reported = unprefixed(reported);
    watched.iter().any(|w| {
        let w = unprefixed(w);
        reported == w
            || (SHORTHANDS.contains(&w)
                && reported
                    .strip_prefix(w)
                    .is_some_and(|rest| rest.starts_with('-')))
    })
}

fn interpolate(data: &PropertyData, eased: f64) -> CssValue {
    let begin = data.begin.as_ref().map_or(f64::NAN, CssValue::as_f64);
    let end = data.end.as_f64();
    CssValue::Number((end - begin) * eased + begin)
}

/// Orchestrator over one host document.
#[derive(Debug)]
pub struct Transit<H: StyleHost> {
    host: H,
    config: Config,
    style: StyleAccess,
    curves: CurveCache,
    ids: IdAllocator,
    elements: HashMap<ElementId, ElementTransit>,
    now: f64,
    pending: Vec<TransitEvent>,
    outputs: Outputs,
}

impl<H: StyleHost> Transit<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, Config::default())
    }

    /// Create with a config; feature support is probed from the host.
    pub fn with_config(host: H, config: Config) -> Self {
        let support = Support::detect(&host);
        Self::with_support(host, config, support)
    }

    pub fn with_support(host: H, config: Config, support: Support) -> Self {
        Self {
            host,
            config,
            style: StyleAccess::new(support),
            curves: CurveCache::new(),
            ids: IdAllocator::new(),
            elements: HashMap::new(),
            now: 0.0,
            pending: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn support(&self) -> &Support {
        self.style.support()
    }

    /// Clock time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn resolve(&self, target: &Target) -> Result<ElementId, TransitError> {
        match target {
            Target::Element(elem) => Ok(*elem),
            Target::Id(id) => self
                .host
                .lookup(id)
                .ok_or_else(|| TransitError::ElementNotFound { id: id.clone() }),
        }
    }

    /// Handle for chaining operations on one element.
    pub fn get(&mut self, target: impl Into<Target>) -> Result<TransitHandle<'_, H>, TransitError> {
        let elem = self.resolve(&target.into())?;
        self.ensure(elem);
        Ok(TransitHandle { engine: self, elem })
    }

    /// Queue one transition on `target`.
    pub fn to(
        &mut self,
        target: impl Into<Target>,
        properties: Properties,
        timing: impl Into<Timing>,
        easing: impl Into<Easing>,
        callback: Option<Callback>,
    ) -> Result<ElementId, TransitError> {
        let elem = self.resolve(&target.into())?;
        self.transit(elem, properties, timing, easing, callback);
        Ok(elem)
    }

    fn ensure(&mut self, elem: ElementId) -> &mut ElementTransit {
        let host = &self.host;
        self.elements.entry(elem).or_insert_with(|| ElementTransit {
            queue: StepQueue::new(),
            history: Vec::new(),
            in_flight: None,
            timeline: Timeline::default(),
            paused: None,
            original_css: host.css_text(elem),
        })
    }

    fn emit(&mut self, event: TransitEvent) {
        self.pending.push(event);
    }

    fn enqueue(&mut self, elem: ElementId, job: Job) {
        self.ensure(elem).queue.push_back(job);
        self.pump(elem);
    }

    /// Queue a transition of `properties` to their target values.
    pub fn transit(
        &mut self,
        elem: ElementId,
        properties: Properties,
        timing: impl Into<Timing>,
        easing: impl Into<Easing>,
        callback: Option<Callback>,
    ) {
        let request = StepRequest {
            properties,
            timing: timing.into(),
            easing: easing.into(),
            kind: StepKind::Normal,
        };
        self.enqueue(elem, Job::step(request, callback));
    }

    /// Queue a replay of the newest `count` steps back to their begin values.
    pub fn reverse(&mut self, elem: ElementId, count: StepCount, callback: Option<Callback>) {
        self.enqueue(elem, Job::reverse(count, None, StepKind::Reverse, callback));
    }

    /// Queue an undo of every recorded step.
    pub fn restore(&mut self, elem: ElementId, callback: Option<Callback>) {
        self.enqueue(elem, Job::restore(callback));
    }

    /// Abort the active job and undo every recorded step ahead of anything
    /// still queued.
    pub fn restore_now(&mut self, elem: ElementId, callback: Option<Callback>) {
        self.abort_active(elem);
        self.ensure(elem).queue.push_front(Job::restore(callback));
        self.pump(elem);
    }

    /// Queue a reset of the whole inline style to its first-seen text.
    pub fn restore_all_style(&mut self, elem: ElementId, callback: Option<Callback>) {
        self.enqueue(elem, Job::restore_all(callback));
    }

    /// Queue `times` alternating reverse/forward replays of the newest `count`
    /// steps.
    pub fn repeat(&mut self, elem: ElementId, times: u32, count: StepCount) {
        self.enqueue(elem, Job::repeat(times, count));
    }

    /// Start jobs until one waits on a watcher or the queue runs dry.
    fn pump(&mut self, elem: ElementId) {
        loop {
            let Some(state) = self.elements.get_mut(&elem) else {
                return;
            };
            if state.in_flight.is_some() {
                return;
            }
            let Some(job) = state.queue.activate() else {
                return;
            };
            match job.next(&state.history) {
                Next::Issue(request) => {
                    let kind = request.kind;
                    if self.start_step(elem, request) {
                        self.step_finished(elem, kind);
                    }
                }
                Next::ResetStyles => self.start_reset(elem),
                Next::Finish(callback) => {
                    state.queue.take_active();
                    log::debug!("job finished on {elem:?}");
                    self.emit(TransitEvent::JobFinished { element: elem });
                    if let Some(callback) = callback {
                        callback(elem);
                    }
                }
            }
        }
    }

    /// Record and start one step. Returns true when it completed synchronously.
    fn start_step(&mut self, elem: ElementId, request: StepRequest) -> bool {
        let (duration, delay) = request.timing.resolve(self.config.speeds.default);
        let live = self.config.enabled && self.style.support().transition.is_some();
        let total = if live { duration + delay } else { 0.0 };

        let mut data = IndexMap::with_capacity(request.properties.len());
        for (name, end) in &request.properties {
            data.insert(
                name.clone(),
                PropertyData {
                    begin: self.style.begin_value(&self.host, elem, name),
                    end: end.clone(),
                    is_transform: is_transform_property(name),
                },
            );
        }

        let now = self.now;
        let Some(state) = self.elements.get_mut(&elem) else {
            return true;
        };
        state.history.push(StepRecord {
            properties: request.properties.clone(),
            duration,
            delay,
            easing: request.easing.clone(),
            kind: request.kind,
            data,
        });
        state.timeline = Timeline::start(now, duration, total);

        if total <= 0.0 {
            self.style.apply(&mut self.host, elem, &request.properties);
            log::debug!("{:?} step applied immediately on {elem:?}", request.kind);
            self.emit(TransitEvent::StepStarted {
                element: elem,
                kind: request.kind,
                duration,
                delay,
                watcher: Watcher::Immediate,
            });
            return true;
        }

        let properties = self.style.transition_properties(&request.properties);
        let transition =
            self.style
                .transition_value(&request.properties, duration, &request.easing.css(), delay);
        self.host.force_reflow(elem);
        if let Some(name) = self.style.support().transition.clone() {
            self.host.set_style(elem, &name, &transition);
        }
        self.style.apply(&mut self.host, elem, &request.properties);

        let event = self
            .style
            .support()
            .transition_end
            .clone()
            .filter(|_| self.config.use_transition_end);
        let token = self.ids.alloc_token();
        let (watch, watcher) = match event {
            Some(name) => {
                self.host.listen_transition_end(elem, &name, token);
                (Watch::Event(name.clone()), Watcher::Event(name))
            }
            None => {
                let due = now + total;
                (Watch::Timer { due }, Watcher::Timer { due })
            }
        };
        if let Some(state) = self.elements.get_mut(&elem) {
            state.in_flight = Some(InFlight {
                token,
                watch,
                kind: request.kind,
                properties,
            });
            state.queue.set_step_in_flight(true);
        }
        log::debug!(
            "{:?} step started on {elem:?}: {transition} ({watcher:?})",
            request.kind
        );
        self.emit(TransitEvent::StepStarted {
            element: elem,
            kind: request.kind,
            duration,
            delay,
            watcher,
        });
        false
    }

    fn start_reset(&mut self, elem: ElementId) {
        let now = self.now;
        let Some(state) = self.elements.get_mut(&elem) else {
            return;
        };
        self.host.set_css_text(elem, &state.original_css);
        self.style.resync_transform(&self.host, elem);
        state.history.clear();
        state.timeline = Timeline::start(now, RESET_MS, RESET_MS);
        let due = now + RESET_MS;
        state.in_flight = Some(InFlight {
            token: self.ids.alloc_token(),
            watch: Watch::Timer { due },
            kind: StepKind::Restore,
            properties: Vec::new(),
        });
        state.queue.set_step_in_flight(true);
        log::debug!("inline style reset on {elem:?}");
        self.emit(TransitEvent::StepStarted {
            element: elem,
            kind: StepKind::Restore,
            duration: RESET_MS,
            delay: 0.0,
            watcher: Watcher::Timer { due },
        });
    }

    fn step_finished(&mut self, elem: ElementId, kind: StepKind) {
        let Some(state) = self.elements.get_mut(&elem) else {
            return;
        };
        state.timeline.finished = true;
        if let Some(job) = state.queue.active_mut() {
            job.step_done(&mut state.history);
        }
        self.emit(TransitEvent::StepCompleted {
            element: elem,
            kind,
        });
    }

    /// Tear down the in-flight watcher and clear the transient transition.
    fn disarm(&mut self, elem: ElementId) -> Option<InFlight> {
        let state = self.elements.get_mut(&elem)?;
        let flight = state.in_flight.take()?;
        state.queue.set_step_in_flight(false);
        if let Watch::Event(name) = &flight.watch {
            self.host.unlisten_transition_end(elem, name);
        }
        if !flight.properties.is_empty() {
            if let Some(name) = self.style.support().transition.clone() {
                self.host.remove_style(elem, &name);
            }
        }
        Some(flight)
    }

    fn complete(&mut self, elem: ElementId) {
        let Some(flight) = self.disarm(elem) else {
            return;
        };
        log::debug!("{:?} step completed on {elem:?} ({:?})", flight.kind, flight.token);
        self.step_finished(elem, flight.kind);
        self.pump(elem);
    }

    fn abort_active(&mut self, elem: ElementId) {
        self.disarm(elem);
        let Some(state) = self.elements.get_mut(&elem) else {
            return;
        };
        state.paused = None;
        if let Some(job) = state.queue.take_active() {
            log::debug!("{} job aborted on {elem:?}", job.name());
            self.emit(TransitEvent::JobAborted { element: elem });
            if let Some(callback) = job.into_callback() {
                callback(elem);
            }
        }
    }

    /// Native transition-finished signal for `elem`. With a `property`, signals
    /// for properties the in-flight step is not transitioning are ignored.
    pub fn transition_end(&mut self, elem: ElementId, property: Option<&str>) {
        self.end_signal(elem, None, property);
    }

    /// A signal delivered by a host listener; ignored unless it was bound for
    /// the watcher still in flight.
    fn deliver(&mut self, end: TransitionEnd) {
        self.end_signal(end.element, Some(end.token), end.property.as_deref());
    }

    fn end_signal(&mut self, elem: ElementId, token: Option<WatchToken>, property: Option<&str>) {
        let Some(state) = self.elements.get(&elem) else {
            return;
        };
        if state.paused.is_some() {
            return;
        }
        let Some(flight) = &state.in_flight else {
            return;
        };
        if !matches!(flight.watch, Watch::Event(_)) {
            return;
        }
        if token.is_some_and(|token| token != flight.token) {
            log::debug!("ignoring stale transition end on {elem:?}");
            return;
        }
        if let Some(property) = property {
            if !reports_watched(&flight.properties, property) {
                log::debug!("ignoring transition end of '{property}' on {elem:?}");
                return;
            }
        }
        self.complete(elem);
    }

    /// Earliest unpaused timer due at or before `limit`; arming order breaks ties.
    fn next_due(&self, limit: f64) -> Option<(ElementId, f64)> {
        self.elements
            .iter()
            .filter(|(_, state)| state.paused.is_none())
            .filter_map(|(elem, state)| {
                let flight = state.in_flight.as_ref()?;
                match flight.watch {
                    Watch::Timer { due } if due <= limit => Some((*elem, due, flight.token)),
                    _ => None,
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2 .0.cmp(&b.2 .0)))
            .map(|(elem, due, _)| (elem, due))
    }

    /// Advance the clock by `dt_ms`, deliver host signals and fire due timers.
    pub fn update(&mut self, dt_ms: f64) -> &Outputs {
        self.outputs.clear();

        for end in self.host.take_transition_ends() {
            self.deliver(end);
        }

        let dt = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
        let target = self.now + dt;
        while let Some((elem, due)) = self.next_due(target) {
            self.now = self.now.max(due);
            self.complete(elem);
        }
        self.now = target;

        self.outputs.events.append(&mut self.pending);
        &self.outputs
    }

    /// Freeze the in-flight step at its current visual state.
    pub fn pause(&mut self, elem: ElementId) {
        let now = self.now;
        let Some(state) = self.elements.get_mut(&elem) else {
            return;
        };
        if state.paused.is_some() {
            return;
        }
        match &state.in_flight {
            Some(flight) if !flight.properties.is_empty() => {}
            _ => return,
        }
        let Some(record) = state.history.last() else {
            return;
        };
        if state.timeline.rest <= 0.0 && record.duration <= 0.0 {
            return;
        }

        state.timeline.pause(now);
        let progress = state.timeline.progress(None);
        state.paused = Some(PauseSnapshot {
            css_text: self.host.css_text(elem),
            transform: self.style.transform_of(elem).cloned(),
        });

        let eased = record.easing.curve().sample(progress);
        let mut frozen = Properties::with_capacity(record.data.len());
        for (name, data) in &record.data {
            let value = if data.is_transform {
                let exact = match name.as_str() {
                    "x" | "y" => self.style.matrix_offset(&self.host, elem, name),
                    _ => None,
                };
                exact.map_or_else(|| interpolate(data, eased), CssValue::Text)
            } else {
                match self.style.computed(&self.host, elem, &camel_case(name)).1 {
                    Some(value) => CssValue::Text(value),
                    None => continue,
                }
            };
            frozen.insert(name.clone(), value);
        }

        self.style.apply(&mut self.host, elem, &frozen);
        if let Some(name) = self.style.support().transition.clone() {
            self.host.set_style(elem, &name, "none");
        }
        log::debug!("paused {elem:?} at {progress}");
        self.emit(TransitEvent::Paused {
            element: elem,
            progress,
        });
    }

    /// Continue a paused step over its remaining time on the continuation of
    /// its easing curve.
    pub fn resume(&mut self, elem: ElementId) {
        let now = self.now;
        let Some(state) = self.elements.get_mut(&elem) else {
            return;
        };
        let Some(snapshot) = state.paused.take() else {
            return;
        };
        let Some(record) = state.history.last() else {
            return;
        };

        let ratio = state.timeline.ratio(None);
        let (curve, err) = self.curves.continuation(&record.easing.curve(), ratio);
        let rest = state.timeline.rest;

        self.host.force_reflow(elem);
        self.host.set_css_text(elem, &snapshot.css_text);
        self.style.set_transform_cache(elem, snapshot.transform);
        let transition =
            self.style
                .transition_value(&record.properties, rest, &bezier_css(&curve.points()), 0.0);
        if let Some(name) = self.style.support().transition.clone() {
            self.host.set_style(elem, &name, &transition);
        }

        state.timeline.resume(now);
        if let Some(InFlight {
            watch: Watch::Timer { due },
            ..
        }) = state.in_flight.as_mut()
        {
            *due = now + rest;
        }

        if let Some(err) = err {
            self.emit(TransitEvent::Diagnostic {
                message: err.to_string(),
            });
        }
        log::debug!("resumed {elem:?} with {rest}ms left");
        self.emit(TransitEvent::Resumed {
            element: elem,
            remaining: rest,
            curve: curve.points(),
        });
    }

    /// Fraction of the current step's duration elapsed, rounded to three
    /// decimals. Live while running, frozen while paused.
    pub fn progress(&self, elem: ElementId) -> f64 {
        self.elements.get(&elem).map_or(0.0, |state| {
            let live = state.in_flight.is_some() && state.paused.is_none();
            state.timeline.progress(live.then_some(self.now))
        })
    }

    pub fn is_paused(&self, elem: ElementId) -> bool {
        self.elements
            .get(&elem)
            .is_some_and(|state| state.paused.is_some())
    }

    pub fn history(&self, elem: ElementId) -> &[StepRecord] {
        self.elements
            .get(&elem)
            .map(|state| state.history.as_slice())
            .unwrap_or_default()
    }

    pub fn history_len(&self, elem: ElementId) -> usize {
        self.history(elem).len()
    }

    pub fn queue_state(&self, elem: ElementId) -> QueueState {
        self.elements
            .get(&elem)
            .map_or(QueueState::Empty, |state| state.queue.state())
    }

    pub fn transform_of(&self, elem: ElementId) -> Option<&TransformState> {
        self.style.transform_of(elem)
    }

    /// Drop everything kept for `elem`. Pending callbacks never fire.
    pub fn forget(&mut self, elem: ElementId) {
        self.disarm(elem);
        self.elements.remove(&elem);
        self.style.forget(elem);
    }
}

/// Chaining handle for one element, returned by [`Transit::get`].
pub struct TransitHandle<'a, H: StyleHost> {
    engine: &'a mut Transit<H>,
    elem: ElementId,
}

impl<'a, H: StyleHost> TransitHandle<'a, H> {
    pub fn element(&self) -> ElementId {
        self.elem
    }

    pub fn transit(
        &mut self,
        properties: Properties,
        timing: impl Into<Timing>,
        easing: impl Into<Easing>,
        callback: Option<Callback>,
    ) -> &mut Self {
        self.engine
            .transit(self.elem, properties, timing, easing, callback);
        self
    }

    /// Alias of [`TransitHandle::transit`].
    pub fn then(
        &mut self,
        properties: Properties,
        timing: impl Into<Timing>,
        easing: impl Into<Easing>,
        callback: Option<Callback>,
    ) -> &mut Self {
        self.transit(properties, timing, easing, callback)
    }

    pub fn reverse(&mut self, count: impl Into<StepCount>, callback: Option<Callback>) -> &mut Self {
        self.engine.reverse(self.elem, count.into(), callback);
        self
    }

    pub fn restore(&mut self, callback: Option<Callback>) -> &mut Self {
        self.engine.restore(self.elem, callback);
        self
    }

    pub fn restore_now(&mut self, callback: Option<Callback>) -> &mut Self {
        self.engine.restore_now(self.elem, callback);
        self
    }

    pub fn restore_all_style(&mut self, callback: Option<Callback>) -> &mut Self {
        self.engine.restore_all_style(self.elem, callback);
        self
    }

    pub fn repeat(&mut self, times: u32, count: impl Into<StepCount>) -> &mut Self {
        self.engine.repeat(self.elem, times, count.into());
        self
    }

    pub fn pause(&mut self) -> &mut Self {
        self.engine.pause(self.elem);
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.engine.resume(self.elem);
        self
    }

    pub fn progress(&self) -> f64 {
        self.engine.progress(self.elem)
    }

    pub fn is_paused(&self) -> bool {
        self.engine.is_paused(self.elem)
    }

    pub fn history_len(&self) -> usize {
        self.engine.history_len(self.elem)
    }

    pub fn queue_state(&self) -> QueueState {
        self.engine.queue_state(self.elem)
    }
}
