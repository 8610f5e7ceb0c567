//! Queued units of work and the step history they read.
//!
//! A [`Job`] is a small state machine. The engine asks it for the next thing to
//! do ([`Job::next`]), runs the step it hands back, reports completion
//! ([`Job::step_done`]) and asks again until the job finishes. Reverse and loop
//! replays are expressed this way instead of as chained callbacks.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::ids::ElementId;
use crate::value::{CssValue, Properties, Timing};

/// Completion callback; receives the element it was registered on.
pub type Callback = Box<dyn FnOnce(ElementId)>;

/// Box a closure as a [`Callback`].
pub fn on_complete(f: impl FnOnce(ElementId) + 'static) -> Option<Callback> {
    Some(Box::new(f))
}

/// How a step was issued.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Normal,
    Reverse,
    Loop,
    Restore,
}

/// Begin/end pair recorded for one property of a started step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    /// Value sampled right before the step wrote its targets. `None` when the
    /// host had no value for the property.
    pub begin: Option<CssValue>,
    pub end: CssValue,
    pub is_transform: bool,
}

/// One started step, as kept in the element's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub properties: Properties,
    pub duration: f64,
    pub delay: f64,
    pub easing: Easing,
    pub kind: StepKind,
    pub data: IndexMap<String, PropertyData>,
}

impl StepRecord {
    /// Properties set back to the values they had before this step. A property
    /// without a recorded begin value is cleared.
    pub fn begin_properties(&self) -> Properties {
        self.data
            .iter()
            .map(|(name, d)| {
                let value = d.begin.clone().unwrap_or_else(|| CssValue::Text(String::new()));
                (name.clone(), value)
            })
            .collect()
    }

    fn reversed(&self, duration: Option<f64>, kind: StepKind) -> StepRequest {
        StepRequest {
            properties: self.begin_properties(),
            timing: Timing::new(duration.unwrap_or(self.duration)),
            easing: self.easing.clone(),
            kind,
        }
    }

    fn replayed(&self, kind: StepKind) -> StepRequest {
        StepRequest {
            properties: self.properties.clone(),
            timing: Timing::new(self.duration).with_delay(self.delay),
            easing: self.easing.clone(),
            kind,
        }
    }
}

/// A step the engine should start.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRequest {
    pub properties: Properties,
    pub timing: Timing,
    pub easing: Easing,
    pub kind: StepKind,
}

/// How many history entries a reverse or loop covers, counted from the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepCount {
    All,
    Last(usize),
}

impl StepCount {
    fn resolve(self, history_len: usize) -> usize {
        match self {
            StepCount::All => history_len,
            StepCount::Last(n) => n,
        }
    }
}

impl Default for StepCount {
    fn default() -> Self {
        StepCount::Last(1)
    }
}

impl From<i32> for StepCount {
    /// `-1` (any negative) means all, `0` means one.
    fn from(n: i32) -> Self {
        match n {
            n if n < 0 => StepCount::All,
            0 => StepCount::Last(1),
            n => StepCount::Last(n as usize),
        }
    }
}

/// What the active job wants next.
pub enum Next {
    Issue(StepRequest),
    /// Reset the element's whole inline style to its first-seen snapshot.
    ResetStyles,
    Finish(Option<Callback>),
}

/// Replays the begin values of the newest history entries, newest first.
pub struct ReverseJob {
    count: StepCount,
    total: Option<usize>,
    issued: usize,
    duration: Option<f64>,
    kind: StepKind,
    callback: Option<Callback>,
}

impl ReverseJob {
    fn next(&mut self, history: &[StepRecord]) -> Next {
        let total = *self.total.get_or_insert(self.count.resolve(history.len()));
        if self.issued < total {
            if let Some(last) = history.last() {
                self.issued += 1;
                return Next::Issue(last.reversed(self.duration, self.kind));
            }
        }
        Next::Finish(self.callback.take())
    }
}

/// Alternates reverse and forward replays of the newest entries.
pub struct LoopJob {
    times: u32,
    count: StepCount,
    steps: Option<usize>,
    reverse_left: usize,
    forward_done: usize,
    round: u32,
    stash: Vec<StepRecord>,
    reversing: bool,
}

impl LoopJob {
    fn next(&mut self, history: &[StepRecord]) -> Next {
        let steps = match self.steps {
            Some(steps) => steps,
            None => {
                let steps = self.count.resolve(history.len());
                self.steps = Some(steps);
                self.reverse_left = steps;
                steps
            }
        };
        loop {
            if self.reverse_left > 0 {
                self.reverse_left -= 1;
                let Some(last) = history.last() else {
                    self.reverse_left = 0;
                    continue;
                };
                self.stash.push(last.clone());
                self.reversing = true;
                return Next::Issue(last.reversed(None, StepKind::Reverse));
            }
            if self.forward_done < steps {
                self.forward_done += 1;
                if let Some(record) = self.stash.pop() {
                    self.reversing = false;
                    return Next::Issue(record.replayed(StepKind::Loop));
                }
                continue;
            }
            if steps > 0 && self.round < self.times {
                self.round += 1;
                self.reverse_left = steps;
                self.forward_done = 0;
                continue;
            }
            return Next::Finish(None);
        }
    }
}

/// Unit of work in an element's queue.
pub enum Job {
    Step {
        request: Option<StepRequest>,
        callback: Option<Callback>,
    },
    Reverse(ReverseJob),
    Loop(LoopJob),
    RestoreAll {
        started: bool,
        callback: Option<Callback>,
    },
}

impl Job {
    pub fn step(request: StepRequest, callback: Option<Callback>) -> Self {
        Job::Step {
            request: Some(request),
            callback,
        }
    }

    /// Reverse `count` entries. `duration` overrides each recorded duration.
    pub fn reverse(
        count: StepCount,
        duration: Option<f64>,
        kind: StepKind,
        callback: Option<Callback>,
    ) -> Self {
        Job::Reverse(ReverseJob {
            count,
            total: None,
            issued: 0,
            duration,
            kind,
            callback,
        })
    }

    /// Reverse the whole history with 1 ms steps.
    pub fn restore(callback: Option<Callback>) -> Self {
        Job::reverse(StepCount::All, Some(1.0), StepKind::Restore, callback)
    }

    /// Run the newest `count` entries `times` times in total (0 means 2).
    pub fn repeat(times: u32, count: StepCount) -> Self {
        Job::Loop(LoopJob {
            times: if times == 0 { 2 } else { times },
            count,
            steps: None,
            reverse_left: 0,
            forward_done: 0,
            round: 1,
            stash: Vec::new(),
            reversing: false,
        })
    }

    pub fn restore_all(callback: Option<Callback>) -> Self {
        Job::RestoreAll {
            started: false,
            callback,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Job::Step { .. } => "step",
            Job::Reverse(_) => "reverse",
            Job::Loop(_) => "loop",
            Job::RestoreAll { .. } => "restore-all",
        }
    }

    pub fn next(&mut self, history: &[StepRecord]) -> Next {
        match self {
            Job::Step { request, callback } => match request.take() {
                Some(request) => Next::Issue(request),
                None => Next::Finish(callback.take()),
            },
            Job::Reverse(job) => job.next(history),
            Job::Loop(job) => job.next(history),
            Job::RestoreAll { started, callback } => {
                if *started {
                    Next::Finish(callback.take())
                } else {
                    *started = true;
                    Next::ResetStyles
                }
            }
        }
    }

    /// Bookkeeping after a step this job issued has completed. A finished
    /// reverse drops both the reversed entry and its own.
    pub fn step_done(&mut self, history: &mut Vec<StepRecord>) {
        let reversed = match self {
            Job::Reverse(_) => true,
            Job::Loop(job) => job.reversing,
            Job::Step { .. } | Job::RestoreAll { .. } => false,
        };
        if reversed {
            history.truncate(history.len().saturating_sub(2));
        }
    }

    /// The callback the job would have fired on finishing.
    pub fn into_callback(self) -> Option<Callback> {
        match self {
            Job::Step { callback, .. } | Job::RestoreAll { callback, .. } => callback,
            Job::Reverse(job) => job.callback,
            Job::Loop(_) => None,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Job").field(&self.name()).finish()
    }
}
