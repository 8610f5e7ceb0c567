//! Timing state of the step currently in flight.

use serde::{Deserialize, Serialize};

use crate::units::round3;

/// Clock bookkeeping for one running step, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// When the step started.
    pub start: f64,
    /// Time left until the step completes (duration + delay at start).
    pub rest: f64,
    /// When the step was last resumed.
    pub resume_start: Option<f64>,
    /// Elapsed running time, accumulated on every pause.
    pub position: f64,
    /// Nominal duration of the step.
    pub duration: f64,
    pub finished: bool,
}

impl Timeline {
    pub fn start(now: f64, duration: f64, total: f64) -> Self {
        Self {
            start: now,
            rest: total,
            resume_start: None,
            position: 0.0,
            duration,
            finished: false,
        }
    }

    fn segment(&self, now: f64) -> f64 {
        (now - self.resume_start.unwrap_or(self.start)).max(0.0)
    }

    /// Fold the running segment into `position` and `rest`.
    pub fn pause(&mut self, now: f64) {
        let elapsed = self.segment(now);
        self.rest = (self.rest - elapsed).max(0.0);
        self.position = (self.position + elapsed).min(self.duration);
    }

    pub fn resume(&mut self, now: f64) {
        self.resume_start = Some(now);
    }

    /// Unrounded fraction of the nominal duration covered so far, at `now` when
    /// the step is running or at the last pause otherwise.
    pub fn ratio(&self, now: Option<f64>) -> f64 {
        if self.finished {
            return 1.0;
        }
        if self.duration <= 0.0 {
            return if now.is_some() { 0.0 } else { 1.0 };
        }
        let position = match now {
            Some(now) => self.position + self.segment(now),
            None => self.position,
        };
        (position / self.duration).clamp(0.0, 1.0)
    }

    /// [`Timeline::ratio`] rounded to three decimals.
    pub fn progress(&self, now: Option<f64>) -> f64 {
        round3(self.ratio(now))
    }
}
