//! Per-element FIFO of pending jobs.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Observable state of an element's queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    /// Nothing active, nothing pending.
    #[default]
    Empty,
    /// A job is active (or pending) but no step is waiting on a watcher.
    Draining,
    /// A step is in flight; further jobs wait for its completion.
    StepActive,
}

/// FIFO of jobs plus the job currently being worked.
#[derive(Debug, Default)]
pub struct StepQueue {
    pending: VecDeque<Job>,
    active: Option<Job>,
    step_in_flight: bool,
}

impl StepQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, job: Job) {
        self.pending.push_back(job);
    }

    /// Queue a job ahead of everything pending (behind the active job, if any).
    pub fn push_front(&mut self, job: Job) {
        self.pending.push_front(job);
    }

    /// The active job, promoting the oldest pending one if nothing is active.
    pub fn activate(&mut self) -> Option<&mut Job> {
        if self.active.is_none() {
            self.active = self.pending.pop_front();
        }
        self.active.as_mut()
    }

    pub fn active_mut(&mut self) -> Option<&mut Job> {
        self.active.as_mut()
    }

    pub fn take_active(&mut self) -> Option<Job> {
        self.step_in_flight = false;
        self.active.take()
    }

    pub fn set_step_in_flight(&mut self, on: bool) {
        self.step_in_flight = on;
    }

    pub fn state(&self) -> QueueState {
        if self.step_in_flight {
            QueueState::StepActive
        } else if self.active.is_some() || !self.pending.is_empty() {
            QueueState::Draining
        } else {
            QueueState::Empty
        }
    }

    /// Pending jobs, not counting the active one.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.active.is_none()
    }
}
