//! Generation-checked timers.
//!
//! Every state machine that schedules callbacks owns one `TimerSlot`. Arming or
//! invalidating the slot bumps its generation, so a callback that was already
//! queued in the external scheduler when it was cancelled carries an old
//! generation and is dropped on arrival.

use std::time::Duration;

use crate::capability::Scheduler;

/// Handle returned by the scheduler, used only for best-effort cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    FocusStep,
    IdleTimeout,
    PauseSettled,
}

/// Payload delivered back into the engine when a scheduled delay elapses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerEvent {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    generation: u64,
    pending: Option<TimerToken>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            generation: 0,
            pending: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace any outstanding callback with one firing after `delay`.
    pub fn arm(&mut self, scheduler: &mut dyn Scheduler, delay: Duration) {
        self.invalidate(scheduler);
        let event = TimerEvent {
            kind: self.kind,
            generation: self.generation,
        };
        self.pending = Some(scheduler.schedule_after(delay, event));
    }

    /// Cancel the outstanding callback and make any in-flight copy inert.
    pub fn invalidate(&mut self, scheduler: &mut dyn Scheduler) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(token) = self.pending.take() {
            scheduler.cancel(token);
        }
    }

    /// Consume a fired event. Returns false for stale or foreign events.
    pub fn accept(&mut self, event: TimerEvent) -> bool {
        if event.kind != self.kind || event.generation != self.generation || self.pending.is_none()
        {
            log::trace!(
                "[timer] dropping stale {:?} gen={} (current {})",
                event.kind,
                event.generation,
                self.generation
            );
            return false;
        }
        self.pending = None;
        true
    }
}
