//! Inactivity detection on the raw orientation stream.

use std::time::Duration;

use crate::capability::Scheduler;
use crate::config::Configuration;
use crate::geometry::OrientationSample;
use crate::timer::{TimerEvent, TimerKind, TimerSlot};

/// Restarts a countdown whenever any axis moves more than the configured
/// delta away from the last significant sample; signals idle when the
/// countdown runs out.
pub struct IdleMonitor {
    last_significant: Option<[f32; 3]>,
    max_delta: f32,
    timeout: Duration,
    timer: TimerSlot,
}

impl IdleMonitor {
    pub fn new(config: &Configuration) -> Self {
        Self {
            last_significant: None,
            max_delta: config.max_idle_sensor_delta,
            timeout: config.idle_timeout(),
            timer: TimerSlot::new(TimerKind::IdleTimeout),
        }
    }

    pub fn last_significant(&self) -> Option<[f32; 3]> {
        self.last_significant
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_pending()
    }

    /// Feed one sample. Returns true when it (re)started the countdown.
    pub fn observe(&mut self, sample: &OrientationSample, scheduler: &mut dyn Scheduler) -> bool {
        if !sample.values.iter().all(|v| v.is_finite()) {
            return false;
        }
        let moved = match self.last_significant {
            None => true,
            Some(prev) => prev
                .iter()
                .zip(sample.values.iter())
                .any(|(a, b)| (a - b).abs() > self.max_delta),
        };
        if moved {
            self.last_significant = Some(sample.values);
            self.timer.arm(scheduler, self.timeout);
        }
        moved
    }

    /// Handle a fired timeout. Returns true when the experience should pause.
    pub fn on_timeout(&mut self, event: TimerEvent) -> bool {
        if !self.timer.accept(event) {
            return false;
        }
        self.last_significant = None;
        true
    }

    /// Forget the last sample and stop the countdown.
    pub fn reset(&mut self, scheduler: &mut dyn Scheduler) {
        self.timer.invalidate(scheduler);
        self.last_significant = None;
    }
}
