//! Dwell-to-focus state machine with a randomized character reveal.
//!
//! ```text
//! Idle --nearest <= primary--> PreFocusDelay --delay--> Revealing --all shown--> Focused
//!   ^                                |                       |                      |
//!   +------ focus target offset > primary (or pause) --------+----------------------+
//! ```
//!
//! Only one focus sequence runs at a time; while it is active no other target
//! can start one, and only the active target leaving the primary angle clears
//! it. Steps are driven by the external scheduler and carry the timer
//! generation, so a step that was in flight when focus was lost does nothing.

use std::time::Duration;

use rand::prelude::*;

use crate::capability::{FocusNotice, Haptics, PresentationSink, RevealEvent, Scheduler};
use crate::config::{seconds, Configuration, EngineParams};
use crate::constants::SEED_MIX;
use crate::target::{TargetId, TargetRegistry};
use crate::timer::{TimerEvent, TimerKind, TimerSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusPhase {
    Idle,
    PreFocusDelay,
    Revealing,
    Focused,
}

pub struct FocusController {
    phase: FocusPhase,
    target: Option<TargetId>,
    text: Vec<char>,
    hidden: Vec<usize>,
    step_delay: Duration,
    timer: TimerSlot,
    rng: StdRng,
    primary_angle: f32,
    time_to_focus: f32,
    pre_focus_delay: Duration,
    haptic_pulse: Duration,
}

impl FocusController {
    pub fn new(config: &Configuration, params: &EngineParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ SEED_MIX),
            None => StdRng::from_entropy(),
        };
        Self {
            phase: FocusPhase::Idle,
            target: None,
            text: Vec::new(),
            hidden: Vec::new(),
            step_delay: Duration::ZERO,
            timer: TimerSlot::new(TimerKind::FocusStep),
            rng,
            primary_angle: config.primary_angle,
            time_to_focus: config.time_to_focus,
            pre_focus_delay: params.pre_focus_delay(),
            haptic_pulse: params.haptic_pulse,
        }
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// Target of the active sequence, in any non-idle phase.
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn is_focused(&self) -> bool {
        self.phase == FocusPhase::Focused
    }

    /// The focus target once the reveal has completed.
    pub fn focused_target(&self) -> Option<TargetId> {
        self.target.filter(|_| self.is_focused())
    }

    /// Characters of the active target's metadata still hidden.
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// Delay between reveal steps for the active sequence.
    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn generation(&self) -> u64 {
        self.timer.generation()
    }

    /// Check threshold crossings against the latest ranking.
    pub fn evaluate(
        &mut self,
        registry: &TargetRegistry,
        scheduler: &mut dyn Scheduler,
        sink: &mut dyn PresentationSink,
    ) {
        if self.target.is_none() {
            if let Some(nearest) = registry.nearest() {
                if nearest.offset() <= self.primary_angle {
                    self.start(nearest.id, nearest.reveal_text(), scheduler, sink);
                }
            }
        }

        if let Some(id) = self.target {
            let left = registry
                .get(id)
                .map_or(true, |t| t.offset() > self.primary_angle);
            if left {
                self.stop(scheduler, sink);
            }
        }
    }

    /// Handle a fired focus step. Returns false when the step was stale.
    pub fn on_step(
        &mut self,
        event: TimerEvent,
        scheduler: &mut dyn Scheduler,
        haptics: &mut dyn Haptics,
        sink: &mut dyn PresentationSink,
    ) -> bool {
        if !self.timer.accept(event) {
            return false;
        }
        match self.phase {
            FocusPhase::PreFocusDelay => {
                let count = self.text.len();
                if count == 0 {
                    self.complete(haptics, sink);
                    return true;
                }
                self.hidden = (0..count).collect();
                self.step_delay = seconds(self.time_to_focus / count as f32);
                self.phase = FocusPhase::Revealing;
                log::debug!(
                    "[focus] revealing {:?}: {} chars every {:?}",
                    self.target,
                    count,
                    self.step_delay
                );
                self.reveal_one(scheduler, haptics, sink);
                true
            }
            FocusPhase::Revealing => {
                self.reveal_one(scheduler, haptics, sink);
                true
            }
            FocusPhase::Idle | FocusPhase::Focused => false,
        }
    }

    /// Abandon any active sequence.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler, sink: &mut dyn PresentationSink) {
        if self.phase == FocusPhase::Idle {
            return;
        }
        self.timer.invalidate(scheduler);
        let previous = self.target.take();
        self.phase = FocusPhase::Idle;
        self.hidden.clear();
        self.text.clear();
        self.step_delay = Duration::ZERO;
        if let Some(id) = previous {
            log::debug!("[focus] cleared {:?}", id);
            sink.focus(FocusNotice::Cleared(id));
        }
    }

    fn start(
        &mut self,
        id: TargetId,
        text: String,
        scheduler: &mut dyn Scheduler,
        sink: &mut dyn PresentationSink,
    ) {
        self.target = Some(id);
        self.text = text.chars().collect();
        self.hidden.clear();
        self.phase = FocusPhase::PreFocusDelay;
        self.timer.arm(scheduler, self.pre_focus_delay);
        log::debug!("[focus] dwell on {:?}", id);
        sink.focus(FocusNotice::Started(id));
    }

    fn reveal_one(
        &mut self,
        scheduler: &mut dyn Scheduler,
        haptics: &mut dyn Haptics,
        sink: &mut dyn PresentationSink,
    ) {
        let (Some(target), false) = (self.target, self.hidden.is_empty()) else {
            return;
        };
        let pick = self.rng.gen_range(0..self.hidden.len());
        let index = self.hidden.swap_remove(pick);
        sink.reveal(&RevealEvent {
            target,
            index,
            character: self.text[index],
            remaining: self.hidden.len(),
        });
        if self.hidden.is_empty() {
            self.complete(haptics, sink);
        } else {
            self.timer.arm(scheduler, self.step_delay);
        }
    }

    fn complete(&mut self, haptics: &mut dyn Haptics, sink: &mut dyn PresentationSink) {
        self.phase = FocusPhase::Focused;
        if let Some(id) = self.target {
            log::info!("[focus] focused on {:?}", id);
            haptics.fire_one_shot(self.haptic_pulse);
            sink.focus(FocusNotice::Focused(id));
        }
    }
}
