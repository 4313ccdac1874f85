//! Narrow interfaces to the device services the engine drives.
//!
//! The engine never talks to platform APIs directly. Hosts implement these
//! traits (real devices on a phone, simulated ones in tests and the CLI) and
//! inject them through [`Devices`].

use std::time::Duration;

use crate::engine::ExperienceState;
use crate::pool::{PrepareTicket, ResourceId};
use crate::target::TargetId;
use crate::timer::{TimerEvent, TimerToken};
use crate::volume::VolumeLevels;

/// A reusable audio player.
///
/// `prepare_async` must return immediately. The host reports completion later
/// by calling `Engine::on_prepared` with the same ticket. There is no readiness
/// query: the pool records readiness from those completions.
pub trait PlaybackResource {
    fn bind(&mut self, asset: &str);
    fn prepare_async(&mut self, ticket: PrepareTicket);
    /// Level in `[0, 1]`.
    fn set_volume(&mut self, level: f32);
    fn release(&mut self);
}

/// The single background bed that plays under the targets.
pub trait AmbienceChannel {
    fn set_volume(&mut self, level: f32);
    fn switch_to_idle_bed(&mut self);
    fn switch_to_active_bed(&mut self);
}

pub trait Haptics {
    fn fire_one_shot(&mut self, duration: Duration);
}

/// Delayed callbacks. Fired events go back through `Engine::on_timer`.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// One row of a ranking snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct RankEntry {
    pub target: TargetId,
    pub offset_deg: f32,
    pub resource: Option<ResourceId>,
}

/// Character disclosed by the focus reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealEvent {
    pub target: TargetId,
    /// Index into the target's `reveal_text`, counted in chars.
    pub index: usize,
    pub character: char,
    /// Characters still hidden after this one.
    pub remaining: usize,
}

/// Focus transitions worth showing to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusNotice {
    /// Dwell detected; the reveal will start after the pre-focus delay.
    Started(TargetId),
    /// Reveal finished; the target is playing solo.
    Focused(TargetId),
    /// Aim left the target (or the experience paused); text should be cleared.
    Cleared(TargetId),
}

/// Read-only consumer of engine output. Every method defaults to a no-op.
pub trait PresentationSink {
    fn ranking(&mut self, _entries: &[RankEntry]) {}
    fn volumes(&mut self, _levels: &VolumeLevels) {}
    fn reveal(&mut self, _event: &RevealEvent) {}
    fn focus(&mut self, _notice: FocusNotice) {}
    fn experience(&mut self, _state: ExperienceState) {}
}

/// Sink for hosts that do not display anything.
#[derive(Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {}

/// Device services handed to the engine at construction.
pub struct Devices {
    pub ambience: Box<dyn AmbienceChannel>,
    pub haptics: Box<dyn Haptics>,
    pub scheduler: Box<dyn Scheduler>,
    pub sink: Box<dyn PresentationSink>,
}
