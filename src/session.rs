//! Single-threaded event loop around an [`Engine`].
//!
//! Samples come from a trace, timers and load completions from delay queues
//! on a shared virtual clock. Before each trace event every timer and
//! completion due at or before it is delivered in due order, so the engine
//! sees one serialized stream exactly as it would on a device.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use instant::Instant;
use spot_core::{
    Devices, Engine, EngineParams, ExperienceState, OrientationSample, PlaybackResource,
    SampleOutcome, SensorKind, StartupData, TargetId, TimerEvent,
};

use crate::devices::{
    AudioLibrary, Completion, DeviceLog, Presentation, RecordingSink, SimAmbience, SimHaptics,
    SimResource,
};
use crate::scheduler::{DelayQueue, SchedulerHandle, VirtualClock};
use crate::trace::{TraceAction, TraceEvent};

// Processing budget for one event before it is reported as slow
const SLOW_EVENT: Duration = Duration::from_millis(4);

/// Counters gathered while a session runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionReport {
    pub samples_processed: usize,
    pub samples_rejected: usize,
    pub samples_ignored: usize,
    pub timers_fired: usize,
    pub timers_stale: usize,
    pub completions: usize,
    pub focused: usize,
    pub pauses: usize,
    pub rejected_commands: usize,
    pub slowest_event: Duration,
    pub final_state: Option<ExperienceState>,
    pub elapsed: Duration,
}

pub struct Session {
    engine: Engine,
    sensor: SensorKind,
    clock: VirtualClock,
    timers: Rc<RefCell<DelayQueue<TimerEvent>>>,
    completions: Rc<RefCell<DelayQueue<Completion>>>,
    devices: Rc<RefCell<DeviceLog>>,
    presentation: Rc<RefCell<Presentation>>,
    report: SessionReport,
}

impl Session {
    /// Build a session on simulated devices.
    ///
    /// Fails when no usable orientation sensor is offered or the startup data
    /// is incomplete or invalid.
    pub fn new(
        startup: StartupData,
        params: EngineParams,
        library: AudioLibrary,
        sensors: &[SensorKind],
    ) -> anyhow::Result<Self> {
        let sensor = spot_core::select_orientation_source(sensors)
            .context("selecting orientation sensor")?;

        let clock = VirtualClock::default();
        let timers = Rc::new(RefCell::new(DelayQueue::new(clock.clone())));
        let completions = Rc::new(RefCell::new(DelayQueue::new(clock.clone())));
        let devices = Rc::new(RefCell::new(DeviceLog::default()));
        let presentation = Rc::new(RefCell::new(Presentation::default()));
        let library = Rc::new(library);

        let text_lens = reveal_lengths(&startup);
        let sink = RecordingSink::new(presentation.clone(), move |id: TargetId| {
            text_lens.get(id.0).copied().unwrap_or(0)
        });

        let engine_devices = Devices {
            ambience: Box::new(SimAmbience(devices.clone())),
            haptics: Box::new(SimHaptics(devices.clone())),
            scheduler: Box::new(SchedulerHandle(timers.clone())),
            sink: Box::new(sink),
        };
        let make_resource = {
            let completions = completions.clone();
            let devices = devices.clone();
            move |id| {
                Box::new(SimResource::new(
                    id,
                    library.clone(),
                    completions.clone(),
                    devices.clone(),
                )) as Box<dyn PlaybackResource>
            }
        };
        let engine = Engine::new(startup, params, engine_devices, make_resource)
            .context("initializing engine")?;
        log::info!("[session] orientation sensor {:?}", sensor);

        Ok(Self {
            engine,
            sensor,
            clock,
            timers,
            completions,
            devices,
            presentation,
            report: SessionReport::default(),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn devices(&self) -> Ref<'_, DeviceLog> {
        self.devices.borrow()
    }

    pub fn presentation(&self) -> Ref<'_, Presentation> {
        self.presentation.borrow()
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Deliver every timer and completion due at or before `t`, then move the
    /// clock to `t`.
    pub fn advance_to(&mut self, t: Duration) {
        loop {
            let next_completion = self.completions.borrow_mut().peek_due();
            let next_timer = self.timers.borrow_mut().peek_due();
            let due = match (next_completion, next_timer) {
                (Some(c), Some(tm)) => c.min(tm),
                (Some(c), None) => c,
                (None, Some(tm)) => tm,
                (None, None) => break,
            };
            if due > t {
                break;
            }
            self.clock.advance_to(due);

            // Completions first on ties
            if next_completion == Some(due) {
                let popped = self.completions.borrow_mut().pop_due(due);
                if let Some((_, (ticket, outcome))) = popped {
                    self.timed(|engine| engine.on_prepared(ticket, outcome));
                    self.report.completions += 1;
                }
                continue;
            }
            let popped = self.timers.borrow_mut().pop_due(due);
            if let Some((_, event)) = popped {
                let was_focused = self.engine.focus().is_focused();
                let was_state = self.engine.state();
                if self.timed(|engine| engine.on_timer(event)) {
                    self.report.timers_fired += 1;
                    if !was_focused && self.engine.focus().is_focused() {
                        self.report.focused += 1;
                    }
                    if was_state == ExperienceState::Playing
                        && self.engine.state() == ExperienceState::Pausing
                    {
                        self.report.pauses += 1;
                    }
                } else {
                    self.report.timers_stale += 1;
                }
            }
        }
        self.clock.advance_to(t);
    }

    /// Advance to the event's time and dispatch it.
    pub fn apply(&mut self, event: &TraceEvent) {
        self.advance_to(event.at());
        match &event.action {
            TraceAction::Touch => {
                if let Err(e) = self.engine.play() {
                    log::debug!("[session] touch ignored: {}", e);
                    self.report.rejected_commands += 1;
                }
            }
            TraceAction::Pause => match self.engine.pause() {
                Ok(()) => self.report.pauses += 1,
                Err(e) => {
                    log::debug!("[session] pause ignored: {}", e);
                    self.report.rejected_commands += 1;
                }
            },
            TraceAction::Sample { values, scalar } => {
                let sample = OrientationSample {
                    values: *values,
                    scalar: *scalar,
                };
                match self.timed(|engine| engine.on_sample(&sample)) {
                    SampleOutcome::Processed => self.report.samples_processed += 1,
                    SampleOutcome::Rejected => self.report.samples_rejected += 1,
                    SampleOutcome::Ignored => self.report.samples_ignored += 1,
                }
            }
            TraceAction::Accuracy { level } => self.engine.on_accuracy_changed(*level),
            TraceAction::Wait => {}
        }
    }

    /// Replay a whole trace and return the accumulated report.
    pub fn run(&mut self, trace: &[TraceEvent]) -> SessionReport {
        for event in trace {
            self.apply(event);
        }
        self.report.final_state = Some(self.engine.state());
        self.report.elapsed = self.clock.now();
        log::info!(
            "[session] {} samples ({} rejected, {} ignored), {} timers, {} focus, {} pauses",
            self.report.samples_processed,
            self.report.samples_rejected,
            self.report.samples_ignored,
            self.report.timers_fired,
            self.report.focused,
            self.report.pauses
        );
        self.report.clone()
    }

    fn timed<T>(&mut self, f: impl FnOnce(&mut Engine) -> T) -> T {
        let start = Instant::now();
        let out = f(&mut self.engine);
        let spent = start.elapsed();
        if spent > SLOW_EVENT {
            log::warn!("[session] event took {:?} at {:?}", spent, self.clock.now());
        }
        self.report.slowest_event = self.report.slowest_event.max(spent);
        out
    }
}

/// Character count of each target's reveal text, in feed order.
fn reveal_lengths(startup: &StartupData) -> Vec<usize> {
    startup
        .targets
        .iter()
        .flatten()
        .map(|t| {
            t.description.chars().count()
                + t.category.chars().count()
                + t.track.to_string().chars().count()
        })
        .collect()
}
