use glam::Vec3;

use crate::capability::{Devices, PlaybackResource, RankEntry};
use crate::config::{Configuration, EngineParams, StartupData};
use crate::error::{Result, SpotError};
use crate::focus::FocusController;
use crate::geometry::{compute_aim, OrientationSample};
use crate::idle::IdleMonitor;
use crate::pool::{PrepareTicket, ResourceId, ResourcePool};
use crate::sensor::SensorAccuracy;
use crate::target::TargetRegistry;
use crate::timer::{TimerEvent, TimerKind, TimerSlot};
use crate::volume::{self, VolumeLevels};

/// Outer lifecycle gating the per-sample pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperienceState {
    /// Paused and waiting for a start gesture.
    Ready,
    Playing,
    /// Pause requested; settles to `Ready` after the transition delay.
    Pausing,
}

/// What happened to an orientation sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Not playing; the sample was dropped before any processing.
    Ignored,
    /// Non-finite or degenerate; previous aim and ranking kept.
    Rejected,
    Processed,
}

/// All mutable session state, driven through one sequential path.
///
/// Hosts call `on_sample`, `on_timer` and `on_prepared` from a single thread
/// of control in arrival order. None of them block: preparation and delays
/// are delegated to the injected [`Devices`] and come back as later calls.
///
/// Typical usage:
/// - Construct with `Engine::new(startup, params, devices, make_resource)`
/// - Call `play()` on the start gesture
/// - Forward every sensor reading to `on_sample`, every fired timer to
///   `on_timer`, every finished load to `on_prepared`
pub struct Engine {
    config: Configuration,
    params: EngineParams,
    registry: TargetRegistry,
    pool: ResourcePool,
    focus: FocusController,
    idle: IdleMonitor,
    pause_timer: TimerSlot,
    devices: Devices,
    state: ExperienceState,
    aim: Option<Vec3>,
    levels: VolumeLevels,
    accuracy: SensorAccuracy,
}

impl Engine {
    /// Validate startup data and build the session in the `Ready` state.
    pub fn new<F>(
        startup: StartupData,
        params: EngineParams,
        mut devices: Devices,
        make_resource: F,
    ) -> Result<Self>
    where
        F: FnMut(ResourceId) -> Box<dyn PlaybackResource>,
    {
        let (config, specs) = startup.into_parts()?;
        let registry = TargetRegistry::new(specs)?;
        let pool = ResourcePool::new(config.max_resources, make_resource);
        let focus = FocusController::new(&config, &params);
        let idle = IdleMonitor::new(&config);

        devices.ambience.switch_to_idle_bed();
        devices.ambience.set_volume(1.0);
        devices.sink.experience(ExperienceState::Ready);
        log::info!(
            "[engine] targets={} resources={} primary={:.1} secondary={:.1}",
            registry.len(),
            pool.capacity(),
            config.primary_angle,
            config.secondary_angle
        );

        Ok(Self {
            config,
            params,
            registry,
            pool,
            focus,
            idle,
            pause_timer: TimerSlot::new(TimerKind::PauseSettled),
            devices,
            state: ExperienceState::Ready,
            aim: None,
            levels: VolumeLevels {
                ambience: 1.0,
                ..Default::default()
            },
            accuracy: SensorAccuracy::default(),
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn idle(&self) -> &IdleMonitor {
        &self.idle
    }

    pub fn state(&self) -> ExperienceState {
        self.state
    }

    /// Last accepted aim vector.
    pub fn aim(&self) -> Option<Vec3> {
        self.aim
    }

    /// Levels applied on the last sample.
    pub fn levels(&self) -> &VolumeLevels {
        &self.levels
    }

    pub fn accuracy(&self) -> SensorAccuracy {
        self.accuracy
    }

    /// Ranking with offsets and resource handles, nearest first.
    pub fn snapshot(&self) -> Vec<RankEntry> {
        self.registry
            .ranked()
            .map(|t| RankEntry {
                target: t.id,
                offset_deg: t.offset(),
                resource: t.resource(),
            })
            .collect()
    }

    /// Start (or resume) the experience.
    pub fn play(&mut self) -> Result<()> {
        if self.state != ExperienceState::Ready {
            return Err(SpotError::NotReady {
                action: "play",
                state: self.state,
            });
        }
        self.state = ExperienceState::Playing;
        self.idle.reset(self.devices.scheduler.as_mut());
        self.pause_timer.invalidate(self.devices.scheduler.as_mut());
        self.devices.ambience.switch_to_active_bed();
        self.devices.sink.experience(self.state);
        log::info!("[engine] playing");
        Ok(())
    }

    /// Drop focus, silence every target and fall back to the idle ambience.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != ExperienceState::Playing {
            return Err(SpotError::NotReady {
                action: "pause",
                state: self.state,
            });
        }
        self.state = ExperienceState::Pausing;
        let scheduler = self.devices.scheduler.as_mut();
        self.focus.stop(scheduler, self.devices.sink.as_mut());
        self.idle.reset(scheduler);

        self.devices.ambience.switch_to_idle_bed();
        self.devices.ambience.set_volume(1.0);
        self.pool.silence_all();
        let released = self.pool.release_all_settled(&mut self.registry);
        self.levels = VolumeLevels {
            ambience: 1.0,
            ..Default::default()
        };
        self.devices.sink.volumes(&self.levels);

        self.pause_timer
            .arm(self.devices.scheduler.as_mut(), self.params.pause_transition());
        self.devices.sink.experience(self.state);
        log::info!("[engine] pausing; released {} resources", released);
        Ok(())
    }

    /// Run the full per-sample pipeline.
    pub fn on_sample(&mut self, sample: &OrientationSample) -> SampleOutcome {
        if self.state != ExperienceState::Playing {
            return SampleOutcome::Ignored;
        }
        self.idle.observe(sample, self.devices.scheduler.as_mut());

        let Some(aim) = compute_aim(sample) else {
            log::debug!("[engine] rejected sample {:?}", sample);
            return SampleOutcome::Rejected;
        };
        self.aim = Some(aim);

        self.registry.update_all(aim);
        self.registry.rank();
        self.pool
            .reallocate(&mut self.registry, self.config.secondary_angle);
        self.apply_volumes();
        let was_focused = self.focus.is_focused();
        self.focus.evaluate(
            &self.registry,
            self.devices.scheduler.as_mut(),
            self.devices.sink.as_mut(),
        );
        // Leaving a focused target restores the unfocused mix this sample
        if was_focused && !self.focus.is_focused() {
            self.apply_volumes();
        }

        log::trace!("[engine] angles:{}", self.registry.angles_summary());
        let snapshot = self.snapshot();
        self.devices.sink.ranking(&snapshot);
        SampleOutcome::Processed
    }

    /// Dispatch a fired timer. Returns false when it was stale.
    pub fn on_timer(&mut self, event: TimerEvent) -> bool {
        match event.kind {
            TimerKind::FocusStep => {
                let was_focused = self.focus.is_focused();
                let fired = self.focus.on_step(
                    event,
                    self.devices.scheduler.as_mut(),
                    self.devices.haptics.as_mut(),
                    self.devices.sink.as_mut(),
                );
                if fired && !was_focused && self.focus.is_focused() {
                    self.apply_volumes();
                }
                fired
            }
            TimerKind::IdleTimeout => {
                if !self.idle.on_timeout(event) {
                    return false;
                }
                log::info!("[engine] idle for {:?}", self.config.idle_timeout());
                if let Err(e) = self.pause() {
                    log::debug!("[engine] idle timeout ignored: {}", e);
                }
                true
            }
            TimerKind::PauseSettled => {
                if !self.pause_timer.accept(event) || self.state != ExperienceState::Pausing {
                    return false;
                }
                self.state = ExperienceState::Ready;
                self.devices.sink.experience(self.state);
                log::info!("[engine] ready");
                true
            }
        }
    }

    /// Completion of an asynchronous load started by the pool.
    pub fn on_prepared(&mut self, ticket: PrepareTicket, outcome: std::result::Result<(), String>) {
        if let Err(reason) = &outcome {
            log::warn!(
                "[engine] preparation of {:?} failed: {}",
                ticket.resource,
                reason
            );
        }
        let Some(owner) = self.pool.on_prepared(ticket, outcome.is_ok()) else {
            return;
        };
        let level = match self.state {
            ExperienceState::Playing => self.levels.get(owner).unwrap_or(0.0),
            _ => 0.0,
        };
        self.pool.set_volume(ticket.resource, level);
    }

    pub fn on_accuracy_changed(&mut self, accuracy: SensorAccuracy) {
        if accuracy != self.accuracy {
            if accuracy.is_trustworthy() {
                log::info!("[engine] sensor accuracy {:?}", accuracy);
            } else {
                log::warn!("[engine] sensor accuracy {:?}", accuracy);
            }
        }
        self.accuracy = accuracy;
    }

    fn apply_volumes(&mut self) {
        let levels = volume::compute(
            &self.registry,
            self.config.secondary_angle,
            self.focus.focused_target(),
        );
        for &(id, level) in &levels.targets {
            if let Some(rid) = self.registry.get(id).and_then(|t| t.resource()) {
                self.pool.set_volume(rid, level);
            }
        }
        self.devices.ambience.set_volume(levels.ambience);
        self.devices.sink.volumes(&levels);
        self.levels = levels;
    }
}
