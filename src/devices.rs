//! Simulated device services.
//!
//! Each device writes what it was asked to do into a shared `DeviceLog` so a
//! host (or a test) can inspect the audible state without real hardware.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fnv::{FnvHashMap, FnvHashSet};
use spot_core::{
    AmbienceChannel, ExperienceState, FocusNotice, Haptics, PlaybackResource, PrepareTicket,
    PresentationSink, RankEntry, ResourceId, RevealEvent, TargetId, VolumeLevels,
};

use crate::scheduler::DelayQueue;

/// Result of a simulated load, delivered after the library latency.
pub type Completion = (PrepareTicket, Result<(), String>);

/// Assets the simulated players can load and how long loading takes.
///
/// An empty asset set accepts every reference.
#[derive(Clone, Debug)]
pub struct AudioLibrary {
    pub assets: FnvHashSet<String>,
    pub latency: Duration,
}

impl Default for AudioLibrary {
    fn default() -> Self {
        Self {
            assets: FnvHashSet::default(),
            latency: Duration::from_millis(150),
        }
    }
}

impl AudioLibrary {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn restricted_to<I, S>(assets: I, latency: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            latency,
        }
    }

    pub fn load(&self, asset: &str) -> Result<(), String> {
        if self.assets.is_empty() || self.assets.contains(asset) {
            Ok(())
        } else {
            Err(format!("asset {asset:?} not found"))
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AmbienceBed {
    #[default]
    Silent,
    Idle,
    Active,
}

/// Everything the simulated devices were told to do.
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub resource_volumes: FnvHashMap<ResourceId, f32>,
    pub bound_assets: FnvHashMap<ResourceId, String>,
    pub binds: usize,
    pub releases: usize,
    pub ambience_volume: f32,
    pub ambience_bed: AmbienceBed,
    pub haptic_pulses: Vec<Duration>,
}

impl DeviceLog {
    /// Volume of a bound resource; `None` once released.
    pub fn volume_of(&self, id: ResourceId) -> Option<f32> {
        self.bound_assets
            .contains_key(&id)
            .then(|| self.resource_volumes.get(&id).copied().unwrap_or(0.0))
    }
}

pub struct SimResource {
    id: ResourceId,
    asset: Option<String>,
    library: Rc<AudioLibrary>,
    completions: Rc<RefCell<DelayQueue<Completion>>>,
    log: Rc<RefCell<DeviceLog>>,
}

impl SimResource {
    pub fn new(
        id: ResourceId,
        library: Rc<AudioLibrary>,
        completions: Rc<RefCell<DelayQueue<Completion>>>,
        log: Rc<RefCell<DeviceLog>>,
    ) -> Self {
        Self {
            id,
            asset: None,
            library,
            completions,
            log,
        }
    }
}

impl PlaybackResource for SimResource {
    fn bind(&mut self, asset: &str) {
        self.asset = Some(asset.to_owned());
        let mut log = self.log.borrow_mut();
        log.binds += 1;
        log.bound_assets.insert(self.id, asset.to_owned());
        log.resource_volumes.insert(self.id, 0.0);
    }

    fn prepare_async(&mut self, ticket: PrepareTicket) {
        let outcome = match &self.asset {
            Some(asset) => self.library.load(asset),
            None => Err("prepare before bind".to_owned()),
        };
        self.completions
            .borrow_mut()
            .push_after(self.library.latency, (ticket, outcome));
    }

    fn set_volume(&mut self, level: f32) {
        self.log
            .borrow_mut()
            .resource_volumes
            .insert(self.id, level);
    }

    fn release(&mut self) {
        self.asset = None;
        let mut log = self.log.borrow_mut();
        log.releases += 1;
        log.bound_assets.remove(&self.id);
        log.resource_volumes.remove(&self.id);
    }
}

pub struct SimAmbience(pub Rc<RefCell<DeviceLog>>);

impl AmbienceChannel for SimAmbience {
    fn set_volume(&mut self, level: f32) {
        self.0.borrow_mut().ambience_volume = level;
    }

    fn switch_to_idle_bed(&mut self) {
        self.0.borrow_mut().ambience_bed = AmbienceBed::Idle;
    }

    fn switch_to_active_bed(&mut self) {
        self.0.borrow_mut().ambience_bed = AmbienceBed::Active;
    }
}

pub struct SimHaptics(pub Rc<RefCell<DeviceLog>>);

impl Haptics for SimHaptics {
    fn fire_one_shot(&mut self, duration: Duration) {
        log::debug!("[haptics] buzz {:?}", duration);
        self.0.borrow_mut().haptic_pulses.push(duration);
    }
}

/// Display-side view rebuilt from sink callbacks.
#[derive(Debug, Default)]
pub struct Presentation {
    pub ranking: Vec<RankEntry>,
    pub levels: VolumeLevels,
    pub reveals: Vec<RevealEvent>,
    pub notices: Vec<FocusNotice>,
    pub experience: Vec<ExperienceState>,
    /// Focus text as currently shown, hidden characters as `None`.
    pub shown: Vec<Option<char>>,
    pub focus: Option<TargetId>,
}

impl Presentation {
    /// Revealed text with hidden characters replaced by `mask`.
    pub fn shown_text(&self, mask: char) -> String {
        self.shown.iter().map(|c| c.unwrap_or(mask)).collect()
    }
}

/// Sink that records into a shared `Presentation`.
pub struct RecordingSink {
    record: Rc<RefCell<Presentation>>,
    text_len: Box<dyn Fn(TargetId) -> usize>,
}

impl RecordingSink {
    pub fn new(
        record: Rc<RefCell<Presentation>>,
        text_len: impl Fn(TargetId) -> usize + 'static,
    ) -> Self {
        Self {
            record,
            text_len: Box::new(text_len),
        }
    }
}

impl PresentationSink for RecordingSink {
    fn ranking(&mut self, entries: &[RankEntry]) {
        self.record.borrow_mut().ranking = entries.to_vec();
    }

    fn volumes(&mut self, levels: &VolumeLevels) {
        self.record.borrow_mut().levels = levels.clone();
    }

    fn reveal(&mut self, event: &RevealEvent) {
        let mut rec = self.record.borrow_mut();
        if let Some(slot) = rec.shown.get_mut(event.index) {
            *slot = Some(event.character);
        }
        rec.reveals.push(*event);
    }

    fn focus(&mut self, notice: FocusNotice) {
        let mut rec = self.record.borrow_mut();
        match notice {
            FocusNotice::Started(id) => {
                rec.focus = Some(id);
                rec.shown = vec![None; (self.text_len)(id)];
            }
            FocusNotice::Cleared(_) => {
                rec.focus = None;
                rec.shown.clear();
            }
            FocusNotice::Focused(_) => {}
        }
        rec.notices.push(notice);
    }

    fn experience(&mut self, state: ExperienceState) {
        self.record.borrow_mut().experience.push(state);
    }
}
