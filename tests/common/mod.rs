// Shared fixtures for the integration tests: a standard configuration,
// targets placed by heading, and hand-driven device doubles.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use spot_core::{
    Configuration, PlaybackResource, PrepareTicket, ResourceId, ResourcePool, Scheduler,
    TargetRegistry, TargetSpec, TimerEvent, TimerKind, TimerToken, TrackInfo,
};
use spot_host::{yaw_direction, yaw_sample};

pub const PRIMARY: f32 = 10.0;
pub const SECONDARY: f32 = 30.0;

pub fn config() -> Configuration {
    Configuration {
        primary_angle: PRIMARY,
        secondary_angle: SECONDARY,
        time_to_focus: 2.0,
        max_resources: 2,
        max_idle_sensor_delta: 0.01,
        max_idle_seconds: 5.0,
    }
}

/// Target on the horizon at `yaw_deg`; aiming with `yaw_sample(0.0)` puts it
/// `|yaw_deg|` degrees off.
pub fn spec(id: &str, yaw_deg: f32) -> TargetSpec {
    TargetSpec {
        id: id.to_owned(),
        direction: yaw_direction(yaw_deg),
        asset: format!("{id}.ogg"),
        description: "Desc".to_owned(),
        category: "Cat".to_owned(),
        track: TrackInfo {
            disc_number: 1,
            disc_name: "Disc".to_owned(),
            track_number: 2,
        },
    }
}

/// "Desc" + "Cat" + "1 Disc - 2"
pub const REVEAL_LEN: usize = 17;

pub fn registry(yaws: &[f32]) -> TargetRegistry {
    let specs = yaws
        .iter()
        .enumerate()
        .map(|(i, y)| spec(&format!("t{i}"), *y))
        .collect();
    TargetRegistry::new(specs).expect("valid targets")
}

/// Aim at `yaw_deg` and re-rank.
pub fn aim_at(registry: &mut TargetRegistry, yaw_deg: f32) {
    let aim = spot_core::compute_aim(&yaw_sample(yaw_deg)).expect("finite aim");
    registry.update_all(aim);
    registry.rank();
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

/// Everything the pool asked of its resources.
#[derive(Debug, Default)]
pub struct ResourceCalls {
    pub binds: Vec<(ResourceId, String)>,
    pub tickets: Vec<PrepareTicket>,
    pub volumes: HashMap<ResourceId, f32>,
    pub releases: Vec<ResourceId>,
}

pub struct MockResource {
    id: ResourceId,
    calls: Rc<RefCell<ResourceCalls>>,
}

impl PlaybackResource for MockResource {
    fn bind(&mut self, asset: &str) {
        self.calls.borrow_mut().binds.push((self.id, asset.to_owned()));
    }

    fn prepare_async(&mut self, ticket: PrepareTicket) {
        self.calls.borrow_mut().tickets.push(ticket);
    }

    fn set_volume(&mut self, level: f32) {
        self.calls.borrow_mut().volumes.insert(self.id, level);
    }

    fn release(&mut self) {
        self.calls.borrow_mut().releases.push(self.id);
    }
}

pub fn pool(capacity: usize) -> (ResourcePool, Rc<RefCell<ResourceCalls>>) {
    let calls = Rc::new(RefCell::new(ResourceCalls::default()));
    let shared = calls.clone();
    let pool = ResourcePool::new(capacity, move |id| {
        Box::new(MockResource {
            id,
            calls: shared.clone(),
        }) as Box<dyn PlaybackResource>
    });
    (pool, calls)
}

/// Scheduler that only records; tests fire events by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pub pending: Vec<(TimerToken, Duration, TimerEvent)>,
    pub cancelled: usize,
}

impl ManualScheduler {
    /// Remove and return the oldest pending event of `kind`.
    pub fn take(&mut self, kind: TimerKind) -> Option<(Duration, TimerEvent)> {
        let i = self.pending.iter().position(|(_, _, e)| e.kind == kind)?;
        let (_, delay, event) = self.pending.remove(i);
        Some((delay, event))
    }

    pub fn count(&self, kind: TimerKind) -> usize {
        self.pending.iter().filter(|(_, _, e)| e.kind == kind).count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerToken {
        self.next += 1;
        let token = TimerToken(self.next);
        self.pending.push((token, delay, event));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        let before = self.pending.len();
        self.pending.retain(|(t, _, _)| *t != token);
        if self.pending.len() < before {
            self.cancelled += 1;
        }
    }
}
