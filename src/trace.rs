//! Recorded (or synthesized) input streams replayed through a session.
//!
//! Traces are JSON lines, one event per line, ordered by `at_ms`:
//!
//! ```text
//! {"at_ms": 0, "event": "touch"}
//! {"at_ms": 20, "event": "sample", "values": [0.0, 0.0, 0.1305]}
//! {"at_ms": 40, "event": "accuracy", "level": "high"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spot_core::{OrientationSample, SensorAccuracy};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: TraceAction,
}

impl TraceEvent {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceAction {
    /// Start gesture on the paused screen.
    Touch,
    /// Explicit pause request.
    Pause,
    Sample {
        values: [f32; 3],
        #[serde(default)]
        scalar: Option<f32>,
    },
    Accuracy {
        level: SensorAccuracy,
    },
    /// Only advances the clock so pending timers can fire.
    Wait,
}

impl TraceAction {
    pub fn sample(sample: OrientationSample) -> Self {
        TraceAction::Sample {
            values: sample.values,
            scalar: sample.scalar,
        }
    }
}

pub fn parse_trace(text: &str) -> anyhow::Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: TraceEvent = serde_json::from_str(line)
            .with_context(|| format!("trace line {}: {}", n + 1, line))?;
        if let Some(prev) = events.last().map(|e: &TraceEvent| e.at_ms) {
            anyhow::ensure!(
                event.at_ms >= prev,
                "trace line {}: at_ms {} goes back in time (previous {})",
                n + 1,
                event.at_ms,
                prev
            );
        }
        events.push(event);
    }
    Ok(events)
}

pub fn load_trace(path: &Path) -> anyhow::Result<Vec<TraceEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    parse_trace(&text)
}

pub fn write_trace(events: &[TraceEvent]) -> anyhow::Result<String> {
    let mut out = String::new();
    for e in events {
        out.push_str(&serde_json::to_string(e)?);
        out.push('\n');
    }
    Ok(out)
}

/// Rotation of `yaw_deg` about the world vertical (+Z).
pub fn yaw_sample(yaw_deg: f32) -> OrientationSample {
    let half = yaw_deg.to_radians() * 0.5;
    OrientationSample::with_scalar([0.0, 0.0, half.sin()], half.cos())
}

/// Horizontal world direction the device aims at after `yaw_sample(yaw_deg)`.
pub fn yaw_direction(yaw_deg: f32) -> [f32; 3] {
    let (s, c) = yaw_deg.to_radians().sin_cos();
    [-s, c, 0.0]
}

/// Fluent construction of synthetic traces.
#[derive(Clone, Debug, Default)]
pub struct TraceBuilder {
    events: Vec<TraceEvent>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, at_ms: u64, action: TraceAction) -> Self {
        self.events.push(TraceEvent { at_ms, action });
        self
    }

    pub fn touch(self, at_ms: u64) -> Self {
        self.push(at_ms, TraceAction::Touch)
    }

    pub fn pause(self, at_ms: u64) -> Self {
        self.push(at_ms, TraceAction::Pause)
    }

    pub fn wait(self, at_ms: u64) -> Self {
        self.push(at_ms, TraceAction::Wait)
    }

    pub fn aim(self, at_ms: u64, yaw_deg: f32) -> Self {
        self.push(at_ms, TraceAction::sample(yaw_sample(yaw_deg)))
    }

    /// Steady aim at `yaw_deg` sampled every `every_ms` in `[from_ms, until_ms]`.
    pub fn hold(mut self, from_ms: u64, until_ms: u64, every_ms: u64, yaw_deg: f32) -> Self {
        let step = every_ms.max(1);
        let mut t = from_ms;
        while t <= until_ms {
            self = self.aim(t, yaw_deg);
            t += step;
        }
        self
    }

    /// Linear sweep from `from_deg` to `to_deg` over `steps` samples.
    pub fn sweep(
        mut self,
        start_ms: u64,
        every_ms: u64,
        from_deg: f32,
        to_deg: f32,
        steps: usize,
    ) -> Self {
        let n = steps.max(2);
        for i in 0..n {
            let f = i as f32 / (n - 1) as f32;
            let yaw = from_deg + (to_deg - from_deg) * f;
            self = self.aim(start_ms + every_ms * i as u64, yaw);
        }
        self
    }

    pub fn build(mut self) -> Vec<TraceEvent> {
        self.events.sort_by_key(|e| e.at_ms);
        self.events
    }
}
