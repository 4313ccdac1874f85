//! Startup data: the immutable session configuration, engine tunables, and the
//! target descriptions supplied by the external data feed.
//!
//! Field names follow the feed's camelCase layout. Older feeds used
//! `maxMediaPlayers` and `maxIdleSensorDifference`; both are accepted as aliases.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    HAPTIC_PULSE, MAX_CONFIG_SECONDS, PAUSE_TRANSITION_SECONDS, SECONDS_PRE_FOCUS,
};
use crate::error::{Result, SpotError};

/// Thresholds and capacities fixed for the whole session.
///
/// Fields:
/// - `primary_angle`: degrees within which the nearest target starts focusing
/// - `secondary_angle`: degrees within which a target may hold a playback resource
/// - `time_to_focus`: seconds the character reveal takes from first to last step
/// - `max_resources`: number of concurrent playback resources in the pool
/// - `max_idle_sensor_delta`: per-axis change that counts as movement
/// - `max_idle_seconds`: stillness needed before the experience pauses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub primary_angle: f32,
    pub secondary_angle: f32,
    pub time_to_focus: f32,
    #[serde(alias = "maxMediaPlayers")]
    pub max_resources: usize,
    #[serde(alias = "maxIdleSensorDifference")]
    pub max_idle_sensor_delta: f32,
    pub max_idle_seconds: f32,
}

impl Configuration {
    /// Reject non-positive or non-finite values, durations longer than
    /// `MAX_CONFIG_SECONDS`, and inverted angle thresholds.
    pub fn validate(&self) -> Result<()> {
        let reals = [
            ("primaryAngle", self.primary_angle),
            ("secondaryAngle", self.secondary_angle),
            ("timeToFocus", self.time_to_focus),
            ("maxIdleSensorDelta", self.max_idle_sensor_delta),
            ("maxIdleSeconds", self.max_idle_seconds),
        ];
        for (name, value) in reals {
            if !value.is_finite() || value <= 0.0 {
                return Err(SpotError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        let durations = [
            ("timeToFocus", self.time_to_focus),
            ("maxIdleSeconds", self.max_idle_seconds),
        ];
        for (name, value) in durations {
            if value > MAX_CONFIG_SECONDS {
                return Err(SpotError::InvalidConfig(format!(
                    "{name} must be at most {MAX_CONFIG_SECONDS} seconds, got {value}"
                )));
            }
        }
        if self.max_resources == 0 {
            return Err(SpotError::InvalidConfig(
                "maxResources must be at least 1".into(),
            ));
        }
        if self.primary_angle > self.secondary_angle {
            return Err(SpotError::InvalidConfig(format!(
                "primaryAngle ({}) must not exceed secondaryAngle ({})",
                self.primary_angle, self.secondary_angle
            )));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        seconds(self.max_idle_seconds)
    }
}

/// Engine tunables that the feed does not carry.
///
/// - `seconds_pre_focus` is the dwell before the reveal begins
/// - `haptic_pulse` is the length of the focus confirmation buzz
/// - `pause_transition_seconds` is how long `Pausing` lasts before `Ready`
/// - `seed` fixes the reveal order; `None` draws one from the OS
#[derive(Clone, Debug)]
pub struct EngineParams {
    pub seconds_pre_focus: f32,
    pub haptic_pulse: Duration,
    pub pause_transition_seconds: f32,
    pub seed: Option<u64>,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            seconds_pre_focus: SECONDS_PRE_FOCUS,
            haptic_pulse: HAPTIC_PULSE,
            pause_transition_seconds: PAUSE_TRANSITION_SECONDS,
            seed: None,
        }
    }
}

impl EngineParams {
    pub fn pre_focus_delay(&self) -> Duration {
        seconds(self.seconds_pre_focus)
    }

    pub fn pause_transition(&self) -> Duration {
        seconds(self.pause_transition_seconds)
    }
}

/// Disc and track numbering shown alongside a target's description.
///
/// Renders as `"{disc_number} {disc_name} - {track_number}"`, or as an empty
/// label when the feed supplied none of the three fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    #[serde(alias = "cdNumber", default)]
    pub disc_number: u32,
    #[serde(alias = "cdName", default)]
    pub disc_name: String,
    #[serde(default)]
    pub track_number: u32,
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == TrackInfo::default() {
            return Ok(());
        }
        write!(
            f,
            "{} {} - {}",
            self.disc_number, self.disc_name, self.track_number
        )
    }
}

/// One sound target as delivered by the feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    pub id: String,
    /// World-frame direction; normalized when the registry is built.
    pub direction: [f32; 3],
    /// Reference handed to the playback resource on bind.
    pub asset: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub track: TrackInfo,
}

/// Everything the feed delivers before the engine may start.
///
/// Either half may be missing when retrieval failed; the engine refuses to
/// initialize in that case.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupData {
    #[serde(default)]
    pub configuration: Option<Configuration>,
    #[serde(default)]
    pub targets: Option<Vec<TargetSpec>>,
}

impl StartupData {
    pub fn new(configuration: Configuration, targets: Vec<TargetSpec>) -> Self {
        Self {
            configuration: Some(configuration),
            targets: Some(targets),
        }
    }

    /// Split into validated configuration and raw target specs.
    pub fn into_parts(self) -> Result<(Configuration, Vec<TargetSpec>)> {
        let configuration = self
            .configuration
            .ok_or(SpotError::IncompleteStartup("configuration"))?;
        let targets = self
            .targets
            .ok_or(SpotError::IncompleteStartup("target list"))?;
        configuration.validate()?;
        Ok((configuration, targets))
    }
}

/// Seconds to `Duration`; negative or NaN gives zero, overflow saturates.
#[inline]
pub(crate) fn seconds(value: f32) -> Duration {
    match Duration::try_from_secs_f32(value) {
        Ok(d) => d,
        Err(_) if value > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}
