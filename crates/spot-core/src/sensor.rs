//! Orientation sensor selection and accuracy reporting.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpotError};

/// Sensors able to report an absolute device rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Fused accelerometer, gyroscope and magnetometer.
    RotationVector,
    /// Accelerometer and magnetometer only; noisier but needs no gyroscope.
    GeomagneticRotationVector,
}

/// Accuracy levels reported by the orientation sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorAccuracy {
    NoContact,
    Unreliable,
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl SensorAccuracy {
    pub fn is_trustworthy(self) -> bool {
        !matches!(self, SensorAccuracy::NoContact | SensorAccuracy::Unreliable)
    }
}

/// Pick the preferred rotation sensor among those the device offers.
pub fn select_orientation_source(available: &[SensorKind]) -> Result<SensorKind> {
    [
        SensorKind::RotationVector,
        SensorKind::GeomagneticRotationVector,
    ]
    .into_iter()
    .find(|k| available.contains(k))
    .ok_or(SpotError::NoOrientationSource)
}
