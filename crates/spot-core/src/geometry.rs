//! Orientation samples to world-frame aim vectors, and angular offsets between
//! unit vectors.

use glam::{Quat, Vec3};

/// A raw rotation-vector reading from the orientation sensor.
///
/// `values` holds the vector part of the device-to-world rotation quaternion
/// (`axis * sin(angle / 2)`). Some sensors also report the scalar part; when it
/// is absent it is reconstructed assuming a unit quaternion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationSample {
    pub values: [f32; 3],
    pub scalar: Option<f32>,
}

impl OrientationSample {
    pub fn new(values: [f32; 3]) -> Self {
        Self {
            values,
            scalar: None,
        }
    }

    pub fn with_scalar(values: [f32; 3], scalar: f32) -> Self {
        Self {
            values,
            scalar: Some(scalar),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite()) && self.scalar.map_or(true, f32::is_finite)
    }

    /// Rotation described by this sample, or `None` when it cannot be normalized.
    pub fn rotation(&self) -> Option<Quat> {
        if !self.is_finite() {
            return None;
        }
        let [x, y, z] = self.values;
        let w = self
            .scalar
            .unwrap_or_else(|| (1.0 - x * x - y * y - z * z).max(0.0).sqrt());
        let q = Quat::from_xyzw(x, y, z, w);
        let len = q.length();
        if !len.is_finite() || len <= f32::EPSILON {
            return None;
        }
        Some(q / len)
    }
}

/// Device forward axis (+Y in device coordinates) expressed in world coordinates.
///
/// Returns `None` for non-finite or zero-length input; callers keep their
/// previous aim in that case.
pub fn compute_aim(sample: &OrientationSample) -> Option<Vec3> {
    let rotation = sample.rotation()?;
    let aim = rotation * Vec3::Y;
    if !aim.is_finite() {
        return None;
    }
    aim.try_normalize()
}

/// Angle in degrees between two unit vectors, in `[0, 180]`.
///
/// The dot product is clamped so rounding never pushes `acos` out of its domain.
#[inline]
pub fn compute_offset(direction: Vec3, aim: Vec3) -> f32 {
    direction.dot(aim).clamp(-1.0, 1.0).acos().to_degrees()
}
