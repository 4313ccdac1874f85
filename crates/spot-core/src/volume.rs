//! Pure volume mapping for the spotlight crossfade.
//!
//! As the aim approaches a target its spot level rises towards
//! `SPOT_VOLUME_MAX` while the ambience bed falls towards `AMBIENCE_FLOOR`.
//! Once a target is focused it plays alone at full level and the ambience is
//! muted.

use smallvec::SmallVec;

use crate::constants::{
    AMBIENCE_FLOOR, AMBIENCE_FULL, AMBIENCE_SPAN, FOCUS_OTHERS_VOLUME, FOCUS_VOLUME,
    SPOT_VOLUME_MAX,
};
use crate::target::{TargetId, TargetRegistry};

/// Levels computed for one sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeLevels {
    /// Only targets currently holding a playback resource, in rank order.
    pub targets: SmallVec<[(TargetId, f32); 8]>,
    pub ambience: f32,
}

impl VolumeLevels {
    pub fn get(&self, id: TargetId) -> Option<f32> {
        self.targets.iter().find(|(t, _)| *t == id).map(|(_, v)| *v)
    }
}

/// Level for one target holding a resource.
///
/// `focused_on` is the focus target once the reveal has completed, `None`
/// otherwise.
#[inline]
pub fn spot_volume(
    id: TargetId,
    offset_deg: f32,
    secondary_angle: f32,
    focused_on: Option<TargetId>,
) -> f32 {
    let level = match focused_on {
        Some(f) if f == id => FOCUS_VOLUME,
        Some(_) => FOCUS_OTHERS_VOLUME,
        None => SPOT_VOLUME_MAX - SPOT_VOLUME_MAX * (offset_deg / secondary_angle),
    };
    level.clamp(0.0, 1.0)
}

/// Level for the ambience bed given the nearest target's offset.
#[inline]
pub fn ambience_volume(nearest_offset: Option<f32>, secondary_angle: f32, focused: bool) -> f32 {
    if focused {
        return 0.0;
    }
    let level = match nearest_offset {
        None => AMBIENCE_FULL,
        Some(offset) if offset < secondary_angle => {
            AMBIENCE_FLOOR + AMBIENCE_SPAN * (offset / secondary_angle)
        }
        Some(_) => AMBIENCE_FULL,
    };
    level.clamp(0.0, 1.0)
}

/// Compute every level from the current ranking and focus state.
pub fn compute(
    registry: &TargetRegistry,
    secondary_angle: f32,
    focused_on: Option<TargetId>,
) -> VolumeLevels {
    let targets = registry
        .ranked()
        .filter(|t| t.resource().is_some())
        .map(|t| {
            (
                t.id,
                spot_volume(t.id, t.offset(), secondary_angle, focused_on),
            )
        })
        .collect();
    let ambience = ambience_volume(
        registry.nearest().map(|t| t.offset()),
        secondary_angle,
        focused_on.is_some(),
    );
    VolumeLevels { targets, ambience }
}
