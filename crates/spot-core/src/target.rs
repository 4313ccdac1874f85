//! Sound targets and the registry that ranks them by angular offset.

use fnv::FnvHashMap;
use glam::Vec3;

use crate::config::TargetSpec;
use crate::constants::UNRANKED_OFFSET_DEG;
use crate::error::{Result, SpotError};
use crate::geometry::compute_offset;
use crate::pool::ResourceId;

/// Index of a target in registry order. Stable for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

/// A fixed point of interest in the room with its own audio and metadata.
#[derive(Clone, Debug)]
pub struct SoundTarget {
    pub id: TargetId,
    /// Identifier from the feed.
    pub key: String,
    /// Unit vector in world coordinates.
    pub direction: Vec3,
    pub asset: String,
    pub description: String,
    pub category: String,
    pub track_label: String,
    offset_deg: f32,
    resource: Option<ResourceId>,
}

impl SoundTarget {
    fn from_spec(id: TargetId, spec: TargetSpec) -> Result<Self> {
        let raw = Vec3::from(spec.direction);
        let direction = match raw.is_finite().then(|| raw.try_normalize()).flatten() {
            Some(d) => d,
            None => {
                return Err(SpotError::InvalidTarget {
                    key: spec.id,
                    reason: format!("direction {:?} is not a usable vector", spec.direction),
                })
            }
        };
        Ok(Self {
            id,
            track_label: spec.track.to_string(),
            key: spec.id,
            direction,
            asset: spec.asset,
            description: spec.description,
            category: spec.category,
            offset_deg: UNRANKED_OFFSET_DEG,
            resource: None,
        })
    }

    /// Degrees between this target and the current aim.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset_deg
    }

    /// Playback resource currently owned by this target, if any.
    #[inline]
    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    pub(crate) fn set_resource(&mut self, resource: Option<ResourceId>) {
        self.resource = resource;
    }

    /// Description, category and track label joined without separators; the
    /// focus reveal discloses this string one character at a time.
    pub fn reveal_text(&self) -> String {
        let mut text = String::with_capacity(
            self.description.len() + self.category.len() + self.track_label.len(),
        );
        text.push_str(&self.description);
        text.push_str(&self.category);
        text.push_str(&self.track_label);
        text
    }
}

/// Owns every target and the per-sample ranking.
///
/// Targets never move within `targets`; `ranking` is a permutation of their ids
/// sorted by ascending offset with registry order breaking ties.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<SoundTarget>,
    ranking: Vec<TargetId>,
    by_key: FnvHashMap<String, TargetId>,
}

impl TargetRegistry {
    pub fn new(specs: Vec<TargetSpec>) -> Result<Self> {
        let mut targets = Vec::with_capacity(specs.len());
        let mut by_key = FnvHashMap::default();
        for (i, spec) in specs.into_iter().enumerate() {
            if by_key.contains_key(&spec.id) {
                return Err(SpotError::InvalidTarget {
                    key: spec.id,
                    reason: "duplicate id".into(),
                });
            }
            let target = SoundTarget::from_spec(TargetId(i), spec)?;
            by_key.insert(target.key.clone(), target.id);
            targets.push(target);
        }
        let ranking = (0..targets.len()).map(TargetId).collect();
        Ok(Self {
            targets,
            ranking,
            by_key,
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&SoundTarget> {
        self.targets.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: TargetId) -> Option<&mut SoundTarget> {
        self.targets.get_mut(id.0)
    }

    pub fn find(&self, key: &str) -> Option<&SoundTarget> {
        self.by_key.get(key).and_then(|id| self.get(*id))
    }

    /// Targets in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &SoundTarget> {
        self.targets.iter()
    }

    /// Recompute every target's offset from `aim`.
    pub fn update_all(&mut self, aim: Vec3) {
        for t in &mut self.targets {
            t.offset_deg = compute_offset(t.direction, aim);
        }
    }

    /// Re-sort the ranking by ascending offset; equal offsets keep registry order.
    pub fn rank(&mut self) {
        let targets = &self.targets;
        self.ranking.sort_by(|a, b| {
            targets[a.0]
                .offset_deg
                .total_cmp(&targets[b.0].offset_deg)
                .then(a.cmp(b))
        });
    }

    /// Target ids nearest first, as of the last `rank`.
    pub fn ranking(&self) -> &[TargetId] {
        &self.ranking
    }

    /// Targets nearest first, as of the last `rank`.
    pub fn ranked(&self) -> impl Iterator<Item = &SoundTarget> {
        self.ranking.iter().map(move |id| &self.targets[id.0])
    }

    pub fn nearest(&self) -> Option<&SoundTarget> {
        self.ranking.first().map(|id| &self.targets[id.0])
    }

    pub fn rank_of(&self, id: TargetId) -> Option<usize> {
        self.ranking.iter().position(|r| *r == id)
    }

    /// Whole-degree offsets in rank order, e.g. `" 4 27 133"`.
    pub fn angles_summary(&self) -> String {
        self.ranked()
            .map(|t| format!(" {}", t.offset_deg as i32))
            .collect()
    }
}
