//! Fixed-size pool of playback resources shared between sound targets.
//!
//! Reallocation runs once per sample after ranking, in two phases:
//!
//! 1. Release: a resource goes back to the pool when its owner no longer
//!    qualifies (outside the top `capacity` ranks, or beyond the secondary
//!    angle) *and* its preparation has settled. A resource still preparing
//!    stays with its owner so in-flight loads are never torn down.
//! 2. Acquire: qualifying targets without a resource take one, in rank order,
//!    until the pool runs dry. Binding starts an asynchronous load; the slot
//!    stays `Preparing` until the host reports completion.

use fnv::FnvHashSet;
use smallvec::SmallVec;

use crate::capability::PlaybackResource;
use crate::target::{TargetId, TargetRegistry};

/// Index of a resource slot in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub usize);

/// Identifies one bind of one resource. Completions carrying an older epoch
/// than the slot's current bind are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrepareTicket {
    pub resource: ResourceId,
    pub epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Preparing,
    Ready,
    /// Load failed; stays silent until released and re-acquired.
    Failed,
}

impl Readiness {
    /// Preparation has finished one way or the other.
    #[inline]
    pub fn is_settled(self) -> bool {
        !matches!(self, Readiness::Preparing)
    }
}

struct Slot {
    resource: Box<dyn PlaybackResource>,
    owner: Option<TargetId>,
    readiness: Readiness,
    epoch: u64,
}

/// What changed during one reallocation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reallocation {
    pub released: SmallVec<[(TargetId, ResourceId); 4]>,
    pub acquired: SmallVec<[(TargetId, ResourceId); 4]>,
}

impl Reallocation {
    pub fn is_empty(&self) -> bool {
        self.released.is_empty() && self.acquired.is_empty()
    }
}

pub struct ResourcePool {
    slots: Vec<Slot>,
    available: Vec<ResourceId>,
}

impl ResourcePool {
    /// Build a pool of `capacity` resources produced by `make`.
    pub fn new<F>(capacity: usize, mut make: F) -> Self
    where
        F: FnMut(ResourceId) -> Box<dyn PlaybackResource>,
    {
        let slots = (0..capacity)
            .map(|i| Slot {
                resource: make(ResourceId(i)),
                owner: None,
                readiness: Readiness::Ready,
                epoch: 0,
            })
            .collect();
        // Popped from the back, so the lowest id is handed out first
        let available = (0..capacity).rev().map(ResourceId).collect();
        Self { slots, available }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.owner.is_some()).count()
    }

    pub fn owner_of(&self, id: ResourceId) -> Option<TargetId> {
        self.slots.get(id.0).and_then(|s| s.owner)
    }

    pub fn held_by(&self, target: TargetId) -> Option<ResourceId> {
        self.slots
            .iter()
            .position(|s| s.owner == Some(target))
            .map(ResourceId)
    }

    /// Readiness of an in-use resource; `None` while it sits in the pool.
    pub fn readiness(&self, id: ResourceId) -> Option<Readiness> {
        self.slots
            .get(id.0)
            .filter(|s| s.owner.is_some())
            .map(|s| s.readiness)
    }

    /// Whether the target at `rank` with `offset` may hold a resource.
    #[inline]
    pub fn qualifies(&self, rank: usize, offset: f32, secondary_angle: f32) -> bool {
        rank < self.capacity() && offset <= secondary_angle
    }

    /// Run both phases against the current ranking.
    pub fn reallocate(
        &mut self,
        registry: &mut TargetRegistry,
        secondary_angle: f32,
    ) -> Reallocation {
        let ranking: SmallVec<[TargetId; 16]> = registry.ranking().iter().copied().collect();
        let mut out = Reallocation::default();

        for (rank, &id) in ranking.iter().enumerate() {
            let Some(target) = registry.get(id) else {
                continue;
            };
            let Some(rid) = target.resource() else {
                continue;
            };
            if self.qualifies(rank, target.offset(), secondary_angle) {
                continue;
            }
            if !self.slots[rid.0].readiness.is_settled() {
                log::trace!("[pool] {:?} still preparing for {:?}; kept", rid, id);
                continue;
            }
            self.release_slot(registry, id, rid);
            out.released.push((id, rid));
        }

        for (rank, &id) in ranking.iter().enumerate() {
            if self.available.is_empty() {
                break;
            }
            let Some(target) = registry.get(id) else {
                continue;
            };
            if target.resource().is_some()
                || !self.qualifies(rank, target.offset(), secondary_angle)
            {
                continue;
            }
            if let Some(rid) = self.acquire_slot(registry, id) {
                out.acquired.push((id, rid));
            }
        }

        if !out.is_empty() {
            log::debug!(
                "[pool] released={:?} acquired={:?} available={}",
                out.released,
                out.acquired,
                self.available.len()
            );
        }
        out
    }

    /// Record a preparation outcome. Returns the owner when the ticket is current.
    pub fn on_prepared(&mut self, ticket: PrepareTicket, success: bool) -> Option<TargetId> {
        let slot = self.slots.get_mut(ticket.resource.0)?;
        if slot.epoch != ticket.epoch
            || slot.owner.is_none()
            || slot.readiness != Readiness::Preparing
        {
            log::debug!("[pool] ignoring stale completion {:?}", ticket);
            return None;
        }
        slot.readiness = if success {
            Readiness::Ready
        } else {
            slot.resource.set_volume(0.0);
            Readiness::Failed
        };
        slot.owner
    }

    /// Apply a level to an in-use resource. Failed loads are held at zero.
    pub fn set_volume(&mut self, id: ResourceId, level: f32) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            let level = match slot.readiness {
                Readiness::Failed => 0.0,
                _ => level.clamp(0.0, 1.0),
            };
            slot.resource.set_volume(level);
        }
    }

    /// Zero every in-use resource.
    pub fn silence_all(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.owner.is_some()) {
            slot.resource.set_volume(0.0);
        }
    }

    /// Return every settled resource to the pool, regardless of qualification.
    pub fn release_all_settled(&mut self, registry: &mut TargetRegistry) -> usize {
        let held: SmallVec<[(TargetId, ResourceId); 8]> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.readiness.is_settled())
            .filter_map(|(i, s)| s.owner.map(|o| (o, ResourceId(i))))
            .collect();
        for &(owner, rid) in &held {
            self.release_slot(registry, owner, rid);
        }
        held.len()
    }

    /// Every slot is either available or owned by exactly one target whose
    /// handle points back at it.
    pub fn is_consistent(&self, registry: &TargetRegistry) -> bool {
        let mut seen = FnvHashSet::default();
        for rid in &self.available {
            let Some(slot) = self.slots.get(rid.0) else {
                return false;
            };
            if slot.owner.is_some() || !seen.insert(*rid) {
                return false;
            }
        }
        for (i, slot) in self.slots.iter().enumerate() {
            let rid = ResourceId(i);
            match slot.owner {
                Some(owner) => {
                    if seen.contains(&rid)
                        || registry.get(owner).and_then(|t| t.resource()) != Some(rid)
                    {
                        return false;
                    }
                }
                None => {
                    if !seen.contains(&rid) {
                        return false;
                    }
                }
            }
        }
        registry.iter().all(|t| match t.resource() {
            Some(rid) => self.owner_of(rid) == Some(t.id),
            None => true,
        })
    }

    fn release_slot(&mut self, registry: &mut TargetRegistry, owner: TargetId, rid: ResourceId) {
        let slot = &mut self.slots[rid.0];
        slot.resource.release();
        slot.owner = None;
        self.available.push(rid);
        if let Some(target) = registry.get_mut(owner) {
            target.set_resource(None);
        }
    }

    fn acquire_slot(
        &mut self,
        registry: &mut TargetRegistry,
        owner: TargetId,
    ) -> Option<ResourceId> {
        let target = registry.get_mut(owner)?;
        let rid = self.available.pop()?;
        let slot = &mut self.slots[rid.0];
        slot.epoch += 1;
        slot.owner = Some(owner);
        slot.readiness = Readiness::Preparing;
        slot.resource.bind(&target.asset);
        slot.resource.prepare_async(PrepareTicket {
            resource: rid,
            epoch: slot.epoch,
        });
        target.set_resource(Some(rid));
        Some(rid)
    }
}
