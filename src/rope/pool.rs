//! Segment pool: a slot arena with a FIFO free list.
//!
//! The pool is the only place segments are created.  [`SegmentPool::acquire`]
//! reuses the oldest released slot before growing the arena, so a rope that
//! pays out and reels in repeatedly settles at a fixed number of slots.
//!
//! Every mutation of a slot that the physics layer has to mirror (activity,
//! link, placement) pushes the slot id onto a change list, drained once per
//! tick by [`SegmentPool::take_changed`].

use super::segment::{JointLink, LinkTarget, Segment, SegmentId};
use crate::error::{RopeError, RopeResult};
use bevy::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct SegmentPool {
    slots: Vec<Segment>,
    free: VecDeque<SegmentId>,
    changed: Vec<SegmentId>,
}

impl SegmentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a segment, preferring a released one over a new slot.
    ///
    /// The returned segment is active, has no pending placement and a zero
    /// distance link to [`LinkTarget::AnchorBody`]; callers overwrite the link.
    /// Its bound body (if any) is kept.
    pub fn acquire(&mut self) -> SegmentId {
        let id = match self.free.pop_front() {
            Some(id) => id,
            None => {
                let id = SegmentId(self.slots.len() as u32);
                self.slots.push(Segment::new(id));
                id
            }
        };

        let slot = &mut self.slots[id.index()];
        slot.active = true;
        slot.link = JointLink::new(LinkTarget::AnchorBody, 0.0);
        slot.position = Vec2::ZERO;
        slot.placement = None;
        self.mark_changed(id);
        id
    }

    /// Deactivate a segment and queue it for reuse.
    ///
    /// Releasing an already-inactive segment is a no-op.
    pub fn release(&mut self, id: SegmentId) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        if !slot.active {
            return;
        }
        slot.active = false;
        slot.placement = None;
        self.free.push_back(id);
        self.mark_changed(id);
    }

    pub fn get(&self, id: SegmentId) -> RopeResult<&Segment> {
        self.slots
            .get(id.index())
            .ok_or(RopeError::UnknownSegment { id: id.raw() })
    }

    /// Total slots ever allocated.
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Slots waiting in the free list.
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.slots.iter()
    }

    /// Take the ids changed since the last call, clearing their dirty flags.
    pub fn take_changed(&mut self) -> Vec<SegmentId> {
        let changed = std::mem::take(&mut self.changed);
        for id in &changed {
            self.slots[id.index()].dirty = false;
        }
        changed
    }

    // ── Crate-internal mutation ──────────────────────────────────────────────

    pub(crate) fn slot(&self, id: SegmentId) -> &Segment {
        &self.slots[id.index()]
    }

    pub(crate) fn set_link(&mut self, id: SegmentId, link: JointLink) {
        self.slots[id.index()].link = link;
        self.mark_changed(id);
    }

    pub(crate) fn relink(&mut self, id: SegmentId, target: LinkTarget) {
        self.slots[id.index()].link.target = target;
        self.mark_changed(id);
    }

    /// Update a link target without scheduling the segment for the physics
    /// layer.  For targets whose joint parent stays the same.
    pub(crate) fn retarget_quietly(&mut self, id: SegmentId, target: LinkTarget) {
        self.slots[id.index()].link.target = target;
    }

    pub(crate) fn set_distance(&mut self, id: SegmentId, distance: f32) {
        self.slots[id.index()].link.distance = distance;
        self.mark_changed(id);
    }

    /// Move the segment and ask the physics layer to teleport its body.
    pub(crate) fn place(&mut self, id: SegmentId, position: Vec2) {
        let slot = &mut self.slots[id.index()];
        slot.position = position;
        slot.placement = Some(position);
        self.mark_changed(id);
    }

    /// Record the body position read back from physics.  Not a change.
    pub(crate) fn observe_position(&mut self, id: SegmentId, position: Vec2) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.position = position;
        }
    }

    pub(crate) fn take_placement(&mut self, id: SegmentId) -> Option<Vec2> {
        self.slots.get_mut(id.index()).and_then(|s| s.placement.take())
    }

    pub(crate) fn bind_body(&mut self, id: SegmentId, body: Entity) -> RopeResult<()> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(RopeError::UnknownSegment { id: id.raw() })?;
        slot.body = Some(body);
        Ok(())
    }

    fn mark_changed(&mut self, id: SegmentId) {
        let slot = &mut self.slots[id.index()];
        if !slot.dirty {
            slot.dirty = true;
            self.changed.push(id);
        }
    }
}
