//! Chain state and the per-tick growth/shrink algorithm.
//!
//! ## Model
//!
//! The chain is an ordered list of active [`SegmentId`]s, index 0 at the
//! anchor and the last index at the moving body.  Only the index-0 constraint
//! distance is driven; every other segment keeps the distance it had when a
//! newer segment was inserted above it.
//!
//! ```text
//! anchor ── seg[0] ── seg[1] ── … ── seg[n-1] ── body
//!        ^ driven    ^ fixed           ^ fixed    ^ body link
//! ```
//!
//! ## Intents
//!
//! `extending` and `retracting` are independent flags.  When both are set,
//! extension is evaluated first and retraction is ignored for that tick.  Set
//! [`ChainSettings::exclusive_intents`] to make each `begin_*` clear the
//! opposite flag instead.

use super::pool::SegmentPool;
use super::segment::{JointLink, LinkTarget, Segment, SegmentId};
use crate::config::RopeConfig;
use crate::error::{RopeError, RopeResult};
use bevy::prelude::*;
use std::collections::VecDeque;

/// Where the rope starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub position: Vec2,
    /// `true` when the anchor carries its own rigid body; the top segment is
    /// then jointed to that body rather than to a fixed world point.
    pub has_body: bool,
}

impl Anchor {
    pub fn fixed(position: Vec2) -> Self {
        Self {
            position,
            has_body: false,
        }
    }

    pub fn with_body(position: Vec2) -> Self {
        Self {
            position,
            has_body: true,
        }
    }

    fn link_target(&self) -> LinkTarget {
        if self.has_body {
            LinkTarget::AnchorBody
        } else {
            LinkTarget::AnchorPoint(self.position)
        }
    }
}

/// Per-rope copy of the chain parameters from [`RopeConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub max_segments: usize,
    pub max_rope_segment_length: f32,
    pub rope_speed: f32,
    pub retract_epsilon: f32,
    pub body_link_distance_on_insert: f32,
    pub body_link_distance_on_remove: f32,
    pub exclusive_intents: bool,
}

impl From<&RopeConfig> for ChainSettings {
    fn from(config: &RopeConfig) -> Self {
        Self {
            max_segments: config.max_segments.max(1),
            max_rope_segment_length: config.max_rope_segment_length,
            rope_speed: config.rope_speed,
            retract_epsilon: config.retract_epsilon,
            body_link_distance_on_insert: config.body_link_distance_on_insert,
            body_link_distance_on_remove: config.body_link_distance_on_remove,
            exclusive_intents: config.exclusive_intents,
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&RopeConfig::default())
    }
}

/// What a single [`Rope::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No intent active; length unchanged.
    Held,
    /// Top distance grew.
    Extended,
    /// A segment was inserted at the anchor end.
    Inserted,
    /// Top distance shrank.
    Retracted,
    /// The top segment was removed.
    Removed,
    /// No moving body attached; nothing was touched.
    Skipped,
}

/// Rope state: pool, chain, intents and the moving body's constraint.
#[derive(Component, Debug, Clone)]
pub struct Rope {
    settings: ChainSettings,
    anchor: Anchor,
    pool: SegmentPool,
    chain: VecDeque<SegmentId>,
    extending: bool,
    retracting: bool,
    body_link: Option<JointLink>,
    body_link_dirty: bool,
    reset_pending: bool,
}

impl Rope {
    /// Build a rope holding a single segment at the anchor.
    ///
    /// A rope cannot exist without an anchor; `None` is reported as
    /// [`RopeError::MissingAnchor`].
    pub fn new(settings: ChainSettings, anchor: Option<Anchor>) -> RopeResult<Self> {
        let anchor = anchor.ok_or(RopeError::MissingAnchor)?;
        let mut rope = Self {
            settings,
            anchor,
            pool: SegmentPool::new(),
            chain: VecDeque::new(),
            extending: false,
            retracting: false,
            body_link: None,
            body_link_dirty: false,
            reset_pending: false,
        };
        rope.reset_length();
        Ok(rope)
    }

    // ── Control surface ──────────────────────────────────────────────────────

    pub fn begin_extend(&mut self) {
        self.extending = true;
        if self.settings.exclusive_intents {
            self.retracting = false;
        }
    }

    pub fn end_extend(&mut self) {
        self.extending = false;
    }

    pub fn begin_retract(&mut self) {
        self.retracting = true;
        if self.settings.exclusive_intents {
            self.extending = false;
        }
    }

    pub fn end_retract(&mut self) {
        self.retracting = false;
    }

    /// Clear both intents now and rebuild the chain at the start of the next
    /// [`Rope::step`].
    pub fn request_reset(&mut self) {
        self.extending = false;
        self.retracting = false;
        self.reset_pending = true;
    }

    /// Release every segment, start over with one segment at the anchor and
    /// clear both intents.
    pub fn reset_length(&mut self) {
        self.extending = false;
        self.retracting = false;
        self.rebuild_chain();
    }

    /// Attach a moving body: its constraint targets the body-end segment.
    pub fn attach_body(&mut self) {
        let distance = self.settings.body_link_distance_on_insert;
        self.body_link = self
            .chain
            .back()
            .map(|&last| JointLink::new(LinkTarget::Segment(last), distance));
        self.body_link_dirty = true;
    }

    pub fn detach_body(&mut self) {
        self.body_link = None;
        self.body_link_dirty = true;
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Advance the rope by one fixed tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> TickOutcome {
        if self.reset_pending {
            self.rebuild_chain();
        }
        if self.body_link.is_none() {
            return TickOutcome::Skipped;
        }
        let Some(&top) = self.chain.front() else {
            return TickOutcome::Skipped;
        };

        let distance = self.pool.slot(top).link.distance;
        let delta = self.settings.rope_speed * dt;

        if self.extending && self.chain.len() < self.settings.max_segments {
            if distance >= self.settings.max_rope_segment_length {
                self.insert_segment();
                TickOutcome::Inserted
            } else {
                self.pool.set_distance(top, distance + delta);
                TickOutcome::Extended
            }
        } else if self.retracting {
            if distance <= self.settings.retract_epsilon && self.chain.len() > 1 {
                self.remove_top_segment();
                TickOutcome::Removed
            } else {
                let next = (distance - delta).max(0.0);
                if next != distance {
                    self.pool.set_distance(top, next);
                }
                TickOutcome::Retracted
            }
        } else {
            TickOutcome::Held
        }
    }

    /// Release the whole chain and hang one fresh segment from the anchor.
    /// Intents are left alone.
    fn rebuild_chain(&mut self) {
        while let Some(id) = self.chain.pop_front() {
            self.pool.release(id);
        }
        self.reset_pending = false;
        self.insert_segment();
    }

    /// Put a new segment at index 0 and rewire the links around it.
    fn insert_segment(&mut self) {
        let spawn_at = match self.chain.front() {
            Some(&top) => self.pool.slot(top).position,
            None => self.anchor.position,
        };

        let id = self.pool.acquire();
        self.pool.place(id, spawn_at);
        self.pool
            .set_link(id, JointLink::new(self.anchor.link_target(), 0.0));

        if let Some(&previous_top) = self.chain.front() {
            self.pool.relink(previous_top, LinkTarget::Segment(id));
        }
        self.chain.push_front(id);

        self.relink_body(self.settings.body_link_distance_on_insert);
    }

    /// Drop the index-0 segment back into the pool.  Never empties the chain.
    fn remove_top_segment(&mut self) -> bool {
        if self.chain.len() <= 1 {
            return false;
        }
        let Some(removed) = self.chain.pop_front() else {
            return false;
        };
        self.pool.release(removed);

        if let Some(&new_top) = self.chain.front() {
            self.pool.relink(new_top, self.anchor.link_target());
        }

        self.relink_body(self.settings.body_link_distance_on_remove);
        true
    }

    fn relink_body(&mut self, distance: f32) {
        let Some(&last) = self.chain.back() else {
            return;
        };
        if let Some(link) = self.body_link.as_mut() {
            *link = JointLink::new(LinkTarget::Segment(last), distance);
            self.body_link_dirty = true;
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn is_extending(&self) -> bool {
        self.extending
    }

    pub fn is_retracting(&self) -> bool {
        self.retracting
    }

    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }

    pub fn has_body(&self) -> bool {
        self.body_link.is_some()
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    /// Segment ids from anchor end to body end.
    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.chain.iter().copied()
    }

    /// Active segments from anchor end to body end.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.chain.iter().map(|&id| self.pool.slot(id))
    }

    /// Id of the segment at chain `index` (0 = anchor end).
    pub fn segment_id_at(&self, index: usize) -> Option<SegmentId> {
        self.chain.get(index).copied()
    }

    pub fn segment(&self, id: SegmentId) -> RopeResult<&Segment> {
        self.pool.get(id)
    }

    pub fn top(&self) -> Option<&Segment> {
        self.chain.front().map(|&id| self.pool.slot(id))
    }

    pub fn body_end(&self) -> Option<&Segment> {
        self.chain.back().map(|&id| self.pool.slot(id))
    }

    /// Target distance of the driven (index-0) constraint.
    pub fn top_distance(&self) -> f32 {
        self.top().map(|s| s.link.distance).unwrap_or(0.0)
    }

    pub fn body_link(&self) -> Option<JointLink> {
        self.body_link
    }

    // ── Physics sync hooks ───────────────────────────────────────────────────

    /// Follow an anchor that moves outside the rope's control.
    /// Follow a moving anchor.  An index-0 link hanging from the anchor point
    /// is moved along; its joint parent (the pin) does not change.
    pub fn set_anchor_position(&mut self, position: Vec2) {
        self.anchor.position = position;
        let Some(&top) = self.chain.front() else {
            return;
        };
        if let LinkTarget::AnchorPoint(_) = self.pool.slot(top).link.target {
            self.pool
                .retarget_quietly(top, LinkTarget::AnchorPoint(position));
        }
    }

    pub fn observe_segment_position(&mut self, id: SegmentId, position: Vec2) {
        self.pool.observe_position(id, position);
    }

    pub fn bind_segment_body(&mut self, id: SegmentId, body: Entity) -> RopeResult<()> {
        self.pool.bind_body(id, body)
    }

    pub fn take_changed_segments(&mut self) -> Vec<SegmentId> {
        self.pool.take_changed()
    }

    pub fn take_segment_placement(&mut self, id: SegmentId) -> Option<Vec2> {
        self.pool.take_placement(id)
    }

    /// `true` once per change of the body link.
    pub fn take_body_link_changed(&mut self) -> bool {
        std::mem::replace(&mut self.body_link_dirty, false)
    }

    #[cfg(test)]
    pub(crate) fn force_top_distance(&mut self, distance: f32) {
        if let Some(&top) = self.chain.front() {
            self.pool.set_distance(top, distance);
        }
    }
}
