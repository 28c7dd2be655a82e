//! Segment records and constraint links.
//!
//! A [`Segment`] is plain data: its physical body is an [`Entity`] bound by
//! [`super::physics`] the first time the segment is pushed to Rapier, and its
//! distance constraint is described by a [`JointLink`].  Re-linking the chain
//! is therefore a data update here; the physics layer turns changed links into
//! `ImpulseJoint`s.

use bevy::prelude::*;

/// Stable handle of a pooled segment.
///
/// Ids are slot indices into [`super::pool::SegmentPool`] and survive release
/// and reacquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub(crate) u32);

impl SegmentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// What the far end of a distance constraint is connected to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkTarget {
    /// The anchor's own rigid body.
    AnchorBody,
    /// A fixed world position, used when the anchor has no body.
    AnchorPoint(Vec2),
    /// The body of another segment in the same rope.
    Segment(SegmentId),
}

/// A distance constraint: connected target plus target distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLink {
    pub target: LinkTarget,
    pub distance: f32,
}

impl JointLink {
    pub fn new(target: LinkTarget, distance: f32) -> Self {
        Self { target, distance }
    }
}

/// One link of the rope.
#[derive(Debug, Clone)]
pub struct Segment {
    pub(crate) id: SegmentId,
    pub(crate) active: bool,
    pub(crate) link: JointLink,
    /// Last known world position, refreshed from the physics body every tick.
    pub(crate) position: Vec2,
    /// Teleport request consumed by the physics layer on the next push.
    pub(crate) placement: Option<Vec2>,
    pub(crate) body: Option<Entity>,
    /// Set while the segment id sits in the pool's change list.
    pub(crate) dirty: bool,
}

impl Segment {
    pub(crate) fn new(id: SegmentId) -> Self {
        Self {
            id,
            active: false,
            link: JointLink::new(LinkTarget::AnchorBody, 0.0),
            position: Vec2::ZERO,
            placement: None,
            body: None,
            dirty: false,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn link(&self) -> JointLink {
        self.link
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Physics body bound to this segment, if it has been spawned yet.
    pub fn body(&self) -> Option<Entity> {
        self.body
    }

    pub fn pending_placement(&self) -> Option<Vec2> {
        self.placement
    }
}
