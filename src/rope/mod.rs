//! Rope module: pooled segment chain between an anchor and a moving body.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`segment`] | `SegmentId`, `Segment`, `JointLink` / `LinkTarget` records |
//! | [`pool`] | `SegmentPool` slot arena with FIFO reuse |
//! | [`chain`] | `Rope` component: chain, intents, growth/shrink step, reset |
//! | [`render`] | `RopePolyline` and the polyline projection |
//! | [`control`] | `RopeCommand` messages and the keyboard mapping |
//! | [`physics`] | Rapier bodies, joints and the fixed-tick system pipeline |
//!
//! The core (`segment`, `pool`, `chain`, `render`) is plain data and runs
//! without a physics engine; `physics` mirrors it into Rapier every tick.

pub mod chain;
pub mod control;
pub mod physics;
pub mod pool;
pub mod render;
pub mod segment;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use chain::{Anchor, ChainSettings, Rope, TickOutcome};
pub use control::{
    apply_rope_commands_system, keyboard_rope_input_system, QueuedRopeCommands, RopeCommand,
};
pub use physics::{
    despawn_orphaned_segments_system, follow_anchor_pins_system, init_ropes_system,
    publish_rope_polyline_system, pull_rope_positions_system, push_rope_physics_system,
    release_body_joint_on_rope_removed, rope_step_system, RopeAnchorPin, RopeAttachments,
    RopeCollisionHooks, RopeDisabled, RopeLinks, RopeSegment,
};
pub use pool::SegmentPool;
pub use render::RopePolyline;
pub use segment::{JointLink, LinkTarget, Segment, SegmentId};

use crate::config::RopeConfig;
use bevy::prelude::*;
use bevy_rapier2d::plugin::PhysicsSet;

/// Ordering of the rope's fixed-tick work.  Runs chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RopeSet {
    Init,
    Pull,
    Step,
    Push,
    Publish,
}

/// Registers rope messages and the fixed-tick pipeline.
///
/// Does not add Rapier; the app adds `RapierPhysicsPlugin::<RopeCollisionHooks>`
/// itself.  When Rapier runs in `FixedUpdate` the rope sets run before it.
pub struct RopePlugin;

impl Plugin for RopePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RopeConfig>()
            .add_message::<RopeCommand>()
            .configure_sets(
                FixedUpdate,
                (
                    RopeSet::Init,
                    RopeSet::Pull,
                    RopeSet::Step,
                    RopeSet::Push,
                    RopeSet::Publish,
                )
                    .chain(),
            )
            .configure_sets(
                FixedUpdate,
                RopeSet::Publish.before(PhysicsSet::SyncBackend),
            )
            .add_observer(release_body_joint_on_rope_removed)
            .add_systems(Update, apply_rope_commands_system)
            .add_systems(
                FixedUpdate,
                (
                    (despawn_orphaned_segments_system, init_ropes_system)
                        .chain()
                        .in_set(RopeSet::Init),
                    pull_rope_positions_system.in_set(RopeSet::Pull),
                    rope_step_system.in_set(RopeSet::Step),
                    (push_rope_physics_system, follow_anchor_pins_system)
                        .in_set(RopeSet::Push),
                    publish_rope_polyline_system.in_set(RopeSet::Publish),
                ),
            );
    }
}
