//! Rapier side of the rope: spawning segment bodies and mirroring links.
//!
//! ## Fixed-tick pipeline
//!
//! | Set | System | Work |
//! |-----|--------|------|
//! | `Init` | [`despawn_orphaned_segments_system`], [`init_ropes_system`] | build `Rope`s for newly spawned rope entities |
//! | `Pull` | [`pull_rope_positions_system`] | copy body transforms into the rope |
//! | `Step` | [`rope_step_system`] | growth/shrink algorithm |
//! | `Push` | [`push_rope_physics_system`], [`follow_anchor_pins_system`] | spawn/enable/disable bodies, write `ImpulseJoint`s, move pins |
//! | `Publish` | [`publish_rope_polyline_system`] | rebuild [`RopePolyline`] |
//!
//! With `in_fixed_schedule()` Rapier's sets also live in `FixedUpdate`; the
//! plugin orders every `RopeSet` before `PhysicsSet::SyncBackend`, so joints
//! written here are solved on the same tick.
//!
//! ## Collisions
//!
//! Segments are members of [`ROPE_GROUP`] and never collide with each other.
//! A rope's signal collider is excluded pairwise by [`RopeCollisionHooks`]:
//! only that rope's segments ignore it, and its own collision groups are left
//! alone.  The app must add `RapierPhysicsPlugin::<RopeCollisionHooks>` for
//! the exclusion to take effect.

use super::chain::{Anchor, ChainSettings, Rope, TickOutcome};
use super::control::{apply_to_rope, QueuedRopeCommands};
use super::render::RopePolyline;
use super::segment::{LinkTarget, SegmentId};
use crate::config::RopeConfig;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

pub const ROPE_GROUP: Group = Group::GROUP_3;

// ── Components ─────────────────────────────────────────────────────────────────

/// Entities a rope is wired to.  Spawn this on an empty entity to create a
/// rope; [`init_ropes_system`] adds the [`Rope`] on the next fixed tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[require(QueuedRopeCommands)]
pub struct RopeAttachments {
    /// Top of the rope.  Required; a rope without one disables itself.
    pub anchor: Option<Entity>,
    /// The moving body hanging from the bottom.
    pub body: Option<Entity>,
    /// Collider the rope must pass through without touching.
    pub signal: Option<Entity>,
}

impl RopeAttachments {
    pub fn new(anchor: Entity) -> Self {
        Self {
            anchor: Some(anchor),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Entity) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_signal(mut self, signal: Entity) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Marker for a rope that failed to initialise.  Every rope system skips it.
#[derive(Component, Debug, Clone, Copy)]
pub struct RopeDisabled;

/// Physics body of one rope segment.
#[derive(Component, Debug, Clone, Copy)]
pub struct RopeSegment {
    pub rope: Entity,
    pub id: SegmentId,
}

/// Kinematic body standing in for an anchor that has no body of its own.
/// [`follow_anchor_pins_system`] keeps it on the anchor's `Transform`.
#[derive(Component, Debug, Clone, Copy)]
pub struct RopeAnchorPin {
    pub rope: Entity,
}

/// Physics handles owned by a rope outside its segments.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RopeLinks {
    pub pin: Option<Entity>,
    /// Body currently carrying the rope's `ImpulseJoint`.
    pub body_joint_on: Option<Entity>,
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Collision groups for a rope segment.
pub fn segment_collision_groups() -> CollisionGroups {
    let mut filter = Group::ALL;
    filter.remove(ROPE_GROUP);
    CollisionGroups::new(ROPE_GROUP, filter)
}

/// Pair filters a segment asks Rapier to run through [`RopeCollisionHooks`].
pub fn segment_active_hooks(has_signal: bool) -> ActiveHooks {
    if has_signal {
        ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR
    } else {
        ActiveHooks::empty()
    }
}

/// Rapier pair filter that keeps each rope's segments out of its own signal
/// collider.
#[derive(SystemParam)]
pub struct RopeCollisionHooks<'w, 's> {
    segments: Query<'w, 's, &'static RopeSegment>,
    ropes: Query<'w, 's, &'static RopeAttachments>,
}

impl RopeCollisionHooks<'_, '_> {
    /// `true` when one collider is a segment and the other is the signal
    /// collider of that segment's rope.
    pub fn ignores_pair(&self, a: Entity, b: Entity) -> bool {
        self.is_own_signal(a, b) || self.is_own_signal(b, a)
    }

    fn is_own_signal(&self, segment: Entity, other: Entity) -> bool {
        self.segments
            .get(segment)
            .ok()
            .and_then(|s| self.ropes.get(s.rope).ok())
            .is_some_and(|attachments| attachments.signal == Some(other))
    }
}

impl BevyPhysicsHooks for RopeCollisionHooks<'_, '_> {
    fn filter_contact_pair(&self, context: PairFilterContextView) -> Option<SolverFlags> {
        if self.ignores_pair(context.collider1(), context.collider2()) {
            None
        } else {
            Some(SolverFlags::COMPUTE_IMPULSES)
        }
    }

    fn filter_intersection_pair(&self, context: PairFilterContextView) -> bool {
        !self.ignores_pair(context.collider1(), context.collider2())
    }
}

fn segment_bundle(
    rope: Entity,
    id: SegmentId,
    position: Vec2,
    config: &RopeConfig,
    has_signal: bool,
) -> impl Bundle {
    (
        RopeSegment { rope, id },
        RigidBody::Dynamic,
        Collider::ball(config.segment_radius),
        AdditionalMassProperties::Mass(config.segment_mass),
        Damping {
            linear_damping: config.segment_linear_damping,
            angular_damping: config.segment_angular_damping,
        },
        Velocity::zero(),
        segment_collision_groups(),
        segment_active_hooks(has_signal),
        Transform::from_translation(position.extend(0.0)),
        Visibility::default(),
    )
}

fn rope_joint(parent: Entity, distance: f32) -> ImpulseJoint {
    ImpulseJoint::new(parent, RopeJointBuilder::new(distance))
}

/// Entity a link points at, if it exists yet.
fn resolve_link_target(
    target: LinkTarget,
    rope: &Rope,
    attachments: &RopeAttachments,
    links: &RopeLinks,
) -> Option<Entity> {
    match target {
        LinkTarget::AnchorBody => attachments.anchor,
        LinkTarget::AnchorPoint(_) => links.pin,
        LinkTarget::Segment(id) => rope.segment(id).ok().and_then(|s| s.body()),
    }
}

// ── Init ───────────────────────────────────────────────────────────────────────

/// Despawn segment bodies and anchor pins whose rope entity is gone.
pub fn despawn_orphaned_segments_system(
    mut commands: Commands,
    segments: Query<(Entity, &RopeSegment)>,
    pins: Query<(Entity, &RopeAnchorPin)>,
    ropes: Query<(), With<Rope>>,
) {
    let orphans = segments
        .iter()
        .map(|(e, s)| (e, s.rope))
        .chain(pins.iter().map(|(e, p)| (e, p.rope)));
    for (entity, rope) in orphans {
        if !ropes.contains(rope) {
            commands.entity(entity).despawn();
        }
    }
}

/// Drop the moving body's joint when its rope goes away; the segment it hangs
/// from is despawned by [`despawn_orphaned_segments_system`].
pub fn release_body_joint_on_rope_removed(
    remove: On<Remove, Rope>,
    ropes: Query<&RopeLinks>,
    mut commands: Commands,
) {
    let Some(body) = ropes.get(remove.entity).ok().and_then(|l| l.body_joint_on) else {
        return;
    };
    if let Ok(mut body) = commands.get_entity(body) {
        body.try_remove::<ImpulseJoint>();
    }
}

/// Build a [`Rope`] for every rope entity that does not have one yet.
///
/// A rope whose anchor is missing (or has no `Transform`) logs an error and is
/// marked [`RopeDisabled`].  Commands queued before this point are replayed
/// in order.
pub fn init_ropes_system(
    mut commands: Commands,
    config: Res<RopeConfig>,
    mut pending: Query<
        (Entity, &RopeAttachments, &mut QueuedRopeCommands),
        (Without<Rope>, Without<RopeDisabled>),
    >,
    anchors: Query<(&Transform, Has<RigidBody>)>,
) {
    for (entity, attachments, mut queued) in pending.iter_mut() {
        let anchor = attachments
            .anchor
            .and_then(|a| anchors.get(a).ok())
            .map(|(transform, has_body)| Anchor {
                position: transform.translation.truncate(),
                has_body,
            });

        let mut rope = match Rope::new(ChainSettings::from(&*config), anchor) {
            Ok(rope) => rope,
            Err(e) => {
                error!("[rope] {:?}: {}; rope disabled", entity, e);
                queued.0.clear();
                commands.entity(entity).insert(RopeDisabled);
                continue;
            }
        };

        let mut links = RopeLinks::default();
        let anchor = rope.anchor();
        if !anchor.has_body {
            let pin = commands
                .spawn((
                    RopeAnchorPin { rope: entity },
                    RigidBody::KinematicPositionBased,
                    Transform::from_translation(anchor.position.extend(0.0)),
                ))
                .id();
            links.pin = Some(pin);
        }

        if let Some(signal) = attachments.signal {
            if commands.get_entity(signal).is_err() {
                warn!("[rope] {:?}: signal collider does not exist", entity);
            }
        }

        if attachments.body.is_some() {
            rope.attach_body();
        }
        if !queued.is_empty() {
            debug!("[rope] {:?} replaying {} queued commands", entity, queued.len());
        }
        for command in queued.0.drain(..) {
            apply_to_rope(&mut rope, command);
        }

        info!(
            "[rope] {:?} initialised at {:?} (anchor body: {})",
            entity, anchor.position, anchor.has_body
        );
        commands
            .entity(entity)
            .insert((rope, links, RopePolyline::default()));
    }
}

// ── Pull ───────────────────────────────────────────────────────────────────────

/// Copy anchor and segment body positions into each rope.
///
/// Segments waiting to be teleported keep their requested position.
pub fn pull_rope_positions_system(
    mut ropes: Query<(&mut Rope, &RopeAttachments), Without<RopeDisabled>>,
    transforms: Query<&Transform>,
) {
    for (mut rope, attachments) in ropes.iter_mut() {
        if let Some(anchor) = attachments.anchor.and_then(|a| transforms.get(a).ok()) {
            rope.set_anchor_position(anchor.translation.truncate());
        }

        for index in 0..rope.len() {
            let Some(id) = rope.segment_id_at(index) else {
                break;
            };
            let Ok(segment) = rope.segment(id) else {
                continue;
            };
            if segment.pending_placement().is_some() {
                continue;
            }
            let Some(transform) = segment.body().and_then(|b| transforms.get(b).ok()) else {
                continue;
            };
            rope.observe_segment_position(id, transform.translation.truncate());
        }
    }
}

// ── Step ───────────────────────────────────────────────────────────────────────

/// Run the growth/shrink algorithm once per fixed tick.
pub fn rope_step_system(
    time: Res<Time<Fixed>>,
    mut ropes: Query<(Entity, &mut Rope), Without<RopeDisabled>>,
) {
    let dt = time.timestep().as_secs_f32();
    for (entity, mut rope) in ropes.iter_mut() {
        match rope.step(dt) {
            TickOutcome::Inserted => debug!(
                "[rope] {:?} inserted segment ({} active, {} pooled)",
                entity,
                rope.len(),
                rope.pool().pooled()
            ),
            TickOutcome::Removed => debug!(
                "[rope] {:?} removed segment ({} active, {} pooled)",
                entity,
                rope.len(),
                rope.pool().pooled()
            ),
            _ => {}
        }
    }
}

// ── Push ───────────────────────────────────────────────────────────────────────

/// Mirror every segment changed this tick into Rapier.
///
/// - first use of a slot spawns its body from the segment template
/// - released segments get `RigidBodyDisabled` + `ColliderDisabled` and lose their joint
/// - active segments are re-enabled, teleported if placed, and get a rope joint
///   with the link's distance as its maximum length
/// - the moving body's joint is moved whenever the body link changes
pub fn push_rope_physics_system(
    mut commands: Commands,
    config: Res<RopeConfig>,
    mut ropes: Query<
        (Entity, &mut Rope, &RopeAttachments, &mut RopeLinks),
        Without<RopeDisabled>,
    >,
) {
    for (rope_entity, mut rope, attachments, mut links) in ropes.iter_mut() {
        let changed = rope.take_changed_segments();
        let has_signal = attachments.signal.is_some();

        // Spawn first so links below can point at bodies created this tick.
        for &id in &changed {
            let Ok(segment) = rope.segment(id) else {
                continue;
            };
            if segment.body().is_some() || !segment.is_active() {
                continue;
            }
            let position = segment.pending_placement().unwrap_or(segment.position());
            let body = commands
                .spawn(segment_bundle(rope_entity, id, position, &config, has_signal))
                .id();
            if let Err(e) = rope.bind_segment_body(id, body) {
                warn!("[rope] {:?}: {}", rope_entity, e);
            }
        }

        for &id in &changed {
            let Ok(segment) = rope.segment(id) else {
                continue;
            };
            let (body, active, link) = (segment.body(), segment.is_active(), segment.link());
            let Some(body) = body else {
                continue;
            };

            if !active {
                commands
                    .entity(body)
                    .insert((RigidBodyDisabled, ColliderDisabled, Visibility::Hidden))
                    .remove::<ImpulseJoint>();
                continue;
            }

            let parent = resolve_link_target(link.target, &rope, attachments, &links);
            let placement = rope.take_segment_placement(id);

            let mut entity = commands.entity(body);
            entity
                .remove::<(RigidBodyDisabled, ColliderDisabled)>()
                .insert((Visibility::Inherited, segment_active_hooks(has_signal)));
            if let Some(position) = placement {
                entity.insert((
                    Transform::from_translation(position.extend(0.0)),
                    Velocity::zero(),
                ));
            }
            match parent {
                Some(parent) => {
                    entity.insert(rope_joint(parent, link.distance));
                }
                None => {
                    warn!(
                        "[rope] {:?}: segment {} link target {:?} has no body",
                        rope_entity,
                        id.raw(),
                        link.target
                    );
                    entity.remove::<ImpulseJoint>();
                }
            }
        }

        if rope.take_body_link_changed() {
            let target = rope.body_link().and_then(|link| {
                resolve_link_target(link.target, &rope, attachments, &links)
                    .map(|parent| (parent, link.distance))
            });

            if let Some(previous) = links.body_joint_on.take() {
                if Some(previous) != attachments.body || target.is_none() {
                    if let Ok(mut old) = commands.get_entity(previous) {
                        old.try_remove::<ImpulseJoint>();
                    }
                }
            }

            if let (Some(body), Some((parent, distance))) = (attachments.body, target) {
                if let Ok(mut moving) = commands.get_entity(body) {
                    moving.try_insert(rope_joint(parent, distance));
                    links.body_joint_on = Some(body);
                }
            }
        }
    }
}

/// Keep each anchor pin on its rope's anchor position.
pub fn follow_anchor_pins_system(
    ropes: Query<(&Rope, &RopeLinks), Without<RopeDisabled>>,
    mut pins: Query<&mut Transform, With<RopeAnchorPin>>,
) {
    for (rope, links) in ropes.iter() {
        let Some(mut pin) = links.pin.and_then(|p| pins.get_mut(p).ok()) else {
            continue;
        };
        let position = rope.anchor().position;
        if pin.translation.truncate() != position {
            pin.translation = position.extend(pin.translation.z);
        }
    }
}

// ── Publish ────────────────────────────────────────────────────────────────────

/// Rebuild each rope's polyline from this tick's chain.
///
/// Ropes without a live moving body keep their previous polyline.
pub fn publish_rope_polyline_system(
    mut ropes: Query<(&Rope, &RopeAttachments, &mut RopePolyline), Without<RopeDisabled>>,
    transforms: Query<&Transform>,
) {
    for (rope, attachments, mut polyline) in ropes.iter_mut() {
        let body = attachments
            .body
            .filter(|_| rope.has_body())
            .and_then(|b| transforms.get(b).ok())
            .map(|t| t.translation.truncate());
        rope.write_polyline(body, &mut polyline.points);
    }
}
