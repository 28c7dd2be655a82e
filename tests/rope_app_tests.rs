//! Headless tests for the rope's fixed-tick pipeline.
//!
//! These tests use [`MinimalPlugins`] plus [`RopePlugin`] (no window, no
//! rendering, no Rapier solver), so they only check what the rope writes into
//! the world: segment bodies, joints, disabled markers and the polyline.
//!
//! Virtual time is paused so `app.update()` never runs `FixedUpdate` on its
//! own; each test ticks the rope explicitly with [`tick`].

use bevy::prelude::*;
use bevy_rapier2d::prelude::{CollisionGroups, Group, ImpulseJoint, RigidBody, RigidBodyDisabled};
use winch_rope::rope::{
    Rope, RopeAnchorPin, RopeAttachments, RopeCommand, RopeDisabled, RopePlugin, RopePolyline,
    RopeSegment,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Scene {
    app: App,
    anchor: Entity,
    rope: Entity,
    body: Entity,
}

fn rope_test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, RopePlugin));
    app.insert_resource(Time::<Fixed>::from_hz(50.0));
    app.world_mut().resource_mut::<Time<Virtual>>().pause();
    app
}

/// Anchor at (0, 6), body hanging just below it, rope between them.
/// Runs one tick so the rope is initialised.
fn scene() -> Scene {
    scene_with_anchor(Transform::from_xyz(0.0, 6.0, 0.0))
}

fn scene_with_anchor(anchor: impl Bundle) -> Scene {
    let mut app = rope_test_app();
    let anchor = app.world_mut().spawn(anchor).id();
    let body = app.world_mut().spawn(Transform::from_xyz(0.0, 5.0, 0.0)).id();
    let rope = app
        .world_mut()
        .spawn(RopeAttachments::new(anchor).with_body(body))
        .id();
    tick(&mut app, 1);
    Scene {
        app,
        anchor,
        rope,
        body,
    }
}

fn tick(app: &mut App, n: usize) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn send(app: &mut App, command: RopeCommand) {
    app.world_mut().write_message(command);
    app.update();
}

fn rope(scene: &Scene) -> &Rope {
    scene.app.world().get::<Rope>(scene.rope).unwrap()
}

fn segment_body_count(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&RopeSegment>().iter(world).count()
}

fn joint_parent(app: &App, entity: Entity) -> Option<Entity> {
    app.world().get::<ImpulseJoint>(entity).map(|j| j.parent)
}

fn pin_count(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&RopeAnchorPin>().iter(world).count()
}

fn pin(app: &mut App) -> Option<Entity> {
    let world = app.world_mut();
    world
        .query_filtered::<Entity, With<RopeAnchorPin>>()
        .iter(world)
        .next()
}

/// Body entities of the active chain, anchor end first.
fn chain_bodies(scene: &Scene) -> Vec<Entity> {
    rope(scene)
        .segments()
        .map(|s| s.body().expect("active segment must have a body"))
        .collect()
}

/// Every joint in the world matches the chain layout.  Index 0 hangs from
/// the pin, or from the anchor itself when there is no pin.
fn assert_joint_chain(scene: &mut Scene) {
    let bodies = chain_bodies(scene);
    let top_parent = pin(&mut scene.app).unwrap_or(scene.anchor);
    for (i, &body) in bodies.iter().enumerate() {
        let expected = if i == 0 { top_parent } else { bodies[i - 1] };
        assert_eq!(
            joint_parent(&scene.app, body),
            Some(expected),
            "segment {i} joint must hang from its predecessor"
        );
    }
    assert_eq!(
        joint_parent(&scene.app, scene.body),
        bodies.last().copied(),
        "moving body must hang from the body-end segment"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn rope_initialises_with_one_segment() {
    let mut scene = scene();
    assert_eq!(rope(&scene).len(), 1);
    assert_eq!(segment_body_count(&mut scene.app), 1);
    assert_joint_chain(&mut scene);

    let polyline = scene.app.world().get::<RopePolyline>(scene.rope).unwrap();
    assert_eq!(
        polyline.points,
        vec![
            Vec2::new(0.0, 6.0),
            Vec2::new(0.0, 6.0),
            Vec2::new(0.0, 5.0)
        ]
    );
}

#[test]
fn missing_anchor_disables_rope() {
    let mut app = rope_test_app();
    let rope = app.world_mut().spawn(RopeAttachments::default()).id();
    tick(&mut app, 2);

    assert!(app.world().get::<RopeDisabled>(rope).is_some());
    assert!(app.world().get::<Rope>(rope).is_none());
    assert_eq!(segment_body_count(&mut app), 0);
}

#[test]
fn extending_inserts_segment_after_threshold() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::BeginExtend);

    tick(&mut scene.app, 4);
    assert_eq!(rope(&scene).len(), 1);
    assert!(rope(&scene).top_distance() >= 1.5);

    tick(&mut scene.app, 1);
    assert_eq!(rope(&scene).len(), 2);
    assert_eq!(segment_body_count(&mut scene.app), 2);
    assert_joint_chain(&mut scene);

    let polyline = scene.app.world().get::<RopePolyline>(scene.rope).unwrap();
    assert_eq!(polyline.len(), 4);
}

#[test]
fn polyline_tracks_chain_length_every_tick() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::BeginExtend);

    let mut previous = rope(&scene).len();
    for _ in 0..30 {
        tick(&mut scene.app, 1);
        let len = rope(&scene).len();
        assert!(len >= previous);
        previous = len;
        let polyline = scene.app.world().get::<RopePolyline>(scene.rope).unwrap();
        assert_eq!(polyline.len(), len + 2);
    }
    assert_joint_chain(&mut scene);
}

#[test]
fn retracting_disables_released_bodies() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::BeginExtend);
    tick(&mut scene.app, 15);
    send(&mut scene.app, RopeCommand::EndExtend);
    let grown = rope(&scene).len();
    assert!(grown >= 3);
    let top_body = chain_bodies(&scene)[0];

    send(&mut scene.app, RopeCommand::BeginRetract);
    tick(&mut scene.app, 100);

    assert_eq!(rope(&scene).len(), 1);
    assert_eq!(segment_body_count(&mut scene.app), grown, "bodies are pooled, not despawned");
    assert!(scene.app.world().get::<RigidBodyDisabled>(top_body).is_some());
    assert!(joint_parent(&scene.app, top_body).is_none());
    assert_joint_chain(&mut scene);
}

#[test]
fn reset_command_shrinks_to_one_on_next_tick() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::BeginExtend);
    tick(&mut scene.app, 20);
    let allocated = rope(&scene).pool().allocated();
    assert!(allocated > 1);

    send(&mut scene.app, RopeCommand::ResetLength);
    send(&mut scene.app, RopeCommand::ResetLength);
    assert!(!rope(&scene).is_extending());

    tick(&mut scene.app, 1);
    assert_eq!(rope(&scene).len(), 1);
    assert_eq!(rope(&scene).pool().pooled(), allocated - 1);
    assert_joint_chain(&mut scene);
}

#[test]
fn reattaching_body_moves_joint() {
    let mut scene = scene();
    let new_body = scene
        .app
        .world_mut()
        .spawn(Transform::from_xyz(1.0, 5.0, 0.0))
        .id();

    send(&mut scene.app, RopeCommand::AttachBody(new_body));
    tick(&mut scene.app, 1);

    let bottom = *chain_bodies(&scene).last().unwrap();
    assert_eq!(joint_parent(&scene.app, new_body), Some(bottom));
    assert!(joint_parent(&scene.app, scene.body).is_none());
}

#[test]
fn detached_rope_holds_length() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::DetachBody);
    send(&mut scene.app, RopeCommand::BeginExtend);
    tick(&mut scene.app, 10);

    assert_eq!(rope(&scene).len(), 1);
    assert_eq!(rope(&scene).top_distance(), 0.0);
    assert!(joint_parent(&scene.app, scene.body).is_none());
}

#[test]
fn despawning_rope_removes_its_bodies() {
    let mut scene = scene();
    send(&mut scene.app, RopeCommand::BeginExtend);
    tick(&mut scene.app, 12);
    assert!(segment_body_count(&mut scene.app) > 1);

    scene.app.world_mut().entity_mut(scene.rope).despawn();
    tick(&mut scene.app, 1);

    assert_eq!(segment_body_count(&mut scene.app), 0);
    assert_eq!(pin_count(&mut scene.app), 0);
    assert!(
        joint_parent(&scene.app, scene.body).is_none(),
        "moving body must not keep a joint to a despawned segment"
    );
}

#[test]
fn commands_sent_before_init_are_applied() {
    let mut app = rope_test_app();
    let anchor = app.world_mut().spawn(Transform::from_xyz(0.0, 6.0, 0.0)).id();
    let body = app.world_mut().spawn(Transform::from_xyz(0.0, 5.0, 0.0)).id();
    let rope = app.world_mut().spawn(RopeAttachments::new(anchor)).id();

    send(&mut app, RopeCommand::AttachBody(body));
    send(&mut app, RopeCommand::BeginExtend);
    assert!(app.world().get::<Rope>(rope).is_none());

    tick(&mut app, 1);
    let r = app.world().get::<Rope>(rope).unwrap();
    assert!(r.has_body());
    assert!(r.is_extending());
    assert!(r.top_distance() > 0.0, "first tick already pays out rope");
    assert!(joint_parent(&app, body).is_some());
}

#[test]
fn reset_sent_before_init_is_applied() {
    let mut app = rope_test_app();
    let anchor = app.world_mut().spawn(Transform::from_xyz(0.0, 6.0, 0.0)).id();
    let body = app.world_mut().spawn(Transform::from_xyz(0.0, 5.0, 0.0)).id();
    let rope = app.world_mut().spawn(RopeAttachments::new(anchor)).id();

    send(&mut app, RopeCommand::BeginExtend);
    send(&mut app, RopeCommand::AttachBody(body));
    send(&mut app, RopeCommand::ResetLength);

    tick(&mut app, 1);
    let r = app.world().get::<Rope>(rope).unwrap();
    assert!(r.has_body());
    assert!(!r.is_extending());
    assert!(!r.is_reset_pending());
    assert_eq!(r.len(), 1);
}

#[test]
fn signal_collider_keeps_its_collision_groups() {
    let mut app = rope_test_app();
    let anchor = app.world_mut().spawn(Transform::from_xyz(0.0, 6.0, 0.0)).id();
    let body = app.world_mut().spawn(Transform::from_xyz(0.0, 5.0, 0.0)).id();
    let groups = CollisionGroups::new(Group::GROUP_2, Group::GROUP_2);
    let signal = app
        .world_mut()
        .spawn((groups, Transform::from_xyz(0.0, 2.0, 0.0)))
        .id();
    app.world_mut().spawn(
        RopeAttachments::new(anchor)
            .with_body(body)
            .with_signal(signal),
    );

    tick(&mut app, 3);
    assert_eq!(app.world().get::<CollisionGroups>(signal), Some(&groups));
}

#[test]
fn anchor_with_body_hangs_chain_from_it() {
    let mut scene = scene_with_anchor((RigidBody::Fixed, Transform::from_xyz(0.0, 6.0, 0.0)));
    assert_eq!(pin_count(&mut scene.app), 0);
    let top = chain_bodies(&scene)[0];
    assert_eq!(joint_parent(&scene.app, top), Some(scene.anchor));

    send(&mut scene.app, RopeCommand::BeginExtend);
    tick(&mut scene.app, 5);
    assert_eq!(rope(&scene).len(), 2);
    let top = chain_bodies(&scene)[0];
    assert_eq!(joint_parent(&scene.app, top), Some(scene.anchor));
    assert_joint_chain(&mut scene);

    send(&mut scene.app, RopeCommand::EndExtend);
    send(&mut scene.app, RopeCommand::BeginRetract);
    tick(&mut scene.app, 100);
    assert_eq!(rope(&scene).len(), 1);
    let top = chain_bodies(&scene)[0];
    assert_eq!(joint_parent(&scene.app, top), Some(scene.anchor));
    assert_eq!(pin_count(&mut scene.app), 0);
    assert_joint_chain(&mut scene);
}

#[test]
fn pin_follows_moving_anchor() {
    let mut scene = scene();
    let pin = pin(&mut scene.app).unwrap();

    scene
        .app
        .world_mut()
        .get_mut::<Transform>(scene.anchor)
        .unwrap()
        .translation = Vec3::new(3.0, 8.0, 0.0);
    tick(&mut scene.app, 1);

    let pin_at = scene.app.world().get::<Transform>(pin).unwrap().translation;
    assert_eq!(pin_at.truncate(), Vec2::new(3.0, 8.0));
    let polyline = scene.app.world().get::<RopePolyline>(scene.rope).unwrap();
    assert_eq!(polyline.points[0], Vec2::new(3.0, 8.0));
}
