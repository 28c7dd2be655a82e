use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;
use rand::Rng;
use winch_rope::config::{self, RopeConfig};
use winch_rope::constants::{ANCHOR_POSITION, BODY_HALF_EXTENTS, WORLD_GRAVITY};
use winch_rope::graphics;
use winch_rope::rope::{
    keyboard_rope_input_system, RopeAttachments, RopeCollisionHooks, RopeCommand, RopePlugin,
};

/// Marker for the body hanging from the rope.
#[derive(Component)]
struct Gnome;

/// Trigger region the rope passes through without colliding.
#[derive(Component)]
struct SignalZone;

fn gnome_bundle(position: Vec2) -> impl Bundle {
    let [hx, hy] = BODY_HALF_EXTENTS;
    (
        Gnome,
        RigidBody::Dynamic,
        Collider::cuboid(hx, hy),
        Velocity::zero(),
        Transform::from_translation(position.extend(0.0)),
        Visibility::default(),
    )
}

/// Just below the anchor, nudged sideways so a fresh gnome starts swinging.
fn gnome_start() -> Vec2 {
    let mut rng = rand::thread_rng();
    Vec2::from(ANCHOR_POSITION) + Vec2::new(rng.gen_range(-0.4..0.4), -1.0)
}

/// Configure Rapier physics: downward gravity for the well.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::new(0.0, -WORLD_GRAVITY);
    }
}

/// Spawn the anchor, the gnome, the signal zone and the rope tying them together.
fn spawn_well_scene(mut commands: Commands) {
    let anchor = commands
        .spawn((
            Name::new("Anchor"),
            Transform::from_translation(Vec2::from(ANCHOR_POSITION).extend(0.0)),
        ))
        .id();

    let gnome = commands.spawn(gnome_bundle(gnome_start())).id();

    let signal = commands
        .spawn((
            SignalZone,
            Collider::cuboid(2.0, 0.25),
            Sensor,
            Transform::from_xyz(0.0, 2.0, 0.0),
        ))
        .id();

    commands.spawn((
        Name::new("Rope"),
        RopeAttachments::new(anchor)
            .with_body(gnome)
            .with_signal(signal),
    ));

    info!("✓ Well scene spawned");
}

/// **R** replaces the gnome with a fresh one at the top and resets the rope.
fn replace_gnome_system(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    gnomes: Query<Entity, With<Gnome>>,
    mut writer: MessageWriter<RopeCommand>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    for gnome in gnomes.iter() {
        commands.entity(gnome).despawn();
    }
    let gnome = commands.spawn(gnome_bundle(gnome_start())).id();
    writer.write(RopeCommand::AttachBody(gnome));
    writer.write(RopeCommand::ResetLength);
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Winch Rope".into(),
            resolution: WindowResolution::new(720, 960),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.08, 0.07, 0.1)))
    // Compiled defaults; load_rope_config overwrites them from assets/rope.toml.
    .insert_resource(RopeConfig::default())
    // World units are metres; joints and the rope step share the fixed tick.
    // The hooks keep the rope out of its signal zone.
    .add_plugins(
        RapierPhysicsPlugin::<RopeCollisionHooks>::pixels_per_meter(1.0).in_fixed_schedule(),
    )
    .add_plugins(RopePlugin)
    .add_systems(
        Startup,
        (
            config::load_rope_config,
            graphics::setup_camera.after(config::load_rope_config),
            spawn_well_scene.after(config::load_rope_config),
            setup_physics_config,
        ),
    )
    .add_systems(
        Update,
        (
            keyboard_rope_input_system,
            replace_gnome_system,
            graphics::rope_gizmo_system,
        ),
    );

    app.run();
}
