use crate::constants::{CAMERA_SCALE, ROPE_COLOR};
use crate::rope::RopePolyline;
use bevy::prelude::*;

/// Setup camera for 2D rendering.
///
/// World units are metres, so the default projection is scaled down to show
/// the whole well.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: CAMERA_SCALE,
            ..OrthographicProjection::default_2d()
        }),
    ));
    info!("[SETUP] Camera spawned");
}

/// Draw every rope's latest polyline with gizmos.
pub fn rope_gizmo_system(mut gizmos: Gizmos, ropes: Query<&RopePolyline>) {
    let [r, g, b] = ROPE_COLOR;
    for polyline in ropes.iter() {
        if polyline.len() < 2 {
            continue;
        }
        gizmos.linestrip_2d(polyline.points.iter().copied(), Color::srgb(r, g, b));
    }
}
