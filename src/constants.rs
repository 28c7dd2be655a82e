//! Centralised rope and scene constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place.  [`crate::config::RopeConfig::default`] reads every
//! value from this file; `assets/rope.toml` overrides them at startup.
//!
//! ## Tuning guidance
//!
//! World units are metres (`pixels_per_meter(1.0)` in the Rapier plugin), so a
//! segment length of `1.5` is a metre and a half of rope.

// ── Chain Limits ──────────────────────────────────────────────────────────────

/// Maximum number of active segments in one rope.
///
/// Extension stops silently once the chain reaches this length.
pub const MAX_SEGMENTS: usize = 1000;

/// Constraint distance of the anchor-side segment at which a new segment is
/// inserted instead of lengthening the current one.
///
/// Smaller values give a smoother rope at the cost of more bodies.
/// Tested range: 0.5–2.0.
pub const MAX_ROPE_SEGMENT_LENGTH: f32 = 1.5;

/// Rope paying-out / reeling-in speed (world units per second).
pub const ROPE_SPEED: f32 = 20.0;

/// The anchor-side segment is removed once its distance drops to this value.
pub const RETRACT_EPSILON: f32 = 0.005;

// ── Body Link ─────────────────────────────────────────────────────────────────

/// Distance the moving body's constraint is reset to after an insertion.
///
/// Keeps the body from snapping onto a freshly placed segment.
pub const BODY_LINK_DISTANCE_ON_INSERT: f32 = 0.5;

/// Distance the moving body's constraint is reset to after a removal.
///
/// Smaller than the insert distance so the body does not visibly pop away.
pub const BODY_LINK_DISTANCE_ON_REMOVE: f32 = 0.1;

// ── Fixed Timestep ────────────────────────────────────────────────────────────

/// Physics tick rate (Hz).  50 Hz gives the 0.02 s step the rope speed is tuned for.
pub const FIXED_TICK_HZ: f64 = 50.0;

// ── Segment Template ──────────────────────────────────────────────────────────

/// Collider radius of one rope segment.
pub const SEGMENT_RADIUS: f32 = 0.08;

/// Mass of one rope segment (kg).
///
/// Light segments keep the rope from dragging the body around; values below
/// ~0.01 make the solver jitter with long chains.
pub const SEGMENT_MASS: f32 = 0.05;

pub const SEGMENT_LINEAR_DAMPING: f32 = 0.5;
pub const SEGMENT_ANGULAR_DAMPING: f32 = 1.0;

// ── Rendering ─────────────────────────────────────────────────────────────────

/// RGB colour of the rope polyline.
pub const ROPE_COLOR: [f32; 3] = [0.82, 0.66, 0.42];

// ── Demo Scene ────────────────────────────────────────────────────────────────

/// World-space position of the anchor at the top of the well.
pub const ANCHOR_POSITION: [f32; 2] = [0.0, 6.0];

/// Half-extents of the moving body's box collider.
pub const BODY_HALF_EXTENTS: [f32; 2] = [0.3, 0.45];

/// Downward gravity of the demo world (m/s²).
pub const WORLD_GRAVITY: f32 = 9.81;

/// Orthographic camera scale; world units are metres so the view is zoomed in.
pub const CAMERA_SCALE: f32 = 0.02;
