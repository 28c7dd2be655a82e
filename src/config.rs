//! Runtime rope configuration loaded from `assets/rope.toml`.
//!
//! [`RopeConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_rope_config`] reads
//! `assets/rope.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<RopeConfig>` to any system parameter list and read values
//! with `config.rope_speed`, `config.max_segments`, etc.  Ropes copy the chain
//! settings they need when they are initialised, so edits after startup only
//! affect ropes spawned afterwards.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `RopeConfig::default()`.

use crate::constants::*;
use crate::error::{validate_non_negative, validate_positive, RopeError, RopeResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional override file, relative to the working directory.
pub const ROPE_CONFIG_PATH: &str = "assets/rope.toml";

/// Runtime-tunable rope configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RopeConfig {
    // ── Chain Limits ─────────────────────────────────────────────────────────
    pub max_segments: usize,
    pub max_rope_segment_length: f32,
    pub rope_speed: f32,
    pub retract_epsilon: f32,

    // ── Body Link ────────────────────────────────────────────────────────────
    pub body_link_distance_on_insert: f32,
    pub body_link_distance_on_remove: f32,

    // ── Intents ──────────────────────────────────────────────────────────────
    /// When `true`, beginning one direction cancels the other.  When `false`
    /// both flags may be set at once and extension takes precedence.
    pub exclusive_intents: bool,

    // ── Fixed Timestep ───────────────────────────────────────────────────────
    pub fixed_tick_hz: f64,

    // ── Segment Template ─────────────────────────────────────────────────────
    pub segment_radius: f32,
    pub segment_mass: f32,
    pub segment_linear_damping: f32,
    pub segment_angular_damping: f32,
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            // Chain Limits
            max_segments: MAX_SEGMENTS,
            max_rope_segment_length: MAX_ROPE_SEGMENT_LENGTH,
            rope_speed: ROPE_SPEED,
            retract_epsilon: RETRACT_EPSILON,
            // Body Link
            body_link_distance_on_insert: BODY_LINK_DISTANCE_ON_INSERT,
            body_link_distance_on_remove: BODY_LINK_DISTANCE_ON_REMOVE,
            // Intents
            exclusive_intents: false,
            // Fixed Timestep
            fixed_tick_hz: FIXED_TICK_HZ,
            // Segment Template
            segment_radius: SEGMENT_RADIUS,
            segment_mass: SEGMENT_MASS,
            segment_linear_damping: SEGMENT_LINEAR_DAMPING,
            segment_angular_damping: SEGMENT_ANGULAR_DAMPING,
        }
    }
}

impl RopeConfig {
    /// Parse a (possibly partial) TOML document and validate the result.
    pub fn from_toml_str(contents: &str) -> RopeResult<Self> {
        let config: RopeConfig =
            toml::from_str(contents).map_err(|e| RopeError::ConfigParse {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> RopeResult<()> {
        if self.max_segments == 0 {
            return Err(RopeError::InvalidConfig {
                name: "max_segments",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }
        validate_positive("max_rope_segment_length", self.max_rope_segment_length)?;
        validate_positive("rope_speed", self.rope_speed)?;
        validate_non_negative("retract_epsilon", self.retract_epsilon)?;
        validate_non_negative(
            "body_link_distance_on_insert",
            self.body_link_distance_on_insert,
        )?;
        validate_non_negative(
            "body_link_distance_on_remove",
            self.body_link_distance_on_remove,
        )?;
        validate_positive("fixed_tick_hz", self.fixed_tick_hz as f32)?;
        validate_positive("segment_radius", self.segment_radius)?;
        validate_positive("segment_mass", self.segment_mass)?;
        validate_non_negative("segment_linear_damping", self.segment_linear_damping)?;
        validate_non_negative("segment_angular_damping", self.segment_angular_damping)?;
        Ok(())
    }
}

/// Startup system: attempt to load `assets/rope.toml` and overwrite the
/// `RopeConfig` resource with any values present in the file, then apply the
/// configured fixed tick rate.
///
/// Parse and validation errors are logged and the compiled defaults are kept.
/// A missing file is not an error.
pub fn load_rope_config(mut commands: Commands, mut config: ResMut<RopeConfig>) {
    match std::fs::read_to_string(ROPE_CONFIG_PATH) {
        Ok(contents) => match RopeConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded rope config from {ROPE_CONFIG_PATH}");
            }
            Err(e) => {
                warn!("{ROPE_CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {ROPE_CONFIG_PATH} found; using compiled defaults");
        }
    }

    commands.insert_resource(Time::<Fixed>::from_hz(config.fixed_tick_hz));
}
