//! Rope-specific error types.
//!
//! Systems propagate errors through these types rather than panicking, so a
//! misconfigured rope disables itself instead of taking the app down.
//!
//! ## Usage
//!
//! ```rust
//! use winch_rope::error::{RopeError, RopeResult};
//!
//! fn require_anchor(anchor: Option<u32>) -> RopeResult<u32> {
//!     anchor.ok_or(RopeError::MissingAnchor)
//! }
//! assert!(require_anchor(None).is_err());
//! ```

use std::fmt;

/// Top-level error enum for the rope simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum RopeError {
    /// The rope was spawned without an anchor entity, or the anchor entity has
    /// no transform.  The rope cannot simulate without one.
    MissingAnchor,

    /// A segment id was used that the pool never handed out.
    UnknownSegment {
        /// The offending slot index.
        id: u32,
    },

    /// `assets/rope.toml` exists but is not valid TOML for [`crate::config::RopeConfig`].
    ConfigParse {
        /// Parser message, including line and column.
        message: String,
    },

    /// A configuration value is outside its valid range.
    InvalidConfig {
        /// Name of the field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },
}

impl fmt::Display for RopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RopeError::MissingAnchor => write!(f, "rope has no anchor assigned"),
            RopeError::UnknownSegment { id } => {
                write!(f, "segment {} was never allocated by the pool", id)
            }
            RopeError::ConfigParse { message } => {
                write!(f, "failed to parse rope config: {}", message)
            }
            RopeError::InvalidConfig {
                name,
                value,
                expected,
            } => write!(
                f,
                "config value '{}' = {} is outside valid range {}",
                name, value, expected
            ),
        }
    }
}

impl std::error::Error for RopeError {}

/// Convenience alias: a `Result` using `RopeError` as the error type.
pub type RopeResult<T> = Result<T, RopeError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error if `value` is not strictly positive and finite.
pub fn validate_positive(name: &'static str, value: f32) -> RopeResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RopeError::InvalidConfig {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Returns an error if `value` is negative or not finite.
pub fn validate_non_negative(name: &'static str, value: f32) -> RopeResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RopeError::InvalidConfig {
            name,
            value,
            expected: "[0.0, ∞)",
        })
    }
}
