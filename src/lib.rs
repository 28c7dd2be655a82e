//! Winch rope library
//!
//! A rope paid out from a fixed anchor down to a moving body, simulated as a
//! chain of pooled Rapier bodies whose anchor-side link grows and shrinks on
//! command.  See [`rope`] for the module layout.

pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod rope;
