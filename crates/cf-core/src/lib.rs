//! cf-core: Shared types for CueForge
//!
//! This crate provides the foundational types used across all CueForge crates.

mod error;

pub use error::*;

/// World-space position of an anchor or voice
pub type Position = nalgebra::Vector3<f32>;

/// Origin of world space (used by non-positional playback)
#[inline]
pub fn origin() -> Position {
    Position::zeros()
}
