//! Errors raised while building a collision space or configuring a collider.
//!
//! The per-frame integrator itself never fails; see `FpsCollider::update`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColliderError {
    #[error("invalid dimension `{name}`: {value}")]
    InvalidDimension { name: &'static str, value: f32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("duplicate static geometry id {0}")]
    DuplicateGeomId(u32),

    #[error("invalid triangle mesh for geometry {id}: {reason}")]
    InvalidMesh { id: u32, reason: String },
}
