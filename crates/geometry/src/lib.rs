//! Geometry factory: procedural solids built on the CPU.
//!
//! Every builder is a pure function of its parameters. Identical inputs give
//! identical vertex and index data, and invalid parameters are rejected before
//! any vertex is emitted.
//!
//! # Invariants
//! - Triangles are wound counter-clockwise when seen from outside the solid.
//! - Normals are unit length.
//! - Indices always reference an existing vertex.

mod mesh;
mod panel;
mod primitives;

pub use mesh::{Aabb, MeshData, Vertex};
pub use panel::{RoundedPanel, build_rounded_panel};
pub use primitives::{Primitive, build_primitive};

/// Errors from geometry construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("corner radius {radius} must be below half the shorter side ({limit})")]
    CornerRadiusTooLarge { radius: f32, limit: f32 },
    #[error(
        "bevel needs a positive size and thickness and at least one segment, got size {size}, thickness {thickness}, {segments} segments"
    )]
    IncompleteBevel {
        size: f32,
        thickness: f32,
        segments: u32,
    },
    #[error("{name} needs at least {min} segments, got {value}")]
    TooFewSegments {
        name: &'static str,
        min: u32,
        value: u32,
    },
}

pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::NonPositive { name, value })
    }
}

pub(crate) fn require_non_negative(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GeometryError::Negative { name, value })
    }
}

pub(crate) fn require_segments(name: &'static str, min: u32, value: u32) -> Result<(), GeometryError> {
    if value >= min {
        Ok(())
    } else {
        Err(GeometryError::TooFewSegments { name, min, value })
    }
}

pub fn crate_info() -> &'static str {
    "showcase-geometry v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("geometry"));
    }

    #[test]
    fn validators_reject_nan() {
        assert!(require_positive("width", f32::NAN).is_err());
        assert!(require_non_negative("bevel", f32::NAN).is_err());
        assert!(require_non_negative("bevel", 0.0).is_ok());
        assert!(require_positive("width", 0.0).is_err());
    }
}
