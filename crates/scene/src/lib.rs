//! Scene: the node tree the hero visualization is drawn from, and the
//! assembler that builds it.
//!
//! # Invariants
//! - The graph is built once by [`SceneAssembler`] and torn down once by
//!   [`SceneHandle::release`]. Node, geometry and material ids stay valid in
//!   between.
//! - Geometry and materials live in pools owned by the graph; meshes refer to
//!   them by id, so shared parts are stored once.
//! - Assembly order is fixed: camera, the four lights, the main object and its
//!   parts, then the decorations.
//! - Decoration placement comes from an injected RNG; a seeded build is fully
//!   reproducible.

mod assembler;
mod camera;
mod graph;
mod light;
mod material;

pub use assembler::{DECORATION_COUNT, SLIDE_STACK_STEP, SceneAssembler, SceneError, SceneHandle};
pub use camera::PerspectiveCamera;
pub use graph::{Fog, GeometryId, MaterialId, MeshInstance, Node, NodeId, NodeKind, SceneGraph};
pub use light::{Light, LightKind, ShadowSettings};
pub use material::{Material, Shading, TextureSlot};

pub fn crate_info() -> &'static str {
    "showcase-scene v0.1.0"
}
