//! wgpu render backend for the hero scene.
//!
//! Draws the phone, its lights and the slide stack into a window surface with
//! physically based shading and exponential-squared fog.
//!
//! # Invariants
//! - The renderer never mutates the scene graph.
//! - Opaque meshes are drawn before blended ones; blended meshes back to front.
//! - Slides that are fully transparent or still waiting on a texture are never drawn.
//! - After `release` every GPU buffer and texture is destroyed and rendering fails.

mod frame;
mod gpu;
mod shaders;

pub use gpu::{RenderError, WgpuRenderer};
pub use shaders::SCENE_SHADER;

pub fn crate_info() -> &'static str {
    "showcase-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render-wgpu"));
    }
}
