use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Write;

use showcase_assets::DecodedTexture;
use showcase_common::SurfaceTarget;
use showcase_scene::{MaterialId, PerspectiveCamera, SceneGraph};

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A renderer reads the scene and camera and produces one frame. It never
/// mutates the scene; GPU copies of geometry and textures are its own.
pub trait Renderer {
    /// What one frame produces: nothing for a window, text for a dump.
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Draw exactly one frame.
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<Self::Output, Self::Error>;

    /// Match a new surface size. Only called with a non-zero area.
    fn resize(&mut self, surface: SurfaceTarget);

    /// Make `texture` the map of `material`.
    fn upload_texture(
        &mut self,
        material: MaterialId,
        texture: &DecodedTexture,
    ) -> Result<(), Self::Error>;

    /// Free every GPU-side resource. Later calls are no-ops.
    fn release(&mut self);
}

/// Text renderer: describes each frame instead of drawing it.
///
/// Used by the CLI and by tests that exercise the render loop without a GPU.
#[derive(Debug, Default)]
pub struct TextRenderer {
    surface: Option<SurfaceTarget>,
    textures: BTreeMap<MaterialId, (u32, u32)>,
    frames: u64,
    releases: u32,
    released: bool,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> Option<SurfaceTarget> {
        self.surface
    }

    pub fn has_texture(&self, material: MaterialId) -> bool {
        self.textures.contains_key(&material)
    }

    /// How many times resources were actually freed.
    pub fn releases(&self) -> u32 {
        self.releases
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Renderer for TextRenderer {
    type Output = String;
    type Error = Infallible;

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<String, Infallible> {
        self.frames += 1;
        let mut out = String::new();
        let (w, h) = self.surface.map_or((0, 0), |s| (s.width, s.height));
        let _ = writeln!(out, "=== Frame {} ({w}x{h}) ===", self.frames);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_y_deg,
            camera.aspect
        );
        let _ = writeln!(out, "Lights: {}", scene.lights().len());
        if let Some(fog) = scene.fog {
            let _ = writeln!(out, "Fog: density={}", fog.density);
        }

        let mut hidden = 0;
        for (id, instance, world) in scene.mesh_instances() {
            let (Some(node), Some(material)) = (scene.node(id), scene.material(instance.material))
            else {
                continue;
            };
            if !material.is_visible() || material.texture_pending() {
                hidden += 1;
                continue;
            }
            let p = world.w_axis;
            let _ = write!(
                out,
                "  {} pos=({:.2}, {:.2}, {:.2})",
                node.name, p.x, p.y, p.z
            );
            if material.transparent {
                let _ = write!(out, " opacity={:.3}", material.opacity);
            }
            out.push('\n');
        }
        let _ = writeln!(out, "Hidden: {hidden}");
        Ok(out)
    }

    fn resize(&mut self, surface: SurfaceTarget) {
        self.surface = Some(surface);
    }

    fn upload_texture(
        &mut self,
        material: MaterialId,
        texture: &DecodedTexture,
    ) -> Result<(), Infallible> {
        self.textures
            .insert(material, (texture.width, texture.height));
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.textures.clear();
        self.releases += 1;
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showcase_common::{Color, Transform};
    use showcase_geometry::{Primitive, build_primitive};
    use showcase_scene::{Material, MeshInstance};

    fn one_slide_scene(ready: bool) -> SceneGraph {
        let mut graph = SceneGraph::new();
        let geometry = graph.add_geometry(
            build_primitive(&Primitive::Plane {
                width: 1.0,
                height: 2.0,
            })
            .unwrap(),
        );
        let mut material = Material::unlit("slide", Color::WHITE)
            .blended(0.5)
            .with_texture("/a.png");
        if let Some(slot) = material.map.as_mut() {
            slot.ready = ready;
        }
        let material = graph.add_material(material);
        let root = graph.root();
        graph.add_mesh(
            root,
            "slide_0",
            MeshInstance {
                geometry,
                material,
                cast_shadow: false,
            },
            Transform::default(),
        );
        graph
    }

    #[test]
    fn text_renderer_lists_visible_meshes() {
        let mut renderer = TextRenderer::new();
        renderer.resize(SurfaceTarget::new(800, 600));
        let output = renderer
            .render(&one_slide_scene(true), &PerspectiveCamera::default())
            .unwrap();
        assert!(output.contains("Frame 1 (800x600)"));
        assert!(output.contains("slide_0 pos=(0.00, 0.00, 0.00) opacity=0.500"));
        assert!(output.contains("Hidden: 0"));
    }

    #[test]
    fn pending_textures_are_not_drawn() {
        let mut renderer = TextRenderer::new();
        let output = renderer
            .render(&one_slide_scene(false), &PerspectiveCamera::default())
            .unwrap();
        assert!(!output.contains("slide_0"));
        assert!(output.contains("Hidden: 1"));
    }

    #[test]
    fn release_is_counted_once() {
        let mut renderer = TextRenderer::new();
        renderer.release();
        renderer.release();
        assert_eq!(renderer.releases(), 1);
        assert!(renderer.is_released());
    }
}
