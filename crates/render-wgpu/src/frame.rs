use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use showcase_scene::{
    GeometryId, LightKind, Material, MaterialId, NodeId, PerspectiveCamera, SceneGraph, Shading,
};

/// Lights beyond this many are dropped, ambient lights excepted.
pub const MAX_LIGHTS: usize = 8;

pub(crate) const LIGHT_DIRECTIONAL: f32 = 1.0;
pub(crate) const LIGHT_SPOT: f32 = 2.0;
pub(crate) const LIGHT_POINT: f32 = 3.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuLight {
    /// xyz position, w kind.
    pub position: [f32; 4],
    /// xyz direction the light travels, w cosine of the outer cone.
    pub direction: [f32; 4],
    /// rgb premultiplied by intensity, w decay exponent.
    pub color: [f32; 4],
    /// x cosine of the inner cone.
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    /// rgb fog color, w density (0 disables fog).
    pub fog: [f32; 4],
    pub light_count: [u32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl FrameUniforms {
    pub fn new(scene: &SceneGraph, camera: &PerspectiveCamera) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.view_proj = camera.view_projection().to_cols_array_2d();
        uniforms.camera_pos = camera.position.extend(1.0).to_array();
        if let Some(fog) = scene.fog {
            uniforms.fog = [fog.color.r, fog.color.g, fog.color.b, fog.density];
        }

        let mut ambient = Vec3::ZERO;
        let mut count = 0;
        for (light, world) in scene.lights() {
            let radiance = Vec3::from_array(light.color.scaled(light.intensity));
            let position = world.w_axis.truncate();
            let packed = match light.kind {
                LightKind::Ambient => {
                    ambient += radiance;
                    continue;
                }
                LightKind::Directional { target, .. } => GpuLight {
                    position: position.extend(LIGHT_DIRECTIONAL).to_array(),
                    direction: direction(position, target).extend(0.0).to_array(),
                    color: radiance.extend(0.0).to_array(),
                    params: [0.0; 4],
                },
                LightKind::Spot {
                    target,
                    angle,
                    penumbra,
                    decay,
                } => GpuLight {
                    position: position.extend(LIGHT_SPOT).to_array(),
                    direction: direction(position, target).extend(angle.cos()).to_array(),
                    color: radiance.extend(decay).to_array(),
                    params: [(angle * (1.0 - penumbra)).cos(), 0.0, 0.0, 0.0],
                },
                LightKind::Point { decay } => GpuLight {
                    position: position.extend(LIGHT_POINT).to_array(),
                    direction: [0.0; 4],
                    color: radiance.extend(decay).to_array(),
                    params: [0.0; 4],
                },
            };
            if count == MAX_LIGHTS {
                tracing::warn!(max = MAX_LIGHTS, "light limit reached, dropping light");
                continue;
            }
            uniforms.lights[count] = packed;
            count += 1;
        }
        uniforms.ambient = ambient.extend(0.0).to_array();
        uniforms.light_count = [count as u32, 0, 0, 0];
        uniforms
    }
}

fn direction(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).try_normalize().unwrap_or(Vec3::NEG_Y)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// rgb base color, a opacity.
    pub color: [f32; 4],
    /// metalness, roughness, clearcoat, clearcoat roughness.
    pub surface: [f32; 4],
    /// x unlit, y textured.
    pub flags: [u32; 4],
}

impl ObjectUniforms {
    pub fn new(world: Mat4, material: &Material, textured: bool) -> Self {
        let (unlit, surface) = match material.shading {
            Shading::Unlit => (1, [0.0, 1.0, 0.0, 0.0]),
            Shading::Standard {
                metalness,
                roughness,
            } => (0, [metalness, roughness, 0.0, 0.0]),
            Shading::Physical {
                metalness,
                roughness,
                clearcoat,
                clearcoat_roughness,
            } => (0, [metalness, roughness, clearcoat, clearcoat_roughness]),
        };
        let opacity = if material.transparent {
            material.opacity
        } else {
            1.0
        };
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            color: [material.color.r, material.color.g, material.color.b, opacity],
            surface,
            flags: [unlit, u32::from(textured), 0, 0],
        }
    }
}

/// One mesh instance queued for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Draw {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub world: Mat4,
    /// Distance along the view direction, larger is farther.
    pub depth: f32,
}

/// Opaque meshes in scene order, then blended meshes back to front.
#[derive(Debug, Default)]
pub(crate) struct DrawPlan {
    pub opaque: Vec<Draw>,
    pub blended: Vec<Draw>,
    /// Meshes skipped as fully transparent or still waiting on a texture.
    pub hidden: usize,
}

impl DrawPlan {
    pub fn new(scene: &SceneGraph, camera: &PerspectiveCamera) -> Self {
        let view = camera.view_matrix();
        let mut plan = Self::default();
        for (node, instance, world) in scene.mesh_instances() {
            let Some(material) = scene.material(instance.material) else {
                continue;
            };
            if !material.is_visible() || material.texture_pending() {
                plan.hidden += 1;
                continue;
            }
            let draw = Draw {
                node,
                geometry: instance.geometry,
                material: instance.material,
                world,
                depth: -view.transform_point3(world.w_axis.truncate()).z,
            };
            if material.transparent {
                plan.blended.push(draw);
            } else {
                plan.opaque.push(draw);
            }
        }
        plan.blended.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        plan
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.blended.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showcase_common::SurfaceTarget;
    use showcase_motion::SlideDescriptor;
    use showcase_scene::{SceneAssembler, SceneHandle};

    fn landing() -> SceneHandle {
        SceneAssembler::new(SlideDescriptor::landing_defaults())
            .with_seed(5)
            .build(Some(SurfaceTarget::new(1280, 720)))
            .unwrap()
    }

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GpuLight>() % 16, 0);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniforms>() % 16, 0);
    }

    #[test]
    fn lights_are_packed_with_ambient_folded() {
        let scene = landing();
        let uniforms = FrameUniforms::new(scene.graph(), scene.camera().unwrap());
        assert_eq!(uniforms.light_count[0], 3);
        assert!((uniforms.ambient[0] - 0.4).abs() < 1e-6);
        assert_eq!(uniforms.lights[0].position[3], LIGHT_DIRECTIONAL);
        assert_eq!(uniforms.lights[1].position[3], LIGHT_SPOT);
        assert_eq!(uniforms.lights[2].position[3], LIGHT_POINT);
        // key light shines from (5,10,10) toward the origin
        let d = Vec3::from_slice(&uniforms.lights[0].direction[..3]);
        assert!((d - Vec3::new(-5.0, -10.0, -10.0).normalize()).length() < 1e-5);
        assert!((uniforms.fog[3] - 0.005).abs() < 1e-9);
    }

    #[test]
    fn hidden_slides_are_not_planned() {
        let scene = landing();
        let plan = DrawPlan::new(scene.graph(), scene.camera().unwrap());
        // five slides wait on textures
        assert_eq!(plan.hidden, 5);
        assert!(plan.blended.is_empty());
        // case, three buttons, bezel, notch, five tori
        assert_eq!(plan.opaque.len(), 11);
    }

    #[test]
    fn blended_draws_go_back_to_front() {
        let mut scene = landing();
        for i in 0..scene.slide_count() {
            scene.mark_slide_ready(i);
        }
        scene.set_slide_opacities(&[0.5, 0.5, 0.0, 0.0, 0.0]);
        let plan = DrawPlan::new(scene.graph(), scene.camera().unwrap());
        assert_eq!(plan.blended.len(), 2);
        assert!(plan.blended[0].depth >= plan.blended[1].depth);
        assert_eq!(plan.blended[1].node, scene.slides()[1]);
        assert_eq!(plan.hidden, 3);
    }

    #[test]
    fn opaque_material_ignores_opacity() {
        let material = Material::unlit("bezel", showcase_common::Color::BLACK);
        let uniforms = ObjectUniforms::new(Mat4::IDENTITY, &material, false);
        assert_eq!(uniforms.color[3], 1.0);
        assert_eq!(uniforms.flags, [1, 0, 0, 0]);
    }
}
