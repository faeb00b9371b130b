use std::f32::consts::PI;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use showcase_common::{Color, SurfaceTarget, Transform};
use showcase_geometry::{GeometryError, Primitive, build_primitive, build_rounded_panel};
use showcase_motion::SlideDescriptor;

use crate::camera::PerspectiveCamera;
use crate::graph::{Fog, MaterialId, MeshInstance, NodeId, NodeKind, SceneGraph};
use crate::light::Light;
use crate::material::Material;

/// Depth gap between stacked slides so coplanar planes never z-fight.
pub const SLIDE_STACK_STEP: f32 = 0.001;

/// Number of floating tori behind the phone.
pub const DECORATION_COUNT: usize = 5;

const CASE_WIDTH: f32 = 5.2;
const CASE_HEIGHT: f32 = 10.5;
const CASE_CORNER_RADIUS: f32 = 0.6;
const CASE_DEPTH: f32 = 0.5;
const CASE_BEVEL: f32 = 0.05;

const BEZEL_Z: f32 = 0.32;
const NOTCH_Z: f32 = 0.33;
const SCREEN_Z: f32 = 0.34;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no surface to draw into")]
    MissingSurface,
    #[error("surface {width}x{height} has no area")]
    DegenerateSurface { width: u32, height: u32 },
    #[error("geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("node {0} could not be attached")]
    Detached(&'static str),
}

/// Builds the hero scene in a fixed order.
#[derive(Debug, Clone)]
pub struct SceneAssembler {
    slides: SlideDescriptor,
    seed: Option<u64>,
}

impl SceneAssembler {
    pub fn new(slides: SlideDescriptor) -> Self {
        Self { slides, seed: None }
    }

    /// Place decorations from a fixed seed so every build looks the same.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn slides(&self) -> &SlideDescriptor {
        &self.slides
    }

    pub fn build(&self, target: Option<SurfaceTarget>) -> Result<SceneHandle, SceneError> {
        match self.seed {
            Some(seed) => self.build_with_rng(target, &mut StdRng::seed_from_u64(seed)),
            None => self.build_with_rng(target, &mut rand::rng()),
        }
    }

    /// Build with decoration placement drawn from `rng`.
    pub fn build_with_rng<R: Rng>(
        &self,
        target: Option<SurfaceTarget>,
        rng: &mut R,
    ) -> Result<SceneHandle, SceneError> {
        let surface = target.ok_or(SceneError::MissingSurface)?;
        if !surface.has_area() {
            return Err(SceneError::DegenerateSurface {
                width: surface.width,
                height: surface.height,
            });
        }

        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.fog = Some(Fog {
            color: Color::from_hex(0x0f172a),
            density: 0.005,
        });

        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(surface.width, surface.height);
        let camera_node = attach(
            graph.add_node(
                root,
                "camera",
                NodeKind::Camera(camera),
                Transform::from_position(camera.position),
            ),
            "camera",
        )?;

        add_lights(&mut graph, root)?;

        let main_object = attach(
            graph.add_group(root, "main_object", Transform::default()),
            "main_object",
        )?;
        let phone = attach(
            graph.add_group(main_object, "phone", Transform::default()),
            "phone",
        )?;
        add_case(&mut graph, phone)?;
        let screen_group = attach(
            graph.add_group(
                phone,
                "screen",
                Transform::from_position(Vec3::new(0.0, 0.0, SCREEN_Z)),
            ),
            "screen",
        )?;
        let (slide_nodes, slide_materials) = self.add_slides(&mut graph, screen_group)?;
        let decorations = add_decorations(&mut graph, root, rng)?;

        tracing::debug!(
            nodes = graph.node_count(),
            geometries = graph.geometry_count(),
            materials = graph.material_count(),
            width = surface.width,
            height = surface.height,
            "scene assembled"
        );

        Ok(SceneHandle {
            graph,
            camera: camera_node,
            main_object,
            screen_group,
            slides: slide_nodes,
            slide_materials,
            decorations,
            surface,
        })
    }

    fn add_slides(
        &self,
        graph: &mut SceneGraph,
        screen: NodeId,
    ) -> Result<(Vec<NodeId>, Vec<MaterialId>), SceneError> {
        let geometry = graph.add_geometry(build_primitive(&Primitive::Plane {
            width: 4.7,
            height: 9.6,
        })?);
        let mut nodes = Vec::with_capacity(self.slides.len());
        let mut materials = Vec::with_capacity(self.slides.len());
        for (i, source) in self.slides.sources().iter().enumerate() {
            let opacity = if i == 0 { 1.0 } else { 0.0 };
            let material = graph.add_material(
                Material::unlit(format!("slide_{i}"), Color::WHITE)
                    .blended(opacity)
                    .with_texture(source.as_str()),
            );
            let node = attach(
                graph.add_mesh(
                    screen,
                    format!("slide_{i}"),
                    MeshInstance {
                        geometry,
                        material,
                        cast_shadow: false,
                    },
                    Transform::from_position(Vec3::new(0.0, 0.0, i as f32 * SLIDE_STACK_STEP)),
                ),
                "slide",
            )?;
            nodes.push(node);
            materials.push(material);
        }
        Ok((nodes, materials))
    }
}

fn attach(id: Option<NodeId>, name: &'static str) -> Result<NodeId, SceneError> {
    id.ok_or(SceneError::Detached(name))
}

fn add_lights(graph: &mut SceneGraph, root: NodeId) -> Result<(), SceneError> {
    let lights = [
        ("ambient_light", Light::ambient(Color::WHITE, 0.4), Vec3::ZERO),
        (
            "key_light",
            Light::directional(Color::WHITE, 1.5).with_shadow(1024),
            Vec3::new(5.0, 10.0, 10.0),
        ),
        (
            "fill_light",
            Light::spot(Color::from_hex(0x3b82f6), 5.0),
            Vec3::new(-10.0, 0.0, 10.0),
        ),
        (
            "rim_light",
            Light::point(Color::from_hex(0xf472b6), 2.0),
            Vec3::new(0.0, 5.0, -5.0),
        ),
    ];
    for (name, light, position) in lights {
        attach(
            graph.add_node(
                root,
                name,
                NodeKind::Light(light),
                Transform::from_position(position),
            ),
            name,
        )?;
    }
    Ok(())
}

fn add_case(graph: &mut SceneGraph, phone: NodeId) -> Result<(), SceneError> {
    let body = graph.add_geometry(build_rounded_panel(
        CASE_WIDTH,
        CASE_HEIGHT,
        CASE_CORNER_RADIUS,
        CASE_DEPTH,
        CASE_BEVEL,
    )?);
    let body_material = graph.add_material(Material::physical(
        "case",
        Color::from_hex(0x0f172a),
        0.6,
        0.2,
        1.0,
        0.1,
    ));
    attach(
        graph.add_mesh(
            phone,
            "case",
            MeshInstance {
                geometry: body,
                material: body_material,
                cast_shadow: true,
            },
            Transform::default(),
        ),
        "case",
    )?;

    let button = graph.add_geometry(build_primitive(&Primitive::Box {
        width: 0.1,
        height: 0.8,
        depth: 0.15,
    })?);
    let button_material =
        graph.add_material(Material::standard("button", Color::from_hex(0x334155), 0.9, 0.2));
    let edge = CASE_WIDTH / 2.0 + 0.02;
    let buttons = [
        ("power_button", Vec3::new(edge, 1.5, 0.0)),
        ("volume_up", Vec3::new(-edge, 1.8, 0.0)),
        ("volume_down", Vec3::new(-edge, 0.8, 0.0)),
    ];
    for (name, position) in buttons {
        attach(
            graph.add_mesh(
                phone,
                name,
                MeshInstance {
                    geometry: button,
                    material: button_material,
                    cast_shadow: false,
                },
                Transform::from_position(position),
            ),
            name,
        )?;
    }

    let overlays = [
        ("bezel", 4.9, 10.1, Vec3::new(0.0, 0.0, BEZEL_Z)),
        ("notch", 1.8, 0.5, Vec3::new(0.0, 4.6, NOTCH_Z)),
    ];
    for (name, width, height, position) in overlays {
        let geometry = graph.add_geometry(build_primitive(&Primitive::Plane { width, height })?);
        let material = graph.add_material(Material::unlit(name, Color::BLACK));
        attach(
            graph.add_mesh(
                phone,
                name,
                MeshInstance {
                    geometry,
                    material,
                    cast_shadow: false,
                },
                Transform::from_position(position),
            ),
            name,
        )?;
    }
    Ok(())
}

fn add_decorations<R: Rng>(
    graph: &mut SceneGraph,
    root: NodeId,
    rng: &mut R,
) -> Result<Vec<NodeId>, SceneError> {
    let geometry = graph.add_geometry(build_primitive(&Primitive::Torus {
        radius: 0.6,
        tube: 0.2,
        radial_segments: 16,
        tubular_segments: 100,
    })?);
    let material =
        graph.add_material(Material::standard("decoration", Color::from_hex(0x60a5fa), 0.8, 0.2));

    let mut nodes = Vec::with_capacity(DECORATION_COUNT);
    for i in 0..DECORATION_COUNT {
        let x = (rng.random::<f32>() - 0.5) * 10.0;
        let y = (rng.random::<f32>() - 0.5) * 10.0;
        let z = -2.0 - rng.random::<f32>() * 5.0;
        let tilt = rng.random::<f32>() * PI;
        let node = attach(
            graph.add_mesh(
                root,
                format!("decoration_{i}"),
                MeshInstance {
                    geometry,
                    material,
                    cast_shadow: false,
                },
                Transform::from_position(Vec3::new(x, y, z)).with_euler(tilt, 0.0, 0.0),
            ),
            "decoration",
        )?;
        nodes.push(node);
    }
    Ok(nodes)
}

/// An assembled scene and the ids the animation needs.
#[derive(Debug, Clone)]
pub struct SceneHandle {
    graph: SceneGraph,
    camera: NodeId,
    main_object: NodeId,
    screen_group: NodeId,
    slides: Vec<NodeId>,
    slide_materials: Vec<MaterialId>,
    decorations: Vec<NodeId>,
    surface: SurfaceTarget,
}

impl SceneHandle {
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn camera_node(&self) -> NodeId {
        self.camera
    }

    /// `None` once the scene has been released.
    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        match &self.graph.node(self.camera)?.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    fn camera_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        match &mut self.graph.node_mut(self.camera)?.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn main_object(&self) -> NodeId {
        self.main_object
    }

    pub fn main_transform_mut(&mut self) -> Option<&mut Transform> {
        self.graph.transform_mut(self.main_object)
    }

    pub fn screen_group(&self) -> NodeId {
        self.screen_group
    }

    pub fn slides(&self) -> &[NodeId] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slide_materials.len()
    }

    pub fn slide_material(&self, index: usize) -> Option<MaterialId> {
        self.slide_materials.get(index).copied()
    }

    pub fn decorations(&self) -> &[NodeId] {
        &self.decorations
    }

    pub fn surface(&self) -> SurfaceTarget {
        self.surface
    }

    /// Follow a new surface size. A surface without area is skipped so the
    /// projection stays finite; returns whether it was applied.
    pub fn resize(&mut self, target: SurfaceTarget) -> bool {
        if !target.has_area() {
            tracing::warn!(
                width = target.width,
                height = target.height,
                "ignoring resize to empty surface"
            );
            return false;
        }
        self.surface = target;
        match self.camera_mut() {
            Some(camera) => camera.set_aspect(target.width, target.height),
            None => false,
        }
    }

    /// Write one opacity per slide. Extra values are ignored.
    pub fn set_slide_opacities(&mut self, opacities: &[f64]) {
        for (material, opacity) in self.slide_materials.iter().zip(opacities) {
            if let Some(m) = self.graph.material_mut(*material) {
                m.opacity = (*opacity as f32).clamp(0.0, 1.0);
            }
        }
    }

    pub fn slide_opacities(&self) -> Vec<f32> {
        self.slide_materials
            .iter()
            .map(|id| self.graph.material(*id).map_or(0.0, |m| m.opacity))
            .collect()
    }

    /// Flag the slide's texture as uploaded. Returns `false` for an unknown
    /// index or a slide without a texture.
    pub fn mark_slide_ready(&mut self, index: usize) -> bool {
        let Some(id) = self.slide_materials.get(index).copied() else {
            return false;
        };
        match self.graph.material_mut(id).and_then(|m| m.map.as_mut()) {
            Some(slot) => {
                slot.ready = true;
                true
            }
            None => false,
        }
    }

    pub fn slide_readiness(&self) -> Vec<bool> {
        self.slide_materials
            .iter()
            .map(|id| {
                self.graph
                    .material(*id)
                    .and_then(|m| m.map.as_ref())
                    .is_some_and(|slot| slot.ready)
            })
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.graph.is_released()
    }

    /// Tear down the graph and every pooled resource. Safe to call twice.
    pub fn release(&mut self) -> bool {
        let released = self.graph.release();
        if released {
            self.slides.clear();
            self.slide_materials.clear();
            self.decorations.clear();
        }
        released
    }
}
