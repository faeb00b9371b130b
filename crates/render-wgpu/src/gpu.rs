use std::collections::HashMap;

use showcase_assets::DecodedTexture;
use showcase_common::SurfaceTarget;
use showcase_geometry::Vertex;
use showcase_render::Renderer;
use showcase_scene::{GeometryId, MaterialId, NodeId, PerspectiveCamera, SceneGraph};
use wgpu::util::DeviceExt;

use crate::frame::{DrawPlan, FrameUniforms, ObjectUniforms};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MAX_ANISOTROPY: u16 = 16;

/// Errors from the wgpu backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("renderer resources were released")]
    Released,
    #[error("texture {id} is {width}x{height}, device limit is {limit}")]
    TextureTooLarge {
        id: String,
        width: u32,
        height: u32,
        limit: u32,
    },
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Per-node uniforms plus the texture bound for the node's material.
struct ObjectBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    material: MaterialId,
    textured: bool,
}

/// wgpu renderer that owns the window surface and every GPU copy of the scene.
///
/// Geometry is uploaded the first time a mesh is drawn. Opaque meshes are
/// drawn first with depth writes, then blended meshes back to front without.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    opaque_pipeline: wgpu::RenderPipeline,
    blended_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback: GpuTexture,
    meshes: HashMap<GeometryId, GpuMesh>,
    textures: HashMap<MaterialId, GpuTexture>,
    objects: HashMap<NodeId, ObjectBinding>,
    depth: GpuTexture,
    last_draws: usize,
    released: bool,
}

impl WgpuRenderer {
    /// Take ownership of a configured surface and its device.
    pub fn new(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&<FrameUniforms as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(0)],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let opaque_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, config.format, false);
        let blended_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, config.format, true);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("slide_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: MAX_ANISOTROPY,
            ..Default::default()
        });

        let fallback = create_rgba_texture(&device, &queue, "fallback_texture", 1, 1, &[&[255; 4]]);
        let depth = create_depth_texture(&device, config.width, config.height);

        tracing::debug!(
            format = ?config.format,
            width = config.width,
            height = config.height,
            "wgpu renderer ready"
        );

        Self {
            surface,
            device,
            queue,
            config,
            opaque_pipeline,
            blended_pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            sampler,
            fallback,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            objects: HashMap::new(),
            depth,
            last_draws: 0,
            released: false,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Meshes drawn in the most recent frame.
    pub fn last_draw_count(&self) -> usize {
        self.last_draws
    }

    fn upload_geometry(&mut self, scene: &SceneGraph, id: GeometryId) {
        if self.meshes.contains_key(&id) {
            return;
        }
        let Some(mesh) = scene.geometry(id) else {
            return;
        };
        if mesh.is_empty() {
            return;
        }
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.meshes.insert(
            id,
            GpuMesh {
                vertices,
                indices,
                index_count: mesh.indices.len() as u32,
            },
        );
    }

    fn prepare_object(&mut self, node: NodeId, material: MaterialId) -> bool {
        let textured = self.textures.contains_key(&material);
        let current = self
            .objects
            .get(&node)
            .is_some_and(|b| b.material == material && b.textured == textured);
        if current {
            return textured;
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniforms"),
            size: std::mem::size_of::<ObjectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let view = self
            .textures
            .get(&material)
            .map_or(&self.fallback.view, |t| &t.view);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: &self.object_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        if let Some(old) = self.objects.insert(
            node,
            ObjectBinding {
                buffer,
                bind_group,
                material,
                textured,
            },
        ) {
            old.buffer.destroy();
        }
        textured
    }

    fn configure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth.texture.destroy();
        self.depth = create_depth_texture(&self.device, self.config.width, self.config.height);
    }
}

impl Renderer for WgpuRenderer {
    type Output = ();
    type Error = RenderError;

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.configure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let plan = DrawPlan::new(scene, camera);
        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(scene, camera)),
        );
        for draw in plan.opaque.iter().chain(&plan.blended) {
            self.upload_geometry(scene, draw.geometry);
            let textured = self.prepare_object(draw.node, draw.material);
            let (Some(material), Some(binding)) =
                (scene.material(draw.material), self.objects.get(&draw.node))
            else {
                continue;
            };
            self.queue.write_buffer(
                &binding.buffer,
                0,
                bytemuck::bytes_of(&ObjectUniforms::new(draw.world, material, textured)),
            );
        }

        let clear = scene.fog.map_or(wgpu::Color::BLACK, |fog| wgpu::Color {
            r: fog.color.r as f64,
            g: fog.color.g as f64,
            b: fog.color.b as f64,
            a: 1.0,
        });
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        let mut drawn = 0;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (pipeline, draws) in [
                (&self.opaque_pipeline, &plan.opaque),
                (&self.blended_pipeline, &plan.blended),
            ] {
                pass.set_pipeline(pipeline);
                for draw in draws {
                    let (Some(mesh), Some(binding)) =
                        (self.meshes.get(&draw.geometry), self.objects.get(&draw.node))
                    else {
                        continue;
                    };
                    pass.set_bind_group(1, &binding.bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                    pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    drawn += 1;
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        tracing::trace!(drawn, planned = plan.len(), hidden = plan.hidden, "frame presented");
        self.last_draws = drawn;
        Ok(())
    }

    fn resize(&mut self, surface: SurfaceTarget) {
        if self.released || !surface.has_area() {
            return;
        }
        self.config.width = surface.width;
        self.config.height = surface.height;
        self.configure();
    }

    fn upload_texture(
        &mut self,
        material: MaterialId,
        texture: &DecodedTexture,
    ) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if texture.width > limit || texture.height > limit {
            return Err(RenderError::TextureTooLarge {
                id: texture.source.clone(),
                width: texture.width,
                height: texture.height,
                limit,
            });
        }
        let chain = texture.mip_chain();
        let levels: Vec<&[u8]> = chain.iter().map(|l| l.pixels.as_slice()).collect();
        let gpu = create_rgba_texture(
            &self.device,
            &self.queue,
            &texture.source,
            texture.width,
            texture.height,
            &levels,
        );
        if let Some(old) = self.textures.insert(material, gpu) {
            old.texture.destroy();
        }
        self.objects.retain(|_, b| b.material != material);
        tracing::debug!(
            id = %texture.source,
            mips = chain.len(),
            "slide texture uploaded"
        );
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        for (_, mesh) in self.meshes.drain() {
            mesh.vertices.destroy();
            mesh.indices.destroy();
        }
        for (_, texture) in self.textures.drain() {
            texture.texture.destroy();
        }
        for (_, object) in self.objects.drain() {
            object.buffer.destroy();
        }
        self.frame_buffer.destroy();
        self.fallback.texture.destroy();
        self.depth.texture.destroy();
        self.released = true;
        tracing::info!("GPU resources released");
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blended: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if blended {
            "blended_pipeline"
        } else {
            "opaque_pipeline"
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                    2 => Float32x2,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(if blended {
                    wgpu::BlendState::ALPHA_BLENDING
                } else {
                    wgpu::BlendState::REPLACE
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !blended,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// sRGB texture with one entry of `levels` per mip level, largest first.
fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    levels: &[&[u8]],
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len().max(1) as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (level, pixels) in levels.iter().enumerate() {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: level as u32,
                origin: wgpu::Origin3d::ZERO,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    GpuTexture { texture, view }
}
