//! Rendering system with wgpu pipelines and per-frame resource upload.
//!
//! Fixed draw order every frame: sky, ocean, rigid entities, terrain. The
//! ocean pass consumes the displacement and normal fields as RGBA float
//! textures; everything else is plain vertex-colored geometry.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::model::{self, ModelMesh, SceneMeshes};
use crate::ocean::{OceanPatch, OceanVertex};
use crate::params::{Atmosphere, RecordingConfig};

pub const ENTITY_HULL: usize = 0;
pub const ENTITY_HATCH: usize = 1;
pub const ENTITY_LEFT_PROP: usize = 2;
pub const ENTITY_RIGHT_PROP: usize = 3;
pub const ENTITY_PLANE: usize = 4;
pub const ENTITY_BOAT: usize = 5;
pub const ENTITY_TORPEDO: usize = 6;
pub const ENTITY_EXPLOSION: usize = 7;
pub const ENTITY_COUNT: usize = 8;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Interleaved vertex for rigid entities and terrain
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Ocean pass per-frame uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct OceanFrameUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    camera_position: [f32; 3],
    _pad0: f32,
    ocean_color: [f32; 3],
    _pad1: f32,
    sky_color: [f32; 3],
    exposure: f32,
    sun_direction: [f32; 3],
    _pad2: f32,
}

/// Ocean pass size-dependent uniforms, refreshed only on parameter change
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PatchUniforms {
    patch_size: f32,
    geometry_size: f32,
    resolution: f32,
    _pad: f32,
}

/// Scene pass per-frame uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SceneFrameUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    camera_position: [f32; 3],
    _pad0: f32,
    light_direction: [f32; 3],
    expl_intensity: f32,
}

/// Per-entity uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct EntityUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    flat_lighting: f32,
    spec_power: f32,
    spec_intensity: f32,
    _pad: f32,
}

/// Sky pass uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SkyUniforms {
    inv_proj_view: [[f32; 4]; 4],
    sky_color: [f32; 3],
    exposure: f32,
    sun_direction: [f32; 3],
    _pad: f32,
}

/// Per-frame transform and visibility of one rigid entity
#[derive(Clone, Copy, Debug)]
pub struct EntityInstance {
    pub model: Mat4,
    pub visible: bool,
}

/// Everything the renderer needs for one frame
pub struct FramePayload<'a> {
    pub projection: Mat4,
    pub view: Mat4,
    /// View with its translation stripped, for the sky ray reconstruction
    pub sky_rotation_view: Mat4,
    pub camera_position: Vec3,
    pub sky_color: [f32; 3],
    pub expl_intensity: f32,
    pub entities: [EntityInstance; ENTITY_COUNT],
    pub island_model: Mat4,
    pub sea_bed_model: Mat4,
    pub displacement: &'a [[f32; 4]],
    pub normals: &'a [[f32; 4]],
    /// Refresh size-dependent ocean uniforms this frame
    pub spectrum_changed: bool,
    pub patch_size: f32,
}

struct EntityDraw {
    first: u32,
    count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct TerrainDraw {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Lighting/material constants per entity slot, in slot order
const ENTITY_MATERIALS: [(f32, f32, f32); ENTITY_COUNT] = [
    // (flat_lighting, spec_power, spec_intensity)
    (0.0, 16.0, 0.5), // hull
    (0.0, 16.0, 2.0), // hatch
    (0.0, 16.0, 2.0), // left prop
    (0.0, 16.0, 2.0), // right prop
    (0.0, 16.0, 2.0), // plane
    (0.0, 16.0, 2.0), // boat
    (1.0, 16.0, 0.0), // torpedo (flat lit)
    (1.0, 16.0, 0.0), // explosion (flat lit)
];

const TERRAIN_MATERIAL: (f32, f32, f32) = (0.0, 4.0, 1.0);

pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    depth_view: wgpu::TextureView,

    // sky pass
    sky_pipeline: wgpu::RenderPipeline,
    sky_uniform_buffer: wgpu::Buffer,
    sky_bind_group: wgpu::BindGroup,

    // ocean pass
    ocean_pipeline: wgpu::RenderPipeline,
    ocean_vertex_buffer: wgpu::Buffer,
    ocean_index_buffer: wgpu::Buffer,
    ocean_index_count: u32,
    ocean_frame_buffer: wgpu::Buffer,
    patch_uniform_buffer: wgpu::Buffer,
    ocean_bind_group: wgpu::BindGroup,
    displacement_texture: wgpu::Texture,
    normal_texture: wgpu::Texture,
    map_resolution: u32,

    // scene pass
    scene_pipeline: wgpu::RenderPipeline,
    scene_frame_buffer: wgpu::Buffer,
    scene_frame_bind_group: wgpu::BindGroup,
    scene_vertex_buffer: wgpu::Buffer,
    entity_layout: wgpu::BindGroupLayout,
    entities: Vec<EntityDraw>,
    island: TerrainDraw,
    sea_bed: TerrainDraw,

    atmosphere: Atmosphere,
    geometry_size: f32,
    recording_config: Option<RecordingConfig>,
    window_size: (u32, u32),
}

impl RenderSystem {
    /// Create the rendering system. Any missing GPU resource is fatal: the
    /// error is returned and initialization aborts.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        ocean_patch: &OceanPatch,
        map_resolution: usize,
        geometry_size: f32,
        meshes: &SceneMeshes,
        island_vertices: &[SceneVertex],
        sea_bed_vertices: &[SceneVertex],
        atmosphere: Atmosphere,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, String> {
        let size = window.inner_size();
        let window_size = (size.width, size.height);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| format!("Failed to create surface: {}", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| format!("Failed to request device: {}", e))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if recording_config.is_some() {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, window_size);

        // Shaders
        let ocean_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ocean Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("ocean.wgsl").into()),
        });
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });
        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sky.wgsl").into()),
        });

        // --- Sky pass ---
        let sky_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SkyUniforms {
                inv_proj_view: Mat4::IDENTITY.to_cols_array_2d(),
                sky_color: atmosphere.sky_color,
                exposure: atmosphere.exposure,
                sun_direction: atmosphere.sun_direction,
                _pad: 0.0,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &sky_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_uniform_buffer.as_entire_binding(),
            }],
        });

        let sky_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Sky Pipeline Layout"),
                bind_group_layouts: &[&sky_layout],
                push_constant_ranges: &[],
            });
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sky Pipeline"),
            layout: Some(&sky_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // --- Ocean pass ---
        let ocean_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Vertex Buffer"),
            contents: bytemuck::cast_slice(&ocean_patch.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ocean_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Index Buffer"),
            contents: bytemuck::cast_slice(&ocean_patch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let ocean_frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Frame Uniform Buffer"),
            contents: bytemuck::cast_slice(&[OceanFrameUniforms {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
                view: Mat4::IDENTITY.to_cols_array_2d(),
                camera_position: [0.0; 3],
                _pad0: 0.0,
                ocean_color: atmosphere.ocean_color,
                _pad1: 0.0,
                sky_color: atmosphere.sky_color,
                exposure: atmosphere.exposure,
                sun_direction: atmosphere.sun_direction,
                _pad2: 0.0,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let patch_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Patch Uniform Buffer"),
            contents: bytemuck::cast_slice(&[PatchUniforms {
                patch_size: 0.0,
                geometry_size,
                resolution: map_resolution as f32,
                _pad: 0.0,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let displacement_texture = create_map_texture(&device, map_resolution, "Displacement Map");
        let normal_texture = create_map_texture(&device, map_resolution, "Normal Map");
        let map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Map Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let ocean_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ocean Bind Group Layout"),
            entries: &[
                uniform_layout_entry(0),
                uniform_layout_entry(1),
                texture_layout_entry(2),
                texture_layout_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let ocean_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ocean Bind Group"),
            layout: &ocean_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ocean_frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: patch_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        &displacement_texture.create_view(&Default::default()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(
                        &normal_texture.create_view(&Default::default()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&map_sampler),
                },
            ],
        });

        let ocean_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Ocean Pipeline Layout"),
                bind_group_layouts: &[&ocean_layout],
                push_constant_ranges: &[],
            });
        let ocean_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ocean Render Pipeline"),
            layout: Some(&ocean_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ocean_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<OceanVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &ocean_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // --- Scene pass ---
        let scene_frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Frame Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneFrameUniforms {
                projection: Mat4::IDENTITY.to_cols_array_2d(),
                view: Mat4::IDENTITY.to_cols_array_2d(),
                camera_position: [0.0; 3],
                _pad0: 0.0,
                light_direction: atmosphere.sun_direction,
                expl_intensity: 0.0,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_frame_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Frame Bind Group Layout"),
                entries: &[uniform_layout_entry(0)],
            });
        let scene_frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Frame Bind Group"),
            layout: &scene_frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_frame_buffer.as_entire_binding(),
            }],
        });

        let entity_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Entity Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });

        let scene_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&scene_frame_layout, &entity_layout],
                push_constant_ranges: &[],
            });
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3, 1 => Float32x3, 2 => Float32x3, 3 => Float32x2
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // One interleaved buffer holds every rigid mesh; entities reference
        // ranges into it
        let (scene_vertices, ranges) = build_scene_vertices(meshes);
        let scene_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&scene_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let entities = (0..ENTITY_COUNT)
            .map(|slot| {
                let (first, count) = ranges[entity_mesh_slot(slot)];
                create_entity_draw(&device, &entity_layout, first, count, ENTITY_MATERIALS[slot])
            })
            .collect();

        let island = create_terrain_draw(&device, &entity_layout, island_vertices, "Island");
        let sea_bed = create_terrain_draw(&device, &entity_layout, sea_bed_vertices, "Sea Bed");

        Ok(Self {
            surface,
            device,
            queue,
            depth_view,
            sky_pipeline,
            sky_uniform_buffer,
            sky_bind_group,
            ocean_pipeline,
            ocean_vertex_buffer,
            ocean_index_buffer,
            ocean_index_count: ocean_patch.indices.len() as u32,
            ocean_frame_buffer,
            patch_uniform_buffer,
            ocean_bind_group,
            displacement_texture,
            normal_texture,
            map_resolution: map_resolution as u32,
            scene_pipeline,
            scene_frame_buffer,
            scene_frame_bind_group,
            scene_vertex_buffer,
            entity_layout,
            entities,
            island,
            sea_bed,
            atmosphere,
            geometry_size,
            recording_config,
            window_size,
        })
    }

    /// Replace the island mesh after a regeneration.
    pub fn update_island_mesh(&mut self, vertices: &[SceneVertex]) {
        self.island = create_terrain_draw(&self.device, &self.entity_layout, vertices, "Island");
    }

    /// Render one frame (and capture it when recording).
    pub fn render(&self, frame: &FramePayload, frame_num: usize) -> Result<(), wgpu::SurfaceError> {
        self.upload_frame_state(frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.75,
                            b: 1.0,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // sky first, then ocean, then rigid entities, then terrain
            render_pass.set_pipeline(&self.sky_pipeline);
            render_pass.set_bind_group(0, &self.sky_bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            render_pass.set_pipeline(&self.ocean_pipeline);
            render_pass.set_bind_group(0, &self.ocean_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.ocean_vertex_buffer.slice(..));
            render_pass
                .set_index_buffer(self.ocean_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.ocean_index_count, 0, 0..1);

            render_pass.set_pipeline(&self.scene_pipeline);
            render_pass.set_bind_group(0, &self.scene_frame_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.scene_vertex_buffer.slice(..));
            for (draw, instance) in self.entities.iter().zip(&frame.entities) {
                if !instance.visible {
                    continue;
                }
                render_pass.set_bind_group(1, &draw.bind_group, &[]);
                render_pass.draw(draw.first..draw.first + draw.count, 0..1);
            }

            for terrain in [&self.island, &self.sea_bed] {
                render_pass.set_bind_group(1, &terrain.bind_group, &[]);
                render_pass.set_vertex_buffer(0, terrain.vertex_buffer.slice(..));
                render_pass.draw(0..terrain.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(ref config) = self.recording_config {
            self.capture_frame(frame_num, config, &output);
        }

        output.present();

        Ok(())
    }

    /// Push the frame's uniforms and ocean textures to the GPU.
    fn upload_frame_state(&self, frame: &FramePayload) {
        self.queue.write_buffer(
            &self.ocean_frame_buffer,
            0,
            bytemuck::cast_slice(&[OceanFrameUniforms {
                projection: frame.projection.to_cols_array_2d(),
                view: frame.view.to_cols_array_2d(),
                camera_position: frame.camera_position.to_array(),
                _pad0: 0.0,
                ocean_color: self.atmosphere.ocean_color,
                _pad1: 0.0,
                sky_color: frame.sky_color,
                exposure: self.atmosphere.exposure,
                sun_direction: self.atmosphere.sun_direction,
                _pad2: 0.0,
            }]),
        );

        if frame.spectrum_changed {
            self.queue.write_buffer(
                &self.patch_uniform_buffer,
                0,
                bytemuck::cast_slice(&[PatchUniforms {
                    patch_size: frame.patch_size,
                    geometry_size: self.geometry_size,
                    resolution: self.map_resolution as f32,
                    _pad: 0.0,
                }]),
            );
        }

        let inv_proj_view = (frame.projection * frame.sky_rotation_view).inverse();
        self.queue.write_buffer(
            &self.sky_uniform_buffer,
            0,
            bytemuck::cast_slice(&[SkyUniforms {
                inv_proj_view: inv_proj_view.to_cols_array_2d(),
                sky_color: frame.sky_color,
                exposure: self.atmosphere.exposure,
                sun_direction: self.atmosphere.sun_direction,
                _pad: 0.0,
            }]),
        );

        self.queue.write_buffer(
            &self.scene_frame_buffer,
            0,
            bytemuck::cast_slice(&[SceneFrameUniforms {
                projection: frame.projection.to_cols_array_2d(),
                view: frame.view.to_cols_array_2d(),
                camera_position: frame.camera_position.to_array(),
                _pad0: 0.0,
                light_direction: self.atmosphere.sun_direction,
                expl_intensity: frame.expl_intensity,
            }]),
        );

        for (slot, (draw, instance)) in
            self.entities.iter().zip(&frame.entities).enumerate()
        {
            if !instance.visible {
                continue;
            }
            let (flat, power, intensity) = ENTITY_MATERIALS[slot];
            write_entity_uniforms(&self.queue, &draw.uniform_buffer, instance.model, flat, power, intensity);
        }
        let (flat, power, intensity) = TERRAIN_MATERIAL;
        write_entity_uniforms(
            &self.queue,
            &self.island.uniform_buffer,
            frame.island_model,
            flat,
            power,
            intensity,
        );
        write_entity_uniforms(
            &self.queue,
            &self.sea_bed.uniform_buffer,
            frame.sea_bed_model,
            flat,
            power,
            intensity,
        );

        self.write_map_texture(&self.displacement_texture, frame.displacement);
        self.write_map_texture(&self.normal_texture, frame.normals);
    }

    fn write_map_texture(&self, texture: &wgpu::Texture, data: &[[f32; 4]]) {
        let r = self.map_resolution;
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(data),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(r * 16),
                rows_per_image: Some(r),
            },
            wgpu::Extent3d {
                width: r,
                height: r,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Capture a frame to disk (recording mode only).
    fn capture_frame(
        &self,
        frame_num: usize,
        config: &RecordingConfig,
        texture: &wgpu::SurfaceTexture,
    ) {
        let (width, height) = self.window_size;
        let bytes_per_pixel = 4; // RGBA8
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Capture Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, |_| {});
        self.device.poll(wgpu::Maintain::Wait);

        let data = buffer_slice.get_mapped_range();
        let mut image_data = vec![0u8; (width * height * bytes_per_pixel) as usize];

        for y in 0..height {
            let padded_offset = (y * padded_bytes_per_row) as usize;
            let unpadded_offset = (y * unpadded_bytes_per_row) as usize;
            image_data[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
                .copy_from_slice(
                    &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize],
                );
        }

        drop(data);
        buffer.unmap();

        let frame_path = format!("{}/frame_{:05}.png", config.frames_dir(), frame_num);
        if let Err(e) = image::save_buffer(
            &frame_path,
            &image_data,
            width,
            height,
            image::ColorType::Rgba8,
        ) {
            eprintln!("Failed to save frame {}: {}", frame_num, e);
        }
    }
}

/// Mesh slot referenced by each entity (props share one mesh).
fn entity_mesh_slot(entity: usize) -> usize {
    match entity {
        ENTITY_HULL => 0,
        ENTITY_HATCH => 1,
        ENTITY_LEFT_PROP | ENTITY_RIGHT_PROP => 2,
        ENTITY_PLANE => 3,
        ENTITY_BOAT => 4,
        ENTITY_TORPEDO => 5,
        _ => 6,
    }
}

/// Concatenate every rigid mesh with its colormap into one vertex run,
/// recording (first, count) per mesh.
fn build_scene_vertices(meshes: &SceneMeshes) -> (Vec<SceneVertex>, [(u32, u32); 7]) {
    let hull_colors = model::build_hull_colors(&meshes.hull.positions);
    let hatch_colors = model::build_color_attributes(meshes.hatch.vertex_count());
    let prop_colors = model::build_prop_colors(meshes.prop.vertex_count());
    let plane_colors = model::build_plane_colors(meshes.plane.vertex_count());
    let boat_colors = model::build_color_attributes(meshes.boat.vertex_count());
    let torp_colors = model::build_color_attributes(meshes.torpedo.vertex_count());
    let expl_colors = model::build_expl_colors(meshes.explosion.vertex_count());

    let parts: [(&ModelMesh, &[[f32; 3]]); 7] = [
        (&meshes.hull, &hull_colors),
        (&meshes.hatch, &hatch_colors),
        (&meshes.prop, &prop_colors),
        (&meshes.plane, &plane_colors),
        (&meshes.boat, &boat_colors),
        (&meshes.torpedo, &torp_colors),
        (&meshes.explosion, &expl_colors),
    ];

    let mut vertices = Vec::new();
    let mut ranges = [(0u32, 0u32); 7];
    for (slot, (mesh, colors)) in parts.iter().enumerate() {
        let first = vertices.len() as u32;
        vertices.extend(interleave_model(mesh, colors));
        ranges[slot] = (first, vertices.len() as u32 - first);
    }
    (vertices, ranges)
}

/// Interleave a model mesh with per-vertex colors.
pub fn interleave_model(mesh: &ModelMesh, colors: &[[f32; 3]]) -> Vec<SceneVertex> {
    (0..mesh.vertex_count())
        .map(|i| SceneVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            color: colors[i],
            normal: [
                mesh.normals[i * 3],
                mesh.normals[i * 3 + 1],
                mesh.normals[i * 3 + 2],
            ],
            uv: [mesh.tex_coords[i * 2], mesh.tex_coords[i * 2 + 1]],
        })
        .collect()
}

/// Interleave terrain attribute arrays produced by the terrain generator.
pub fn interleave_terrain(
    positions: &[Vec3],
    colors: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
) -> Vec<SceneVertex> {
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| SceneVertex {
            position: p.to_array(),
            color: colors[i],
            normal: normals[i],
            uv: uvs[i],
        })
        .collect()
}

fn uniform_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
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

fn texture_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_depth_view(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn create_map_texture(device: &wgpu::Device, resolution: usize, label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: resolution as u32,
            height: resolution as u32,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_entity_draw(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    first: u32,
    count: u32,
    (flat_lighting, spec_power, spec_intensity): (f32, f32, f32),
) -> EntityDraw {
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Entity Uniform Buffer"),
        contents: bytemuck::cast_slice(&[EntityUniforms {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            normal_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            flat_lighting,
            spec_power,
            spec_intensity,
            _pad: 0.0,
        }]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Entity Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });
    EntityDraw {
        first,
        count,
        uniform_buffer,
        bind_group,
    }
}

fn create_terrain_draw(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    vertices: &[SceneVertex],
    label: &str,
) -> TerrainDraw {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let entity = create_entity_draw(device, layout, 0, vertices.len() as u32, TERRAIN_MATERIAL);
    TerrainDraw {
        vertex_buffer,
        vertex_count: vertices.len() as u32,
        uniform_buffer: entity.uniform_buffer,
        bind_group: entity.bind_group,
    }
}

fn write_entity_uniforms(
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    model: Mat4,
    flat_lighting: f32,
    spec_power: f32,
    spec_intensity: f32,
) {
    // a collapsed (zero-scale) transform has no inverse; its normals are
    // never lit, so identity will do
    let normal_matrix = if model.determinant() != 0.0 {
        model.inverse().transpose()
    } else {
        Mat4::IDENTITY
    };
    queue.write_buffer(
        buffer,
        0,
        bytemuck::cast_slice(&[EntityUniforms {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            flat_lighting,
            spec_power,
            spec_intensity,
            _pad: 0.0,
        }]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SceneMeshes;

    #[test]
    fn test_scene_buffer_ranges_are_contiguous() {
        let meshes = SceneMeshes::procedural();
        let (vertices, ranges) = build_scene_vertices(&meshes);

        let mut expected_first = 0;
        for (first, count) in ranges {
            assert_eq!(first, expected_first);
            assert!(count > 0);
            expected_first = first + count;
        }
        assert_eq!(expected_first as usize, vertices.len());
    }

    #[test]
    fn test_entity_mesh_slots_in_bounds() {
        for entity in 0..ENTITY_COUNT {
            assert!(entity_mesh_slot(entity) < 7);
        }
        // both propellers share one mesh
        assert_eq!(
            entity_mesh_slot(ENTITY_LEFT_PROP),
            entity_mesh_slot(ENTITY_RIGHT_PROP)
        );
    }

    #[test]
    fn test_interleave_model_matches_counts() {
        let meshes = SceneMeshes::procedural();
        let colors = crate::model::build_color_attributes(meshes.boat.vertex_count());
        let vertices = interleave_model(&meshes.boat, &colors);
        assert_eq!(vertices.len(), meshes.boat.vertex_count());
    }
}
