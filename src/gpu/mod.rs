//! GPU resources and the per-frame pass encoding.
//!
//! `GpuState` owns the surface, device, both particle storage buffers, the
//! compiled update (compute) and render pipelines, and encodes one frame:
//! the update pass reading the "read" buffer into the "write" buffer,
//! followed by the instanced render pass drawing the pre-update state. Both
//! passes go into a single command encoder, so their ordering is fixed here
//! and nowhere else.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::buffers::Slot;
use crate::error::GpuError;
use crate::particles::{Particle, PARTICLE_STRIDE};
use crate::simulation::FramePlan;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const WORKGROUP_SIZE: u32 = 64;

/// Stride of one quad vertex: coord.xy + tex_coord.xy.
const QUAD_STRIDE: u64 = 4 * 4;

/// Two triangles forming a unit quad, with texture coordinates.
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 24] = [
    // coord        tex_coord
    -1.0, -1.0,     0.0, 0.0,
     1.0, -1.0,     1.0, 0.0,
    -1.0,  1.0,     0.0, 1.0,
    -1.0,  1.0,     0.0, 1.0,
     1.0, -1.0,     1.0, 0.0,
     1.0,  1.0,     1.0, 1.0,
];

/// Uniforms shared by the update and render shaders (matches WGSL).
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    pointer: [f32; 2],
    speed: f32,
    time: f32,
    aspect: f32,
    born: u32,
    _padding: [f32; 2],
}

pub(crate) struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    update_pipeline: wgpu::ComputePipeline,
    render_pipeline: wgpu::RenderPipeline,
    /// The two particle storages, indexed by [`Slot`].
    particle_buffers: [wgpu::Buffer; 2],
    /// Update bind groups, indexed by the frame's *read* slot. Each binds
    /// the read slot's buffer as read-only source and the other slot's
    /// buffer as destination, so source and destination can never alias.
    update_bind_groups: [wgpu::BindGroup; 2],
    quad_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    speed: f32,
}

impl GpuState {
    pub(crate) async fn new(
        window: Arc<Window>,
        particles: &[Particle],
        speed: f32,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        // Both storages start from the same seed data; roles are assigned
        // on the CPU side and only ever swapped, never copied.
        let particle_buffers = [0, 1].map(|i| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Particle Buffer {}", i)),
                contents: bytemuck::cast_slice(particles),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::STORAGE,
            })
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = Uniforms {
            pointer: [0.0, 0.0],
            speed,
            time: 0.0,
            aspect: config.width as f32 / config.height as f32,
            born: 0,
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Update bind group layout: read-only source, writable destination,
        // shared uniforms.
        let update_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Update Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        // One bind group per role assignment: reading slot A writes slot B
        // and vice versa.
        let update_bind_groups = [Slot::A, Slot::B].map(|read| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Update Bind Group"),
                layout: &update_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: particle_buffers[read.index()].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: particle_buffers[read.other().index()].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Update pipeline (compute).
        let update_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Update Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/update.wgsl").into()),
        });

        let update_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Update Pipeline Layout"),
                bind_group_layouts: &[&update_bind_group_layout],
                push_constant_ranges: &[],
            });

        let update_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Update Pipeline"),
            layout: Some(&update_pipeline_layout),
            module: &update_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        // Render pipeline (instanced quads over the pre-update buffer).
        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Render Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/render.wgsl").into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    // Particle attributes, one set per instance. Offsets
                    // follow the `Particle` record layout.
                    wgpu::VertexBufferLayout {
                        array_stride: PARTICLE_STRIDE,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x2, // position
                            },
                            wgpu::VertexAttribute {
                                offset: 8,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32, // age
                            },
                            wgpu::VertexAttribute {
                                offset: 12,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32, // life
                            },
                        ],
                    },
                    // Shared quad geometry, one set per vertex.
                    wgpu::VertexBufferLayout {
                        array_stride: QUAD_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 3,
                                format: wgpu::VertexFormat::Float32x2, // coord
                            },
                            wgpu::VertexAttribute {
                                offset: 8,
                                shader_location: 4,
                                format: wgpu::VertexFormat::Float32x2, // tex_coord
                            },
                        ],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                // Disable depth writes for additive blending
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            update_pipeline,
            render_pipeline,
            particle_buffers,
            update_bind_groups,
            quad_buffer,
            uniform_buffer,
            uniform_bind_group,
            depth_texture,
            speed,
        })
    }

    /// Match the surface to the window's new inner size. One surface
    /// reconfiguration per notification; zero-sized updates (minimized
    /// window) are ignored. Particle state is untouched.
    pub(crate) fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if let Some((width, height)) = surface_extent(new_size) {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Encode and submit one frame: update pass, then render pass.
    ///
    /// The update pass advances the first `born` particles from the plan's
    /// read slot into its write slot; the render pass draws the read slot's
    /// pre-update state as `born` instanced quads. Rotation of the roles is
    /// the caller's step, after this returns Ok.
    pub(crate) fn render(&mut self, plan: &FramePlan) -> Result<(), wgpu::SurfaceError> {
        let uniforms = Uniforms {
            pointer: plan.pointer.to_array(),
            speed: self.speed,
            time: plan.time,
            aspect: self.config.width as f32 / self.config.height as f32,
            born: plan.born,
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Update pass: read slot -> write slot.
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Update Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.update_pipeline);
            compute_pass.set_bind_group(0, &self.update_bind_groups[plan.read.index()], &[]);
            compute_pass.dispatch_workgroups(plan.born.div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        // Render pass: draw the pre-update state.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.particle_buffers[plan.read.index()].slice(..));
            render_pass.set_vertex_buffer(1, self.quad_buffer.slice(..));
            render_pass.draw(0..6, 0..plan.born);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// The surface dimensions for a window of the given inner size, or `None`
/// when the window reports a zero extent (minimized). Configuring a
/// zero-sized surface is a wgpu validation error.
fn surface_extent(size: winit::dpi::PhysicalSize<u32>) -> Option<(u32, u32)> {
    if size.width > 0 && size.height > 0 {
        Some((size.width, size.height))
    } else {
        None
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn test_surface_follows_window_inner_size() {
        assert_eq!(
            surface_extent(PhysicalSize::new(1280, 720)),
            Some((1280, 720))
        );
        assert_eq!(surface_extent(PhysicalSize::new(1, 1)), Some((1, 1)));
    }

    #[test]
    fn test_zero_extent_is_rejected() {
        assert_eq!(surface_extent(PhysicalSize::new(0, 720)), None);
        assert_eq!(surface_extent(PhysicalSize::new(1280, 0)), None);
        assert_eq!(surface_extent(PhysicalSize::new(0, 0)), None);
    }
}
