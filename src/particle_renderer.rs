use anyhow::Context;
use cgmath::Vector3;

use crate::buffer_util::{make_depth_view, make_uniform_buffer, make_vertex_buffer, SizedBuffer};
use crate::camera::Camera;
use crate::geometry::ParticleGeometry;
use crate::render_loop::FrameTarget;
use crate::simulation::SimulationState;

// This should match the Uniforms struct in particles.wgsl, including the
// 16 byte alignment of the vec3 members.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniforms {
    pub projection: [[f32; 4]; 4],
    pub modelview: [[f32; 4]; 4],
    pub gravity: [f32; 3],
    pub elapsed_time: f32,
    pub emitter_position: [f32; 3],
    pub point_size: f32,
    pub viewport_size: [f32; 2],
    pub _padding: [f32; 2],
}

impl ParticleUniforms {
    pub fn new(camera: &Camera, simulation: &SimulationState, point_size: f32) -> Self {
        ParticleUniforms {
            projection: camera.projection_matrix().into(),
            modelview: camera.modelview_matrix().into(),
            gravity: simulation.gravity.into(),
            elapsed_time: simulation.clock.elapsed_time(),
            emitter_position: simulation.emitter_position.into(),
            point_size,
            viewport_size: [camera.screen_size.0 as f32, camera.screen_size.1 as f32],
            _padding: [0.0; 2],
        }
    }

    pub fn set_camera(&mut self, camera: &Camera) {
        self.projection = camera.projection_matrix().into();
        self.modelview = camera.modelview_matrix().into();
        self.viewport_size = [camera.screen_size.0 as f32, camera.screen_size.1 as f32];
    }
}

const OFFSET_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const SPAWN_TIME_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32];

// Each particle is drawn as a 4 vertex triangle strip, one instance per particle.
const VERTICES_PER_PARTICLE: u32 = 4;

/// Owns the GPU side of the effect: the two immutable attribute buffers, the
/// uniform buffer and the pipeline that evaluates the particle model.
pub struct ParticleRenderer {
    uniforms: ParticleUniforms,
    particle_count: u32,

    // GPU interface cruft
    offset_buffer: SizedBuffer,
    spawn_time_buffer: SizedBuffer,
    uniform_buffer: SizedBuffer,
    uniform_size: wgpu::BufferSize,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    staging_belt: wgpu::util::StagingBelt,
}

impl ParticleRenderer {
    pub fn init(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        geometry: &ParticleGeometry,
        camera: &Camera,
        simulation: &SimulationState,
        point_size: f32,
    ) -> anyhow::Result<Self> {
        log::info!("Uploading {} particles", geometry.particle_count());
        let offset_buffer = make_vertex_buffer(device, "Particle offsets", &geometry.offsets);
        let spawn_time_buffer =
            make_vertex_buffer(device, "Particle spawn times", &geometry.spawn_times);

        let uniforms = ParticleUniforms::new(camera, simulation, point_size);
        let uniform_buffer = make_uniform_buffer(device, "Particle uniforms", &uniforms);
        let uniform_size = wgpu::BufferSize::new(uniform_buffer.size)
            .context("Particle uniform buffer is empty")?;

        let shader = crate::shader_utils::create_wgsl_module(
            device,
            "Particle shader",
            crate::include_shader!("particles.wgsl"),
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle bind group layout"),
            entries: &[
                // Uniform inputs
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(uniform_size),
                    },
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Offsets and spawn times live in separate buffers, both stepped per instance.
        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &OFFSET_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &SPAWN_TIME_ATTRIBUTES,
            },
        ];

        let pipeline = crate::shader_utils::checked(device, "Particle pipeline", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Particle pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vertex_buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    }],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: crate::buffer_util::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        let depth_view = make_depth_view(device, config.width, config.height);
        let staging_belt = wgpu::util::StagingBelt::new(uniform_buffer.size);

        Ok(ParticleRenderer {
            uniforms,
            particle_count: geometry.particle_count(),
            offset_buffer,
            spawn_time_buffer,
            uniform_buffer,
            uniform_size,
            bind_group,
            pipeline,
            depth_view,
            staging_belt,
        })
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera: &Camera,
    ) {
        self.uniforms.set_camera(camera);
        self.depth_view = make_depth_view(device, config.width, config.height);
    }

    pub fn begin_frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_texture: wgpu::SurfaceTexture,
    ) -> ParticleFrame<'a> {
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        ParticleFrame {
            renderer: self,
            device,
            queue,
            surface_texture: Some(surface_texture),
            view,
            encoder: None,
        }
    }

    // Hands the staging belt's in-flight chunks back once the GPU is done with them.
    pub fn after_queue_submission(&mut self, spawner: &impl futures::task::LocalSpawn) {
        use futures::task::LocalSpawnExt;
        let belt_future = self.staging_belt.recall();
        if let Err(e) = spawner.spawn_local(belt_future) {
            log::error!("Failed to recall staging belt: {:?}", e);
        }
    }
}

/// One frame of the effect. Uniform updates accumulate on the CPU copy and
/// are copied into the uniform buffer ahead of the draw, inside the same
/// command encoder.
pub struct ParticleFrame<'a> {
    renderer: &'a mut ParticleRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
    encoder: Option<wgpu::CommandEncoder>,
}

impl<'a> FrameTarget for ParticleFrame<'a> {
    fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.renderer.uniforms.gravity = gravity.into();
    }

    fn set_emitter_position(&mut self, position: Vector3<f32>) {
        self.renderer.uniforms.emitter_position = position.into();
    }

    fn set_elapsed_time(&mut self, elapsed_time: f32) {
        self.renderer.uniforms.elapsed_time = elapsed_time;
    }

    fn draw_particles(&mut self, particle_count: u32) {
        let device = self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle frame"),
            })
        });
        let renderer = &mut *self.renderer;

        // Update uniforms
        renderer
            .staging_belt
            .write_buffer(
                encoder,
                &renderer.uniform_buffer.buffer,
                0,
                renderer.uniform_size,
                device,
            )
            .copy_from_slice(bytemuck::bytes_of(&renderer.uniforms));

        let instances = particle_count.min(renderer.particle_count);
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particles"),
            color_attachments: &[wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            }],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &renderer.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: true,
                }),
                stencil_ops: None,
            }),
        });
        rpass.set_pipeline(&renderer.pipeline);
        rpass.set_bind_group(0, &renderer.bind_group, &[]);
        rpass.set_vertex_buffer(0, renderer.offset_buffer.buffer.slice(..));
        rpass.set_vertex_buffer(1, renderer.spawn_time_buffer.buffer.slice(..));
        log::trace!("Drawing {} particles", instances);
        rpass.draw(0..VERTICES_PER_PARTICLE, 0..instances);
    }

    fn present(&mut self) {
        self.renderer.staging_belt.finish();
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        if let Some(surface_texture) = self.surface_texture.take() {
            surface_texture.present();
        }
    }
}
