use log::{error, info};
use spout_effect::camera::Camera;
use spout_effect::framework;
use spout_effect::geometry::{make_rng, ParticleGeometry};
use spout_effect::input::InputState;
use spout_effect::params::EffectParams;
use spout_effect::particle_renderer::ParticleRenderer;
use spout_effect::render_loop::{LoopState, RenderLoop};

struct ParticleEffect {
    render_loop: RenderLoop,
    renderer: ParticleRenderer,
    camera: Camera,
}

impl framework::Effect for ParticleEffect {
    fn init(
        params: &EffectParams,
        config: &wgpu::SurfaceConfiguration,
        device: &wgpu::Device,
    ) -> anyhow::Result<Self> {
        let mut rng = make_rng(params.particles.seed);
        let geometry = ParticleGeometry::generate(
            params.particles.count,
            params.particles.spawn_step,
            &params.offset_range(),
            &mut rng,
        );
        let camera = Camera::from_params(&params.camera, (config.width, config.height));
        let render_loop = RenderLoop::new(params);
        let renderer = ParticleRenderer::init(
            device,
            config,
            &geometry,
            &camera,
            render_loop.simulation(),
            params.point_size(),
        )?;
        info!(
            "Steering mode {:?}, {} particles",
            render_loop.steering().mode(),
            geometry.particle_count()
        );
        Ok(ParticleEffect {
            render_loop,
            renderer,
            camera,
        })
    }

    fn resize(&mut self, config: &wgpu::SurfaceConfiguration, device: &wgpu::Device) {
        self.camera.resize(config.width, config.height);
        self.renderer.resize(device, config, &self.camera);
    }

    fn update(&mut self, input: &InputState) -> LoopState {
        self.render_loop.observe(input)
    }

    fn render(
        &mut self,
        input: &InputState,
        frame: wgpu::SurfaceTexture,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spawner: &futures::executor::LocalSpawner,
    ) -> LoopState {
        let state = {
            let mut target = self.renderer.begin_frame(device, queue, frame);
            self.render_loop.tick(input, &mut target)
        };
        self.renderer.after_queue_submission(spawner);
        state
    }
}

fn main() {
    if let Err(e) = framework::run::<ParticleEffect>() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}
