use anyhow::Context;
use futures::executor::LocalPool;
use winit::event::{Event, WindowEvent};

use crate::frame_pacer::FramePacer;
use crate::input::InputState;
use crate::params::EffectParams;
use crate::render_loop::LoopState;

gflags::define! {
    --log_filter: &str = "warn,spout_effect=info"
}
gflags::define! {
    --config: &str = "effect_config.toml"
}
gflags::define! {
    -h, --help = false
}

// "Framework" for a windowed executable: owns the window, the GPU context and
// the event loop, and drives an effect through these callbacks.
pub trait Effect: 'static + Sized {
    fn init(
        params: &EffectParams,
        config: &wgpu::SurfaceConfiguration,
        device: &wgpu::Device,
    ) -> anyhow::Result<Self>;
    fn resize(&mut self, config: &wgpu::SurfaceConfiguration, device: &wgpu::Device);
    // Called at the update rate.
    fn update(&mut self, input: &InputState) -> LoopState;
    // Called at the render rate with the next surface texture to draw into.
    fn render(
        &mut self,
        input: &InputState,
        frame: wgpu::SurfaceTexture,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        spawner: &futures::executor::LocalSpawner,
    ) -> LoopState;
}

struct Setup {
    window: winit::window::Window,
    event_loop: winit::event_loop::EventLoop<()>,
    instance: wgpu::Instance,
    surface: wgpu::Surface,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

async fn setup(params: &EffectParams) -> anyhow::Result<Setup> {
    let event_loop = winit::event_loop::EventLoop::new();
    log::info!("Initializing the window...");
    let window = winit::window::WindowBuilder::new()
        .with_title(params.window.title.as_str())
        .with_inner_size(winit::dpi::LogicalSize::new(
            params.window.width,
            params.window.height,
        ))
        .build(&event_loop)
        .context("Failed to create the window")?;
    let size = window.inner_size();

    let backends = wgpu::util::backend_bits_from_env().unwrap_or_else(|| params.backend.to_wgpu());
    log::info!("Requesting backends {:?}", backends);
    let instance = wgpu::Instance::new(backends);
    let surface = unsafe { instance.create_surface(&window) };
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("No suitable GPU adapter found")?;
    let adapter_info = adapter.get_info();
    log::info!("Using {} ({:?})", adapter_info.name, adapter_info.backend);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            },
            None,
        )
        .await
        .context("Failed to create the device")?;

    let format = surface
        .get_preferred_format(&adapter)
        .context("Surface is incompatible with the adapter")?;
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: if params.window.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        },
    };
    surface.configure(&device, &config);

    Ok(Setup {
        window,
        event_loop,
        instance,
        surface,
        adapter,
        device,
        queue,
        config,
    })
}

fn start<E: Effect>(params: EffectParams, setup: Setup, mut effect: E) -> ! {
    let Setup {
        window,
        event_loop,
        instance,
        surface,
        adapter,
        device,
        queue,
        mut config,
    } = setup;

    let now = std::time::Instant::now();
    let mut update_pacer = FramePacer::new(params.update_rate, now);
    let mut render_pacer = FramePacer::new(params.render_rate, now);
    let mut input = InputState::new([config.width, config.height]);
    let mut local_pool = LocalPool::new();
    let spawner = local_pool.spawner();
    // The instance and adapter must outlive the surface and device. `run`
    // never returns, so this binding is never dropped.
    let _keep_alive = (instance, adapter);

    log::info!("Entering render loop...");
    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                input.handle_event(&WindowEvent::Resized(size));
                if size.width == 0 || size.height == 0 {
                    // Minimized, keep the old configuration until we are visible again.
                    return;
                }
                log::info!("Resizing to {:?}", size);
                config.width = size.width;
                config.height = size.height;
                surface.configure(&device, &config);
                effect.resize(&config, &device);
            }
            Event::WindowEvent {
                event: WindowEvent::ScaleFactorChanged { new_inner_size, .. },
                ..
            } => {
                let size = *new_inner_size;
                input.handle_event(&WindowEvent::Resized(size));
                if size.width > 0 && size.height > 0 {
                    log::info!("Scale factor changed, resizing to {:?}", size);
                    config.width = size.width;
                    config.height = size.height;
                    surface.configure(&device, &config);
                    effect.resize(&config, &device);
                }
            }
            Event::WindowEvent { event, .. } => input.handle_event(&event),
            Event::MainEventsCleared => {
                let now = std::time::Instant::now();
                if update_pacer.tick_if_due(now).is_some() {
                    if effect.update(&input) == LoopState::Exiting {
                        *control_flow = winit::event_loop::ControlFlow::Exit;
                        return;
                    }
                }
                if render_pacer.is_due(now) {
                    window.request_redraw();
                }
                let wake_at = update_pacer.next_deadline().min(render_pacer.next_deadline());
                *control_flow = winit::event_loop::ControlFlow::WaitUntil(wake_at);
            }
            Event::RedrawRequested(_) => {
                if render_pacer.tick_if_due(std::time::Instant::now()).is_none() {
                    // Expose and resize redraws don't get an extra tick.
                    log::trace!("Skipping unscheduled redraw");
                    return;
                }
                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                        log::warn!("Surface lost, reconfiguring");
                        surface.configure(&device, &config);
                        return;
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout when acquiring next surface texture");
                        return;
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory when acquiring next surface texture");
                        std::process::exit(1);
                    }
                };
                if effect.render(&input, frame, &device, &queue, &spawner) == LoopState::Exiting {
                    *control_flow = winit::event_loop::ControlFlow::Exit;
                    return;
                }
                device.poll(wgpu::Maintain::Poll);
                local_pool.run_until_stalled();
            }
            Event::LoopDestroyed => log::info!("Event loop destroyed"),
            _ => (),
        }
    })
}

/// Parses flags, initializes logging, loads the config and runs the effect
/// until it exits. Returns only on initialization failure.
pub fn run<E: Effect>() -> anyhow::Result<()> {
    gflags::parse();
    if HELP.flag {
        gflags::print_help_and_exit(0);
    }
    scrub_log::init_with_filter_string(LOG_FILTER.flag)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {:?}", e))?;

    let params = EffectParams::load_or_default(CONFIG.flag);
    let setup = futures::executor::block_on(setup(&params))?;

    log::info!("Initializing the effect...");
    let effect = E::init(&params, &setup.config, &setup.device)?;
    start(params, setup, effect)
}
