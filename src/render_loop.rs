use cgmath::Vector3;
use log::{info, trace};

use crate::input::InputState;
use crate::params::EffectParams;
use crate::simulation::{SimulationState, Steering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    // Terminal.
    Exiting,
}

/// Receives one tick's uniform updates followed by its draw and present.
/// Implementations must apply every update issued before `draw_particles`
/// to that draw.
pub trait FrameTarget {
    fn set_gravity(&mut self, gravity: Vector3<f32>);
    fn set_emitter_position(&mut self, position: Vector3<f32>);
    fn set_elapsed_time(&mut self, elapsed_time: f32);
    fn draw_particles(&mut self, particle_count: u32);
    fn present(&mut self);
}

/// Per-frame orchestration: reads input, derives the uniforms, draws.
pub struct RenderLoop {
    state: LoopState,
    simulation: SimulationState,
    steering: Steering,
    particle_count: u32,
}

impl RenderLoop {
    pub fn new(params: &EffectParams) -> Self {
        RenderLoop {
            state: LoopState::Running,
            simulation: SimulationState::new(params),
            steering: Steering::new(params),
            particle_count: params.particles.count,
        }
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn steering(&self) -> &Steering {
        &self.steering
    }

    /// Checks for a quit request without touching the simulation.
    pub fn observe(&mut self, input: &InputState) -> LoopState {
        if self.state == LoopState::Running && input.quit {
            info!(
                "Exiting at clock {}",
                self.simulation.clock.elapsed_time()
            );
            self.state = LoopState::Exiting;
        }
        self.state
    }

    /// Runs one frame. Nothing reaches `target` once the loop is exiting.
    pub fn tick<T: FrameTarget>(&mut self, input: &InputState, target: &mut T) -> LoopState {
        if self.observe(input) == LoopState::Exiting {
            return LoopState::Exiting;
        }
        let pointer = input.normalized_pointer();

        if let Some(gravity) = self.steering.gravity(pointer) {
            self.simulation.gravity = gravity;
            target.set_gravity(gravity);
        }
        if let Some(position) = self
            .steering
            .emitter_position(pointer, input.primary_button)
        {
            self.simulation.emitter_position = position;
            target.set_emitter_position(position);
        }
        let elapsed_time = self.simulation.clock.advance();
        target.set_elapsed_time(elapsed_time);
        trace!(
            "Tick: clock {}, gravity {:?}, emitter {:?}",
            elapsed_time,
            self.simulation.gravity,
            self.simulation.emitter_position
        );

        target.draw_particles(self.particle_count);
        target.present();
        LoopState::Running
    }
}
