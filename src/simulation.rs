use cgmath::Vector3;

use crate::params::{EffectParams, SteeringMode};

/// Global clock the shader derives every particle's age from. It advances by
/// a fixed step per rendered frame, not by wall time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    elapsed_time: f32,
    step: f32,
}

impl SimulationClock {
    pub fn new(step: f32) -> Self {
        SimulationClock {
            elapsed_time: 0.0,
            step,
        }
    }

    pub fn starting_at(elapsed_time: f32, step: f32) -> Self {
        SimulationClock { elapsed_time, step }
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Resets to zero instead of reaching `f32::MAX`. Never negative.
    ///
    /// Also resets once adding the step no longer changes the clock (from
    /// 2^21 on for a step of 0.1).
    pub fn advance(&mut self) -> f32 {
        let next = self.elapsed_time + self.step;
        let stalled = next == self.elapsed_time;
        self.elapsed_time = if self.elapsed_time < 0.0 || stalled || !(next < f32::MAX) {
            log::debug!("Simulation clock wrapped at {}", self.elapsed_time);
            0.0
        } else {
            next
        };
        self.elapsed_time
    }
}

/// Everything the render loop owns between frames. Single writer: the render
/// loop. The GPU only ever sees copies pushed as uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub clock: SimulationClock,
    pub gravity: Vector3<f32>,
    pub emitter_position: Vector3<f32>,
}

impl SimulationState {
    pub fn new(params: &EffectParams) -> Self {
        SimulationState {
            clock: SimulationClock::new(params.time_step),
            gravity: params.steering.fixed_gravity.into(),
            emitter_position: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

/// Maps a pointer in window pixels to [-1, 1] on both axes. Both axes are
/// mirrored: the left and top edges map to +1.
pub fn normalize_pointer(pointer: [f64; 2], window_size: [u32; 2]) -> [f32; 2] {
    if window_size[0] == 0 || window_size[1] == 0 {
        return [0.0, 0.0];
    }
    let x = (pointer[0] / window_size[0] as f64 - 0.5) * -2.0;
    let y = (pointer[1] / window_size[1] as f64 - 0.5) * -2.0;
    [x as f32, y as f32]
}

/// Derives gravity and emitter updates from the normalized pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    mode: SteeringMode,
    emitter_scale: f32,
}

impl Steering {
    pub fn new(params: &EffectParams) -> Self {
        Steering {
            mode: params.steering.mode,
            emitter_scale: params.steering.emitter_scale,
        }
    }

    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    /// `None` when gravity stays at its configured constant.
    pub fn gravity(&self, pointer: [f32; 2]) -> Option<Vector3<f32>> {
        match self.mode {
            SteeringMode::Interactive => Some(Vector3::new(pointer[0], pointer[1] - 1.0, 0.0)),
            SteeringMode::Fixed => None,
        }
    }

    /// `None` leaves the emitter where it was.
    pub fn emitter_position(&self, pointer: [f32; 2], primary_held: bool) -> Option<Vector3<f32>> {
        match self.mode {
            SteeringMode::Interactive if primary_held => Some(Vector3::new(
                pointer[0] * self.emitter_scale,
                pointer[1] * self.emitter_scale,
                0.0,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_by_step() {
        let mut clock = SimulationClock::new(0.1);
        assert_eq!(clock.elapsed_time(), 0.0);
        let mut expected = 0.0f32;
        for _ in 0..100 {
            expected += 0.1;
            assert_eq!(clock.advance(), expected);
        }
    }

    #[test]
    fn clock_wraps_before_max() {
        let mut clock = SimulationClock::starting_at(f32::MAX, 0.1);
        assert_eq!(clock.advance(), 0.0);
        assert_eq!(clock.advance(), 0.1);

        // A step large enough to overflow to infinity also wraps.
        let mut clock = SimulationClock::starting_at(f32::MAX * 0.75, f32::MAX * 0.5);
        assert_eq!(clock.advance(), 0.0);
    }

    #[test]
    fn clock_below_max_does_not_wrap() {
        let start = f32::MAX * 0.5;
        let mut clock = SimulationClock::starting_at(start, f32::MAX * 0.25);
        let next = clock.advance();
        assert!(next > start);
        assert!(next < f32::MAX);
    }

    #[test]
    fn clock_wraps_when_step_is_lost() {
        let stall_point = 2f32.powi(21);
        assert_eq!(stall_point + 0.1, stall_point);

        let mut clock = SimulationClock::starting_at(stall_point, 0.1);
        assert_eq!(clock.advance(), 0.0);
        assert_eq!(clock.advance(), 0.1);

        // Just below the stall point the step still registers.
        let below = 2f32.powi(20);
        let mut clock = SimulationClock::starting_at(below, 0.1);
        assert!(clock.advance() > below);
    }

    #[test]
    fn negative_clock_resets() {
        let mut clock = SimulationClock::starting_at(-3.0, 0.1);
        assert_eq!(clock.advance(), 0.0);
    }

    #[test]
    fn pointer_normalization() {
        let size = [800, 600];
        assert_eq!(normalize_pointer([400.0, 300.0], size), [0.0, 0.0]);
        assert_eq!(normalize_pointer([0.0, 0.0], size), [1.0, 1.0]);
        assert_eq!(normalize_pointer([800.0, 600.0], size), [-1.0, -1.0]);
        assert_eq!(normalize_pointer([200.0, 450.0], size), [0.5, -0.5]);
        assert_eq!(normalize_pointer([10.0, 10.0], [0, 600]), [0.0, 0.0]);
    }

    #[test]
    fn interactive_steering() {
        let steering = Steering::new(&EffectParams::default());
        assert_eq!(steering.gravity([0.0, 0.0]), Some(Vector3::new(0.0, -1.0, 0.0)));
        assert_eq!(steering.gravity([0.5, 1.0]), Some(Vector3::new(0.5, 0.0, 0.0)));
        assert_eq!(steering.emitter_position([0.5, -0.2], false), None);
        assert_eq!(
            steering.emitter_position([0.5, -0.2], true),
            Some(Vector3::new(2.5, -1.0, 0.0))
        );
    }

    #[test]
    fn fixed_steering_ignores_pointer() {
        let mut params = EffectParams::default();
        params.steering.mode = SteeringMode::Fixed;
        let steering = Steering::new(&params);
        assert_eq!(steering.gravity([0.9, 0.9]), None);
        assert_eq!(steering.emitter_position([0.9, 0.9], true), None);

        let state = SimulationState::new(&params);
        assert_eq!(state.gravity, Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(state.emitter_position, Vector3::new(0.0, 0.0, 0.0));
    }
}
