//! Host-side evaluation of the per-particle model that the vertex shader runs.
//!
//! The frame path never calls into this module: every particle is evaluated on
//! the GPU. These functions mirror `shaders/particles.wgsl` term for term so the
//! model can be checked without a device.

use cgmath::{Matrix4, Vector3, Vector4};

use crate::constants::{
    AGE_PERIOD, ALPHA_FADE_AGE, BLUE_BASE, BLUE_FADE_AGE, GRAVITY_SCALE, GREEN_FADE_AGE,
    RED_FADE_AGE,
};

/// Age of a particle at the given clock value, in `[0, AGE_PERIOD)`.
/// Particles that have not spawned yet sit at age zero.
pub fn particle_age(elapsed_time: f32, spawn_time: f32) -> f32 {
    (elapsed_time - spawn_time).max(0.0) % AGE_PERIOD
}

pub fn particle_position(
    age: f32,
    offset: Vector3<f32>,
    gravity: Vector3<f32>,
    emitter_position: Vector3<f32>,
) -> Vector3<f32> {
    emitter_position + offset * age + GRAVITY_SCALE * gravity * age * age
}

/// Unclamped: channels go negative as the particle ages.
pub fn particle_color(age: f32) -> Vector4<f32> {
    Vector4::new(
        1.0 - age / RED_FADE_AGE,
        1.0 - age / GREEN_FADE_AGE,
        BLUE_BASE - age / BLUE_FADE_AGE,
        1.0 - age / ALPHA_FADE_AGE,
    )
}

pub fn clip_position(
    projection: &Matrix4<f32>,
    modelview: &Matrix4<f32>,
    position: Vector3<f32>,
) -> Vector4<f32> {
    projection * modelview * position.extend(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn age_stays_in_cycle() {
        let clocks = [0.0, 0.05, 3.3, 9.999, 10.0, 10.005, 57.25, 1234.5];
        let spawns = [0.0, 0.005, 2.5, 9.995, 20.0];
        for &elapsed in clocks.iter() {
            for &spawn in spawns.iter() {
                let age = particle_age(elapsed, spawn);
                assert!(age >= 0.0 && age < AGE_PERIOD, "{} {} {}", elapsed, spawn, age);
            }
        }
    }

    #[test]
    fn unborn_particles_have_zero_age() {
        assert_eq!(particle_age(1.0, 5.0), 0.0);
        assert_eq!(particle_age(0.0, 0.005), 0.0);
    }

    #[test]
    fn age_wraps() {
        assert_close(particle_age(12.5, 0.0), 2.5);
        assert_close(particle_age(25.0, 1.0), 4.0);
        assert_eq!(particle_age(10.0, 0.0), 0.0);
    }

    #[test]
    fn no_displacement_at_birth() {
        let emitter = Vector3::new(1.5, -2.0, 0.25);
        let position = particle_position(
            0.0,
            Vector3::new(0.3, 0.9, -0.1),
            Vector3::new(0.4, -1.0, 0.0),
            emitter,
        );
        assert_eq!(position, emitter);
    }

    #[test]
    fn position_is_pure() {
        let args = (
            3.25,
            Vector3::new(0.1, 0.8, 0.2),
            Vector3::new(-0.5, -1.2, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        );
        let a = particle_position(args.0, args.1, args.2, args.3);
        let b = particle_position(args.0, args.1, args.2, args.3);
        assert_eq!(a, b);
    }

    #[test]
    fn four_particle_scenario() {
        let spawn_times = [0.0, 0.005, 0.01, 0.015];
        let offset = Vector3::new(1.0, 0.0, 0.0);
        let gravity = Vector3::new(0.0, -1.0, 0.0);
        let emitter = Vector3::new(0.0, 0.0, 0.0);
        for &spawn in spawn_times.iter() {
            let age = particle_age(5.0, spawn);
            assert_close(age, 5.0 - spawn);
            let position = particle_position(age, offset, gravity, emitter);
            assert_close(position.x, age);
            assert_close(position.y, -0.2 * age * age);
            assert_close(position.z, 0.0);
        }
    }

    #[test]
    fn color_fades_without_clamping() {
        assert_eq!(particle_color(0.0), Vector4::new(1.0, 1.0, 0.4, 1.0));
        let old = particle_color(9.0);
        assert_close(old.x, 0.4);
        assert_close(old.y, -1.25);
        assert_close(old.z, -1.85);
        assert_close(old.w, -0.125);
    }

    #[test]
    fn identity_transform() {
        let identity = Matrix4::identity();
        let clip = clip_position(&identity, &identity, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(clip, Vector4::new(1.0, 2.0, 3.0, 1.0));
    }
}
