use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Box that initial offsets are drawn from, inclusive on both ends.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct OffsetRange {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl OffsetRange {
    /// Straight up with a wide horizontal spread.
    pub const BASELINE: OffsetRange = OffsetRange {
        min: [-0.5, 1.0, -0.5],
        max: [0.5, 1.0, 0.5],
    };
    /// Narrower spread with some variation in upward speed.
    pub const INTERACTIVE: OffsetRange = OffsetRange {
        min: [-0.3, 0.7, -0.3],
        max: [0.3, 1.0, 0.3],
    };

    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| {
            self.min[axis].is_finite()
                && self.max[axis].is_finite()
                && self.min[axis] <= self.max[axis]
        })
    }
}

// Offsets are drawn on a grid of hundredths of a unit.
const OFFSET_STEPS_PER_UNIT: f32 = 100.0;

/// Per-particle attributes, generated once and uploaded as two parallel
/// immutable vertex buffers. A particle is identified only by its index.
#[derive(Debug, Clone)]
pub struct ParticleGeometry {
    pub offsets: Vec<[f32; 3]>,
    pub spawn_times: Vec<f32>,
}

impl ParticleGeometry {
    pub fn generate<R: Rng>(
        count: u32,
        spawn_step: f32,
        range: &OffsetRange,
        rng: &mut R,
    ) -> Self {
        let offsets = (0..count)
            .map(|_| {
                [
                    sample_axis(range.min[0], range.max[0], rng),
                    sample_axis(range.min[1], range.max[1], rng),
                    sample_axis(range.min[2], range.max[2], rng),
                ]
            })
            .collect();
        let spawn_times = (0..count).map(|i| spawn_time(i, spawn_step)).collect();
        ParticleGeometry {
            offsets,
            spawn_times,
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.spawn_times.len() as u32
    }
}

/// Spawn stamps are a multiple of the index so births stagger evenly over
/// the age cycle.
pub fn spawn_time(index: u32, spawn_step: f32) -> f32 {
    index as f32 * spawn_step
}

pub fn make_rng(seed: Option<u64>) -> rand::rngs::StdRng {
    match seed {
        Some(seed) => {
            log::info!("Seeding particle generator with {}", seed);
            rand::rngs::StdRng::seed_from_u64(seed)
        }
        None => rand::rngs::StdRng::from_entropy(),
    }
}

fn sample_axis<R: Rng>(min: f32, max: f32, rng: &mut R) -> f32 {
    let low = (min * OFFSET_STEPS_PER_UNIT).round() as i32;
    let high = (max * OFFSET_STEPS_PER_UNIT).round() as i32;
    rng.gen_range(low..=high) as f32 / OFFSET_STEPS_PER_UNIT
}
