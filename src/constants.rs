// Fixed coefficients of the particle motion and color model.
//
// This file is also pulled into build.rs with `include!`, which substitutes
// the values into the shader template, so it must stay free of crate imports.

/// Particle age wraps back to zero after this many clock units.
pub const AGE_PERIOD: f32 = 10.0;

/// Scale applied to the gravity term: `GRAVITY_SCALE * gravity * age^2`.
pub const GRAVITY_SCALE: f32 = 0.2;

/// Age at which each color channel reaches zero (blue starts at `BLUE_BASE`).
pub const RED_FADE_AGE: f32 = 15.0;
pub const GREEN_FADE_AGE: f32 = 4.0;
pub const BLUE_FADE_AGE: f32 = 4.0;
pub const ALPHA_FADE_AGE: f32 = 8.0;
pub const BLUE_BASE: f32 = 0.4;
