use serde::{Deserialize, Serialize};

use crate::geometry::OffsetRange;

// Parameters that define the effect. These don't change at runtime.
// Plain values come before tables, toml refuses to serialize them otherwise.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EffectParams {
    pub update_rate: f64,
    pub render_rate: f64,
    pub backend: Backend,
    // Clock units added per rendered frame.
    pub time_step: f32,

    pub window: WindowParams,
    pub particles: ParticleParams,
    pub steering: SteeringParams,
    pub camera: CameraParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowParams {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            title: String::from("Left Click to change emitter position"),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ParticleParams {
    pub count: u32,
    pub spawn_step: f32,
    // Falls back to the steering mode's default when absent.
    pub point_size: Option<f32>,
    // Absent means seeded from entropy.
    pub seed: Option<u64>,
}

impl Default for ParticleParams {
    fn default() -> Self {
        ParticleParams {
            count: 2000,
            spawn_step: 0.005,
            point_size: None,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SteeringMode {
    /// Pointer steers gravity, holding the primary button moves the emitter.
    Interactive,
    /// Constant gravity, emitter pinned at the origin.
    Fixed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SteeringParams {
    pub mode: SteeringMode,
    pub emitter_scale: f32,
    pub fixed_gravity: [f32; 3],
    pub offset_range: Option<OffsetRange>,
}

impl Default for SteeringParams {
    fn default() -> Self {
        SteeringParams {
            mode: SteeringMode::Interactive,
            emitter_scale: 5.0,
            fixed_gravity: [0.0, -1.0, 0.0],
            offset_range: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CameraParams {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraParams {
            eye: [-5.0, 0.0, -5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_radians: 0.7,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Primary,
    Gl,
    Vulkan,
    Metal,
    Dx12,
}

impl Backend {
    pub fn to_wgpu(self) -> wgpu::Backends {
        match self {
            Backend::Primary => wgpu::Backends::PRIMARY,
            Backend::Gl => wgpu::Backends::GL,
            Backend::Vulkan => wgpu::Backends::VULKAN,
            Backend::Metal => wgpu::Backends::METAL,
            Backend::Dx12 => wgpu::Backends::DX12,
        }
    }
}

impl std::str::FromStr for EffectParams {
    type Err = toml::de::Error;
    fn from_str(serialized: &str) -> Result<Self, Self::Err> {
        let params = toml::from_str(serialized)?;
        Ok(params)
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        EffectParams {
            update_rate: 30.0,
            render_rate: 30.0,
            backend: Backend::Primary,
            time_step: 0.1,
            window: WindowParams::default(),
            particles: ParticleParams::default(),
            steering: SteeringParams::default(),
            camera: CameraParams::default(),
        }
    }
}

// Slowest accepted update or render rate, in calls per second.
const MIN_RATE: f64 = 1e-3;

impl EffectParams {
    #[cfg(test)]
    pub fn from_default_file() -> Self {
        let config_data = include_str!("../effect_config.toml");
        match config_data.parse() {
            Ok(params) => params,
            Err(e) => {
                log::error!(
                    "Failed to parse config file({}): {:?}",
                    "../effect_config.toml",
                    e
                );
                EffectParams::default()
            }
        }
    }

    pub fn read_from_file(path: &str) -> anyhow::Result<Self> {
        let params: EffectParams = std::fs::read_to_string(path)?.parse()?;
        params.validate()?;
        Ok(params)
    }

    // Config problems are never fatal, the effect runs with defaults instead.
    pub fn load_or_default(path: &str) -> Self {
        match EffectParams::read_from_file(path) {
            Ok(params) => {
                log::debug!("Loaded config from {}: {:?}", path, params);
                params
            }
            Err(e) => {
                log::error!("Failed to load config file({}): {:?}", path, e);
                EffectParams::default()
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let rate_ok = |rate: f64| rate >= MIN_RATE && rate.is_finite();
        if !(rate_ok(self.update_rate) && rate_ok(self.render_rate)) {
            anyhow::bail!(
                "update_rate and render_rate must be finite and at least {}, got {} and {}",
                MIN_RATE,
                self.update_rate,
                self.render_rate
            );
        }
        if !(self.time_step > 0.0) {
            anyhow::bail!("time_step must be positive, got {}", self.time_step);
        }
        if self.particles.count == 0 {
            anyhow::bail!("particles.count must be at least 1");
        }
        if !(self.particles.spawn_step >= 0.0) {
            anyhow::bail!(
                "particles.spawn_step must not be negative, got {}",
                self.particles.spawn_step
            );
        }
        if !(self.point_size() > 0.0) {
            anyhow::bail!("particles.point_size must be positive");
        }
        if self.window.width == 0 || self.window.height == 0 {
            anyhow::bail!(
                "window size must be non-zero, got {}x{}",
                self.window.width,
                self.window.height
            );
        }
        if !self.offset_range().is_valid() {
            anyhow::bail!("invalid offset range: {:?}", self.offset_range());
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            anyhow::bail!(
                "camera clip planes must satisfy 0 < near < far, got {} and {}",
                self.camera.near,
                self.camera.far
            );
        }
        Ok(())
    }

    pub fn offset_range(&self) -> OffsetRange {
        match (self.steering.offset_range, self.steering.mode) {
            (Some(range), _) => range,
            (None, SteeringMode::Interactive) => OffsetRange::INTERACTIVE,
            (None, SteeringMode::Fixed) => OffsetRange::BASELINE,
        }
    }

    pub fn point_size(&self) -> f32 {
        match (self.particles.point_size, self.steering.mode) {
            (Some(size), _) => size,
            (None, SteeringMode::Interactive) => 3.0,
            (None, SteeringMode::Fixed) => 4.0,
        }
    }
}
