pub mod buffer_util;
pub mod camera;
pub mod constants;
pub mod frame_pacer;
pub mod framework;
pub mod geometry;
pub mod input;
pub mod motion;
pub mod params;
pub mod particle_renderer;
pub mod render_loop;
pub mod shader_utils;
pub mod simulation;
