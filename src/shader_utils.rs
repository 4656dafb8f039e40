use std::borrow::Cow;

// Include a shader rendered by build.rs by specifying a path relative to the
// shader source directory.
#[macro_export]
macro_rules! include_shader {
    ($path:literal) => {
        include_str!(concat!(env!("OUT_DIR"), "/shaders/", $path))
    };
}

/// Runs `create` inside a validation error scope. Any validation error raised
/// while it runs comes back as `Err` instead of reaching the device's
/// uncaptured error handler.
pub fn checked<T>(
    device: &wgpu::Device,
    what: &str,
    create: impl FnOnce() -> T,
) -> anyhow::Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match futures::executor::block_on(device.pop_error_scope()) {
        Some(error) => Err(anyhow::anyhow!("{} failed: {}", what, error)),
        None => Ok(value),
    }
}

pub fn create_wgsl_module(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
) -> anyhow::Result<wgpu::ShaderModule> {
    checked(device, label, || {
        device.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        })
    })
}

// Parses and validates WGSL the same way the device does at module creation.
#[cfg(test)]
pub(crate) fn validated_module(source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => {
            e.emit_to_stderr(source);
            panic!("WGSL failed to parse");
        }
    };
    if let Err(e) = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    {
        panic!("WGSL failed validation: {:?}", e);
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        AGE_PERIOD, ALPHA_FADE_AGE, BLUE_BASE, BLUE_FADE_AGE, GRAVITY_SCALE, GREEN_FADE_AGE,
        RED_FADE_AGE,
    };

    #[test]
    fn particle_shader_is_rendered() {
        let source = include_shader!("particles.wgsl");
        assert!(!source.contains("{{"), "unrendered template tag");
        assert!(source.contains("max(uniforms.elapsed_time - spawn_time, 0.0)"));
        assert!(source.contains(&format!("age % {:?}", AGE_PERIOD)));
        assert!(source.contains(&format!("{:?} * uniforms.gravity * age * age", GRAVITY_SCALE)));
        assert!(source.contains("uniforms.emitter_position\n        + initial_offset * age"));
        for color in [
            format!("1.0 - age / {:?}", RED_FADE_AGE),
            format!("1.0 - age / {:?}", GREEN_FADE_AGE),
            format!("{:?} - age / {:?}", BLUE_BASE, BLUE_FADE_AGE),
            format!("1.0 - age / {:?}", ALPHA_FADE_AGE),
        ]
        .iter()
        {
            assert!(source.contains(color.as_str()), "missing color term {}", color);
        }
    }

    #[test]
    fn particle_shader_validates() {
        let module = validated_module(include_shader!("particles.wgsl"));
        let stages: Vec<(&str, naga::ShaderStage)> = module
            .entry_points
            .iter()
            .map(|entry| (entry.name.as_str(), entry.stage))
            .collect();
        assert_eq!(
            stages,
            vec![
                ("vs_main", naga::ShaderStage::Vertex),
                ("fs_main", naga::ShaderStage::Fragment),
            ]
        );
    }
}
