use std::{env, error::Error, fs, path::Path};

include!("src/constants.rs");

// All shader templates reside under this directory. The rendered output keeps
// the same relative path under $OUT_DIR/shaders.
static SHADER_PATH: &str = "src/shaders";

// WGSL has no implicit int to float conversion, so always print a decimal point.
fn wgsl_float(value: f32) -> String {
    format!("{:?}", value)
}

fn shader_context() -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("age_period", &wgsl_float(AGE_PERIOD));
    context.insert("gravity_scale", &wgsl_float(GRAVITY_SCALE));
    context.insert("red_fade_age", &wgsl_float(RED_FADE_AGE));
    context.insert("green_fade_age", &wgsl_float(GREEN_FADE_AGE));
    context.insert("blue_fade_age", &wgsl_float(BLUE_FADE_AGE));
    context.insert("alpha_fade_age", &wgsl_float(ALPHA_FADE_AGE));
    context.insert("blue_base", &wgsl_float(BLUE_BASE));
    context
}

fn generate_shaders() -> std::result::Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={}", SHADER_PATH);
    println!("cargo:rerun-if-changed=src/constants.rs");
    let tera = tera::Tera::new(&format!("{}/**/*.wgsl", SHADER_PATH))?;
    let context = shader_context();
    let output_dir = Path::new(&env::var("OUT_DIR")?).join("shaders");
    fs::create_dir_all(&output_dir)?;
    for entry in walkdir::WalkDir::new(SHADER_PATH)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("wgsl") {
            continue;
        }
        let template_name = path
            .strip_prefix(SHADER_PATH)?
            .to_string_lossy()
            .replace('\\', "/");
        let rendered = tera.render(&template_name, &context)?;
        let output_path = output_dir.join(&template_name);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, rendered)?;
        println!("cargo:rerun-if-changed={}", path.display());
    }
    Ok(())
}

fn main() {
    if let Err(err) = generate_shaders() {
        // panic here for a nicer error message, otherwise it will
        // be flattened to one line for some reason
        panic!("Unable to generate shaders\n{}", err);
    }
}
