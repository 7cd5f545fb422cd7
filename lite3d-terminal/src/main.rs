/// lite3d - spinning meshes in the terminal
///
/// Controls:
///   - 1-9, 0: Select a model
///   - F / V: Cycle fill / view style
///   - Space or `: Pause, S: Step one frame
///   - R: Reset, C: Re-centre
///   - +/- : Zoom, Up/Down: Speed, Left/Right: Tilt the rotation axis
///   - Q/ESC: Quit
use clap::Parser;
use lite3d_core::{FillStyle, MeshLibrary, MeshSource, RendererConfig, ViewStyle};
use lite3d_terminal::{describe_models, to_io, TerminalApp};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lite3d")]
#[command(about = "Software 3-D mesh renderer for the terminal", long_about = None)]
struct Args {
    /// Model to show first
    #[arg(short, long, default_value = "cube")]
    model: String,

    /// Wavefront OBJ file to add to the model list (repeatable)
    #[arg(long = "obj", value_name = "PATH")]
    obj: Vec<PathBuf>,

    /// Rotation speed (0-10)
    #[arg(short, long, default_value_t = 5.0)]
    speed: f64,

    /// Rotation axis weights, each within ±100
    #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [33.0, 33.0, 33.0], allow_negative_numbers = true)]
    axis: Vec<f64>,

    /// Pixel grid cell size for the pixelated view (2-20)
    #[arg(long, default_value_t = 2.0)]
    pixel_grid: f64,

    /// Fill style: solid, wireframe-full or wireframe-cull
    #[arg(long, default_value_t = FillStyle::Solid)]
    fill: FillStyle,

    /// View style: polygonal or pixelated
    #[arg(long, default_value_t = ViewStyle::Polygonal)]
    view: ViewStyle,

    /// Start paused (space resumes)
    #[arg(long)]
    paused: bool,

    /// List the available models and exit
    #[arg(long)]
    list: bool,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut library = MeshLibrary::with_presets();
    for path in &args.obj {
        let text = fs::read_to_string(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read OBJ file {}: {}", path.display(), e),
            )
        })?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        let name = library.load_obj(stem, &text).map_err(to_io)?;
        log::info!("loaded {} as `{}`", path.display(), name);
    }

    if args.list {
        println!("{}", describe_models(&library));
        return Ok(());
    }

    if library.mesh(&args.model).is_none() {
        eprintln!("Unknown model `{}`. Available:", args.model);
        eprintln!("{}", describe_models(&library));
        return Err(io::Error::new(io::ErrorKind::NotFound, "unknown model"));
    }

    let config = RendererConfig {
        model: args.model,
        rotation_speed: args.speed,
        rotation_axis: [args.axis[0], args.axis[1], args.axis[2]],
        pixel_grid_size: args.pixel_grid,
        style: lite3d_core::RenderStyle::new(args.fill, args.view),
        paused: args.paused,
        ..Default::default()
    };
    config.validate().map_err(to_io)?;

    // Run the terminal app
    let mut app = TerminalApp::new(library, config)?;
    app.run()?;

    println!("Thank you for using lite3d!");
    Ok(())
}
