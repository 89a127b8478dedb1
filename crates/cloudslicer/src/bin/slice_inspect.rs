//! # Slice Inspector
//!
//! Voxelizes a scene, cuts every plane through the grid and prints ASCII
//! dumps of the results. The cloud pack is loaded before and saved after,
//! so a second run is served from the cache.
//!
//! Usage:
//!
//! ```text
//! slice_inspect [scene.toml] [--pack <file>] [--no-save] [--grid]
//! ```
//!
//! Without a scene file `scene.toml` in the working directory is used, or
//! the built-in demo scene if that does not exist either.
//!
//! Log level is controlled by `RUST_LOG` (default `cloudslicer=info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloudslicer::{AppError, AppResult, SceneConfig};
use cloudslicer_core::{
    grid_to_ascii, slice_to_ascii, values_to_ascii, CloudCache, CloudError, Slicer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Parsed command line.
struct Args {
    scene: Option<PathBuf>,
    pack: Option<PathBuf>,
    save: bool,
    print_grid: bool,
}

fn parse_args() -> AppResult<Args> {
    let mut args = Args {
        scene: None,
        pack: None,
        save: true,
        print_grid: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pack" => {
                let path = iter
                    .next()
                    .ok_or_else(|| AppError::Usage("--pack needs a file name".into()))?;
                args.pack = Some(PathBuf::from(path));
            }
            "--no-save" => args.save = false,
            "--grid" => args.print_grid = true,
            flag if flag.starts_with("--") => {
                return Err(AppError::Usage(format!(
                    "unknown flag {flag}\nusage: slice_inspect [scene.toml] [--pack <file>] [--no-save] [--grid]"
                )));
            }
            path => args.scene = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn load_scene(path: Option<&Path>) -> AppResult<SceneConfig> {
    match path {
        Some(path) => {
            info!("Loading scene from {:?}", path);
            SceneConfig::load(path)
        }
        None if Path::new("scene.toml").exists() => {
            info!("Loading scene from scene.toml");
            SceneConfig::load(Path::new("scene.toml"))
        }
        None => {
            info!("Using built-in demo scene");
            Ok(SceneConfig::demo())
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cloudslicer=info")),
        )
        .init();

    let args = parse_args()?;
    let mut scene = load_scene(args.scene.as_deref())?;
    if let Some(pack) = args.pack {
        scene.slicer.pack_path = pack;
    }

    let world = scene.build_scene();
    info!(
        "Scene: {} shapes, {} planes, cloud {:?}",
        world.len(),
        scene.planes.len(),
        scene.slicer.cloud_tag
    );

    let mut slicer = Slicer::new(scene.slicer.clone())?;
    slicer.attach_world(Arc::new(world));

    let mut cache = CloudCache::new();
    match slicer.load_cache(&mut cache) {
        Ok(()) => {}
        Err(CloudError::NotFound(path)) => info!("No pack at {}, starting empty", path.display()),
        Err(err) => warn!("Ignoring unreadable pack: {}", err),
    }

    let cloud_box = scene.cloud_box();
    let grid = slicer.generate_or_load_point_cloud(
        &mut cache,
        cloud_box.center,
        cloud_box.extent,
        scene.density(),
    )?;
    println!(
        "cloud {:?}: {} of {} points occupied",
        slicer.cloud_tag(),
        grid.occupied_count(),
        grid.len()
    );
    if args.print_grid {
        print!("{}", grid_to_ascii(&grid));
    }

    for (tag, request) in scene.slice_requests() {
        let slice = slicer.calculate_or_load_slice(&mut cache, &request, &tag)?;
        println!(
            "\nslice {:?} ({}x{}):",
            tag,
            slice.width(),
            slice.height()
        );
        print!("{}", slice_to_ascii(&slice));

        match slicer.stage_slice(&cache, &tag) {
            Ok(canvas) => println!(
                "staged {} of {} canvas pixels; canvas view:\n{}",
                canvas.len(),
                canvas.capacity(),
                values_to_ascii(canvas.as_slice())
            ),
            Err(err) => warn!("Slice {:?} not staged: {}", tag, err),
        }
    }

    if args.save {
        slicer.save_cache(&cache)?;
    }
    Ok(())
}
