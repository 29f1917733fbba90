use anyhow::Context;
use bsp_ambient_light::*;
use clap::Parser;
use collision::{BrushWorld, CollisionWorld};
use config::LightingConfig;
use level::{BakedLeaf, BakedLevel, LevelData};
use log::{debug, error, info, warn};
use manager::AmbientLightingManager;
use math::{Vec3, AABB};
use simplelog::{LevelFilter, SimpleLogger};
use std::path::PathBuf;
use std::sync::Arc;
use types::{ObjectId, Transform};
use vmf_forge::prelude::VmfFile;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input VMF file (entities and brushes)
    #[arg(short, long)]
    input: PathBuf,

    /// Baked level sidecar (JSON): leaves, visibility, ambient samples, cubemaps.
    /// Without it the whole map is treated as one visible leaf
    #[arg(long)]
    level: Option<PathBuf>,

    /// Directory with raw lump files overriding the sidecar's baked arrays
    #[arg(long)]
    lump_dir: Option<PathBuf>,

    /// Lighting config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable cross-frame light and ambient averaging
    #[arg(long, default_value_t = false)]
    no_light_average: bool,

    /// Interpolation rate in 1/seconds, 0 snaps
    #[arg(long)]
    light_lerp_speed: Option<f64>,

    /// Waypoints of the simulated object in world units, "x y z"
    #[arg(long = "path", num_args = 1..)]
    path: Vec<String>,

    /// Number of simulated frames along the path
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Seconds between simulated frames
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame_time: f64,

    /// Verbose info for debugging
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Dump prepared light source data to the console for debugging
    #[arg(long, default_value_t = false)]
    dump_data: bool,

    /// Write the final lighting state of every simulated object to this JSON file
    #[arg(long)]
    dump_states: Option<PathBuf>,

    /// Write decoded cubemap faces as EXR files into this directory
    #[arg(long)]
    dump_cubemaps: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    if !args.input.exists() {
        error!("Input file does not exist: {:?}", args.input);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => LightingConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {:?}", path))?,
        None => LightingConfig::default(),
    };
    if args.no_light_average {
        config.light_average = false;
    }
    if let Some(speed) = args.light_lerp_speed {
        config.light_lerp_speed = speed;
    }
    info!("Lighting config: {:?}", config);

    // Parse VMF
    let mut file = std::fs::File::open(&args.input)?;
    let vmf = VmfFile::parse_file(&mut file)?;

    let mut level = match &args.level {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read level sidecar {:?}", path))?;
            serde_json::from_str::<BakedLevel>(&text)?
        }
        None => BakedLevel::new(Vec::new()),
    };
    if let Some(dir) = &args.lump_dir {
        level.load_lumps(dir)?;
    }

    let mut world = BrushWorld::from_vmf(&vmf, &level);
    if args.level.is_none() {
        warn!("No level sidecar given, using a single leaf around all brushes");
        cover_with_single_leaf(&mut level, &mut world);
    }
    level.entities = vmf.entities.iter().cloned().collect();

    let manager = AmbientLightingManager::new(config);
    manager.load_level(&level, Arc::new(world))?;
    let catalog = manager
        .catalog()
        .ok_or_else(|| anyhow::anyhow!("Level catalog missing after load"))?;

    if args.dump_data {
        dump::print_lights(&catalog);
        dump::print_probes(&catalog);
    }
    if let Some(dir) = &args.dump_cubemaps {
        dump::write_cubemap_faces(&catalog, dir)?;
    }

    let waypoints = args
        .path
        .iter()
        .map(|s| math::parse_vector(s))
        .collect::<Vec<Vec3>>();
    if waypoints.is_empty() {
        info!("No --path given, nothing to simulate");
        return Ok(());
    }

    let object = ObjectId(1);
    let mut now = 0.0;
    let mut last = Vec::new();
    for frame in 0..args.frames {
        let t = if args.frames > 1 { frame as f32 / (args.frames - 1) as f32 } else { 0.0 };
        let pos = sample_path(&waypoints, t);

        // The camera rides along with the object
        manager.transform_lights_to_eye_space(&math::translation_mat(pos));
        manager.queue_update(object, Transform::from_pos(pos));
        last = manager.process_frame(now);

        for (id, handle) in &last {
            let state = handle.read();
            debug!(
                "frame {:>4} {:?} at {:?}: {} active, {} total, ambient +Z {:?}",
                frame,
                id,
                pos,
                state.active_lights,
                state.light_count(),
                state.ambient_cube[4]
            );
        }
        now += args.frame_time;
    }

    for (id, handle) in &last {
        let state = handle.read();
        let ids: Vec<u32> = state.slots.iter().map(|s| s.id).collect();
        info!(
            "{:?}: {} active lights, slots {:?}, nearest light {:?}",
            id,
            state.active_lights,
            ids,
            waypoints
                .last()
                .and_then(|&p| catalog.lights.nearest_light(p))
                .map(|i| catalog.lights.all[i].id)
        );
    }

    if let Some(path) = &args.dump_states {
        dump::write_states_json(path, &last)?;
    }

    manager.reset();
    Ok(())
}

/// Piecewise-linear position along `points` for `t` in 0..=1.
fn sample_path(points: &[Vec3], t: f32) -> Vec3 {
    if points.len() == 1 {
        return points[0];
    }
    let segments = (points.len() - 1) as f32;
    let scaled = t.clamp(0.0, 1.0) * segments;
    let i = (scaled.floor() as usize).min(points.len() - 2);
    let f = scaled - i as f32;
    let (a, b) = (points[i], points[i + 1]);
    [
        a[0] + (b[0] - a[0]) * f,
        a[1] + (b[1] - a[1]) * f,
        a[2] + (b[2] - a[2]) * f,
    ]
}

/// Gives a level without compiled leaves one cluster spanning every brush.
fn cover_with_single_leaf(level: &mut BakedLevel, world: &mut BrushWorld) {
    let mut bounds = AABB::new();
    for brush in &world.brushes {
        bounds.extend(brush.bounds.min);
        bounds.extend(brush.bounds.max);
    }
    if world.brushes.is_empty() {
        bounds = AABB::from_min_max([-16384.0; 3], [16384.0; 3]);
    }

    let scale = level.unit_scale();
    let to_level = |v: Vec3| v.map(|c| c / scale);
    level.leaves = vec![
        BakedLeaf { mins: [0.0; 3], maxs: [0.0; 3], cluster: -1 },
        BakedLeaf { mins: to_level(bounds.min), maxs: to_level(bounds.max), cluster: 0 },
    ];
    level.visibility.clear();
    world.leaf_bounds = vec![AABB::default(), bounds];
    debug!("Single leaf bounds: {:?}, center in leaf {}", bounds, world.find_leaf(bounds.center));
}

fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let config = simplelog::ConfigBuilder::default()
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    if simplelog::TermLogger::init(level, config.clone(), simplelog::TerminalMode::Mixed, simplelog::ColorChoice::Auto).is_err() {
        SimpleLogger::init(level, config)?;
    }

    Ok(())
}
