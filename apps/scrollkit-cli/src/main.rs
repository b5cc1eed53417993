mod scene;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{IVec2, Vec2};
use scrollkit_common::{Rect, collides};
use scrollkit_kernel::{Body, GameClock, World};
use scrollkit_render::{
    Camera, CameraConfig, Image, MapSource, TileCache, TileCacheConfig, View,
};
use scrollkit_spatial::SpatialHash;
use scrollkit_stream::{FrameTimer, MapHandler, SuperMap, SuperMapConfig};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::scene::CheckerLoader;

#[derive(Parser)]
#[command(name = "scrollkit-cli", about = "CLI tool for scrollkit diagnostics")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with `tile_cache`, `camera` and `supermap` sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and the effective configuration
    Info,
    /// Scatter bodies and run a broad-phase collision sweep
    Collide {
        /// Number of bodies to scatter
        #[arg(short, long, default_value = "2000")]
        bodies: usize,
        /// Spatial hash cell size
        #[arg(long, default_value = "64")]
        cell_size: f32,
        /// Largest body size
        #[arg(long, default_value = "24")]
        max_size: f32,
        /// RNG seed for the scatter
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Also count pairs by brute force and compare
        #[arg(long)]
        verify: bool,
    },
    /// Scroll a camera across a synthetic map through the tile cache
    Scroll {
        /// Number of frames to render
        #[arg(short, long, default_value = "600")]
        frames: u32,
        /// Player speed in world units per second
        #[arg(long, default_value = "480")]
        speed: f32,
        /// Viewport width and height
        #[arg(long, num_args = 2, default_values = ["640", "480"])]
        view: Vec<u32>,
    },
    /// Walk a focus point across a grid of streamed map regions
    Regions {
        /// Regions per side
        #[arg(long, default_value = "6")]
        side: i32,
        /// Region edge length in world units
        #[arg(long, default_value = "1024")]
        region_size: f32,
        /// Number of update steps
        #[arg(long, default_value = "400")]
        steps: u32,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    tile_cache: TileCacheConfig,
    camera: CameraConfig,
    supermap: SuperMapConfig,
}

impl Config {
    fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.tile_cache.validate()?;
        config.camera.validate()?;
        config.supermap.validate()?;
        tracing::debug!(?config, "loaded config");
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("scrollkit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", scrollkit_common::crate_info());
            println!("kernel: {}", scrollkit_kernel::crate_info());
            println!("spatial: {}", scrollkit_spatial::crate_info());
            println!("render: {}", scrollkit_render::crate_info());
            println!("stream: {}", scrollkit_stream::crate_info());
            println!("config: {config:?}");
        }
        Commands::Collide {
            bodies,
            cell_size,
            max_size,
            seed,
            verify,
        } => run_collide(bodies, cell_size, max_size, seed, verify)?,
        Commands::Scroll {
            frames,
            speed,
            view,
        } => {
            let view = match view.as_slice() {
                [w, h] => Vec2::new(*w as f32, *h as f32),
                _ => anyhow::bail!("--view takes a width and a height"),
            };
            run_scroll(&config, frames, speed, view)?;
        }
        Commands::Regions {
            side,
            region_size,
            steps,
        } => run_regions(&config, side, region_size, steps)?,
    }

    Ok(())
}

fn run_collide(
    bodies: usize,
    cell_size: f32,
    max_size: f32,
    seed: u64,
    verify: bool,
) -> anyhow::Result<()> {
    let bounds = Rect::new(0.0, 0.0, 4096.0, 4096.0);
    let mut world = World::new();
    scene::scatter_bodies(&mut world, bounds, bodies, max_size, seed);

    let mut hash = SpatialHash::new(bounds, cell_size)?;
    let start = Instant::now();
    hash.rebuild_from_world(&world);
    let rebuild = start.elapsed();

    let start = Instant::now();
    let pairs = hash.collide_all_list(&world, None);
    let sweep = start.elapsed();

    println!(
        "Collide: bodies={bodies}, cells={}x{}, pairs={}, tests={}, rebuild={rebuild:?}, sweep={sweep:?}",
        hash.cols(),
        hash.rows(),
        pairs.len(),
        hash.coll_tests()
    );

    if verify {
        let all: Vec<&Body> = world.entities().values().collect();
        let mut brute = 0usize;
        for (i, a) in all.iter().enumerate() {
            brute += all[i + 1..].iter().filter(|b| collides(*a, **b)).count();
        }
        let status = if brute == pairs.len() { "OK" } else { "MISMATCH" };
        let tests = all.len() * all.len().saturating_sub(1) / 2;
        println!("Brute force: pairs={brute}, tests={tests} ({status})");
    }
    Ok(())
}

fn run_scroll(config: &Config, frames: u32, speed: f32, view: Vec2) -> anyhow::Result<()> {
    let tile = 32.0;
    let map = scene::checker_map(Vec2::ZERO, 256, 256, tile, [60, 170, 70, 255])?;
    let map_rect = map.rect();

    let mut world = World::new();
    let player = world.spawn(Body::boxed(Rect::from_center(map_rect.center(), Vec2::splat(16.0))));
    let mut velocity = Vec2::new(speed, speed * 0.6);

    let mut camera = Camera::with_config(View::new(view), config.camera)?;
    camera.set_target(Some(player));
    let mut cache = TileCache::new(map, view, config.tile_cache)?;
    let mut clock = GameClock::new(60.0)?;
    let mut screen = Image::new(view.x as u32, view.y as u32);
    let mut timer = FrameTimer::new(120)?;

    let per_tick = speed * clock.step();
    if per_tick > config.tile_cache.max_scroll_speed {
        tracing::warn!(
            per_tick,
            max_scroll_speed = config.tile_cache.max_scroll_speed,
            "player outruns the tile margin; expect late tiles at the trailing edge"
        );
    }

    let mut drawn = 0;
    for _ in 0..frames {
        for _ in 0..clock.advance(1.0 / 60.0) {
            let step = clock.step();
            let Some(body) = world.get(player) else {
                anyhow::bail!("player body disappeared");
            };
            let next = body.rect.translate(velocity * step);
            if next.left() < map_rect.left() || next.right() > map_rect.right() {
                velocity.x = -velocity.x;
            }
            if next.top() < map_rect.top() || next.bottom() > map_rect.bottom() {
                velocity.y = -velocity.y;
            }
            world.translate(player, velocity * step);
            camera.update(step, &world);
            let clamped = camera.rect().clamp(&map_rect).center();
            if clamped != camera.position() {
                camera.set_position(clamped);
            }
        }

        let start = Instant::now();
        drawn = cache.draw_tiles(&camera, &mut screen);
        timer.record(start.elapsed());
    }

    let stats = cache.stats();
    tracing::info!(?stats, "scroll finished");
    println!(
        "Scroll: frames={frames}, ticks={}, camera=({:.0}, {:.0}), drawn={drawn}, live tiles={}",
        clock.tick(),
        camera.position().x,
        camera.position().y,
        cache.len()
    );
    println!(
        "Draw time: avg={:?}, min={:?}, max={:?} ({:.0} fps)",
        timer.average(),
        timer.min(),
        timer.max(),
        timer.fps()
    );
    Ok(())
}

fn run_regions(config: &Config, side: i32, region_size: f32, steps: u32) -> anyhow::Result<()> {
    let size = Vec2::splat(region_size);
    let mut supermap = SuperMap::new(size, config.supermap)?;
    for y in 0..side {
        for x in 0..side {
            supermap.add_handler(MapHandler::new(format!("region_{x}_{y}"), IVec2::new(x, y)))?;
        }
    }
    let mut loader = CheckerLoader {
        region_size: size,
        tile: 32.0,
        loads: 0,
    };

    // Diagonal sweep with a sideways wobble so the focus crosses both axes.
    let extent = side as f32 * region_size;
    let mut transitions = 0;
    let mut peak_loaded = 0;
    for step in 0..steps {
        let t = step as f32 / steps.max(1) as f32;
        let focus = Vec2::new(
            t * extent,
            (t * extent + (t * 40.0).sin() * region_size).clamp(0.0, extent - 1.0),
        );
        let transition = supermap.update(1.0 / 60.0, focus, &mut loader)?;
        if !transition.is_empty() {
            transitions += 1;
            tracing::info!(
                current = ?supermap.current(),
                loaded = ?transition.loaded,
                unloaded = ?transition.unloaded,
                "region transition"
            );
        }
        peak_loaded = peak_loaded.max(supermap.loaded_count());
    }

    let mut layers = 0;
    supermap.draw(|_, map| layers += map.layers().len());
    println!(
        "Regions: {side}x{side}, steps={steps}, transitions={transitions}, loads={}, peak loaded={peak_loaded}, loaded now={} ({layers} layers)",
        loader.loads,
        supermap.loaded_count()
    );
    println!(
        "History: {:?}",
        supermap.history().map(|o| (o.x, o.y)).collect::<Vec<_>>()
    );
    Ok(())
}
