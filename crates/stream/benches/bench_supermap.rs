use std::hint::black_box;
use std::time::Instant;

use glam::{IVec2, Vec2};
use scrollkit_stream::{LoadError, MapHandler, MapLoader, Region, SuperMap, SuperMapConfig};

struct Level {
    _data: Vec<u8>,
}

impl Region for Level {}

struct Loader {
    bytes: usize,
}

impl MapLoader<Level> for Loader {
    fn load(&mut self, _name: &str, _offset: IVec2) -> Result<Level, LoadError> {
        Ok(Level {
            _data: vec![0; self.bytes],
        })
    }
}

fn make_supermap(side: i32, config: SuperMapConfig) -> SuperMap<Level> {
    let mut sm = SuperMap::new(Vec2::splat(512.0), config).unwrap();
    for y in 0..side {
        for x in 0..side {
            sm.add_handler(MapHandler::new(format!("r{x}_{y}"), IVec2::new(x, y)))
                .unwrap();
        }
    }
    sm
}

fn bench_walk(side: i32, config: SuperMapConfig, steps: usize) {
    let mut sm = make_supermap(side, config);
    let mut loader = Loader { bytes: 64 * 1024 };
    let span = side as f32 * 512.0;

    let start = Instant::now();
    let mut transitions = 0;
    for step in 0..steps {
        let t = step as f32 * 7.0;
        let focus = Vec2::new(t % span, (t * 0.5) % span);
        let tr = sm.update(0.016, black_box(focus), &mut loader).unwrap();
        transitions += usize::from(!tr.is_empty());
    }
    let elapsed = start.elapsed();
    let per_step = elapsed / steps as u32;
    println!(
        "  walk ({side}x{side} regions, max_maps={}, preload={}, {steps} steps): {per_step:?}/step, {transitions} transitions, {} loaded",
        config.max_maps,
        config.preload_neighbors,
        sm.loaded_count()
    );
}

fn main() {
    println!("=== SuperMap Benchmarks ===\n");

    println!("Walk:");
    bench_walk(8, SuperMapConfig::default(), 10000);
    bench_walk(
        32,
        SuperMapConfig {
            max_maps: 8,
            preload_neighbors: false,
        },
        10000,
    );
    bench_walk(
        32,
        SuperMapConfig {
            max_maps: 2,
            preload_neighbors: true,
        },
        10000,
    );

    println!("\n=== Done ===");
}
