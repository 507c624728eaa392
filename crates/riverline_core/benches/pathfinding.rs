//! Pathfinding benchmarks for riverline_core.
//!
//! Run with: `cargo bench -p riverline_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use riverline_core::map::BattleMap;
use riverline_core::pathfinding::{find_path, PathfinderConfig};

/// Cross-river searches dominate real frames; benchmark the worst case.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let map = BattleMap::default();
    let cfg = PathfinderConfig::default();

    c.bench_function("cross_river_corner_to_corner", |b| {
        let start = map.tile_to_world(0, 29);
        let goal = map.tile_to_world(17, 0);
        b.iter(|| black_box(find_path(&map, &cfg, black_box(start), black_box(goal))));
    });

    c.bench_function("same_bank_short_hop", |b| {
        let start = map.tile_to_world(2, 20);
        let goal = map.tile_to_world(6, 24);
        b.iter(|| black_box(find_path(&map, &cfg, black_box(start), black_box(goal))));
    });
}

criterion_group!(benches, pathfinding_benchmark);
criterion_main!(benches);
