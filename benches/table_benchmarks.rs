//! Benchmarks for the table subsystem: transposition table traffic and
//! material cache probes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_tables::endgame::EndgameRegistry;
use chess_tables::types::Bound;
use chess_tables::{MaterialCache, Position, TranspositionTable};

fn bench_tt(c: &mut Criterion) {
    let mut group = c.benchmark_group("tt");

    for mb in [1usize, 16] {
        let tt = TranspositionTable::new(mb);
        tt.new_search();

        // Warm a working set so probes mix hits and misses.
        for i in 0..100_000u64 {
            let key = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            tt.store(key, (i % 1000) as i32, false, Bound::Lower, 8, None, 0);
        }

        group.bench_with_input(BenchmarkId::new("probe", mb), &mb, |b, _| {
            let mut i = 0u64;
            b.iter(|| {
                i = i.wrapping_add(1);
                let key = (i % 200_000).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                black_box(tt.probe(black_box(key)).1)
            })
        });

        group.bench_with_input(BenchmarkId::new("store", mb), &mb, |b, _| {
            let mut i = 0u64;
            b.iter(|| {
                i = i.wrapping_add(1);
                let key = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                tt.store(black_box(key), 0, false, Bound::Lower, 8, None, 0);
            })
        });
    }

    group.finish();
}

fn bench_material(c: &mut Criterion) {
    let mut group = c.benchmark_group("material");

    let endgames = EndgameRegistry::new();
    let positions = [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
        ("imbalance", "1nb1k3/pppp4/8/8/8/8/PPPP4/1BB1K3 w"),
        ("krpkr", "4k3/4r3/8/8/8/4P3/8/3RK3 w"),
        ("kpk", "4k3/8/8/8/8/8/4P3/4K3 w"),
    ];

    for (name, fen) in positions {
        let position = Position::from_fen(fen).expect("valid fen");
        let mut cache = MaterialCache::new();

        group.bench_function(BenchmarkId::new("probe_cached", name), |b| {
            b.iter(|| black_box(cache.probe(black_box(&position), &endgames).game_phase()))
        });
    }

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let endgames = EndgameRegistry::new();
    let philidor = Position::from_fen("4k3/8/r7/4PK2/8/8/8/4R3 w").expect("valid fen");
    let key = philidor.material_key();

    c.bench_function("registry/probe_scale", |b| {
        b.iter(|| black_box(endgames.probe_scale(black_box(key))))
    });
}

criterion_group!(benches, bench_tt, bench_material, bench_registry);
criterion_main!(benches);
