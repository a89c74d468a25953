//! Benchmarks for routine pattern expansion
//!
//! Run with: cargo bench --bench routine_expansion

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;

use bullet_hell::game::content::RoutineDesc;
use bullet_hell::game::routine::Routine;
use bullet_hell::DeterministicRng;

fn routine_desc(duration: u32) -> RoutineDesc {
    serde_json::from_value(json!({
        "name": "bench", "loops": true, "duration": duration, "hp": 1000,
        "moves": [
            {"type": "Randomized", "times": [0, 120, 240], "x_velo_range": [-100, 100], "y_velo_range": [-20, 20]}
        ],
        "shots": [
            {
                "type": "ShotRow", "nr_shots": 10, "shot_ids": ["pellet"], "speeds": [200], "degrees": [0],
                "x_offset_start": -100, "x_offset_end": 100, "continuous": true, "interval": 20
            },
            {
                "type": "ShotCircle", "nr_shots": 24, "shot_spread": true, "shot_ids": ["orb"],
                "speeds": [150], "radius": 30, "continuous": true, "interval": 45
            },
            {
                "type": "ShotTwister", "speeds": [180], "shot_ids": ["needle"], "start_degree": 0,
                "finish_degree": 360, "degree_offset": 10, "time_interval": 2, "continuous": true,
                "repeat_interval": 20
            }
        ]
    }))
    .expect("valid routine descriptor")
}

fn bench_from_desc(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_desc");

    for duration in [600u32, 3600, 18000].iter() {
        let desc = routine_desc(*duration);
        group.bench_with_input(BenchmarkId::from_parameter(duration), &desc, |b, desc| {
            b.iter(|| black_box(Routine::from_desc(desc)));
        });
    }

    group.finish();
}

fn bench_frame_queries(c: &mut Criterion) {
    let desc = routine_desc(3600);

    c.bench_function("full_cycle_queries", |b| {
        b.iter(|| {
            let mut routine = Routine::from_desc(&desc);
            let mut rng = DeterministicRng::new(7);
            let mut shots = 0;
            for _ in 0..=routine.duration() {
                black_box(routine.get_moves_current_time(&mut rng));
                shots += routine.get_shots_current_time().map_or(0, <[_]>::len);
                routine.advance_timer();
            }
            black_box(shots)
        });
    });
}

criterion_group!(benches, bench_from_desc, bench_frame_queries);
criterion_main!(benches);
