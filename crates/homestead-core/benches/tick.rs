//! Criterion benchmark: one full simulation step with a busy settlement.
//!
//! Citizens are spread across every job so all behavior systems have work.
//!
//! Run with: cargo bench -p homestead-core --bench tick

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use homestead_core::generation::SettlementConfig;
use homestead_core::prelude::*;

fn busy_engine(citizens: usize) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimulationConfig {
        starting_resources: [(ResourceType::Wood, 500), (ResourceType::Stone, 200), (ResourceType::Food, 500)]
            .into_iter()
            .collect(),
        ..SimulationConfig::default()
    });

    let jobs = [JobType::Woodcutter, JobType::Quarrier, JobType::Forager, JobType::Builder];
    engine.generate(&SettlementConfig {
        starting_jobs: (0..citizens).map(|i| jobs[i % jobs.len()]).collect(),
        trees: 60,
        rocks: 30,
        berry_bushes: 30,
        max_node_distance: 80.0,
        ..SettlementConfig::default()
    });
    for i in 0..6 {
        let _ = engine.place_building(BuildingType::House, Vec3::ground(-40.0 + i as f32 * 8.0, -40.0));
    }

    // Warm up so citizens are spread over every behavior phase
    for _ in 0..200 {
        engine.step(0.05);
    }
    engine
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for citizens in [50usize, 200, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(citizens), &citizens, |b, &n| {
            let mut engine = busy_engine(n);
            b.iter(|| engine.step(0.05));
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let engine = busy_engine(200);
    c.bench_function("save_200", |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            engine.save(&mut buffer).map(|_| buffer.len())
        })
    });
}

criterion_group!(benches, bench_step, bench_snapshot);
criterion_main!(benches);
