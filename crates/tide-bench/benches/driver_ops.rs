//! Criterion benchmark for one outer iteration of the box-model run.

use criterion::{criterion_group, criterion_main, Criterion};
use tide_bench::box_model_simulation;
use tide_engine::DriverState;

fn bench_box_model_step(c: &mut Criterion) {
    let mut sim = box_model_simulation(f64::MAX).unwrap();

    c.bench_function("box_model_outer_iteration", |b| {
        b.iter(|| {
            debug_assert_eq!(sim.state(), DriverState::Running);
            let report = sim.step().unwrap();
            std::hint::black_box(report.next_dt);
        });
    });
}

criterion_group! {
    name = benches;
    config = criterion::Criterion::default().sample_size(20);
    targets = bench_box_model_step
}
criterion_main!(benches);
