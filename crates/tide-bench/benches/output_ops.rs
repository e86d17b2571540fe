//! Criterion micro-benchmarks for output plans, scheduling, and frame encoding.

use criterion::{criterion_group, criterion_main, Criterion};
use tide_core::Field;
use tide_grid::{Axis, GridDescriptor};
use tide_obs::{
    FrameWriter, NullSink, OutputEntry, OutputPlan, OutputScheduler, OutputSink, OutputSpec,
    WriterSchedule,
};
use tide_test_utils::MockFields;

fn grid() -> GridDescriptor {
    GridDescriptor::new([1, 256, 64], [20.0, 5120.0, 640.0]).unwrap()
}

fn spec() -> OutputSpec {
    OutputSpec::new(vec![
        OutputEntry::full(Field::Temperature),
        OutputEntry::slice(Field::Meltwater, Axis::Y, 128),
        OutputEntry::maximum(Field::Viscosity),
    ])
}

fn fields(n: usize) -> MockFields {
    let mut f = MockFields::new(n);
    f.set_field(Field::Temperature, (0..n).map(|i| i as f64 * 1e-3).collect());
    f.fill(Field::Viscosity, 1e-4);
    f
}

fn bench_plan_execute(c: &mut Criterion) {
    let g = grid();
    let plan = OutputPlan::compile(&spec(), &g).unwrap();
    let f = fields(g.cell_count());

    c.bench_function("plan_execute_16k", |b| {
        b.iter(|| {
            let payload = plan.execute(&f).unwrap();
            std::hint::black_box(payload.len());
        });
    });
}

fn bench_scheduler_poll(c: &mut Criterion) {
    let g = grid();
    let f = fields(g.cell_count());
    let mut scheduler = OutputScheduler::new();
    for (i, interval) in [60.0, 300.0, 3600.0].into_iter().enumerate() {
        scheduler
            .register(
                WriterSchedule::new(format!("s{i}"), interval, &spec(), &g, Box::new(NullSink))
                    .unwrap(),
            )
            .unwrap();
    }
    let mut t = 0.0;

    c.bench_function("scheduler_poll_3_schedules", |b| {
        b.iter(|| {
            t += 30.0;
            let fired = scheduler.poll(t, &f).unwrap();
            std::hint::black_box(fired);
        });
    });
}

fn bench_frame_encode(c: &mut Criterion) {
    let g = grid();
    let plan = OutputPlan::compile(&spec(), &g).unwrap();
    let payload = plan.execute(&fields(g.cell_count())).unwrap();

    c.bench_function("frame_encode_16k", |b| {
        b.iter(|| {
            let mut writer = FrameWriter::new(Vec::new(), "bench").unwrap();
            writer.write("bench", &payload, 300.0).unwrap();
            std::hint::black_box(writer.into_inner().len());
        });
    });
}

criterion_group!(
    benches,
    bench_plan_execute,
    bench_scheduler_poll,
    bench_frame_encode
);
criterion_main!(benches);
