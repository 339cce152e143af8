//! Executive frame benchmarks
//!
//! Measures the cost of one pipeline frame and of the property registry
//! lookups the scenario driver performs every frame.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rustfdm::model::{Model, ModelBase};
use rustfdm::{ExecSettings, Executive, PropertyManager};

/// Stand-in for a user model scheduled after the standard roles
struct Busy {
    base: ModelBase,
    acc: f64,
}

impl Model for Busy {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn run(&mut self, _holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        self.acc = (self.acc + 1.0).sqrt();
        false
    }
}

fn quiet_settings() -> ExecSettings {
    ExecSettings {
        debug_level: Some(0),
        ..ExecSettings::default()
    }
}

/// One frame of the bare pipeline
fn bench_frame(c: &mut Criterion) {
    let mut exec = Executive::new(quiet_settings()).unwrap();
    exec.run_ic().unwrap();

    c.bench_function("executive frame", |b| {
        b.iter(|| black_box(exec.run()));
    });
}

/// Frames with extra models at different rates
fn bench_scheduled_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scheduled models");

    for rate in [1u32, 4, 16].iter() {
        let mut exec = Executive::new(quiet_settings()).unwrap();
        for _ in 0..8 {
            exec.schedule(
                Box::new(Busy {
                    base: ModelBase::new("busy"),
                    acc: 0.0,
                }),
                *rate,
            );
        }

        group.bench_with_input(BenchmarkId::new("rate", rate), rate, |b, _| {
            b.iter(|| black_box(exec.run()));
        });
    }

    group.finish();
}

/// Name lookups against a registry the size of a loaded vehicle
fn bench_property_lookup(c: &mut Criterion) {
    let pm = PropertyManager::new();
    for i in 0..500 {
        pm.bind(&format!("bench/group-{}/value-{}", i / 20, i), i as f64);
    }

    c.bench_function("property get (500 nodes)", |b| {
        b.iter(|| black_box(pm.get(black_box("bench/group-12/value-250"))));
    });
}

criterion_group!(
    benches,
    bench_frame,
    bench_scheduled_models,
    bench_property_lookup
);
criterion_main!(benches);
