#[macro_use]
extern crate criterion;
extern crate mandelzoom;
extern crate num;

use criterion::{black_box, Criterion};
use mandelzoom::{iterations_at, ImageSpec, RenderJob, Viewport};
use num::Complex;

fn escape_kernel(c: &mut Criterion) {
    c.bench_function("interior point, full budget", |b| {
        b.iter(|| iterations_at(black_box(Complex::new(0.0, 0.0)), 1000))
    });
    c.bench_function("near-boundary point", |b| {
        b.iter(|| iterations_at(black_box(Complex::new(-0.75, 0.1)), 1000))
    });
    c.bench_function("far exterior point", |b| {
        b.iter(|| iterations_at(black_box(Complex::new(3.0, 3.0)), 1000))
    });
}

fn small_frame(c: &mut Criterion) {
    let viewport = Viewport::centered(Complex::new(0.0, 0.0), 2.0).unwrap();
    let spec = ImageSpec::new(64, 64, 250).unwrap();
    c.bench_function("64x64 frame, one worker", move |b| {
        let job = RenderJob::new(viewport, spec, 1).unwrap();
        b.iter(|| job.render())
    });
    c.bench_function("64x64 frame, four workers", move |b| {
        let job = RenderJob::new(viewport, spec, 4).unwrap();
        b.iter(|| job.render())
    });
}

criterion_group!(benches, escape_kernel, small_frame);
criterion_main!(benches);
