//! Benchmarks for the pixel diff kernel and the diff renderer.

use criterion::{Criterion, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use snapdiff_engine::{diff_metrics, render_diff};
use std::hint::black_box;

fn images() -> (RgbaImage, RgbaImage) {
    let left = RgbaImage::from_fn(512, 512, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut right = left.clone();
    // A diagonal of differing pixels.
    for i in 0..512 {
        right.put_pixel(i, i, Rgba([255, 0, 255, 255]));
    }
    (left, right)
}

fn bench_diff(c: &mut Criterion) {
    let (left, right) = images();

    c.bench_function("diff_metrics_512x512", |b| {
        b.iter(|| diff_metrics(black_box(&left), black_box(&right)));
    });

    c.bench_function("render_diff_512x512", |b| {
        b.iter(|| render_diff(black_box(&left), black_box(&right)));
    });
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
