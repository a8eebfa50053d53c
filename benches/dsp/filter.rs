//! Benchmarks for the resonant state-variable lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mono::dsp::filter::SVFilter;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fixed coefficients
        let mut filter = SVFilter::lowpass(48_000.0, 1_000.0, 0.5);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // High resonance drives the limiter most of the time
        let mut filter = SVFilter::lowpass(48_000.0, 200.0, 0.99);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass_resonant", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // Cutoff moves every block: one tan() per block
        let mut filter = SVFilter::lowpass(48_000.0, 1_000.0, 0.5);
        let mut buffer = input.clone();
        let mut cutoff = 1_000.0f32;
        group.bench_with_input(BenchmarkId::new("lowpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8_000.0 { 200.0 } else { cutoff * 1.05 };
                filter.set_cutoff(cutoff);
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
