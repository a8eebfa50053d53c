//! Benchmarks for the band-limited sawtooth.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mono::dsp::oscillator::Oscillator;

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Steady pitch: phase step plus two PolyBLEP branches
        let mut osc = Oscillator::new(48_000.0);
        osc.set_frequency(440.0);
        osc.play();
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Near Nyquist: a discontinuity every couple of samples
        let mut osc = Oscillator::new(48_000.0);
        osc.set_frequency(12_000.0);
        osc.play();
        group.bench_with_input(BenchmarkId::new("saw_high", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Gliding between two pitches every block
        let mut osc = Oscillator::new(48_000.0);
        osc.set_frequency(110.0);
        osc.play();
        let mut up = true;
        group.bench_with_input(BenchmarkId::new("saw_glide", size), &size, |b, _| {
            b.iter(|| {
                osc.set_frequency(if up { 220.0 } else { 110.0 });
                up = !up;
                osc.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
