//! Benchmarks for the complete voice behind the engine.
//!
//! Covers what one audio callback pays: draining control messages, then
//! oscillator → lowpass → envelope for every frame.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_mono::{EngineConfig, SynthEngine};

use crate::BLOCK_SIZES;

pub fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voice");
    let config = EngineConfig::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === HELD NOTE ===
        // Baseline: one key down, nothing changing
        let (mut engine, mut controller) = SynthEngine::new(&config);
        controller.note_on(45);
        group.bench_with_input(BenchmarkId::new("held_note", size), &size, |b, _| {
            b.iter(|| {
                engine.render_block(black_box(&mut buffer));
            })
        });

        // === CUTOFF SWEEP ===
        // A control moving every block: two messages plus a coefficient update
        let (mut engine, mut controller) = SynthEngine::new(&config);
        controller.note_on(45);
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("cutoff_sweep", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 10_000.0 { 200.0 } else { cutoff * 1.1 };
                controller.set_filter_cutoff(cutoff);
                engine.render_block(black_box(&mut buffer));
            })
        });

        // === FAST PLAYING ===
        // Retrigger on every block
        let (mut engine, mut controller) = SynthEngine::new(&config);
        let mut note = 48u8;
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                note = if note >= 72 { 48 } else { note + 1 };
                controller.note_on(note);
                engine.render_block(black_box(&mut buffer));
            })
        });

        // === STEREO OUTPUT ===
        // What the cpal callback does on a two-channel device
        let (mut engine, mut controller) = SynthEngine::new(&config);
        controller.note_on(45);
        let mut interleaved = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                engine.render_interleaved(black_box(&mut interleaved), 2);
            })
        });
    }

    group.finish();
}
