//! Scenario benchmarks: the voice as the audio callback drives it.

mod voice;

pub use voice::bench_voice;
