//! Low-level DSP primitives used by the voice.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside the voice struct. They stay focused on the
//! signal-processing math; event handling and threading live in `synth`.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable lowpass with resonance and output limiting.
pub mod filter;
/// Band-limited sawtooth oscillator.
pub mod oscillator;
/// Linear parameter ramps for click-free changes.
pub mod ramp;

pub use envelope::{Envelope, EnvelopeState};
pub use filter::SVFilter;
pub use oscillator::Oscillator;
