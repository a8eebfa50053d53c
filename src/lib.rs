pub mod config;
pub mod dsp; // Oscillator, filter and envelope primitives
pub mod engine; // Audio-thread renderer and control-thread scheduling
pub mod error;
pub mod io;
pub mod synth; // Mono voice, control messages and the voice controller

pub use config::{EngineConfig, PatchParams, ResonancePolicy};
pub use engine::SynthEngine;
pub use error::{Error, Result};
pub use io::midi::{NoteEvent, NoteKind};
pub use synth::controller::VoiceController;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
