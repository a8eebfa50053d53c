//! Engine configuration and patch defaults.
//!
//! `EngineConfig` describes how the engine is built (sample rate, queue
//! sizes, output device) and the patch it starts with. With the `config`
//! feature it can be read from a TOML file; every field is optional and
//! falls back to the defaults below.
//!
//! ```toml
//! sample_rate = 44100.0
//! resonance_policy = "track_cutoff"
//!
//! [patch]
//! attack = 0.005
//! release = 0.4
//! cutoff = 1200.0
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use std::path::Path;

/// Inclusive range a control value is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. NaN maps to `min`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Map a normalized position in [0, 1] onto the range.
    #[inline]
    pub fn from_normalized(&self, t: f32) -> f32 {
        self.min + t.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Position of `value` inside the range, in [0, 1].
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        ((self.clamp(value) - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Attack time in seconds (0.01 ms to 1 s).
pub const ATTACK_RANGE: ParamRange = ParamRange::new(0.000_01, 1.0);
/// Decay time in seconds (0.1 ms to 1 s).
pub const DECAY_RANGE: ParamRange = ParamRange::new(0.000_1, 1.0);
/// Sustain level, unitless gain.
pub const SUSTAIN_RANGE: ParamRange = ParamRange::new(0.0, 1.0);
/// Release time in seconds (0.1 ms to 1 s).
pub const RELEASE_RANGE: ParamRange = ParamRange::new(0.000_1, 1.0);
/// Filter cutoff in Hz. The filter additionally caps this at Nyquist.
pub const CUTOFF_RANGE: ParamRange = ParamRange::new(1.0, 22_050.0);
/// Filter resonance. Values at or above 1.0 would self-oscillate.
pub const RESONANCE_RANGE: ParamRange = ParamRange::new(0.0, 0.99);

/// How the filter resonance is driven.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResonancePolicy {
    /// One control: moving the cutoff also sets `resonance = 1 - cutoff / nyquist`,
    /// so the filter gets more resonant as it closes.
    #[default]
    TrackCutoff,
    /// Cutoff and resonance are set independently.
    Independent,
}

impl ResonancePolicy {
    /// Resonance implied by `cutoff_hz`, or `None` when resonance is its own control.
    pub fn derive(&self, cutoff_hz: f32, nyquist: f32) -> Option<f32> {
        match self {
            ResonancePolicy::TrackCutoff => {
                Some(RESONANCE_RANGE.clamp(1.0 - cutoff_hz / nyquist))
            }
            ResonancePolicy::Independent => None,
        }
    }
}

/// The sound-shaping parameters of the voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchParams {
    /// Seconds to ramp 0 -> 1.
    pub attack: f32,
    /// Seconds to ramp 1 -> sustain.
    pub decay: f32,
    /// Level held while the key is down.
    pub sustain: f32,
    /// Seconds to ramp the level at note-off down to 0.
    pub release: f32,
    /// Lowpass cutoff in Hz.
    pub cutoff: f32,
    /// Lowpass resonance in [0, 0.99].
    pub resonance: f32,
}

impl Default for PatchParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
            cutoff: 22_000.0,
            resonance: 0.2,
        }
    }
}

impl PatchParams {
    /// Copy of the patch with every field clamped into its control range.
    pub fn clamped(&self) -> Self {
        Self {
            attack: ATTACK_RANGE.clamp(self.attack),
            decay: DECAY_RANGE.clamp(self.decay),
            sustain: SUSTAIN_RANGE.clamp(self.sustain),
            release: RELEASE_RANGE.clamp(self.release),
            cutoff: CUTOFF_RANGE.clamp(self.cutoff),
            resonance: RESONANCE_RANGE.clamp(self.resonance),
        }
    }
}

/// Sample rates the engine accepts, in Hz.
pub const SAMPLE_RATE_RANGE: ParamRange = ParamRange::new(8_000.0, 768_000.0);

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Sample rate for offline rendering. A live output uses the device rate.
    pub sample_rate: f32,
    /// Capacity of the control -> audio message ring.
    pub queue_capacity: usize,
    /// Substring of the output device name. `None` picks the host default.
    pub device: Option<String>,
    pub resonance_policy: ResonancePolicy,
    pub patch: PatchParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            queue_capacity: 64,
            device: None,
            resonance_policy: ResonancePolicy::TrackCutoff,
            patch: PatchParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Same config rendering at a different sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Reject values the engine cannot run with. Patch fields are not
    /// checked; they clamp.
    pub fn validate(&self) -> crate::Result<()> {
        let rate = self.sample_rate;
        if !(SAMPLE_RATE_RANGE.min..=SAMPLE_RATE_RANGE.max).contains(&rate) {
            return Err(crate::Error::InvalidConfig(format!(
                "sample_rate {rate} outside {}..={} Hz",
                SAMPLE_RATE_RANGE.min, SAMPLE_RATE_RANGE.max
            )));
        }
        if self.queue_capacity == 0 {
            return Err(crate::Error::InvalidConfig(
                "queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    #[cfg(feature = "config")]
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| crate::Error::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }
}
