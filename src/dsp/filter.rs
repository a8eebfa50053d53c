use std::f32::consts::PI;

/*
Resonant Lowpass (TPT State-Variable Filter)
============================================

The voice runs the sawtooth through a 12 dB/octave lowpass. The structure is
the topology-preserving-transform SVF: two trapezoidal integrators in a
feedback loop. It stays stable under fast parameter changes, which matters
because the cutoff is swept live from a control.

Coefficients
------------

    g = tan(π · cutoff / sample_rate)     integrator gain (prewarped)
    k = 2 - 2 · resonance                 damping (k = 2 is no peak)
    h = 1 / (1 + g · (g + k))

Resonance 0.0 gives k = 2 (gentle rolloff); 0.99 gives k = 0.02, a sharp
peak at the cutoff. At k = 0 the loop would ring forever, so resonance is
clamped to MAX_RESONANCE.

g is a `tan`, so coefficients are only recomputed when a parameter changed,
and only at block boundaries (`update_coefficients`).

Output Limiting
---------------

A sharp peak can amplify a unit-amplitude input far past 1.0 at the cutoff
frequency. The lowpass output passes through a soft limiter that is the
identity below LIMIT_KNEE and bends smoothly towards ±1.0 above it:

     1.0 ┤          ___------
    knee ┤      _/‾‾
         │    ╱
         │  ╱
       0 └╱──────────────────→ |input|
*/

/// Highest resonance accepted. Above this the filter approaches self-oscillation.
pub const MAX_RESONANCE: f32 = 0.99;

/// Lowest cutoff accepted, in Hz.
pub const MIN_CUTOFF: f32 = 1.0;

/// Prewarp is capped at this fraction of the sample rate so `tan` stays finite.
const MAX_WARP_RATIO: f32 = 0.49;

/// Level above which the output limiter starts to bend.
const LIMIT_KNEE: f32 = 0.75;

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,

    // Cached coefficients
    g: f32,
    k: f32,
    h: f32,
    dirty: bool,
}

impl SVFilter {
    pub fn lowpass(sample_rate: f32, cutoff_hz: f32, resonance: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            sample_rate,
            cutoff_hz: 0.0,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
            h: 1.0,
            dirty: true,
        };
        filter.set_cutoff(cutoff_hz);
        filter.set_resonance(resonance);
        filter.update_coefficients();
        filter
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Set the cutoff in Hz, clamped to [MIN_CUTOFF, Nyquist]. Takes effect
    /// at the next `update_coefficients`.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let cutoff = if cutoff_hz.is_nan() {
            MIN_CUTOFF
        } else {
            cutoff_hz.clamp(MIN_CUTOFF, self.nyquist().max(MIN_CUTOFF))
        };
        if cutoff != self.cutoff_hz {
            self.cutoff_hz = cutoff;
            self.dirty = true;
        }
    }

    /// Set the resonance, clamped to [0, MAX_RESONANCE].
    pub fn set_resonance(&mut self, resonance: f32) {
        let resonance = if resonance.is_nan() {
            0.0
        } else {
            resonance.clamp(0.0, MAX_RESONANCE)
        };
        if resonance != self.resonance {
            self.resonance = resonance;
            self.dirty = true;
        }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Recompute coefficients if a parameter changed since the last call.
    pub fn update_coefficients(&mut self) {
        if !self.dirty {
            return;
        }
        let warp_hz = self.cutoff_hz.min(self.sample_rate * MAX_WARP_RATIO);
        self.g = (PI * warp_hz / self.sample_rate).tan();
        self.k = 2.0 - 2.0 * self.resonance;
        self.h = 1.0 / (1.0 + self.g * (self.g + self.k));
        self.dirty = false;
    }

    /// Filter one sample with the current coefficients.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let v3 = sample - self.ic2eq;
        let v1 = self.h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        soft_limit(v2)
    }

    /// Filter a block in place. Coefficients are refreshed once, up front.
    pub fn render(&mut self, buffer: &mut [f32]) {
        self.update_coefficients();
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

#[inline]
fn soft_limit(x: f32) -> f32 {
    let magnitude = x.abs();
    if magnitude <= LIMIT_KNEE {
        return x;
    }
    let headroom = 1.0 - LIMIT_KNEE;
    let bent = LIMIT_KNEE + headroom * ((magnitude - LIMIT_KNEE) / headroom).tanh();
    bent.copysign(x)
}
