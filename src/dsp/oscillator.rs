use crate::dsp::ramp::LinearRamp;

/*
Sawtooth Oscillator
===================

The oscillator is the sound source of the voice. It produces a rising ramp
from -1.0 to +1.0 that snaps back once per period:

    +1 ┐    ╱│    ╱│    ╱│
       │   ╱ │   ╱ │   ╱ │
     0 ┤  ╱  │  ╱  │  ╱  │
       │ ╱   │ ╱   │ ╱   │
    -1 └╱────┴╱────┴╱────┴──→ Time

A sawtooth contains every harmonic (amplitude 1/n), which is what makes it
the classic starting point for subtractive synthesis: the lowpass filter
downstream carves away the top end.

Phase Accumulation
------------------

    phase     Position inside one period, 0.0 .. 1.0
    dt        Phase increment per sample = frequency / sample_rate

Each sample: output = 2 * phase - 1, then phase += dt, wrapping at 1.0.

Band-Limiting (PolyBLEP)
------------------------

The snap from +1 to -1 is an ideal step, which has energy at every frequency
and aliases back into the audible band. PolyBLEP replaces the samples on
either side of the step with a 2nd-order polynomial residual, spreading the
drop over two samples. It costs two comparisons per sample away from the
edge and removes most of the audible aliasing.

Start / Stop Policy
-------------------

  play() from stopped   Phase resets to 0. With the BLEP residual the first
                        sample is exactly 0.0, so a cold start never clicks.
  play() while playing  Phase keeps running. Retriggering a held note does
                        not jump the waveform.
  set_frequency()       Jumps when stopped; glides linearly over FREQUENCY_GLIDE
                        seconds when playing, so a new pitch does not put a
                        corner into the waveform.
  stop()                Output is silence until the next play().
*/

/// Time for a frequency change to settle while the oscillator is sounding.
pub const FREQUENCY_GLIDE: f32 = 0.002;

/// Lowest frequency the oscillator accepts, in Hz.
pub const MIN_FREQUENCY: f32 = 0.01;

/// Highest frequency as a fraction of Nyquist (kept strictly below it).
const MAX_NYQUIST_RATIO: f32 = 0.999;

pub struct Oscillator {
    sample_rate: f32,
    phase: f32,
    frequency: LinearRamp,
    playing: bool,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            frequency: LinearRamp::new(440.0, sample_rate, FREQUENCY_GLIDE),
            playing: false,
        }
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Set the pitch in Hz, clamped into (0, Nyquist). Non-finite input is ignored.
    pub fn set_frequency(&mut self, hz: f32) {
        if !hz.is_finite() {
            return;
        }
        let ceiling = (self.nyquist() * MAX_NYQUIST_RATIO).max(MIN_FREQUENCY);
        let hz = hz.clamp(MIN_FREQUENCY, ceiling);

        if self.playing {
            self.frequency.set_target(hz);
        } else {
            self.frequency.set_immediate(hz);
        }
    }

    /// Target frequency in Hz (where any glide in progress is heading).
    pub fn frequency(&self) -> f32 {
        self.frequency.target()
    }

    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.phase = 0.0;
        self.frequency.set_immediate(self.frequency.target());
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.playing {
            return 0.0;
        }

        let dt = self.frequency.advance() / self.sample_rate;
        let naive = 2.0 * self.phase - 1.0;
        let output = naive - poly_blep(self.phase, dt);

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        output
    }

    /// Fill the buffer with oscillator output.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

/// 2nd-order PolyBLEP residual for a downward unit step at phase 0.
///
/// `t` is the phase in [0, 1), `dt` the per-sample phase increment. Returns 0
/// outside the one-sample window on either side of the wrap.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let n = t / dt;
        2.0 * n - n * n - 1.0
    } else if t > 1.0 - dt {
        let n = (t - 1.0) / dt;
        n * n + 2.0 * n + 1.0
    } else {
        0.0
    }
}
