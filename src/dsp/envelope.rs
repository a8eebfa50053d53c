use crate::MIN_TIME;

/*
ADSR Envelope Implementation
============================

This module implements a linear ADSR envelope generator, the gain stage at
the end of the voice: oscillator → filter → (× envelope) → output.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). This multiplies
              the audio signal to control its amplitude over time.

  stage       Which phase of the envelope we're in: Idle, Attack, Decay,
              Sustain, or Release. A state machine governs transitions.

  start/stop  Gate high (start) enters Attack. Gate low (stop) enters Release.
              Both are legal from any stage.

  rate        How fast `level` moves, in level units per second. Derived from
              the stage duration.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
         (A)   (D)      (S)      (R)

Attack climbs at 1/attack per second, so a full 0 → 1 ramp takes exactly
`attack` seconds. Decay covers 1 → S in `decay` seconds. Release always takes
exactly `release` seconds, whatever level it starts from: the level at stop()
is snapshotted and interpolated down to 0. The voice relies on that to stop
the oscillator right when the tail has finished.


The State Machine
-----------------

    ┌──────────────────────────────────────────────────────┐
    │                                                      │
    │   ┌──────┐  start     ┌────────┐  level=1   ┌─────┐  │
    │   │ Idle │ ─────────→ │ Attack │ ─────────→ │Decay│  │
    │   └──────┘            └────────┘            └─────┘  │
    │       ↑                 ↑  │ stop              │     │
    │       │           start │  ↓                   ↓     │
    │       │               ┌─────────┐  stop     ┌─────┐  │
    │       │               │ Release │ ←──────── │ Sus │  │
    │       │               └─────────┘           └─────┘  │
    │       │    level=0         │                         │
    │       └────────────────────┘                         │
    │                                                      │
    └──────────────────────────────────────────────────────┘

Key behavior: stop() enters Release from the CURRENT level, and start()
re-enters Attack from the CURRENT level (even mid-Release). Neither ever
jumps the level, so retriggering and early releases do not click. stop() in
Idle or Release changes nothing.


Ticking
-------

tick(dt) advances by dt seconds. If a stage completes partway through dt,
the leftover time is spent in the next stage within the same call, so a
coarse tick lands in the same place as many fine ones. next_sample() is
tick(1 / sample_rate).

Durations below MIN_TIME (one sample at 48 kHz) are raised to MIN_TIME,
which keeps every rate finite.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Gate high, ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

pub struct Envelope {
    // ADSR parameters
    attack_time: f32,   // seconds to ramp 0 → 1
    decay_time: f32,    // seconds to ramp 1 → sustain
    sustain_level: f32, // level to hold (0.0 - 1.0)
    release_time: f32,  // seconds to ramp current → 0

    sample_rate: f32,

    // Runtime state
    stage: EnvelopeState,
    level: f32,

    // Release bookkeeping, snapshotted at stop()
    release_start_level: f32,
    release_total: f64,
    release_elapsed: f64,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::adsr(sample_rate, 0.01, 0.1, 1.0, 0.1)
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            attack_time: MIN_TIME,
            decay_time: MIN_TIME,
            sustain_level: 1.0,
            release_time: MIN_TIME,

            sample_rate,

            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total: MIN_TIME as f64,
            release_elapsed: 0.0,
        };
        env.set_attack(attack);
        env.set_decay(decay);
        env.set_sustain(sustain);
        env.set_release(release);
        env
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack_time = clamp_time(seconds);
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay_time = clamp_time(seconds);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.sustain_level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
    }

    /// Takes effect at the next stop(); a release in progress keeps its length.
    pub fn set_release(&mut self, seconds: f32) {
        self.release_time = clamp_time(seconds);
    }

    pub fn attack(&self) -> f32 {
        self.attack_time
    }

    pub fn decay(&self) -> f32 {
        self.decay_time
    }

    pub fn sustain(&self) -> f32 {
        self.sustain_level
    }

    pub fn release(&self) -> f32 {
        self.release_time
    }

    /// Gate high: enter Attack from the current level.
    pub fn start(&mut self) {
        self.stage = EnvelopeState::Attack;
        self.release_elapsed = 0.0;
    }

    /// Gate low: enter Release from the current level.
    pub fn stop(&mut self) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total = self.release_time as f64;
        self.release_elapsed = 0.0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance by `dt` seconds and return the new level.
    pub fn tick(&mut self, dt: f32) -> f32 {
        let mut remaining = dt.max(0.0);

        loop {
            match self.stage {
                EnvelopeState::Idle => {
                    self.level = 0.0;
                    break;
                }

                EnvelopeState::Attack => {
                    let rate = 1.0 / self.attack_time;
                    let needed = (1.0 - self.level) / rate;
                    if remaining < needed {
                        self.level += rate * remaining;
                        break;
                    }
                    remaining -= needed;
                    self.level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }

                EnvelopeState::Decay => {
                    let target = self.sustain_level;
                    let distance = (self.level - target).abs();
                    // Sustain may have moved mid-decay; never crawl slower than a full span.
                    let span = (1.0 - target).max(distance);
                    if span <= 0.0 {
                        self.stage = EnvelopeState::Sustain;
                        continue;
                    }

                    let rate = span / self.decay_time;
                    let needed = distance / rate;
                    if remaining < needed {
                        let step = rate * remaining;
                        if self.level > target {
                            self.level -= step;
                        } else {
                            self.level += step;
                        }
                        break;
                    }
                    remaining -= needed;
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }

                EnvelopeState::Sustain => {
                    self.level = self.sustain_level;
                    break;
                }

                EnvelopeState::Release => {
                    self.release_elapsed += remaining as f64;
                    if self.release_elapsed >= self.release_total {
                        self.level = 0.0;
                        self.stage = EnvelopeState::Idle;
                    } else {
                        let progress = (self.release_elapsed / self.release_total) as f32;
                        self.level = self.release_start_level * (1.0 - progress);
                    }
                    break;
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }

    /// Advance the envelope by one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.tick(1.0 / self.sample_rate)
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Multiply a block of audio by the envelope, in place.
    pub fn apply(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.next_sample();
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed = 0.0;
    }

    /// Get the current envelope level (0.0 to 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Get the current envelope stage
    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_TIME
    } else {
        seconds.max(MIN_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.1, 0.7, 0.2);

        env.start();
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize + 1);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.05, sustain, 0.2);

        env.start();
        let attack_decay_samples = ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5;
        render_samples(&mut env, attack_decay_samples);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 1e-6, "sustain level should be held");
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.05, 0.5, release);

        env.start();
        render_samples(&mut env, (0.02 * SAMPLE_RATE) as usize);

        env.stop();
        render_samples(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001, "release should fall back to zero");
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn release_takes_release_time_from_any_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.1, 0.1, 1.0, 0.05);
        env.start();
        render_samples(&mut env, 30); // partway up the attack
        let start_level = env.level();
        assert!(start_level > 0.2 && start_level < 0.4);

        env.stop();
        render_samples(&mut env, 49);
        assert_eq!(env.state(), EnvelopeState::Release);
        assert!(env.level() > 0.0);
        env.next_sample();
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn stop_during_attack_releases_from_current_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.1, 0.1, 0.8, 0.1);
        env.start();
        render_samples(&mut env, 50);
        let before = env.level();

        env.stop();
        let after = env.next_sample();

        assert_eq!(env.state(), EnvelopeState::Release);
        assert!(after <= before);
        assert!(before - after < 0.02, "release should not jump: {before} -> {after}");
    }

    #[test]
    fn start_during_release_resumes_attack_from_current_level() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.05, 0.05, 0.8, 0.2);
        env.start();
        render_samples(&mut env, 200);
        env.stop();
        render_samples(&mut env, 100);
        let g = env.level();
        assert!(g > 0.3 && g < 0.5);

        env.start();
        let next = env.next_sample();

        assert_eq!(env.state(), EnvelopeState::Attack);
        assert!(next > g, "attack should climb from {g}, got {next}");
        assert!(next - g <= 1.0 / (0.05 * SAMPLE_RATE) + 1e-6);
    }

    #[test]
    fn stop_is_idempotent_in_release_and_idle() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.01, 0.5, 0.1);

        env.stop();
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert_eq!(env.level(), 0.0);

        env.start();
        render_samples(&mut env, 40);
        env.stop();
        render_samples(&mut env, 10);
        let level = env.level();

        env.stop();
        env.stop();
        assert_eq!(env.state(), EnvelopeState::Release);
        assert_eq!(env.level(), level);

        // The release clock was not restarted by the extra stops.
        render_samples(&mut env, 91);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn coarse_tick_carries_leftover_through_stages() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.02, 0.4, 0.1);
        env.start();

        // Finishes attack (0.01 s) and decay (0.02 s) inside a single tick.
        let level = env.tick(0.05);
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((level - 0.4).abs() < 1e-6);

        env.stop();
        env.tick(0.5);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn partial_tick_lands_in_decay() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.01, 0.02, 0.0, 0.1);
        env.start();

        // 0.01 s of attack then half of the decay.
        let level = env.tick(0.02);
        assert_eq!(env.state(), EnvelopeState::Decay);
        assert!((level - 0.5).abs() < 1e-4, "got {level}");
    }

    #[test]
    fn stages_never_skip() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.005, 0.005, 0.5, 0.005);
        let mut seen = vec![env.state()];
        env.start();
        for n in 0..100 {
            if n == 50 {
                env.stop();
            }
            env.next_sample();
            if *seen.last().unwrap() != env.state() {
                seen.push(env.state());
            }
        }
        assert_eq!(
            seen,
            vec![
                EnvelopeState::Idle,
                EnvelopeState::Attack,
                EnvelopeState::Decay,
                EnvelopeState::Sustain,
                EnvelopeState::Release,
                EnvelopeState::Idle,
            ]
        );
    }

    #[test]
    fn zero_durations_are_clamped_to_min_time() {
        let mut env = Envelope::adsr(48_000.0, 0.0, 0.0, 0.5, 0.0);
        assert_eq!(env.attack(), MIN_TIME);
        assert_eq!(env.decay(), MIN_TIME);
        assert_eq!(env.release(), MIN_TIME);

        env.start();
        for _ in 0..4 {
            let level = env.next_sample();
            assert!(level.is_finite());
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);

        env.stop();
        env.next_sample();
        env.next_sample();
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn sustain_change_is_followed_live() {
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.8, 0.1);
        env.start();
        render_samples(&mut env, 10);
        assert_eq!(env.state(), EnvelopeState::Sustain);

        env.set_sustain(0.3);
        assert!((env.next_sample() - 0.3).abs() < 1e-6);
    }
}
