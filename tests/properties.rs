//! Property-based tests for the voice primitives.
//!
//! Envelope gain stays in [0, 1] and moves through its stages in order for
//! any patch and gate pattern; the lowpass stays bounded for any cutoff and
//! resonance in range.

use proptest::prelude::*;
use saavy_mono::{
    config::{ATTACK_RANGE, CUTOFF_RANGE, DECAY_RANGE, RELEASE_RANGE, RESONANCE_RANGE},
    dsp::{Envelope, EnvelopeState, SVFilter},
};

const SAMPLE_RATE: f32 = 48_000.0;

/// Stage changes a plain tick may produce.
fn natural_transition(from: EnvelopeState, to: EnvelopeState, sustain: f32) -> bool {
    use EnvelopeState::*;
    match (from, to) {
        (a, b) if a == b => true,
        (Attack, Decay) | (Decay, Sustain) | (Release, Idle) => true,
        // A sustain of 1.0 leaves nothing to decay.
        (Attack, Sustain) => sustain >= 1.0,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
enum Gate {
    Start,
    Stop,
    Hold(u16),
}

fn gate() -> impl Strategy<Value = Gate> {
    prop_oneof![
        Just(Gate::Start),
        Just(Gate::Stop),
        (1u16..4_000).prop_map(Gate::Hold),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn envelope_gain_bounded_and_ordered(
        attack in ATTACK_RANGE.min..=0.05f32,
        decay in DECAY_RANGE.min..=0.05f32,
        sustain in 0.0f32..=1.0,
        release in RELEASE_RANGE.min..=0.05f32,
        gates in prop::collection::vec(gate(), 1..24),
    ) {
        let mut env = Envelope::adsr(SAMPLE_RATE, attack, decay, sustain, release);

        for g in gates {
            match g {
                Gate::Start => {
                    env.start();
                    prop_assert_eq!(env.state(), EnvelopeState::Attack);
                }
                Gate::Stop => {
                    let before = env.state();
                    env.stop();
                    let expected = match before {
                        EnvelopeState::Idle => EnvelopeState::Idle,
                        _ => EnvelopeState::Release,
                    };
                    prop_assert_eq!(env.state(), expected);
                }
                Gate::Hold(n) => {
                    for _ in 0..n {
                        let before = env.state();
                        let level = env.next_sample();
                        prop_assert!((0.0..=1.0).contains(&level), "level {}", level);
                        prop_assert!(
                            natural_transition(before, env.state(), env.sustain()),
                            "{:?} -> {:?}", before, env.state()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn release_never_rises(
        attack in ATTACK_RANGE.min..=0.02f32,
        sustain in 0.0f32..=1.0,
        release in RELEASE_RANGE.min..=0.05f32,
        held in 1usize..2_000,
    ) {
        let mut env = Envelope::adsr(SAMPLE_RATE, attack, 0.01, sustain, release);
        env.start();
        for _ in 0..held {
            env.next_sample();
        }
        env.stop();

        let mut last = env.level();
        while env.is_active() {
            let level = env.next_sample();
            prop_assert!(level <= last);
            last = level;
        }
        prop_assert_eq!(last, 0.0);
    }

    #[test]
    fn lowpass_bounded_for_unit_input(
        cutoff in CUTOFF_RANGE.min..=CUTOFF_RANGE.max,
        resonance in RESONANCE_RANGE.min..=RESONANCE_RANGE.max,
        input in prop::collection::vec(-1.0f32..=1.0, 64..512),
        sample_rate in prop_oneof![Just(44_100.0f32), Just(48_000.0f32)],
    ) {
        let mut filter = SVFilter::lowpass(sample_rate, cutoff, resonance);

        // Cycle the input long enough for resonance to build up.
        for _ in 0..8 {
            let mut buffer = input.clone();
            filter.render(&mut buffer);
            for &y in &buffer {
                prop_assert!(y.is_finite() && y.abs() <= 1.0, "output {}", y);
            }
        }
    }

    #[test]
    fn lowpass_bounded_under_live_sweep(
        sweep in prop::collection::vec(
            (CUTOFF_RANGE.min..=CUTOFF_RANGE.max, RESONANCE_RANGE.min..=RESONANCE_RANGE.max),
            1..32,
        ),
    ) {
        let mut filter = SVFilter::lowpass(SAMPLE_RATE, 1_000.0, 0.5);
        let mut phase = 0.0f32;

        for (cutoff, resonance) in sweep {
            filter.set_cutoff(cutoff);
            filter.set_resonance(resonance);

            let mut block = [0.0f32; 128];
            for s in block.iter_mut() {
                // Full-scale square, the hardest case for a resonant peak.
                *s = if phase < 0.5 { 1.0 } else { -1.0 };
                phase = (phase + 0.013) % 1.0;
            }
            filter.render(&mut block);
            for &y in &block {
                prop_assert!(y.is_finite() && y.abs() <= 1.0, "output {}", y);
            }
        }
    }
}
