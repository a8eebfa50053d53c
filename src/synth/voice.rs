use crate::{
    config::PatchParams,
    dsp::{Envelope, EnvelopeState, Oscillator, SVFilter},
    io::midi::midi_note_to_freq,
    synth::message::{Param, SynthMessage, VoiceSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Oscillator stopped, nothing sounding
    Active,    // Key down, envelope in attack/decay/sustain
    Releasing, // Key up, envelope releasing, oscillator still running
}

/// The one voice of the synth: saw oscillator → lowpass → ADSR gain.
///
/// Lives on the audio thread. It only changes in response to `SynthMessage`s,
/// applied between blocks by the engine.
pub struct MonoVoice {
    oscillator: Oscillator,
    filter: SVFilter,
    envelope: Envelope,
    note: Option<u8>,
    generation: u64,
    state: VoiceState,
    /// A matching stop arrived while the release tail was still sounding.
    stop_after_release: bool,
}

impl MonoVoice {
    pub fn new(sample_rate: f32, patch: &PatchParams) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate),
            filter: SVFilter::lowpass(sample_rate, patch.cutoff, patch.resonance),
            envelope: Envelope::adsr(
                sample_rate,
                patch.attack,
                patch.decay,
                patch.sustain,
                patch.release,
            ),
            note: None,
            generation: 0,
            state: VoiceState::Free,
            stop_after_release: false,
        }
    }

    pub fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, generation } => {
                self.note = Some(note);
                self.generation = generation;
                self.state = VoiceState::Active;
                self.stop_after_release = false;

                self.oscillator.set_frequency(midi_note_to_freq(note));
                self.oscillator.play();
                self.envelope.start();
            }
            SynthMessage::Glide { note } => {
                if self.state == VoiceState::Active {
                    self.note = Some(note);
                    self.oscillator.set_frequency(midi_note_to_freq(note));
                }
            }
            SynthMessage::NoteOff { note } => {
                if self.state == VoiceState::Active && self.note == Some(note) {
                    self.release();
                }
            }
            SynthMessage::StopOscillator { generation } => {
                if generation == self.generation && self.state == VoiceState::Releasing {
                    if self.envelope.is_active() {
                        self.stop_after_release = true;
                    } else {
                        self.free();
                    }
                }
            }
            SynthMessage::SetParam { param, value } => self.set_param(param, value),
            SynthMessage::AllNotesOff => {
                if self.state == VoiceState::Active {
                    self.release();
                }
            }
        }
    }

    fn release(&mut self) {
        self.envelope.stop();
        self.state = VoiceState::Releasing;
    }

    fn free(&mut self) {
        self.oscillator.stop();
        self.note = None;
        self.state = VoiceState::Free;
        self.stop_after_release = false;
    }

    fn set_param(&mut self, param: Param, value: f32) {
        match param {
            Param::Attack => self.envelope.set_attack(value),
            Param::Decay => self.envelope.set_decay(value),
            Param::Sustain => self.envelope.set_sustain(value),
            Param::Release => self.envelope.set_release(value),
            Param::Cutoff => self.filter.set_cutoff(value),
            Param::Resonance => self.filter.set_resonance(value),
        }
    }

    /// Render one block. Filter coefficients are refreshed once, up front.
    pub fn render(&mut self, out: &mut [f32]) {
        if !self.oscillator.is_playing() && !self.envelope.is_active() {
            out.fill(0.0);
            self.filter.reset();
            return;
        }

        self.filter.update_coefficients();
        for sample in out.iter_mut() {
            let raw = self.oscillator.next_sample();
            let filtered = self.filter.process(raw);
            *sample = filtered * self.envelope.next_sample();
        }

        // Everything after the envelope went idle was multiplied by zero.
        if self.stop_after_release && !self.envelope.is_active() {
            self.free();
        }
    }

    pub fn snapshot(&self) -> VoiceSnapshot {
        VoiceSnapshot {
            note: self.note,
            stage: self.envelope.state(),
            level: self.envelope.level(),
            oscillator_playing: self.oscillator.is_playing(),
        }
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// True while a stop waits for the release tail to finish.
    pub fn stop_pending(&self) -> bool {
        self.stop_after_release
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn envelope_state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    pub fn oscillator_playing(&self) -> bool {
        self.oscillator.is_playing()
    }

    pub fn frequency(&self) -> f32 {
        self.oscillator.frequency()
    }

    pub fn cutoff(&self) -> f32 {
        self.filter.cutoff()
    }

    pub fn resonance(&self) -> f32 {
        self.filter.resonance()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
