use rtrb::Consumer;

use crate::dsp::EnvelopeState;

/// A patch parameter the control thread can change while the voice plays.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Param {
    Attack,
    Decay,
    Sustain,
    Release,
    Cutoff,
    Resonance,
}

impl Param {
    pub const COUNT: usize = 6;
    pub const ALL: [Param; Param::COUNT] = [
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::Cutoff,
        Param::Resonance,
    ];
}

/// Control thread → audio thread.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    /// Retune, make sure the oscillator runs, and restart the envelope.
    /// `generation` identifies this note for deferred stops.
    NoteOn { note: u8, generation: u64 },
    /// Retune without touching the envelope (another held key takes over).
    Glide { note: u8 },
    /// Start the envelope release.
    NoteOff { note: u8 },
    /// Silence the oscillator if `generation` still names the current note.
    StopOscillator { generation: u64 },
    SetParam { param: Param, value: f32 },
    /// Release immediately, whatever is held.
    AllNotesOff,
}

/// Audio thread → control thread, once per rendered block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoiceSnapshot {
    pub note: Option<u8>,
    pub stage: EnvelopeState,
    pub level: f32,
    pub oscillator_playing: bool,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
