//! The audio-thread side of the synth.
//!
//! `SynthEngine` is what the host audio callback calls. Per callback it:
//!
//! 1. drains every pending `SynthMessage` from the control ring (wait-free),
//! 2. renders the voice in chunks of at most `MAX_BLOCK_SIZE` frames,
//! 3. optionally pushes one `VoiceSnapshot` back for display.
//!
//! Nothing here allocates, locks or logs after construction.

/// Cancellable delayed actions for the control thread.
pub mod scheduler;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::EngineConfig,
    synth::{
        controller::VoiceController,
        message::{MessageReceiver, SynthMessage, VoiceSnapshot},
        voice::MonoVoice,
    },
    MAX_BLOCK_SIZE,
};

pub struct SynthEngine<R: MessageReceiver = Consumer<SynthMessage>> {
    voice: MonoVoice,
    rx: R,
    telemetry: Option<Producer<VoiceSnapshot>>,
    scratch: Vec<f32>,
    sample_rate: f32,
    frames_rendered: u64,
}

impl SynthEngine {
    /// Build an engine and the controller that drives it, connected by a
    /// ring of `config.queue_capacity` messages.
    pub fn new(config: &EngineConfig) -> (Self, VoiceController) {
        let (tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity.max(1));
        let engine = Self::with_receiver(config, rx);
        let controller = VoiceController::new(config, tx);
        (engine, controller)
    }
}

impl<R: MessageReceiver> SynthEngine<R> {
    pub fn with_receiver(config: &EngineConfig, rx: R) -> Self {
        Self {
            voice: MonoVoice::new(config.sample_rate, &config.patch.clamped()),
            rx,
            telemetry: None,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            sample_rate: config.sample_rate,
            frames_rendered: 0,
        }
    }

    /// Publish a snapshot of the voice after every render call.
    pub fn with_telemetry(mut self, capacity: usize) -> (Self, Consumer<VoiceSnapshot>) {
        let (tx, rx) = RingBuffer::<VoiceSnapshot>::new(capacity.max(1));
        self.telemetry = Some(tx);
        (self, rx)
    }

    fn apply_pending(&mut self) {
        while let Some(msg) = self.rx.pop() {
            self.voice.handle(msg);
        }
    }

    fn publish_snapshot(&mut self) {
        if let Some(tx) = self.telemetry.as_mut() {
            // Drop on overflow; the reader only wants the latest.
            let _ = tx.push(self.voice.snapshot());
        }
    }

    /// Render mono samples into `out`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.apply_pending();

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.voice.render(chunk);
        }

        self.frames_rendered += out.len() as u64;
        self.publish_snapshot();
    }

    /// Render into an interleaved buffer, duplicating the mono voice to every channel.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        self.apply_pending();

        let total_frames = data.len() / channels;
        let mut frames_written = 0;
        while frames_written < total_frames {
            let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
            let block = &mut self.scratch[..frames_to_render];
            self.voice.render(block);

            let out_off = frames_written * channels;
            for (i, &s) in block.iter().enumerate() {
                for ch in 0..channels {
                    data[out_off + i * channels + ch] = s;
                }
            }

            frames_written += frames_to_render;
        }
        // A partial trailing frame gets silence.
        data[total_frames * channels..].fill(0.0);

        self.frames_rendered += total_frames as u64;
        self.publish_snapshot();
    }

    pub fn voice(&self) -> &MonoVoice {
        &self.voice
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}
