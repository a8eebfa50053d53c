//! Event loop: keys in, controller calls out, telemetry back for display.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use rtrb::Consumer;
use saavy_mono::{
    config::{
        ParamRange, ResonancePolicy, ATTACK_RANGE, CUTOFF_RANGE, DECAY_RANGE, RELEASE_RANGE,
        RESONANCE_RANGE, SUSTAIN_RANGE,
    },
    synth::message::{Param, VoiceSnapshot},
    VoiceController,
};

use crate::keymap::{key_to_note, MAX_OCTAVE};
use crate::ui;

/// Redraw interval when nothing else is due (~60 fps).
const FRAME: Duration = Duration::from_millis(16);
const COARSE_STEP: f32 = 0.02;
const FINE_STEP: f32 = 0.002;

/// One row of the parameter panel.
pub struct Slider {
    pub label: &'static str,
    pub param: Param,
    pub range: ParamRange,
    pub unit: &'static str,
    /// Move on a log scale (cutoff).
    pub log: bool,
}

pub const SLIDERS: [Slider; 6] = [
    Slider { label: "Attack", param: Param::Attack, range: ATTACK_RANGE, unit: "s", log: false },
    Slider { label: "Decay", param: Param::Decay, range: DECAY_RANGE, unit: "s", log: false },
    Slider { label: "Sustain", param: Param::Sustain, range: SUSTAIN_RANGE, unit: "", log: false },
    Slider { label: "Release", param: Param::Release, range: RELEASE_RANGE, unit: "s", log: false },
    Slider { label: "Cutoff", param: Param::Cutoff, range: CUTOFF_RANGE, unit: "Hz", log: true },
    Slider { label: "Resonance", param: Param::Resonance, range: RESONANCE_RANGE, unit: "", log: false },
];

impl Slider {
    /// Position of `value` on the slider, in [0, 1].
    pub fn position(&self, value: f32) -> f32 {
        if self.log {
            let v = self.range.clamp(value);
            ((v / self.range.min).ln() / (self.range.max / self.range.min).ln()).clamp(0.0, 1.0)
        } else {
            self.range.normalize(value)
        }
    }

    pub fn value_at(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        if self.log {
            self.range.min * (self.range.max / self.range.min).powf(t)
        } else {
            self.range.from_normalized(t)
        }
    }
}

pub struct Device {
    pub name: String,
    pub sample_rate: f32,
    pub channels: usize,
}

pub struct App {
    controller: VoiceController,
    telemetry: Consumer<VoiceSnapshot>,
    device: Device,
    snapshot: Option<VoiceSnapshot>,
    selected: usize,
    octave: u8,
    /// Auto-release length when the terminal cannot report key releases.
    gate: Duration,
    key_releases: bool,
    /// Notes waiting for their auto-release.
    gated: Vec<(u8, Instant)>,
    should_quit: bool,
}

impl App {
    pub fn new(
        controller: VoiceController,
        telemetry: Consumer<VoiceSnapshot>,
        device: Device,
        octave: u8,
        gate: Duration,
        key_releases: bool,
    ) -> Self {
        Self {
            controller,
            telemetry,
            device,
            snapshot: None,
            selected: 0,
            octave: octave.min(MAX_OCTAVE),
            gate,
            key_releases,
            gated: Vec::new(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let now = Instant::now();
            self.release_gated(now);
            self.controller.poll(now);
            self.poll_telemetry();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(self.next_wakeup(Instant::now()))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key, Instant::now());
                }
            }
        }

        self.controller.all_notes_off();
        tracing::info!("quit");
        Ok(())
    }

    fn next_wakeup(&self, now: Instant) -> Duration {
        let deadlines = self
            .controller
            .next_deadline()
            .into_iter()
            .chain(self.gated.iter().map(|&(_, at)| at));
        deadlines
            .map(|at| at.saturating_duration_since(now))
            .fold(FRAME, Duration::min)
    }

    fn poll_telemetry(&mut self) {
        while let Ok(snapshot) = self.telemetry.pop() {
            self.snapshot = Some(snapshot);
        }
    }

    fn release_gated(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.gated.len() {
            let (note, at) = self.gated[i];
            if at <= now {
                self.gated.swap_remove(i);
                self.controller.note_off_at(note, now);
            } else {
                i += 1;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                if let Some(note) = key_to_note(c, self.octave) {
                    self.controller.note_off_at(note, now);
                }
            }
            return;
        }

        let fine = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(SLIDERS.len() - 1),
            KeyCode::Left => self.nudge(if fine { -FINE_STEP } else { -COARSE_STEP }),
            KeyCode::Right => self.nudge(if fine { FINE_STEP } else { COARSE_STEP }),
            KeyCode::PageUp => self.shift_octave(1),
            KeyCode::PageDown => self.shift_octave(-1),
            KeyCode::Char(c) => {
                if let Some(note) = key_to_note(c, self.octave) {
                    self.press(note, key.kind == KeyEventKind::Repeat, now);
                }
            }
            _ => {}
        }
    }

    fn press(&mut self, note: u8, repeat: bool, now: Instant) {
        if self.key_releases {
            if !repeat {
                self.controller.note_on(note);
            }
            return;
        }

        // Without release events a held key arrives as repeated presses:
        // extend the gate instead of retriggering.
        let until = now + self.gate;
        if let Some(entry) = self.gated.iter_mut().find(|(n, _)| *n == note) {
            entry.1 = until;
        } else {
            self.controller.note_on(note);
            self.gated.push((note, until));
        }
    }

    fn nudge(&mut self, step: f32) {
        let slider = &SLIDERS[self.selected];
        let current = self.value(slider.param);
        let value = slider.value_at(slider.position(current) + step);
        tracing::debug!(param = slider.label, value, "slider");
        self.controller.set_param(slider.param, value);
    }

    fn shift_octave(&mut self, delta: i8) {
        let octave = (self.octave as i8 + delta).clamp(0, MAX_OCTAVE as i8);
        if octave as u8 != self.octave {
            // Keys pressed in the old octave would never see their release.
            self.gated.clear();
            self.controller.all_notes_off();
            self.octave = octave as u8;
        }
    }

    pub fn value(&self, param: Param) -> f32 {
        let patch = self.controller.patch();
        match param {
            Param::Attack => patch.attack,
            Param::Decay => patch.decay,
            Param::Sustain => patch.sustain,
            Param::Release => patch.release,
            Param::Cutoff => patch.cutoff,
            Param::Resonance => patch.resonance,
        }
    }

    /// Current release time in seconds.
    pub fn release(&self) -> f32 {
        self.controller.patch().release
    }

    pub fn resonance_tracks_cutoff(&self) -> bool {
        self.controller.resonance_policy() == ResonancePolicy::TrackCutoff
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn snapshot(&self) -> Option<&VoiceSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn key_releases(&self) -> bool {
        self.key_releases
    }

    pub fn held_notes(&self) -> &[u8] {
        self.controller.held_notes()
    }
}
