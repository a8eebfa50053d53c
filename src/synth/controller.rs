//! Control-thread half of the voice.
//!
//! `VoiceController` is what the keyboard and sliders talk to. It never
//! touches DSP state: every change becomes a `SynthMessage` pushed onto the
//! wait-free ring that the engine drains at the start of each audio block.
//!
//! Note lifecycle
//! --------------
//!
//!   note_on   Bumps the note generation, cancels any deferred stop, and
//!             sends NoteOn (retune + play + envelope start).
//!   note_off  Sends NoteOff (envelope release) at once and schedules
//!             StopOscillator for `release` seconds later, so the oscillator
//!             keeps feeding the release tail and goes quiet only after it.
//!   poll      Fires due deferred stops. A stop whose generation is no longer
//!             current is dropped; the voice checks the generation again.
//!
//! Note messages are never lost. If the ring is full they wait in a backlog
//! that every later call and `poll` retries, in order. Parameter updates
//! leave a few slots free for notes; beyond that they are coalesced to the
//! latest value per parameter and sent once there is room.
//!
//! Held keys are kept on a small last-note-priority stack. Releasing the
//! sounding key while others are still down glides to the most recent one
//! without retriggering; releasing a key that is not held does nothing.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use rtrb::{Producer, PushError};

use crate::{
    config::{
        EngineConfig, PatchParams, ResonancePolicy, ATTACK_RANGE, CUTOFF_RANGE, DECAY_RANGE,
        RELEASE_RANGE, RESONANCE_RANGE, SUSTAIN_RANGE,
    },
    engine::scheduler::{Scheduler, TimerToken},
    io::midi::{NoteEvent, NoteKind},
    synth::message::{Param, SynthMessage},
};

/// Keys tracked for last-note priority. Older keys fall off the bottom.
pub const MAX_HELD_NOTES: usize = 16;

/// Ring slots parameter updates leave free for note messages.
const NOTE_RESERVE: usize = 2;

#[derive(Debug, Clone, Copy)]
struct DeferredStop {
    generation: u64,
}

pub struct VoiceController {
    tx: Producer<SynthMessage>,
    scheduler: Scheduler<DeferredStop>,
    pending_stop: Option<TimerToken>,

    held: Vec<u8>,
    sounding: Option<u8>,
    generation: u64,

    patch: PatchParams,
    policy: ResonancePolicy,
    nyquist: f32,

    /// Note messages the ring had no room for, oldest first.
    backlog: VecDeque<SynthMessage>,
    /// Latest unsent value per parameter, indexed by `Param as usize`.
    stale_params: [Option<f32>; Param::COUNT],
    reserve: usize,
    deferred: u64,
}

impl VoiceController {
    /// `tx` should be freshly made: its free slots are taken as the ring size.
    pub fn new(config: &EngineConfig, tx: Producer<SynthMessage>) -> Self {
        let reserve = NOTE_RESERVE.min(tx.slots().saturating_sub(1));
        Self {
            tx,
            scheduler: Scheduler::new(),
            pending_stop: None,
            held: Vec::with_capacity(MAX_HELD_NOTES),
            sounding: None,
            generation: 0,
            patch: config.patch.clamped(),
            policy: config.resonance_policy,
            nyquist: config.nyquist(),
            backlog: VecDeque::new(),
            stale_params: [None; Param::COUNT],
            reserve,
            deferred: 0,
        }
    }

    pub fn handle(&mut self, event: NoteEvent) {
        self.handle_at(event, Instant::now());
    }

    pub fn handle_at(&mut self, event: NoteEvent, now: Instant) {
        match event.kind {
            NoteKind::On => self.note_on(event.note),
            NoteKind::Off => self.note_off_at(event.note, now),
        }
    }

    /// Key press. Always retriggers the voice.
    pub fn note_on(&mut self, note: u8) {
        let note = note.min(127);

        if let Some(token) = self.pending_stop.take() {
            if self.scheduler.cancel(token) {
                tracing::trace!(note, "cancelled deferred oscillator stop");
            }
        }

        self.held.retain(|&n| n != note);
        if self.held.len() == MAX_HELD_NOTES {
            self.held.remove(0);
        }
        self.held.push(note);

        self.generation += 1;
        self.sounding = Some(note);
        tracing::debug!(note, generation = self.generation, "note on");
        self.send(SynthMessage::NoteOn {
            note,
            generation: self.generation,
        });
    }

    /// Key release, timed from now.
    pub fn note_off(&mut self, note: u8) {
        self.note_off_at(note, Instant::now());
    }

    /// Key release at `now`. The deferred oscillator stop is due at
    /// `now + release`.
    pub fn note_off_at(&mut self, note: u8, now: Instant) {
        if !self.held.contains(&note) {
            tracing::trace!(note, "note off for a key that is not held");
            return;
        }
        self.held.retain(|&n| n != note);

        if self.sounding != Some(note) {
            return;
        }

        if let Some(&next) = self.held.last() {
            tracing::debug!(from = note, to = next, "note off, gliding to held key");
            self.sounding = Some(next);
            self.send(SynthMessage::Glide { note: next });
            return;
        }

        tracing::debug!(note, release = self.patch.release, "note off");
        self.sounding = None;
        self.send(SynthMessage::NoteOff { note });
        self.schedule_stop(now);
    }

    pub fn all_notes_off(&mut self) {
        self.all_notes_off_at(Instant::now());
    }

    /// Forget every held key and release the voice if it is sounding.
    pub fn all_notes_off_at(&mut self, now: Instant) {
        self.held.clear();
        if self.sounding.take().is_some() {
            tracing::debug!("all notes off");
            self.send(SynthMessage::AllNotesOff);
            self.schedule_stop(now);
        }
    }

    fn schedule_stop(&mut self, now: Instant) {
        let deadline = now + Duration::from_secs_f32(self.patch.release);
        let token = self.scheduler.schedule(
            deadline,
            DeferredStop {
                generation: self.generation,
            },
        );
        self.pending_stop = Some(token);
    }

    /// Retry anything held back by a full ring, then fire deferred stops due
    /// at `now`. Returns how many stops were sent.
    pub fn poll(&mut self, now: Instant) -> usize {
        self.flush();
        let mut fired = 0;
        for stop in self.scheduler.take_due(now) {
            if stop.generation != self.generation {
                tracing::trace!(generation = stop.generation, "dropping stale oscillator stop");
                continue;
            }
            tracing::trace!(generation = stop.generation, "deferred oscillator stop");
            self.pending_stop = None;
            self.send(SynthMessage::StopOscillator {
                generation: stop.generation,
            });
            fired += 1;
        }
        fired
    }

    /// When `poll` next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn has_pending_stop(&self) -> bool {
        self.pending_stop.is_some()
    }

    /// Attack time in seconds.
    pub fn set_attack(&mut self, seconds: f32) {
        self.patch.attack = ATTACK_RANGE.clamp(seconds);
        self.send_param(Param::Attack, self.patch.attack);
    }

    /// Decay time in seconds.
    pub fn set_decay(&mut self, seconds: f32) {
        self.patch.decay = DECAY_RANGE.clamp(seconds);
        self.send_param(Param::Decay, self.patch.decay);
    }

    /// Sustain level in [0, 1].
    pub fn set_sustain(&mut self, level: f32) {
        self.patch.sustain = SUSTAIN_RANGE.clamp(level);
        self.send_param(Param::Sustain, self.patch.sustain);
    }

    /// Release time in seconds. Also sets the delay of the next deferred stop.
    pub fn set_release(&mut self, seconds: f32) {
        self.patch.release = RELEASE_RANGE.clamp(seconds);
        self.send_param(Param::Release, self.patch.release);
    }

    /// Cutoff in Hz. Under `ResonancePolicy::TrackCutoff` this also sets the
    /// resonance to `1 - cutoff / nyquist`.
    pub fn set_filter_cutoff(&mut self, hz: f32) {
        let cutoff = CUTOFF_RANGE.clamp(hz).min(self.nyquist);
        self.patch.cutoff = cutoff;
        self.send_param(Param::Cutoff, cutoff);

        if let Some(resonance) = self.policy.derive(cutoff, self.nyquist) {
            self.patch.resonance = resonance;
            self.send_param(Param::Resonance, resonance);
        }
    }

    /// Resonance in [0, 0.99]. Ignored under `ResonancePolicy::TrackCutoff`,
    /// where resonance follows the cutoff.
    pub fn set_resonance(&mut self, resonance: f32) {
        if self.policy == ResonancePolicy::TrackCutoff {
            tracing::debug!(resonance, "resonance follows cutoff; ignoring direct set");
            return;
        }
        self.patch.resonance = RESONANCE_RANGE.clamp(resonance);
        self.send_param(Param::Resonance, self.patch.resonance);
    }

    /// Set cutoff and resonance together, bypassing the resonance policy.
    pub fn set_filter_params(&mut self, cutoff: f32, resonance: f32) {
        self.patch.cutoff = CUTOFF_RANGE.clamp(cutoff).min(self.nyquist);
        self.patch.resonance = RESONANCE_RANGE.clamp(resonance);
        self.send_param(Param::Cutoff, self.patch.cutoff);
        self.send_param(Param::Resonance, self.patch.resonance);
    }

    pub fn set_param(&mut self, param: Param, value: f32) {
        match param {
            Param::Attack => self.set_attack(value),
            Param::Decay => self.set_decay(value),
            Param::Sustain => self.set_sustain(value),
            Param::Release => self.set_release(value),
            Param::Cutoff => self.set_filter_cutoff(value),
            Param::Resonance => self.set_resonance(value),
        }
    }

    /// The patch as last sent to the voice.
    pub fn patch(&self) -> &PatchParams {
        &self.patch
    }

    pub fn resonance_policy(&self) -> ResonancePolicy {
        self.policy
    }

    pub fn nyquist(&self) -> f32 {
        self.nyquist
    }

    /// Keys currently down, oldest first.
    pub fn held_notes(&self) -> &[u8] {
        &self.held
    }

    /// The held key the voice is playing, if any.
    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages that had to wait for room in the ring since construction.
    pub fn deferred_messages(&self) -> u64 {
        self.deferred
    }

    /// Messages still waiting for room in the ring.
    pub fn pending_messages(&self) -> usize {
        self.backlog.len() + self.stale_params.iter().flatten().count()
    }

    /// Push what is waiting: the note backlog in order, then parameter
    /// updates while the ring has room beyond the note reserve.
    fn flush(&mut self) {
        while let Some(&msg) = self.backlog.front() {
            if self.tx.push(msg).is_err() {
                return;
            }
            self.backlog.pop_front();
        }

        for param in Param::ALL {
            if self.tx.slots() <= self.reserve {
                return;
            }
            if let Some(value) = self.stale_params[param as usize].take() {
                if self.tx.push(SynthMessage::SetParam { param, value }).is_err() {
                    self.stale_params[param as usize] = Some(value);
                    return;
                }
            }
        }
    }

    fn send_param(&mut self, param: Param, value: f32) {
        self.flush();
        if self.backlog.is_empty()
            && self.tx.slots() > self.reserve
            && self.tx.push(SynthMessage::SetParam { param, value }).is_ok()
        {
            return;
        }
        if self.stale_params[param as usize].replace(value).is_none() {
            self.deferred += 1;
        }
        tracing::debug!(?param, value, "control queue busy, holding parameter update");
    }

    fn send(&mut self, msg: SynthMessage) {
        self.flush();
        if self.backlog.is_empty() {
            match self.tx.push(msg) {
                Ok(()) => return,
                Err(PushError::Full(msg)) => self.backlog.push_back(msg),
            }
        } else {
            self.backlog.push_back(msg);
        }
        self.deferred += 1;
        tracing::warn!(?msg, backlog = self.backlog.len(), "control queue full, deferring note message");
    }
}
