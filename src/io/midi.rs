/// Key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    On,
    Off,
}

/// A note event as the controller receives it from a keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: NoteKind,
    /// MIDI note number, 0..=127.
    pub note: u8,
}

impl NoteEvent {
    pub fn on(note: u8) -> Self {
        Self {
            kind: NoteKind::On,
            note,
        }
    }

    pub fn off(note: u8) -> Self {
        Self {
            kind: NoteKind::Off,
            note,
        }
    }
}

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Name like `C#4` for display, with middle C (60) as C4.
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NAMES[note as usize % 12], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert_eq!(midi_note_to_freq(69), 440.0);
        assert!((midi_note_to_freq(81) - 880.0).abs() < 1e-3);
        assert!((midi_note_to_freq(60) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn every_note_is_finite_and_ascending() {
        let mut last = 0.0;
        for note in 0..=127u8 {
            let freq = midi_note_to_freq(note);
            assert!(freq.is_finite() && freq > last, "note {note} -> {freq}");
            last = freq;
        }
        assert!((midi_note_to_freq(0) - 8.1758).abs() < 1e-3);
        assert!(midi_note_to_freq(127) < 12_600.0);
    }

    #[test]
    fn names_follow_middle_c_as_c4() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(49), "C#3");
        assert_eq!(note_name(0), "C-1");
    }
}
