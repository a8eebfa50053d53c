//! Computer keyboard as a piano.
//!
//! Two rows, tracker style. The bottom row starts at C of the base octave,
//! the top row one octave higher, which gives about three octaves:
//!
//! ```text
//!  2 3   5 6 7   9 0   =        s d   g h j   l ;
//! q w e r t y u i o p [ ]      z x c v b n m , . /
//! ```

const LOWER_ROW: [(char, u8); 17] = [
    ('z', 0),
    ('s', 1),
    ('x', 2),
    ('d', 3),
    ('c', 4),
    ('v', 5),
    ('g', 6),
    ('b', 7),
    ('h', 8),
    ('n', 9),
    ('j', 10),
    ('m', 11),
    (',', 12),
    ('l', 13),
    ('.', 14),
    (';', 15),
    ('/', 16),
];

const UPPER_ROW: [(char, u8); 20] = [
    ('q', 12),
    ('2', 13),
    ('w', 14),
    ('3', 15),
    ('e', 16),
    ('r', 17),
    ('5', 18),
    ('t', 19),
    ('6', 20),
    ('y', 21),
    ('7', 22),
    ('u', 23),
    ('i', 24),
    ('9', 25),
    ('o', 26),
    ('0', 27),
    ('p', 28),
    ('[', 29),
    ('=', 30),
    (']', 31),
];

pub const MAX_OCTAVE: u8 = 8;

/// MIDI note for `key` with the bottom row starting at C of `octave`
/// (C3 = 48). `None` for unmapped keys or notes above 127.
pub fn key_to_note(key: char, octave: u8) -> Option<u8> {
    let key = key.to_ascii_lowercase();
    let offset = LOWER_ROW
        .iter()
        .chain(UPPER_ROW.iter())
        .find(|(c, _)| *c == key)
        .map(|&(_, semitone)| semitone)?;

    let note = (octave as u32 + 1) * 12 + offset as u32;
    u8::try_from(note).ok().filter(|&n| n <= 127)
}
