//! # Note Naming
//!
//! Conversions between frequencies and canonical note names under
//! A4 = 440 Hz equal temperament. The canonical spelling is sharp-based
//! ("A#4", never "Bb4"); flat and Unicode accidental spellings are
//! accepted on input and normalized.
//!
//! The tables cover the standard 88-key range (A0 to C8), which comfortably
//! contains the analyzer's default 128–1024 Hz band.

use once_cell::sync::Lazy;

use crate::error::{AnalysisError, Result};

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone)]
pub struct Note {
    /// Canonical note name (e.g. "A4", "C#3").
    pub name: String,
    /// Equal-tempered frequency in Hz.
    pub frequency: f32,
}

/// Statically computed notes for the 88-key range (A0 to C8).
///
/// Computed once at startup. A4 is key index 48; frequencies follow
/// `f = 440 * 2^((i - 48) / 12)`.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];
    let mut notes = Vec::with_capacity(88);

    for i in 0..88 {
        let frequency = 440.0 * 2.0_f32.powf((i as f32 - 48.0) / 12.0);
        // The keyboard starts at A0; the octave number increments at C.
        let note_index = i % 12;
        let octave = (i + 9) / 12;
        let name = format!("{}{}", NOTE_NAMES[note_index], octave);
        notes.push(Note { name, frequency });
    }
    notes
});

/// Finds the note closest to a given frequency.
///
/// # Returns
/// * `(note_name, target_frequency)` — the nearest note and its
///   equal-tempered frequency.
pub fn nearest_note(freq: f32) -> (String, f32) {
    let closest = NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - freq).abs();
            let diff_b = (b.frequency - freq).abs();
            diff_a.partial_cmp(&diff_b).unwrap()
        })
        .unwrap(); // Safe: NOTES is never empty.

    (closest.name.clone(), closest.frequency)
}

/// Maps a frequency to its canonical note name.
pub fn hz_to_note(freq: f32) -> String {
    nearest_note(freq).0
}

/// Parses a note name into its equal-tempered frequency.
///
/// Accepts sharp (`#`, `♯`) and flat (`b`, `♭`) accidentals and any
/// letter case for the pitch letter. Names outside the A0..C8 range, or
/// that fail to parse at all, are [`AnalysisError::MalformedAnnotation`].
pub fn note_to_hz(name: &str) -> Result<f32> {
    let malformed = || AnalysisError::MalformedAnnotation(format!("unrecognized note `{}`", name));

    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(malformed)?.to_ascii_uppercase();
    // Semitone offset of the natural letter from C within one octave.
    let letter_offset: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(malformed()),
    };

    let rest: String = chars.collect();
    let mut accidental = 0i32;
    let mut octave_start = 0;
    for c in rest.chars() {
        match c {
            '#' | '♯' => accidental += 1,
            'b' | '♭' => accidental -= 1,
            _ => break,
        }
        octave_start += c.len_utf8();
    }
    let octave: i32 = rest[octave_start..].parse().map_err(|_| malformed())?;

    // Semitones above C0; A4 sits at 57.
    let semitones = octave * 12 + letter_offset + accidental;
    let a0 = 9; // A0, the lowest supported key
    let c8 = 96; // C8, the highest supported key
    if !(a0..=c8).contains(&semitones) {
        return Err(AnalysisError::MalformedAnnotation(format!(
            "note `{}` is outside the supported A0..C8 range",
            name
        )));
    }

    Ok(440.0 * 2.0_f32.powf((semitones - 57) as f32 / 12.0))
}

/// Normalizes a note name to its canonical sharp spelling (Bb4 → A#4).
pub fn canonical_name(name: &str) -> Result<String> {
    Ok(hz_to_note(note_to_hz(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_reference() {
        assert_eq!(note_to_hz("A4").unwrap(), 440.0);
        assert_eq!(hz_to_note(440.0), "A4");
    }

    #[test]
    fn nearest_note_tolerates_detuning() {
        let (name, target) = nearest_note(445.0);
        assert_eq!(name, "A4");
        assert_eq!(target, 440.0);
    }

    #[test]
    fn flats_normalize_to_sharps() {
        assert_eq!(canonical_name("Bb4").unwrap(), "A#4");
        assert_eq!(canonical_name("Db3").unwrap(), "C#3");
        assert_eq!(canonical_name("E♭4").unwrap(), "D#4");
    }

    #[test]
    fn unicode_sharps_are_accepted() {
        assert_eq!(canonical_name("F♯2").unwrap(), "F#2");
    }

    #[test]
    fn octave_boundary_names() {
        // B3 and C4 straddle the octave increment.
        assert!((note_to_hz("B3").unwrap() - 246.94).abs() < 0.01);
        assert!((note_to_hz("C4").unwrap() - 261.63).abs() < 0.01);
    }

    #[test]
    fn garbage_names_are_rejected() {
        assert!(note_to_hz("H4").is_err());
        assert!(note_to_hz("A").is_err());
        assert!(note_to_hz("").is_err());
        assert!(note_to_hz("A#x").is_err());
    }

    #[test]
    fn out_of_range_names_are_rejected() {
        assert!(note_to_hz("G0").is_err()); // below A0
        assert!(note_to_hz("D8").is_err()); // above C8
    }

    #[test]
    fn table_spans_the_88_keys() {
        assert!((note_to_hz("A0").unwrap() - 27.5).abs() < 0.01);
        assert!((note_to_hz("C8").unwrap() - 4186.01).abs() < 0.05);
    }
}
