//! Frequency / note-name conversion in 12-tone equal temperament, A4 = 440 Hz.

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const A4_HZ: f32 = 440.0;

/// C0 in Hz, derived from A4 = 440 (A4 is 57 semitones above C0).
fn c0_hz() -> f32 {
    A4_HZ * 2.0_f32.powf(-4.75)
}

/// Convert a frequency to the nearest note name, e.g. 220.0 -> "A3".
///
/// Non-positive frequencies map to "C3" as a neutral placeholder.
pub fn frequency_to_note(frequency: f32) -> String {
    if frequency <= 0.0 || !frequency.is_finite() {
        return "C3".to_string();
    }
    let half_steps = (12.0 * (frequency / c0_hz()).log2()).round() as i32;
    let half_steps = half_steps.max(0);
    let octave = half_steps / 12;
    let note_index = (half_steps % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// Parse a note name like "A3" or "C#4" back to its frequency in Hz.
pub fn note_to_frequency(note: &str) -> Option<f32> {
    let digits_start = note.find(|c: char| c.is_ascii_digit())?;
    if digits_start == 0 {
        return None;
    }
    let (name, octave) = note.split_at(digits_start);
    let index = NOTE_NAMES.iter().position(|&n| n == name)? as i32;
    let octave: i32 = octave.parse().ok()?;
    let half_steps = octave * 12 + index;
    Some(c0_hz() * 2.0_f32.powf(half_steps as f32 / 12.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitches() {
        assert_eq!(frequency_to_note(440.0), "A4");
        assert_eq!(frequency_to_note(261.63), "C4");
        assert_eq!(frequency_to_note(220.0), "A3");
        assert_eq!(frequency_to_note(82.41), "E2");
    }

    #[test]
    fn test_nearest_note_rounding() {
        // 225 Hz sits between A3 (220) and A#3 (233.1), closer to A3
        assert_eq!(frequency_to_note(225.0), "A3");
        assert_eq!(frequency_to_note(230.0), "A#3");
    }

    #[test]
    fn test_invalid_frequency_placeholder() {
        assert_eq!(frequency_to_note(0.0), "C3");
        assert_eq!(frequency_to_note(-5.0), "C3");
        assert_eq!(frequency_to_note(f32::NAN), "C3");
    }

    #[test]
    fn test_note_to_frequency_roundtrip() {
        for (name, hz) in [("A4", 440.0), ("C3", 130.81), ("G#2", 103.83), ("C6", 1046.5)] {
            let f = note_to_frequency(name).unwrap();
            assert!(
                (f - hz).abs() / hz < 0.001,
                "{name}: expected ~{hz}, got {f}"
            );
            assert_eq!(frequency_to_note(f), name);
        }
    }

    #[test]
    fn test_note_to_frequency_rejects_garbage() {
        assert!(note_to_frequency("").is_none());
        assert!(note_to_frequency("H3").is_none());
        assert!(note_to_frequency("A").is_none());
    }
}
