//! Stateless metric calculators over the pitch series and raw buffer.
//!
//! Each calculator degrades to a simpler method or a fixed default when its
//! preferred method lacks data; that is normal operation, never an error.

pub(crate) mod dynamics;
pub(crate) mod jitter;
pub(crate) mod note_range;
pub(crate) mod shimmer;
pub(crate) mod vibrato;
pub(crate) mod voice_type;

use crate::stats;

/// Fraction trimmed from each tail of the pitch distribution; guards the
/// mean against transient octave errors.
const TRIM_FRACTION: f32 = 0.10;

/// Trimmed mean pitch in Hz. Falls back to the plain mean below 3 samples.
pub(crate) fn mean_pitch(pitches: &[f32]) -> f32 {
    stats::trimmed_mean(pitches, TRIM_FRACTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pitch_resists_octave_errors() {
        let mut pitches = vec![220.0f32; 18];
        pitches.push(440.0); // octave error
        pitches.push(110.0); // octave error
        let mean = mean_pitch(&pitches);
        assert!((mean - 220.0).abs() < 2.0, "mean {mean}");
    }

    #[test]
    fn test_mean_pitch_tiny_input() {
        assert!((mean_pitch(&[200.0, 300.0]) - 250.0).abs() < 1e-4);
    }
}
