//! The analysis result record and its classification enums.

use serde::{Deserialize, Serialize};

/// Dynamics classification, ordered from least to most expressive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamics {
    Stable,
    Controlled,
    Variable,
    Expressive,
    HighlyExpressive,
}

impl Dynamics {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dynamics::Stable => "stable",
            Dynamics::Controlled => "controlled",
            Dynamics::Variable => "variable",
            Dynamics::Expressive => "expressive",
            Dynamics::HighlyExpressive => "highly_expressive",
        }
    }
}

/// Voice-type classification, ordered from lowest to highest register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceType {
    Bass,
    BassBaritone,
    Baritone,
    Tenor,
    Alto,
    MezzoSoprano,
    Soprano,
}

impl VoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceType::Bass => "bass",
            VoiceType::BassBaritone => "bass_baritone",
            VoiceType::Baritone => "baritone",
            VoiceType::Tenor => "tenor",
            VoiceType::Alto => "alto",
            VoiceType::MezzoSoprano => "mezzo_soprano",
            VoiceType::Soprano => "soprano",
        }
    }

    /// Canonical comfortable range for the voice type, used when a measured
    /// range is implausibly narrow.
    pub fn default_range(&self) -> (&'static str, &'static str) {
        match self {
            VoiceType::Bass => ("E2", "E4"),
            VoiceType::BassBaritone => ("F2", "F4"),
            VoiceType::Baritone => ("G2", "G4"),
            VoiceType::Tenor => ("C3", "C5"),
            VoiceType::Alto | VoiceType::MezzoSoprano => ("G3", "G5"),
            VoiceType::Soprano => ("C4", "C6"),
        }
    }
}

/// The flat metrics record returned to the caller.
///
/// Numeric fields are clamped by the validator to the documented ranges:
/// mean_pitch [80, 800] Hz, vibrato_rate [0, 10] Hz, jitter [0.001, 0.05],
/// shimmer [0.005, 0.06].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocalMetricsResult {
    pub mean_pitch: f32,
    pub vibrato_rate: f32,
    pub jitter: f32,
    pub shimmer: f32,
    pub dynamics: Dynamics,
    pub voice_type: VoiceType,
    pub lowest_note: String,
    pub highest_note: String,
}

impl VocalMetricsResult {
    /// True when every numeric field is a finite number
    pub fn all_finite(&self) -> bool {
        self.mean_pitch.is_finite()
            && self.vibrato_rate.is_finite()
            && self.jitter.is_finite()
            && self.shimmer.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ordering() {
        assert!(Dynamics::Stable < Dynamics::Controlled);
        assert!(Dynamics::Expressive < Dynamics::HighlyExpressive);
        assert!(VoiceType::Bass < VoiceType::Soprano);
        assert!(VoiceType::Baritone < VoiceType::Tenor);
    }

    #[test]
    fn test_serializes_to_flat_snake_case() {
        let result = VocalMetricsResult {
            mean_pitch: 220.0,
            vibrato_rate: 5.0,
            jitter: 0.01,
            shimmer: 0.02,
            dynamics: Dynamics::HighlyExpressive,
            voice_type: VoiceType::MezzoSoprano,
            lowest_note: "G3".to_string(),
            highest_note: "G5".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dynamics"], "highly_expressive");
        assert_eq!(json["voice_type"], "mezzo_soprano");
        assert_eq!(json["mean_pitch"], 220.0);
        assert_eq!(json["lowest_note"], "G3");
    }

    #[test]
    fn test_default_ranges_span_two_octaves() {
        use crate::notes::note_to_frequency;
        for vt in [
            VoiceType::Bass,
            VoiceType::BassBaritone,
            VoiceType::Baritone,
            VoiceType::Tenor,
            VoiceType::Alto,
            VoiceType::MezzoSoprano,
            VoiceType::Soprano,
        ] {
            let (lo, hi) = vt.default_range();
            let lo_hz = note_to_frequency(lo).unwrap();
            let hi_hz = note_to_frequency(hi).unwrap();
            assert!(
                hi_hz >= 1.5 * lo_hz,
                "{}: {lo}-{hi} is too narrow",
                vt.as_str()
            );
        }
    }
}
