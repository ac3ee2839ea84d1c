//! Voice-type classification from pitch statistics and timbre.

use crate::config::AnalyzerConfig;
use crate::result::VoiceType;
use crate::stats;

/// Blend weights for the effective pitch: mean / median
const W_MEAN: f32 = 0.7;
const W_MEDIAN: f32 = 0.3;

/// Brightness adjustment never moves the effective pitch more than +-10%
const BRIGHTNESS_FACTOR_MIN: f32 = 0.9;
const BRIGHTNESS_FACTOR_MAX: f32 = 1.1;

/// Classify from the pitch series and spectral brightness.
///
/// Blends mean and median pitch, then nudges the effective pitch upward for
/// brighter timbres (and downward for darker ones) before bucketing.
pub(crate) fn classify(pitches: &[f32], brightness: f32, config: &AnalyzerConfig) -> VoiceType {
    let blended = W_MEAN * stats::mean(pitches) + W_MEDIAN * stats::median(pitches);
    let adjusted = blended * brightness_factor(brightness, config);
    classify_simple(adjusted, config)
}

/// Simple threshold classifier on a single pitch value, used by the hint
/// override and the fallback generator.
pub(crate) fn classify_simple(pitch_hz: f32, config: &AnalyzerConfig) -> VoiceType {
    let [b0, b1, b2, b3, b4, b5] = config.voice_type_boundaries_hz;
    if pitch_hz < b0 {
        VoiceType::Bass
    } else if pitch_hz < b1 {
        VoiceType::BassBaritone
    } else if pitch_hz < b2 {
        VoiceType::Baritone
    } else if pitch_hz < b3 {
        VoiceType::Tenor
    } else if pitch_hz < b4 {
        VoiceType::Alto
    } else if pitch_hz < b5 {
        VoiceType::MezzoSoprano
    } else {
        VoiceType::Soprano
    }
}

fn brightness_factor(brightness: f32, config: &AnalyzerConfig) -> f32 {
    (1.0 + config.brightness_gain * (brightness - config.brightness_neutral))
        .clamp(BRIGHTNESS_FACTOR_MIN, BRIGHTNESS_FACTOR_MAX)
}
