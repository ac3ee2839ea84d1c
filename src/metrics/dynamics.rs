//! Dynamics classification: how expressively the pitch and amplitude move.
//!
//! A weighted score over pitch/amplitude variation statistics, boosted by a
//! pattern-strength term when the pitch movement is periodic (intentional
//! expression rather than noise), mapped through fixed boundaries into five
//! ordered categories.

use crate::config::AnalyzerConfig;
use crate::result::Dynamics;
use crate::stats;

/// Score weights: pitch CoV / pitch range / amplitude CoV / amplitude range
const W_PITCH_COV: f32 = 0.3;
const W_PITCH_RANGE: f32 = 0.2;
const W_AMP_COV: f32 = 0.3;
const W_AMP_RANGE: f32 = 0.2;

/// Number of equal windows for the amplitude statistics
const N_AMP_WINDOWS: usize = 20;

/// Minimum pitch samples before the pattern-strength boost applies
const MIN_SAMPLES_PATTERN: usize = 50;

/// Boost per unit of pattern strength
const PATTERN_GAIN: f32 = 0.2;

/// Classify dynamics from the pitch series and raw waveform.
pub(crate) fn dynamics(pitches: &[f32], samples: &[f32], config: &AnalyzerConfig) -> Dynamics {
    let pitch_mean = stats::mean(pitches);
    let (pitch_cov, pitch_range) = if pitch_mean > 0.0 {
        let max = pitches.iter().fold(f32::MIN, |a, &b| a.max(b));
        let min = pitches.iter().fold(f32::MAX, |a, &b| a.min(b));
        (
            stats::coefficient_of_variation(pitches),
            (max - min) / pitch_mean,
        )
    } else {
        (0.0, 0.0)
    };

    let (amp_cov, amp_range) = amplitude_variation(samples);

    let mut score = W_PITCH_COV * pitch_cov
        + W_PITCH_RANGE * pitch_range
        + W_AMP_COV * amp_cov
        + W_AMP_RANGE * amp_range;

    if pitches.len() >= MIN_SAMPLES_PATTERN {
        score *= 1.0 + PATTERN_GAIN * pattern_strength(pitches);
    }

    let [b0, b1, b2, b3] = config.dynamics_boundaries;
    if score < b0 {
        Dynamics::Stable
    } else if score < b1 {
        Dynamics::Controlled
    } else if score < b2 {
        Dynamics::Variable
    } else if score < b3 {
        Dynamics::Expressive
    } else {
        Dynamics::HighlyExpressive
    }
}

/// Mean-amplitude CoV and range-to-mean ratio over equal windows.
fn amplitude_variation(samples: &[f32]) -> (f32, f32) {
    if samples.len() < N_AMP_WINDOWS {
        return (0.0, 0.0);
    }
    let window = samples.len() / N_AMP_WINDOWS;
    let levels: Vec<f32> = samples
        .chunks(window)
        .take(N_AMP_WINDOWS)
        .map(|c| stats::mean(&c.iter().map(|s| s.abs()).collect::<Vec<_>>()))
        .collect();

    let mean = stats::mean(&levels);
    if mean <= 0.0 {
        return (0.0, 0.0);
    }
    let max = levels.iter().fold(f32::MIN, |a, &b| a.max(b));
    let min = levels.iter().fold(f32::MAX, |a, &b| a.min(b));
    (stats::coefficient_of_variation(&levels), (max - min) / mean)
}

/// Strength of periodic structure in the pitch movement: the largest
/// normalized autocorrelation peak of the first-difference series.
fn pattern_strength(pitches: &[f32]) -> f32 {
    let diffs: Vec<f32> = pitches.windows(2).map(|w| w[1] - w[0]).collect();
    let energy: f32 = diffs.iter().map(|d| d * d).sum();
    if energy <= f32::EPSILON {
        return 0.0;
    }

    let mut best = 0.0f32;
    for lag in 2..diffs.len() / 2 {
        let corr: f32 = diffs
            .iter()
            .zip(diffs[lag..].iter())
            .map(|(a, b)| a * b)
            .sum::<f32>()
            / energy;
        best = best.max(corr);
    }
    best.clamp(0.0, 1.0)
}
