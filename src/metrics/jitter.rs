//! Jitter: cycle-to-cycle instability of the fundamental period.
//!
//! Blends three classical perturbation measures computed on the period
//! series (1/f): local absolute difference, 3-point relative average
//! perturbation, and a 5-point variant. The blend is scaled up when the
//! overall pitch trajectory is unstable.

use crate::stats;

/// Blend weights: local / 3-point / 5-point
const W_LOCAL: f32 = 0.4;
const W_RAP3: f32 = 0.3;
const W_PPQ5: f32 = 0.3;

/// Scale factor applied per unit of pitch coefficient of variation
const INSTABILITY_GAIN: f32 = 0.5;

/// Output clamp
const JITTER_MIN: f32 = 0.001;
const JITTER_MAX: f32 = 0.04;

/// Minimum samples for the perturbation measures
const MIN_SAMPLES: usize = 5;

/// Default when too few samples are available
const DEFAULT_JITTER: f32 = 0.015;

/// Estimate jitter from the pitch series.
pub(crate) fn jitter(pitches: &[f32]) -> f32 {
    if pitches.len() < MIN_SAMPLES {
        return DEFAULT_JITTER;
    }

    let periods: Vec<f32> = pitches.iter().map(|&p| 1.0 / p).collect();
    let mean_period = stats::mean(&periods);
    if mean_period <= 0.0 {
        return DEFAULT_JITTER;
    }

    let local = local_jitter(&periods, mean_period);
    let rap3 = perturbation_quotient(&periods, mean_period, 3);
    let ppq5 = perturbation_quotient(&periods, mean_period, 5);

    let blended = W_LOCAL * local + W_RAP3 * rap3 + W_PPQ5 * ppq5;

    // Penalize overall pitch instability on top of cycle-level perturbation
    let cov = stats::coefficient_of_variation(pitches);
    let scaled = blended * (1.0 + INSTABILITY_GAIN * cov);

    scaled.clamp(JITTER_MIN, JITTER_MAX)
}

/// Mean absolute consecutive-period difference over the mean period.
fn local_jitter(periods: &[f32], mean_period: f32) -> f32 {
    let diffs: Vec<f32> = periods.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    stats::mean(&diffs) / mean_period
}

/// k-point perturbation quotient: each period against the mean of its
/// k-wide neighborhood, normalized by the mean period.
fn perturbation_quotient(periods: &[f32], mean_period: f32, k: usize) -> f32 {
    let half = k / 2;
    if periods.len() < k {
        return 0.0;
    }
    let deviations: Vec<f32> = (half..periods.len() - half)
        .map(|i| {
            let neighborhood = stats::mean(&periods[i - half..=i + half]);
            (periods[i] - neighborhood).abs()
        })
        .collect();
    stats::mean(&deviations) / mean_period
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_pitch_has_minimal_jitter() {
        let pitches = vec![220.0f32; 50];
        assert_eq!(jitter(&pitches), JITTER_MIN);
    }

    #[test]
    fn test_perturbed_pitch_has_higher_jitter() {
        // Alternate +-2% cycle to cycle
        let perturbed: Vec<f32> = (0..50)
            .map(|i| if i % 2 == 0 { 224.4 } else { 215.6 })
            .collect();
        let steady = vec![220.0f32; 50];
        assert!(jitter(&perturbed) > jitter(&steady));
    }

    #[test]
    fn test_jitter_is_clamped() {
        // Wild alternation far beyond physiological jitter
        let wild: Vec<f32> = (0..50)
            .map(|i| if i % 2 == 0 { 300.0 } else { 150.0 })
            .collect();
        assert!(jitter(&wild) <= JITTER_MAX);
    }

    #[test]
    fn test_too_few_samples_returns_default() {
        assert_eq!(jitter(&[220.0, 221.0, 219.0]), DEFAULT_JITTER);
        assert_eq!(jitter(&[]), DEFAULT_JITTER);
    }

    #[test]
    fn test_perturbation_quotient_zero_for_constant() {
        let periods = vec![1.0 / 220.0; 20];
        let mean = stats::mean(&periods);
        assert!(perturbation_quotient(&periods, mean, 3) < 1e-9);
        assert!(perturbation_quotient(&periods, mean, 5) < 1e-9);
    }
}
