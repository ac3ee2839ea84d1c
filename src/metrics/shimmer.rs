//! Shimmer: cycle-to-cycle instability of peak amplitude.
//!
//! Detects amplitude peaks in the raw waveform with an adaptive threshold,
//! then computes perturbation measures on the peak amplitudes analogous to
//! jitter, blended with a decibel-domain term. Falls back to an RMS
//! coefficient-of-variation estimate when too few peaks are found.

use crate::stats;

/// Peak-picking threshold percentile over |signal|
const PEAK_THRESHOLD_PERCENTILE: f32 = 75.0;

/// Minimum spacing between accepted peaks (seconds)
const MIN_PEAK_SPACING_SECS: f32 = 0.002;

/// Blend weights: local / 3-point / 5-point for the linear measures
const W_LOCAL: f32 = 0.4;
const W_APQ3: f32 = 0.3;
const W_APQ5: f32 = 0.3;

/// Linear blend vs decibel-domain term
const W_LINEAR: f32 = 0.7;
const W_DB: f32 = 0.3;

/// Output clamp
const SHIMMER_MIN: f32 = 0.005;
const SHIMMER_MAX: f32 = 0.05;

/// Minimum peaks for the perturbation measures
const MIN_PEAKS: usize = 5;

/// RMS fallback window length (seconds)
const RMS_WINDOW_SECS: f32 = 0.02;

/// Estimate shimmer from the raw waveform.
pub(crate) fn shimmer(samples: &[f32], sample_rate: u32) -> f32 {
    let amplitudes = peak_amplitudes(samples, sample_rate);
    if amplitudes.len() < MIN_PEAKS {
        return rms_fallback(samples, sample_rate).clamp(SHIMMER_MIN, SHIMMER_MAX);
    }

    let mean_amp = stats::mean(&amplitudes);
    if mean_amp <= 0.0 {
        return SHIMMER_MIN;
    }

    let local = local_shimmer(&amplitudes, mean_amp);
    let apq3 = perturbation_quotient(&amplitudes, mean_amp, 3);
    let apq5 = perturbation_quotient(&amplitudes, mean_amp, 5);
    let linear = W_LOCAL * local + W_APQ3 * apq3 + W_APQ5 * apq5;

    // Decibel-domain shimmer: spread of peak levels in dB, normalized
    let db_levels: Vec<f32> = amplitudes
        .iter()
        .map(|&a| 20.0 * (a + 1e-10).log10())
        .collect();
    let db_term = stats::std_dev(&db_levels) / 20.0;

    let blended = W_LINEAR * linear + W_DB * db_term;
    blended.clamp(SHIMMER_MIN, SHIMMER_MAX)
}

/// Adaptive-threshold peak picking: local maxima of |signal| above the
/// 75th percentile, separated by at least ~2 ms.
fn peak_amplitudes(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if samples.len() < 3 {
        return Vec::new();
    }
    let rectified: Vec<f32> = samples.iter().map(|s| s.abs()).collect();
    let threshold = stats::percentile(&rectified, PEAK_THRESHOLD_PERCENTILE);
    if threshold <= 0.0 {
        return Vec::new();
    }
    let min_spacing = (MIN_PEAK_SPACING_SECS * sample_rate as f32) as usize;

    let mut peaks = Vec::new();
    let mut last_peak: Option<usize> = None;
    for i in 1..rectified.len() - 1 {
        let value = rectified[i];
        if value > threshold && value > rectified[i - 1] && value >= rectified[i + 1] {
            if let Some(last) = last_peak {
                if i - last < min_spacing {
                    continue;
                }
            }
            peaks.push(value);
            last_peak = Some(i);
        }
    }
    peaks
}

fn local_shimmer(amplitudes: &[f32], mean_amp: f32) -> f32 {
    let diffs: Vec<f32> = amplitudes.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    stats::mean(&diffs) / mean_amp
}

fn perturbation_quotient(amplitudes: &[f32], mean_amp: f32, k: usize) -> f32 {
    let half = k / 2;
    if amplitudes.len() < k {
        return 0.0;
    }
    let deviations: Vec<f32> = (half..amplitudes.len() - half)
        .map(|i| {
            let neighborhood = stats::mean(&amplitudes[i - half..=i + half]);
            (amplitudes[i] - neighborhood).abs()
        })
        .collect();
    stats::mean(&deviations) / mean_amp
}

/// Coefficient of variation of RMS over 20 ms frames.
fn rms_fallback(samples: &[f32], sample_rate: u32) -> f32 {
    let window = ((RMS_WINDOW_SECS * sample_rate as f32) as usize).max(1);
    let frames: Vec<f32> = samples
        .chunks(window)
        .filter(|c| !c.is_empty())
        .map(|c| (c.iter().map(|s| s * s).sum::<f32>() / c.len() as f32).sqrt())
        .collect();
    if frames.len() < 2 {
        return SHIMMER_MIN;
    }
    stats::coefficient_of_variation(&frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn amplitude_modulated_sine(freq: f32, mod_depth: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let envelope = 1.0 + mod_depth * (2.0 * PI * 7.0 * t).sin();
                0.5 * envelope * (2.0 * PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_steady_tone_has_low_shimmer() {
        let steady = amplitude_modulated_sine(220.0, 0.0, 22050, 1.0);
        let wobbling = amplitude_modulated_sine(220.0, 0.4, 22050, 1.0);
        assert!(shimmer(&steady, 22050) < shimmer(&wobbling, 22050));
    }

    #[test]
    fn test_shimmer_within_clamp() {
        let wobbling = amplitude_modulated_sine(220.0, 0.9, 22050, 1.0);
        let value = shimmer(&wobbling, 22050);
        assert!((SHIMMER_MIN..=SHIMMER_MAX).contains(&value), "{value}");
    }

    #[test]
    fn test_silence_uses_fallback() {
        let value = shimmer(&vec![0.0f32; 22050], 22050);
        assert!((SHIMMER_MIN..=SHIMMER_MAX).contains(&value), "{value}");
    }

    #[test]
    fn test_short_input_uses_fallback() {
        let value = shimmer(&[0.1, -0.1, 0.2], 22050);
        assert!((SHIMMER_MIN..=SHIMMER_MAX).contains(&value), "{value}");
    }

    #[test]
    fn test_peak_picking_enforces_spacing() {
        // 220 Hz tone at 22050 Hz: one cycle every ~100 samples, well above
        // the ~44-sample minimum spacing, so peaks come roughly per cycle.
        let tone = amplitude_modulated_sine(220.0, 0.0, 22050, 1.0);
        let peaks = peak_amplitudes(&tone, 22050);
        assert!(peaks.len() > 100, "{} peaks", peaks.len());
        assert!(peaks.len() < 500, "{} peaks", peaks.len());
    }
}
