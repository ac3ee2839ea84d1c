//! Vibrato rate estimation.
//!
//! Converts the pitch series to cents relative to its own mean, detrends,
//! and looks for a significant spectral peak in the vibrato band via
//! Welch's method. When the peak is not significant (or the series is too
//! short for a meaningful PSD) a variance-ratio heuristic stands in.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::AnalyzerConfig;
use crate::stats;

/// Minimum samples for the spectral method
const MIN_SAMPLES_SPECTRAL: usize = 20;

/// Welch segment length (samples), halved as needed for short series
const WELCH_SEGMENT: usize = 64;

/// Variance-ratio (variance / mean^2) boundaries for the heuristic
const COV_NONE: f32 = 0.001;
const COV_MODERATE: f32 = 0.005;
const COV_STRONG: f32 = 0.01;

/// Heuristic vibrato rates for the variance-ratio buckets (Hz)
const RATE_MODERATE: f32 = 4.5;
const RATE_STRONG: f32 = 5.5;
const RATE_WIDE: f32 = 6.5;

/// Estimate the vibrato rate in Hz from the pitch series.
///
/// `frame_rate` is the nominal rate at which the series was sampled
/// (frames per second).
pub(crate) fn vibrato_rate(pitches: &[f32], frame_rate: f32, config: &AnalyzerConfig) -> f32 {
    if pitches.len() >= MIN_SAMPLES_SPECTRAL {
        if let Some(rate) = spectral_rate(pitches, frame_rate, config) {
            return rate;
        }
    }
    variance_heuristic(pitches)
}

/// Welch PSD over the detrended cents series; returns the band peak only
/// when it passes the significance gate.
fn spectral_rate(pitches: &[f32], frame_rate: f32, config: &AnalyzerConfig) -> Option<f32> {
    let mean = stats::mean(pitches);
    if mean <= 0.0 {
        return None;
    }
    let mut cents: Vec<f32> = pitches.iter().map(|&p| 1200.0 * (p / mean).log2()).collect();
    detrend(&mut cents);

    let segment = WELCH_SEGMENT.min(cents.len().next_power_of_two() / 2).max(8);
    let psd = welch_psd(&cents, segment)?;

    let freq_res = frame_rate / segment as f32;
    let (band_lo, band_hi) = config.vibrato_band_hz;
    let bin_lo = ((band_lo / freq_res).ceil() as usize).max(1);
    let bin_hi = ((band_hi / freq_res).floor() as usize).min(psd.len() - 1);
    if bin_lo > bin_hi {
        return None;
    }

    let (peak_bin, peak_power) = psd[bin_lo..=bin_hi]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, &p)| (i + bin_lo, p))?;

    let median_power = stats::median(&psd[1..]);
    if peak_power > config.vibrato_significance * median_power {
        Some(peak_bin as f32 * freq_res)
    } else {
        None
    }
}

/// Map the series' variance ratio through fixed boundaries.
fn variance_heuristic(pitches: &[f32]) -> f32 {
    let mean = stats::mean(pitches);
    if mean <= 0.0 {
        return 0.0;
    }
    let ratio = stats::variance(pitches) / (mean * mean);
    if ratio < COV_NONE {
        0.0
    } else if ratio < COV_MODERATE {
        RATE_MODERATE
    } else if ratio < COV_STRONG {
        RATE_STRONG
    } else {
        RATE_WIDE
    }
}

/// Subtract the least-squares line in place.
fn detrend(values: &mut [f32]) {
    let n = values.len();
    if n < 2 {
        return;
    }
    let n_f = n as f32;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = stats::mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f32 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };
    for (i, y) in values.iter_mut().enumerate() {
        *y -= y_mean + slope * (i as f32 - x_mean);
    }
}

/// Averaged periodogram over Hamming-windowed segments with 50% overlap.
/// Returns `segment / 2 + 1` power values.
fn welch_psd(values: &[f32], segment: usize) -> Option<Vec<f32>> {
    if values.len() < segment || segment < 4 {
        return None;
    }

    let window: Vec<f32> = (0..segment)
        .map(|i| {
            0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (segment - 1) as f32).cos()
        })
        .collect();
    let window_power: f32 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(segment);
    let n_bins = segment / 2 + 1;
    let hop = segment / 2;

    let mut psd = vec![0.0f32; n_bins];
    let mut n_segments = 0;
    let mut buffer = vec![Complex { re: 0.0f32, im: 0.0 }; segment];
    let mut start = 0;
    while start + segment <= values.len() {
        for ((slot, &v), &w) in buffer
            .iter_mut()
            .zip(values[start..start + segment].iter())
            .zip(window.iter())
        {
            *slot = Complex { re: v * w, im: 0.0 };
        }
        fft.process(&mut buffer);
        for (bin, acc) in psd.iter_mut().enumerate() {
            *acc += buffer[bin].norm_sqr() / window_power;
        }
        n_segments += 1;
        start += hop;
    }

    if n_segments == 0 {
        return None;
    }
    for p in psd.iter_mut() {
        *p /= n_segments as f32;
    }
    Some(psd)
}
