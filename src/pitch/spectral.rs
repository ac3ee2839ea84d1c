//! Spectral-peak pitch tracking on the harmonic component.
//!
//! STFT → harmonic/percussive separation by median filtering with soft
//! masks → per-frame spectral peak picking with parabolic sub-bin
//! refinement. Candidates are gated by a relative magnitude threshold and a
//! clip-wide percentile of peak magnitudes.

use std::f32::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::AnalyzerConfig;
use crate::stats;

/// Median filter length (frames/bins) for harmonic-percussive separation
const HPSS_KERNEL: usize = 17;

/// Mask exponent: 2 gives Wiener-style soft masks
const MASK_POWER: f32 = 2.0;

/// Magnitude spectrogram: one `Vec<f32>` of `n_fft / 2 + 1` bins per frame.
///
/// Frames are centered: the signal is zero-padded by `frame_len / 2` on both
/// ends so frame `i` is centered on sample `i * hop_len`.
pub(crate) fn stft_magnitudes(samples: &[f32], frame_len: usize, hop_len: usize) -> Vec<Vec<f32>> {
    if samples.is_empty() || frame_len == 0 || hop_len == 0 {
        return Vec::new();
    }

    let pad = frame_len / 2;
    let mut padded = vec![0.0f32; pad];
    padded.extend_from_slice(samples);
    padded.extend(std::iter::repeat(0.0).take(pad));

    let window: Vec<f32> = (0..frame_len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / frame_len as f32).cos())
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_len);
    let n_bins = frame_len / 2 + 1;

    let mut frames = Vec::new();
    let mut buffer = vec![Complex { re: 0.0f32, im: 0.0 }; frame_len];
    let mut start = 0;
    while start + frame_len <= padded.len() {
        for ((slot, &sample), &w) in buffer
            .iter_mut()
            .zip(padded[start..start + frame_len].iter())
            .zip(window.iter())
        {
            *slot = Complex {
                re: sample * w,
                im: 0.0,
            };
        }
        fft.process(&mut buffer);
        frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        start += hop_len;
    }

    frames
}

/// Suppress percussive/noise content: median-filter the magnitude
/// spectrogram across time (harmonic-enhanced) and across frequency
/// (percussive-enhanced), then apply a soft harmonic mask.
pub(crate) fn harmonic_component(magnitudes: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n_frames = magnitudes.len();
    if n_frames == 0 {
        return Vec::new();
    }
    let n_bins = magnitudes[0].len();

    // Harmonic-enhanced: median across time for each bin
    let mut harmonic = vec![vec![0.0f32; n_bins]; n_frames];
    let mut column = vec![0.0f32; n_frames];
    for bin in 0..n_bins {
        for frame in 0..n_frames {
            column[frame] = magnitudes[frame][bin];
        }
        let filtered = median_filter(&column, HPSS_KERNEL);
        for frame in 0..n_frames {
            harmonic[frame][bin] = filtered[frame];
        }
    }

    // Percussive-enhanced: median across frequency for each frame
    let percussive: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| median_filter(frame, HPSS_KERNEL))
        .collect();

    // Soft mask: H^p / (H^p + P^p)
    let mut out = vec![vec![0.0f32; n_bins]; n_frames];
    for frame in 0..n_frames {
        for bin in 0..n_bins {
            let h = harmonic[frame][bin].powf(MASK_POWER);
            let p = percussive[frame][bin].powf(MASK_POWER);
            let denom = h + p;
            let mask = if denom > f32::EPSILON { h / denom } else { 0.0 };
            out[frame][bin] = magnitudes[frame][bin] * mask;
        }
    }
    out
}

/// Running median with a truncated window at the edges.
fn median_filter(values: &[f32], kernel: usize) -> Vec<f32> {
    let half = kernel / 2;
    let mut out = Vec::with_capacity(values.len());
    let mut window = Vec::with_capacity(kernel);
    for i in 0..values.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(values.len());
        window.clear();
        window.extend_from_slice(&values[lo..hi]);
        window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out.push(window[window.len() / 2]);
    }
    out
}

/// Pick pitch candidates from the harmonic magnitude spectrogram.
///
/// Per frame: local spectral maxima inside the configured band whose
/// magnitude exceeds `threshold × frame max`, refined by parabolic
/// interpolation. Across the clip: keep per frame the top
/// `spectral_peaks_per_frame` candidates whose magnitude exceeds the
/// configured percentile of all detected peak magnitudes.
pub(crate) fn track(samples: &[f32], sample_rate: u32, config: &AnalyzerConfig) -> Vec<f32> {
    let magnitudes = stft_magnitudes(samples, config.frame_len, config.hop_len);
    if magnitudes.is_empty() {
        return Vec::new();
    }
    let harmonic = harmonic_component(&magnitudes);

    let freq_res = sample_rate as f32 / config.frame_len as f32;
    let n_bins = harmonic[0].len();
    let bin_lo = ((config.spectral_fmin_hz / freq_res).ceil() as usize).max(1);
    let bin_hi = ((config.spectral_fmax_hz / freq_res).floor() as usize).min(n_bins - 2);
    if bin_lo >= bin_hi {
        return Vec::new();
    }

    // Per-frame candidates: (frequency, magnitude)
    let mut candidates: Vec<Vec<(f32, f32)>> = Vec::with_capacity(harmonic.len());
    let mut all_magnitudes = Vec::new();
    for frame in &harmonic {
        let frame_max = frame.iter().fold(0.0f32, |acc, &m| acc.max(m));
        let gate = config.spectral_magnitude_threshold * frame_max;
        let mut frame_candidates = Vec::new();
        if frame_max > f32::EPSILON {
            for bin in bin_lo..=bin_hi {
                let prev = frame[bin - 1];
                let curr = frame[bin];
                let next = frame[bin + 1];
                if curr > prev && curr > next && curr > gate {
                    // Parabolic interpolation for a sub-bin estimate
                    let denom = prev - 2.0 * curr + next;
                    let shift = if denom.abs() > f32::EPSILON {
                        0.5 * (prev - next) / denom
                    } else {
                        0.0
                    };
                    let frequency = (bin as f32 + shift) * freq_res;
                    frame_candidates.push((frequency, curr));
                    all_magnitudes.push(curr);
                }
            }
        }
        candidates.push(frame_candidates);
    }

    if all_magnitudes.is_empty() {
        return Vec::new();
    }
    let magnitude_gate = stats::percentile(&all_magnitudes, config.spectral_percentile_gate);

    let mut out = Vec::new();
    for mut frame_candidates in candidates {
        frame_candidates
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for &(frequency, magnitude) in frame_candidates
            .iter()
            .take(config.spectral_peaks_per_frame)
        {
            if magnitude >= magnitude_gate && frequency > 0.0 {
                out.push(frequency);
            }
        }
    }
    out
}
