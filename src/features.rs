//! Spectral timbre features used by voice-type classification.

use crate::audio::AudioBuffer;
use crate::config::AnalyzerConfig;
use crate::pitch::stft_magnitudes;
use crate::stats;

/// Energy fraction defining the spectral rolloff point
const ROLLOFF_FRACTION: f32 = 0.85;

/// Number of MFCCs and mel filterbank bands
const N_MFCC: usize = 13;
const N_MEL_BANDS: usize = 26;

/// Scalar bag of spectral features, averaged over frames.
#[derive(Debug, Clone)]
pub struct HarmonicFeatures {
    /// Amplitude-weighted mean frequency (Hz)
    pub spectral_centroid: f32,
    /// Frequency below which 85% of the spectral energy lies (Hz)
    pub spectral_rolloff: f32,
    /// Amplitude-weighted spread around the centroid (Hz)
    pub spectral_bandwidth: f32,
    /// Mean MFCC vector over frames
    pub mfcc_mean: Vec<f32>,
    /// Centroid normalized by the sample rate; the voice-type classifier's
    /// timbre cue
    pub brightness: f32,
}

impl HarmonicFeatures {
    /// Neutral features for when no audio is usable.
    pub(crate) fn neutral(config: &AnalyzerConfig) -> Self {
        Self {
            spectral_centroid: config.brightness_neutral * config.target_sample_rate as f32,
            spectral_rolloff: 0.0,
            spectral_bandwidth: 0.0,
            mfcc_mean: vec![0.0; N_MFCC],
            brightness: config.brightness_neutral,
        }
    }
}

/// Compute spectral features from a decoded buffer.
pub(crate) fn compute(buffer: &AudioBuffer, config: &AnalyzerConfig) -> HarmonicFeatures {
    let magnitudes = stft_magnitudes(buffer.samples(), config.frame_len, config.hop_len);
    if magnitudes.is_empty() {
        return HarmonicFeatures::neutral(config);
    }

    let sample_rate = buffer.sample_rate() as f32;
    let freq_res = sample_rate / config.frame_len as f32;

    let mut centroids = Vec::new();
    let mut rolloffs = Vec::new();
    let mut bandwidths = Vec::new();
    for frame in &magnitudes {
        let total: f32 = frame.iter().sum();
        if total <= f32::EPSILON {
            continue;
        }

        let centroid: f32 = frame
            .iter()
            .enumerate()
            .map(|(bin, &m)| bin as f32 * freq_res * m)
            .sum::<f32>()
            / total;
        centroids.push(centroid);

        let target = ROLLOFF_FRACTION * total;
        let mut cumulative = 0.0;
        let mut rolloff = (frame.len() - 1) as f32 * freq_res;
        for (bin, &m) in frame.iter().enumerate() {
            cumulative += m;
            if cumulative >= target {
                rolloff = bin as f32 * freq_res;
                break;
            }
        }
        rolloffs.push(rolloff);

        let bandwidth = (frame
            .iter()
            .enumerate()
            .map(|(bin, &m)| {
                let d = bin as f32 * freq_res - centroid;
                m * d * d
            })
            .sum::<f32>()
            / total)
            .sqrt();
        bandwidths.push(bandwidth);
    }

    if centroids.is_empty() {
        return HarmonicFeatures::neutral(config);
    }

    let centroid = stats::mean(&centroids);
    HarmonicFeatures {
        spectral_centroid: centroid,
        spectral_rolloff: stats::mean(&rolloffs),
        spectral_bandwidth: stats::mean(&bandwidths),
        mfcc_mean: mfcc_mean(&magnitudes, sample_rate),
        brightness: centroid / sample_rate,
    }
}

/// Mean MFCC vector: mel filterbank energies, log, then DCT-II.
fn mfcc_mean(magnitudes: &[Vec<f32>], sample_rate: f32) -> Vec<f32> {
    let n_bins = magnitudes[0].len();
    let filterbank = mel_filterbank(n_bins, sample_rate, N_MEL_BANDS);

    let mut sums = vec![0.0f32; N_MFCC];
    for frame in magnitudes {
        let log_energies: Vec<f32> = filterbank
            .iter()
            .map(|filter| {
                let e: f32 = filter
                    .iter()
                    .zip(frame.iter())
                    .map(|(&w, &m)| w * m * m)
                    .sum();
                (e + 1e-10).ln()
            })
            .collect();

        for (c, sum) in sums.iter_mut().enumerate() {
            let coeff: f32 = log_energies
                .iter()
                .enumerate()
                .map(|(b, &e)| {
                    e * (std::f32::consts::PI * c as f32 * (b as f32 + 0.5)
                        / N_MEL_BANDS as f32)
                        .cos()
                })
                .sum();
            *sum += coeff;
        }
    }

    let n = magnitudes.len() as f32;
    sums.iter().map(|s| s / n).collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the FFT bins.
fn mel_filterbank(n_bins: usize, sample_rate: f32, n_bands: usize) -> Vec<Vec<f32>> {
    let nyquist = sample_rate / 2.0;
    let mel_max = hz_to_mel(nyquist);
    let freq_res = nyquist / (n_bins - 1) as f32;

    // Band edge frequencies, evenly spaced on the mel scale
    let edges: Vec<f32> = (0..n_bands + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_bands + 1) as f32))
        .collect();

    let mut filterbank = Vec::with_capacity(n_bands);
    for band in 0..n_bands {
        let (lo, center, hi) = (edges[band], edges[band + 1], edges[band + 2]);
        let filter: Vec<f32> = (0..n_bins)
            .map(|bin| {
                let f = bin as f32 * freq_res;
                if f <= lo || f >= hi {
                    0.0
                } else if f <= center {
                    (f - lo) / (center - lo)
                } else {
                    (hi - f) / (hi - center)
                }
            })
            .collect();
        filterbank.push(filter);
    }
    filterbank
}
