//! Pitch extraction: two complementary trackers unioned, then
//! outlier-filtered.
//!
//! Pass A is a probabilistic frame-wise YIN tracker that keeps only
//! confidently voiced frames. Pass B picks spectral peaks on the
//! harmonic-separated spectrogram. The union of both candidate sets goes
//! through a shared IQR fence filter, keeping tracker logic independent of
//! outlier policy.

mod spectral;
mod yin;

pub(crate) use spectral::stft_magnitudes;

use tracing::debug;

use crate::audio::AudioBuffer;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::stats;

/// Ordered positive pitch estimates in Hz, one per analysis frame that
/// produced a usable candidate. Frames with no detected pitch are dropped,
/// not zero-filled, so indices are not time-aligned across stages.
#[derive(Debug, Clone)]
pub struct PitchSeries {
    values: Vec<f32>,
}

impl PitchSeries {
    pub(crate) fn new(values: Vec<f32>) -> Self {
        debug_assert!(values.iter().all(|&v| v > 0.0 && v.is_finite()));
        Self { values }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extract the pitch series for a buffer.
///
/// Fails with [`AnalyzerError::InsufficientPitchData`] when fewer than the
/// configured minimum number of candidates survive; the caller routes that
/// to the fallback generator.
pub fn extract_pitch_series(
    buffer: &AudioBuffer,
    config: &AnalyzerConfig,
) -> Result<PitchSeries, AnalyzerError> {
    let samples = buffer.samples();
    let sample_rate = buffer.sample_rate();

    let pass_a: Vec<f32> = yin::track(samples, sample_rate, config)
        .into_iter()
        .filter(|f| f.voiced_prob > config.voicing_threshold)
        .map(|f| f.frequency)
        .collect();

    let pass_b = spectral::track(samples, sample_rate, config);

    debug!(
        "Pitch candidates: {} probabilistic + {} spectral",
        pass_a.len(),
        pass_b.len()
    );

    let mut union = pass_a;
    union.extend(pass_b);
    union.retain(|&f| f >= config.pitch_floor_hz && f <= config.pitch_ceil_hz);

    let filtered = iqr_filter(&union, config.iqr_fence);
    if filtered.len() < config.min_pitch_frames {
        return Err(AnalyzerError::InsufficientPitchData {
            found: filtered.len(),
            required: config.min_pitch_frames,
        });
    }

    Ok(PitchSeries::new(filtered))
}

/// Drop values outside `[q1 - fence*iqr, q3 + fence*iqr]`, preserving order.
pub(crate) fn iqr_filter(values: &[f32], fence: f32) -> Vec<f32> {
    if values.len() < 4 {
        return values.to_vec();
    }
    let q1 = stats::percentile(values, 25.0);
    let q3 = stats::percentile(values, 75.0);
    let iqr = q3 - q1;
    let lo = q1 - fence * iqr;
    let hi = q3 + fence * iqr;
    values.iter().copied().filter(|&v| v >= lo && v <= hi).collect()
}
