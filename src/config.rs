//! Analyzer configuration.
//!
//! Every empirically calibrated threshold lives here so the pipeline stages
//! stay free of magic numbers and the boundaries can be tuned and tested
//! independently of the algorithms that consume them.

/// Configuration for the analysis pipeline
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Sample rate the decoder resamples to (Hz)
    pub target_sample_rate: u32,
    /// High-pass cutoff applied after decode (Hz)
    pub highpass_cutoff_hz: f32,

    /// Analysis frame length in samples
    pub frame_len: usize,
    /// Hop between analysis frames in samples
    pub hop_len: usize,

    /// Lower bound of the plausible voice band (~C2, Hz)
    pub pitch_floor_hz: f32,
    /// Upper bound of the plausible voice band (~C7, Hz)
    pub pitch_ceil_hz: f32,
    /// Per-frame voicing probability required to keep a YIN estimate
    pub voicing_threshold: f32,

    /// Spectral-peak tracker frequency band (Hz)
    pub spectral_fmin_hz: f32,
    pub spectral_fmax_hz: f32,
    /// Relative magnitude threshold for spectral peak candidates
    pub spectral_magnitude_threshold: f32,
    /// Candidates kept per frame by the spectral tracker
    pub spectral_peaks_per_frame: usize,
    /// Percentile of peak magnitudes a candidate must exceed
    pub spectral_percentile_gate: f32,

    /// IQR fence multiplier for outlier rejection
    pub iqr_fence: f32,
    /// Minimum surviving pitch frames before the extractor is considered
    /// to have failed (policy choice, not a physical limit)
    pub min_pitch_frames: usize,

    /// Vibrato search band (Hz)
    pub vibrato_band_hz: (f32, f32),
    /// Spectral peak must exceed this multiple of the median PSD
    pub vibrato_significance: f32,

    /// Dynamics category boundaries (stable < controlled < variable <
    /// expressive < highly_expressive)
    pub dynamics_boundaries: [f32; 4],

    /// Voice-type bucket boundaries in Hz
    /// (bass | bass_baritone | baritone | tenor | alto | mezzo_soprano | soprano)
    pub voice_type_boundaries_hz: [f32; 6],
    /// Brightness (centroid / sample rate) considered timbre-neutral
    pub brightness_neutral: f32,
    /// Strength of the brightness nudge on the effective pitch
    pub brightness_gain: f32,

    /// Seed for the fallback random source; `None` uses entropy.
    /// Set in tests to make fallback output reproducible.
    pub fallback_seed: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 22050,
            highpass_cutoff_hz: 80.0,
            frame_len: 2048,
            hop_len: 512,
            pitch_floor_hz: 65.0,
            pitch_ceil_hz: 2093.0,
            voicing_threshold: 0.9,
            spectral_fmin_hz: 80.0,
            spectral_fmax_hz: 2000.0,
            spectral_magnitude_threshold: 0.05,
            spectral_peaks_per_frame: 3,
            spectral_percentile_gate: 75.0,
            iqr_fence: 1.5,
            min_pitch_frames: 10,
            vibrato_band_hz: (3.0, 8.0),
            vibrato_significance: 3.0,
            dynamics_boundaries: [0.08, 0.15, 0.25, 0.35],
            voice_type_boundaries_hz: [160.0, 200.0, 250.0, 300.0, 350.0, 450.0],
            brightness_neutral: 0.06,
            brightness_gain: 1.0,
            fallback_seed: None,
        }
    }
}

impl AnalyzerConfig {
    /// Frame rate of the pitch series (frames per second)
    pub fn frame_rate(&self) -> f32 {
        self.target_sample_rate as f32 / self.hop_len as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_consistent() {
        let config = AnalyzerConfig::default();
        assert!(config.pitch_floor_hz < config.pitch_ceil_hz);
        assert!(config.spectral_fmin_hz < config.spectral_fmax_hz);
        assert!(config.hop_len <= config.frame_len);
        assert!(config.vibrato_band_hz.0 < config.vibrato_band_hz.1);

        // Category boundaries must be strictly increasing
        for w in config.dynamics_boundaries.windows(2) {
            assert!(w[0] < w[1]);
        }
        for w in config.voice_type_boundaries_hz.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_frame_rate() {
        let config = AnalyzerConfig::default();
        assert!((config.frame_rate() - 43.066).abs() < 0.01);
    }
}
