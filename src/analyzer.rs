//! Analysis orchestration.
//!
//! `VoiceAnalyzer` wires the pipeline stages together: decode and
//! preprocess, extract the pitch series, run the metric calculators, then
//! validate. Decode failures and insufficient pitch data route to the
//! fallback generator instead of surfacing; the outcome is tagged so
//! callers can tell a genuine measurement from a heuristic stand-in.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::{self, AudioBuffer};
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::fallback;
use crate::features;
use crate::metrics;
use crate::pitch;
use crate::result::VocalMetricsResult;
use crate::validate;

/// Why a result came from the fallback generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The file could not be decoded as audio
    DecodeFailed,
    /// Too few pitch frames survived extraction
    InsufficientPitchData,
    /// A calculator produced a non-finite value
    CalculatorFailure,
}

/// An analysis outcome, tagged by provenance.
///
/// `Measured` carries metrics computed from the recording; `Estimated`
/// carries a synthetic record from the fallback generator together with the
/// reason analysis could not complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Measured(VocalMetricsResult),
    Estimated {
        metrics: VocalMetricsResult,
        reason: FallbackReason,
    },
}

impl AnalysisOutcome {
    /// The metrics record, regardless of provenance
    pub fn metrics(&self) -> &VocalMetricsResult {
        match self {
            AnalysisOutcome::Measured(metrics) => metrics,
            AnalysisOutcome::Estimated { metrics, .. } => metrics,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, AnalysisOutcome::Estimated { .. })
    }
}

/// The vocal-signal analysis pipeline.
#[derive(Debug, Clone, Default)]
pub struct VoiceAnalyzer {
    config: AnalyzerConfig,
}

impl VoiceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an audio file.
    ///
    /// Always produces a complete outcome for decodable-or-not audio; the
    /// only errors are contract violations caught before the pipeline runs
    /// (empty path, non-positive or non-finite hint).
    pub fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        hint_pitch_hz: Option<f32>,
    ) -> Result<AnalysisOutcome, AnalyzerError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AnalyzerError::InvalidArgument("empty path".to_string()));
        }
        validate_hint(hint_pitch_hz)?;

        info!("Analyzing {}", path.display());
        let buffer = match audio::decode_file(path, &self.config) {
            Ok(buffer) => buffer,
            Err(err) => {
                warn!("Decode failed, generating fallback metrics: {err}");
                return Ok(self.estimated(hint_pitch_hz, None, FallbackReason::DecodeFailed));
            }
        };

        Ok(self.analyze_buffer(&buffer, hint_pitch_hz))
    }

    /// Analyze an already-decoded buffer. Non-positive or non-finite hints
    /// are ignored.
    pub fn analyze_buffer(
        &self,
        buffer: &AudioBuffer,
        hint_pitch_hz: Option<f32>,
    ) -> AnalysisOutcome {
        let hint = hint_pitch_hz.filter(|&h| h > 0.0 && h.is_finite());
        let mut samples = buffer.samples().to_vec();
        audio::preprocess(
            &mut samples,
            buffer.sample_rate(),
            self.config.highpass_cutoff_hz,
        );
        let buffer = AudioBuffer::from_samples(samples, buffer.sample_rate());

        let series = match pitch::extract_pitch_series(&buffer, &self.config) {
            Ok(series) => series,
            Err(err) => {
                warn!("Pitch extraction failed, generating fallback metrics: {err}");
                return self.estimated(hint, Some(&buffer), FallbackReason::InsufficientPitchData);
            }
        };
        info!("Extracted {} pitch frames", series.len());

        let draft = self.run_calculators(&series, &buffer);
        if !draft.all_finite() {
            warn!("Calculator produced a non-finite value, generating fallback metrics");
            return self.estimated(hint, Some(&buffer), FallbackReason::CalculatorFailure);
        }

        AnalysisOutcome::Measured(validate::refine(draft, hint, &self.config))
    }

    /// Run the six calculators over the shared pitch series.
    fn run_calculators(&self, series: &pitch::PitchSeries, buffer: &AudioBuffer) -> VocalMetricsResult {
        let pitches = series.values();
        let samples = buffer.samples();
        let timbre = features::compute(buffer, &self.config);
        let (lowest_note, highest_note) = metrics::note_range::note_range(pitches);

        VocalMetricsResult {
            mean_pitch: metrics::mean_pitch(pitches),
            vibrato_rate: metrics::vibrato::vibrato_rate(
                pitches,
                self.config.frame_rate(),
                &self.config,
            ),
            jitter: metrics::jitter::jitter(pitches),
            shimmer: metrics::shimmer::shimmer(samples, buffer.sample_rate()),
            dynamics: metrics::dynamics::dynamics(pitches, samples, &self.config),
            voice_type: metrics::voice_type::classify(pitches, timbre.brightness, &self.config),
            lowest_note,
            highest_note,
        }
    }

    /// Build a tagged fallback outcome; the synthetic record still goes
    /// through the validator so the range invariants hold everywhere.
    fn estimated(
        &self,
        hint_pitch_hz: Option<f32>,
        buffer: Option<&AudioBuffer>,
        reason: FallbackReason,
    ) -> AnalysisOutcome {
        let mut rng = match self.config.fallback_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let metrics = fallback::generate(hint_pitch_hz, buffer, &self.config, &mut rng);
        AnalysisOutcome::Estimated {
            metrics: validate::refine(metrics, hint_pitch_hz, &self.config),
            reason,
        }
    }
}

fn validate_hint(hint_pitch_hz: Option<f32>) -> Result<(), AnalyzerError> {
    if let Some(hint) = hint_pitch_hz {
        if !(hint > 0.0 && hint.is_finite()) {
            return Err(AnalyzerError::InvalidArgument(format!(
                "pitch hint must be a positive finite frequency, got {hint}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone_buffer(freq: f32, duration_secs: f32) -> AudioBuffer {
        let sample_rate = 22050;
        let n = (sample_rate as f32 * duration_secs) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * PI * freq * t).sin()
            })
            .collect();
        AudioBuffer::from_samples(samples, sample_rate)
    }

    #[test]
    fn test_tone_is_measured() {
        let analyzer = VoiceAnalyzer::new();
        let outcome = analyzer.analyze_buffer(&tone_buffer(220.0, 2.0), None);
        assert!(!outcome.is_estimated());
        let metrics = outcome.metrics();
        assert!((metrics.mean_pitch - 220.0).abs() < 15.0, "{}", metrics.mean_pitch);
    }

    #[test]
    fn test_silence_is_estimated() {
        let analyzer = VoiceAnalyzer::new();
        let buffer = AudioBuffer::from_samples(vec![0.0; 44100], 22050);
        let outcome = analyzer.analyze_buffer(&buffer, None);
        assert!(matches!(
            outcome,
            AnalysisOutcome::Estimated {
                reason: FallbackReason::InsufficientPitchData,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let analyzer = VoiceAnalyzer::new();
        assert!(matches!(
            analyzer.analyze_file("", None),
            Err(AnalyzerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bad_hint_is_rejected() {
        let analyzer = VoiceAnalyzer::new();
        for hint in [0.0, -220.0, f32::NAN, f32::INFINITY] {
            assert!(analyzer.analyze_file("ignored.wav", Some(hint)).is_err());
        }
    }

    #[test]
    fn test_missing_file_falls_back() {
        let analyzer = VoiceAnalyzer::new();
        let outcome = analyzer
            .analyze_file("/nonexistent/clip.wav", Some(220.0))
            .unwrap();
        assert!(matches!(
            outcome,
            AnalysisOutcome::Estimated {
                reason: FallbackReason::DecodeFailed,
                ..
            }
        ));
        assert_eq!(outcome.metrics().mean_pitch, 220.0);
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let analyzer = VoiceAnalyzer::with_config(AnalyzerConfig {
            fallback_seed: Some(1),
            ..AnalyzerConfig::default()
        });
        let buffer = AudioBuffer::from_samples(vec![0.0; 44100], 22050);
        let outcome = analyzer.analyze_buffer(&buffer, None);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["provenance"], "estimated");
        assert_eq!(json["reason"], "insufficient_pitch_data");
    }
}
