//! Vocal-signal analysis: turn a voice recording into a compact set of
//! vocal metrics.
//!
//! The pipeline decodes and preprocesses the audio, extracts a pitch series
//! with two complementary trackers, runs six independent metric calculators
//! over it, and validates the combined result. When any stage fails, a
//! fallback generator produces a plausible synthetic record instead, and
//! the outcome is tagged so callers can tell the difference.
//!
//! ```no_run
//! use vocal_metrics::VoiceAnalyzer;
//!
//! let analyzer = VoiceAnalyzer::new();
//! let outcome = analyzer.analyze_file("recording.wav", Some(220.0))?;
//! let metrics = outcome.metrics();
//! println!("{} / {}", metrics.voice_type.as_str(), metrics.lowest_note);
//! # Ok::<(), vocal_metrics::AnalyzerError>(())
//! ```

mod analyzer;
mod audio;
mod config;
mod error;
mod fallback;
mod features;
mod metrics;
mod notes;
mod pitch;
mod result;
mod stats;
mod validate;

pub use analyzer::{AnalysisOutcome, FallbackReason, VoiceAnalyzer};
pub use audio::{decode_file, AudioBuffer};
pub use config::AnalyzerConfig;
pub use error::AnalyzerError;
pub use notes::{frequency_to_note, note_to_frequency};
pub use pitch::{extract_pitch_series, PitchSeries};
pub use result::{Dynamics, VocalMetricsResult, VoiceType};
