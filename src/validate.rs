//! Result validation and refinement.
//!
//! The last stage before a measured result reaches the caller: applies the
//! registered-hint override when the measured mean pitch is implausible,
//! clamps every numeric field to its documented range, and widens note
//! ranges too narrow to be a real singing range.

use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::metrics::voice_type;
use crate::notes;
use crate::result::VocalMetricsResult;

/// Mean pitch outside this band triggers the hint override
const PLAUSIBLE_PITCH_HZ: (f32, f32) = (50.0, 1000.0);

/// Clamp ranges for the numeric fields
const MEAN_PITCH_RANGE: (f32, f32) = (80.0, 800.0);
const VIBRATO_RANGE: (f32, f32) = (0.0, 10.0);
const JITTER_RANGE: (f32, f32) = (0.001, 0.05);
const SHIMMER_RANGE: (f32, f32) = (0.005, 0.06);

/// A note range must span at least this frequency ratio
const MIN_RANGE_SPAN: f32 = 1.5;

/// Validate and refine a draft result in place.
pub(crate) fn refine(
    mut result: VocalMetricsResult,
    hint_pitch_hz: Option<f32>,
    config: &AnalyzerConfig,
) -> VocalMetricsResult {
    if let Some(hint) = hint_pitch_hz {
        let (lo, hi) = PLAUSIBLE_PITCH_HZ;
        if !(lo..=hi).contains(&result.mean_pitch) {
            debug!(
                "Mean pitch {} Hz implausible, overriding with hint {} Hz",
                result.mean_pitch, hint
            );
            result.mean_pitch = hint;
            result.voice_type = voice_type::classify_simple(hint, config);
        }
    }

    result.mean_pitch = clamp(result.mean_pitch, MEAN_PITCH_RANGE);
    result.vibrato_rate = clamp(result.vibrato_rate, VIBRATO_RANGE);
    result.jitter = clamp(result.jitter, JITTER_RANGE);
    result.shimmer = clamp(result.shimmer, SHIMMER_RANGE);

    if !range_is_plausible(&result.lowest_note, &result.highest_note) {
        let (lo, hi) = result.voice_type.default_range();
        debug!(
            "Note range {}-{} too narrow, substituting {}-{}",
            result.lowest_note, result.highest_note, lo, hi
        );
        result.lowest_note = lo.to_string();
        result.highest_note = hi.to_string();
    }

    result
}

fn clamp(value: f32, (lo, hi): (f32, f32)) -> f32 {
    value.clamp(lo, hi)
}

/// True when the notes parse and the high bound is at least `MIN_RANGE_SPAN`
/// times the low bound.
fn range_is_plausible(lowest: &str, highest: &str) -> bool {
    match (
        notes::note_to_frequency(lowest),
        notes::note_to_frequency(highest),
    ) {
        (Some(lo_hz), Some(hi_hz)) => hi_hz >= MIN_RANGE_SPAN * lo_hz,
        _ => false,
    }
}
