//! Note-range estimation: the lowest and highest notes the singer held.
//!
//! Raw percentile bounds on the pitch series are too eager to reward a
//! single squeak or growl, so the series is first stability-filtered:
//! only frames whose frame-to-frame pitch change is at or below the median
//! change count, excluding rapid transients and glides.

use crate::notes;
use crate::stats;

/// Percentile bounds on the stable subset
const LOW_PERCENTILE: f32 = 5.0;
const HIGH_PERCENTILE: f32 = 95.0;

/// Minimum stable samples before the percentile bounds are trusted;
/// below this the full series is used instead
const MIN_STABLE_SAMPLES: usize = 10;

/// Estimate the note range as (lowest, highest) note names.
pub(crate) fn note_range(pitches: &[f32]) -> (String, String) {
    let stable = stable_subset(pitches);
    let source: &[f32] = if stable.len() >= MIN_STABLE_SAMPLES {
        &stable
    } else {
        pitches
    };

    let low = stats::percentile(source, LOW_PERCENTILE);
    let high = stats::percentile(source, HIGH_PERCENTILE);
    (notes::frequency_to_note(low), notes::frequency_to_note(high))
}

/// Keep pitches whose change from the previous frame is at or below the
/// median frame-to-frame change.
fn stable_subset(pitches: &[f32]) -> Vec<f32> {
    if pitches.len() < 3 {
        return pitches.to_vec();
    }
    let changes: Vec<f32> = pitches.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let median_change = stats::median(&changes);

    changes
        .iter()
        .zip(pitches[1..].iter())
        .filter(|(&change, _)| change <= median_change)
        .map(|(_, &pitch)| pitch)
        .collect()
}
