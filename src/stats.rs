//! Small statistics helpers shared by the metric calculators.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance; 0.0 for an empty slice.
pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f32>() / values.len() as f32
}

/// Population standard deviation.
pub fn std_dev(values: &[f32]) -> f32 {
    variance(values).sqrt()
}

/// Median; 0.0 for an empty slice.
pub fn median(values: &[f32]) -> f32 {
    percentile(values, 50.0)
}

/// Percentile with linear interpolation between ranks; 0.0 for an empty slice.
pub fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f32;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Two-sided trimmed mean: drops `trim_frac` of the samples from each tail.
///
/// Falls back to the untrimmed mean when fewer than 3 samples are available,
/// or when trimming would discard everything.
pub fn trimmed_mean(values: &[f32], trim_frac: f32) -> f32 {
    if values.len() < 3 {
        return mean(values);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let trim = (sorted.len() as f32 * trim_frac).floor() as usize;
    let kept = &sorted[trim..sorted.len() - trim];
    if kept.is_empty() {
        return mean(values);
    }
    mean(kept)
}

/// Coefficient of variation (std dev / mean); 0.0 when the mean is ~0.
pub fn coefficient_of_variation(values: &[f32]) -> f32 {
    let m = mean(values);
    if m.abs() < f32::EPSILON {
        return 0.0;
    }
    std_dev(values) / m
}
