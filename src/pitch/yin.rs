//! Probabilistic frame-wise YIN pitch tracking.
//!
//! Classic YIN (difference function + cumulative mean normalized difference)
//! with a pYIN-style probabilistic voicing decision: candidate lags are the
//! local minima of the CMND curve, and a grid of absolute thresholds weighted
//! by a Beta(2, 18) prior distributes probability mass over them. The mass a
//! frame accumulates across all thresholds is its voicing probability.
//!
//! The difference function is computed in O(n log n) via FFT autocorrelation.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::config::AnalyzerConfig;

/// Number of candidate-selection thresholds on (0, 1]
const N_THRESHOLDS: usize = 100;

/// Beta prior over thresholds; favors low thresholds like pYIN
const BETA_A: f32 = 2.0;
const BETA_B: f32 = 18.0;

/// A single frame's pitch estimate with its voicing probability
#[derive(Debug, Clone, Copy)]
pub(crate) struct FramePitch {
    pub frequency: f32,
    pub voiced_prob: f32,
}

/// Track pitch across the buffer, returning one estimate per frame that
/// produced any voiced candidate.
pub(crate) fn track(samples: &[f32], sample_rate: u32, config: &AnalyzerConfig) -> Vec<FramePitch> {
    let frame_len = config.frame_len;
    let hop_len = config.hop_len;
    if samples.len() < frame_len || frame_len == 0 || hop_len == 0 {
        return Vec::new();
    }

    let min_tau = ((sample_rate as f32 / config.pitch_ceil_hz).floor() as usize).max(2);
    let max_tau = ((sample_rate as f32 / config.pitch_floor_hz).ceil() as usize)
        .min(frame_len - 1);
    if min_tau >= max_tau {
        return Vec::new();
    }

    let fft_len = (frame_len * 2).next_power_of_two();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    // Beta(a, b) prior over the threshold grid, normalized to sum to 1
    let thresholds: Vec<f32> = (1..=N_THRESHOLDS)
        .map(|i| i as f32 / N_THRESHOLDS as f32)
        .collect();
    let mut prior: Vec<f32> = thresholds
        .iter()
        .map(|&t| t.powf(BETA_A - 1.0) * (1.0 - t).powf(BETA_B - 1.0))
        .collect();
    let prior_sum: f32 = prior.iter().sum();
    if prior_sum > 0.0 {
        for w in prior.iter_mut() {
            *w /= prior_sum;
        }
    }

    let mut fft_buffer = vec![Complex { re: 0.0f32, im: 0.0 }; fft_len];
    let mut prefix_sq = vec![0.0f32; frame_len + 1];
    let mut diff = vec![0.0f32; max_tau + 1];
    let mut cmnd = vec![0.0f32; max_tau + 1];

    let mut out = Vec::new();
    let mut start = 0;
    while start + frame_len <= samples.len() {
        let frame = &samples[start..start + frame_len];
        start += hop_len;

        difference_function(
            frame,
            max_tau,
            fft.as_ref(),
            ifft.as_ref(),
            &mut fft_buffer,
            &mut prefix_sq,
            &mut diff,
        );
        cumulative_mean_normalized(&diff, &mut cmnd);

        let minima = local_minima(&cmnd, min_tau, max_tau);
        if minima.is_empty() {
            continue;
        }

        // Distribute prior mass: each threshold votes for the first local
        // minimum that falls below it.
        let mut tau_mass: Vec<(usize, f32)> = minima.iter().map(|&t| (t, 0.0)).collect();
        let mut voiced_prob = 0.0;
        for (t, w) in thresholds.iter().zip(prior.iter()) {
            if let Some(slot) = tau_mass.iter_mut().find(|(tau, _)| cmnd[*tau] < *t) {
                slot.1 += w;
                voiced_prob += w;
            }
        }

        let best = tau_mass
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let Some(&(best_tau, mass)) = best else {
            continue;
        };
        if mass <= 0.0 {
            continue;
        }

        let refined_tau = parabolic_interpolation(&cmnd, best_tau);
        if refined_tau <= 0.0 {
            continue;
        }
        let frequency = sample_rate as f32 / refined_tau;
        if frequency >= config.pitch_floor_hz && frequency <= config.pitch_ceil_hz {
            out.push(FramePitch {
                frequency,
                voiced_prob,
            });
        }
    }

    out
}

/// YIN difference function d(tau) via the FFT autocorrelation identity.
#[allow(clippy::too_many_arguments)]
fn difference_function(
    frame: &[f32],
    max_tau: usize,
    fft: &dyn rustfft::Fft<f32>,
    ifft: &dyn rustfft::Fft<f32>,
    fft_buffer: &mut [Complex<f32>],
    prefix_sq: &mut [f32],
    diff: &mut [f32],
) {
    let n = frame.len();

    fft_buffer.fill(Complex { re: 0.0, im: 0.0 });
    for (slot, &sample) in fft_buffer.iter_mut().zip(frame.iter()) {
        slot.re = sample;
    }
    fft.process(fft_buffer);
    for value in fft_buffer.iter_mut() {
        let power = value.re * value.re + value.im * value.im;
        *value = Complex { re: power, im: 0.0 };
    }
    ifft.process(fft_buffer);

    prefix_sq[0] = 0.0;
    for (idx, &sample) in frame.iter().enumerate() {
        prefix_sq[idx + 1] = prefix_sq[idx] + sample * sample;
    }

    diff.fill(0.0);
    let scale = 1.0 / fft_buffer.len() as f32;
    for tau in 1..=max_tau.min(n - 1) {
        let sum_head = prefix_sq[n - tau];
        let sum_tail = prefix_sq[n] - prefix_sq[tau];
        let autocorr = fft_buffer[tau].re * scale;
        diff[tau] = sum_head + sum_tail - 2.0 * autocorr;
    }
}

/// Cumulative mean normalized difference: d'(0) = 1,
/// d'(tau) = d(tau) * tau / sum(d(1..=tau)).
fn cumulative_mean_normalized(diff: &[f32], cmnd: &mut [f32]) {
    cmnd[0] = 1.0;
    let mut running_sum = 0.0;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        cmnd[tau] = if running_sum <= 0.0 {
            1.0
        } else {
            diff[tau] * tau as f32 / running_sum
        };
    }
}

/// Local minima of the CMND curve within [min_tau, max_tau], ascending.
fn local_minima(cmnd: &[f32], min_tau: usize, max_tau: usize) -> Vec<usize> {
    let mut minima = Vec::new();
    let hi = max_tau.min(cmnd.len().saturating_sub(2));
    for tau in min_tau.max(1)..=hi {
        if cmnd[tau] < cmnd[tau - 1] && cmnd[tau] <= cmnd[tau + 1] {
            minima.push(tau);
        }
    }
    minima
}

/// Refine a lag estimate by fitting a parabola through the minimum and its
/// neighbors.
fn parabolic_interpolation(cmnd: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f32;
    }
    let y1 = cmnd[tau - 1];
    let y2 = cmnd[tau];
    let y3 = cmnd[tau + 1];
    let denom = y1 - 2.0 * y2 + y3;
    if denom.abs() < 1e-12 {
        return tau as f32;
    }
    tau as f32 + 0.5 * (y1 - y3) / denom
}
