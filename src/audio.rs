//! Audio decoding and preprocessing.
//!
//! Loads a WAV file into a mono f32 buffer at the target sample rate,
//! applies a 4th-order Butterworth high-pass at 80 Hz to remove sub-vocal
//! rumble, then normalizes so the peak absolute amplitude is 1.0.

use std::path::Path;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};
use hound::SampleFormat;
use rubato::{FftFixedIn, Resampler};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;

/// Q values of the two cascaded biquad sections forming a 4th-order
/// Butterworth response.
const BUTTERWORTH_4TH_ORDER_Q: [f32; 2] = [0.5412, 1.3066];

/// Peaks below this are treated as silence and left unnormalized
const SILENCE_PEAK: f32 = 1e-6;

/// Chunk size fed to the resampler
const RESAMPLE_CHUNK: usize = 1024;

/// Immutable decoded audio: mono samples plus their sample rate.
///
/// Owned by a single analysis invocation and never mutated after decode.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap an already-decoded mono sample buffer.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a WAV file into a mono [`AudioBuffer`] at the configured target
/// sample rate. Preprocessing (high-pass, normalization) is a separate step.
pub fn decode_file(path: &Path, config: &AnalyzerConfig) -> Result<AudioBuffer, AnalyzerError> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| AnalyzerError::decode(path, &e))?;
    let spec = reader.spec();

    debug!(
        "Decoding {:?}: {} Hz, {} channel(s), {:?} {}-bit",
        path, spec.sample_rate, spec.channels, spec.sample_format, spec.bits_per_sample
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AnalyzerError::decode(path, &e))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AnalyzerError::decode(path, &e))?
        }
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    let samples = resample(mono, spec.sample_rate, config.target_sample_rate)
        .map_err(|e| AnalyzerError::decode(path, e))?;

    Ok(AudioBuffer::from_samples(samples, config.target_sample_rate))
}

/// Average interleaved channels down to mono.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample mono audio to the target rate using an FFT-based resampler.
fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>, String> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    debug!("Resampling {} Hz -> {} Hz", from_rate, to_rate);

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK,
        2, // sub_chunks for quality
        1, // mono
    )
    .map_err(|e| format!("failed to create resampler: {e}"))?;

    let mut input_buffer = vec![vec![0.0f32; RESAMPLE_CHUNK]];
    let mut output_buffer = resampler.output_buffer_allocate(true);
    let mut output = Vec::with_capacity(
        (samples.len() as f64 * to_rate as f64 / from_rate as f64) as usize + RESAMPLE_CHUNK,
    );

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        input_buffer[0][..chunk.len()].copy_from_slice(chunk);
        // Zero-pad the final partial chunk
        input_buffer[0][chunk.len()..].fill(0.0);

        let (_, output_frames) = resampler
            .process_into_buffer(&input_buffer, &mut output_buffer, None)
            .map_err(|e| format!("resampling failed: {e}"))?;
        output.extend_from_slice(&output_buffer[0][..output_frames]);
    }

    Ok(output)
}

/// High-pass filter then peak-normalize in place.
///
/// Normalization is skipped for effectively silent buffers.
pub(crate) fn preprocess(samples: &mut [f32], sample_rate: u32, highpass_cutoff_hz: f32) {
    if samples.is_empty() {
        return;
    }

    for q in BUTTERWORTH_4TH_ORDER_Q {
        let coeffs = match Coefficients::<f32>::from_params(
            Type::HighPass,
            (sample_rate as f32).hz(),
            highpass_cutoff_hz.hz(),
            q,
        ) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping high-pass section (q={q}): {e:?}");
                continue;
            }
        };
        let mut section = DirectForm2Transposed::<f32>::new(coeffs);
        for sample in samples.iter_mut() {
            *sample = section.run(*sample);
        }
    }

    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > SILENCE_PEAK {
        let gain = 1.0 / peak;
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    } else {
        debug!("Peak {peak:.2e} below silence threshold, skipping normalization");
    }
}
