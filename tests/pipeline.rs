//! End-to-end pipeline tests over synthesized audio.

use std::f32::consts::PI;

use proptest::prelude::*;

use vocal_metrics::{
    note_to_frequency, AnalysisOutcome, AnalyzerConfig, AudioBuffer, FallbackReason,
    VocalMetricsResult, VoiceAnalyzer, VoiceType,
};

const SAMPLE_RATE: u32 = 22050;

fn tone(freq: f32, duration_secs: f32) -> AudioBuffer {
    let n = (SAMPLE_RATE as f32 * duration_secs) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            0.5 * (2.0 * PI * freq * t).sin()
        })
        .collect();
    AudioBuffer::from_samples(samples, SAMPLE_RATE)
}

/// Tone with sinusoidal vibrato, synthesized by phase integration.
fn vibrato_tone(base: f32, rate: f32, depth_cents: f32, duration_secs: f32) -> AudioBuffer {
    let n = (SAMPLE_RATE as f32 * duration_secs) as usize;
    let mut phase = 0.0f32;
    let samples = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let cents = depth_cents * (2.0 * PI * rate * t).sin();
            let freq = base * 2.0f32.powf(cents / 1200.0);
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
            0.5 * phase.sin()
        })
        .collect();
    AudioBuffer::from_samples(samples, SAMPLE_RATE)
}

fn assert_ranges(metrics: &VocalMetricsResult) {
    assert!(
        (80.0..=800.0).contains(&metrics.mean_pitch),
        "mean_pitch {}",
        metrics.mean_pitch
    );
    assert!(
        (0.0..=10.0).contains(&metrics.vibrato_rate),
        "vibrato_rate {}",
        metrics.vibrato_rate
    );
    assert!(
        (0.001..=0.05).contains(&metrics.jitter),
        "jitter {}",
        metrics.jitter
    );
    assert!(
        (0.005..=0.06).contains(&metrics.shimmer),
        "shimmer {}",
        metrics.shimmer
    );

    let lo = note_to_frequency(&metrics.lowest_note).expect("lowest note parses");
    let hi = note_to_frequency(&metrics.highest_note).expect("highest note parses");
    assert!(
        hi >= 1.5 * lo,
        "range {} - {} spans less than a fifth-plus",
        metrics.lowest_note,
        metrics.highest_note
    );
}

#[test]
fn test_clean_sustained_tone_scenario() {
    let analyzer = VoiceAnalyzer::new();
    let buffer = vibrato_tone(220.0, 5.0, 20.0, 3.0);
    let outcome = analyzer.analyze_buffer(&buffer, None);

    assert!(!outcome.is_estimated());
    let metrics = outcome.metrics();
    assert!(
        (4.0..=6.0).contains(&metrics.vibrato_rate),
        "vibrato_rate {}",
        metrics.vibrato_rate
    );
    assert_eq!(metrics.voice_type, VoiceType::Baritone);
    assert_ranges(metrics);
}

#[test]
fn test_silence_scenario() {
    let analyzer = VoiceAnalyzer::with_config(AnalyzerConfig {
        fallback_seed: Some(11),
        ..AnalyzerConfig::default()
    });
    let silence = AudioBuffer::from_samples(vec![0.0; SAMPLE_RATE as usize * 2], SAMPLE_RATE);

    let outcome = analyzer.analyze_buffer(&silence, None);
    assert!(outcome.is_estimated());
    assert_ranges(outcome.metrics());

    let hinted = analyzer.analyze_buffer(&silence, Some(220.0));
    assert_eq!(hinted.metrics().mean_pitch, 220.0);
}

#[test]
fn test_empty_buffer_yields_complete_result() {
    let analyzer = VoiceAnalyzer::with_config(AnalyzerConfig {
        fallback_seed: Some(3),
        ..AnalyzerConfig::default()
    });
    let empty = AudioBuffer::from_samples(vec![], SAMPLE_RATE);
    let outcome = analyzer.analyze_buffer(&empty, None);
    assert!(matches!(
        outcome,
        AnalysisOutcome::Estimated {
            reason: FallbackReason::InsufficientPitchData,
            ..
        }
    ));
    assert_ranges(outcome.metrics());
}

#[test]
fn test_hint_overrides_out_of_band_pitch() {
    // A whistle-register tone measures far above the plausible singing band,
    // so the caller's hint takes over
    let analyzer = VoiceAnalyzer::new();
    let outcome = analyzer.analyze_buffer(&tone(1200.0, 2.0), Some(220.0));

    assert!(!outcome.is_estimated());
    let metrics = outcome.metrics();
    assert_eq!(metrics.mean_pitch, 220.0);
    assert_eq!(metrics.voice_type, VoiceType::Baritone);
}

#[test]
fn test_measured_path_is_deterministic() {
    let analyzer = VoiceAnalyzer::new();
    let buffer = vibrato_tone(196.0, 5.5, 30.0, 2.0);

    let first = analyzer.analyze_buffer(&buffer, Some(196.0));
    let second = analyzer.analyze_buffer(&buffer, Some(196.0));
    assert_eq!(first, second);
}

#[test]
fn test_seeded_fallback_is_deterministic() {
    let analyzer = VoiceAnalyzer::with_config(AnalyzerConfig {
        fallback_seed: Some(99),
        ..AnalyzerConfig::default()
    });
    let silence = AudioBuffer::from_samples(vec![0.0; SAMPLE_RATE as usize], SAMPLE_RATE);

    let first = analyzer.analyze_buffer(&silence, None);
    let second = analyzer.analyze_buffer(&silence, None);
    assert_eq!(first, second);
}

#[test]
fn test_analyze_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voice.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in vibrato_tone(220.0, 5.0, 20.0, 3.0).samples() {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();

    let analyzer = VoiceAnalyzer::new();
    let outcome = analyzer.analyze_file(&path, None).unwrap();
    assert!(!outcome.is_estimated());
    assert_ranges(outcome.metrics());
}

#[test]
fn test_result_serializes_flat() {
    let analyzer = VoiceAnalyzer::new();
    let outcome = analyzer.analyze_buffer(&tone(220.0, 2.0), None);
    let json = serde_json::to_value(outcome.metrics()).unwrap();

    for field in [
        "mean_pitch",
        "vibrato_rate",
        "jitter",
        "shimmer",
        "dynamics",
        "voice_type",
        "lowest_note",
        "highest_note",
    ] {
        assert!(json.get(field).is_some(), "missing field {field}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Range invariants hold for arbitrary tones, measured or estimated.
    #[test]
    fn prop_range_invariants(freq in 90.0f32..700.0, amplitude in 0.05f32..0.9) {
        let n = SAMPLE_RATE as usize;
        let samples: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * PI * freq * t).sin()
            })
            .collect();
        let buffer = AudioBuffer::from_samples(samples, SAMPLE_RATE);

        let analyzer = VoiceAnalyzer::with_config(AnalyzerConfig {
            fallback_seed: Some(5),
            ..AnalyzerConfig::default()
        });
        let outcome = analyzer.analyze_buffer(&buffer, None);
        assert_ranges(outcome.metrics());
    }
}
