mod common;

use common::{approx, ScriptedAnalyser};
use phasescope::audio::AnalyserError;
use phasescope::config::SampleSource;
use phasescope::sample::SampleStage;
use phasescope::settings::{Settings, SettingsUpdate};

fn settings(source: SampleSource, log2: bool, gain: f32) -> Settings {
    Settings::default()
        .with_updates([
            SettingsUpdate::SampleSource(source),
            SettingsUpdate::Log2(log2),
            SettingsUpdate::Gain(gain),
        ])
        .unwrap()
}

// ── transforms ──────────────────────────────────────────────────────────────

#[test]
fn perceptual_waveform_is_antisymmetric() {
    let stage = SampleStage::new();
    for k in 1..=127u8 {
        let up = stage.waveform_log2(128 + k);
        let down = stage.waveform_log2(128 - k);
        assert_eq!(up, -down, "k={k}");
    }
    assert_eq!(stage.waveform_log2(128), 0.0);
}

#[test]
fn perceptual_waveform_stays_in_unit_range() {
    let stage = SampleStage::new();
    for b in 0..=255u8 {
        let v = stage.waveform_log2(b);
        assert!((-1.0..=1.0).contains(&v), "byte {b} -> {v}");
    }
    assert_eq!(stage.waveform_log2(0), -1.0);
    assert!(approx(stage.waveform_log2(255), (1.0f32 + 254.0 / 255.0).log2(), 1e-6));
}

#[test]
fn perceptual_spectrum_is_monotone_with_fixed_ends() {
    let stage = SampleStage::new();
    let mut prev = f32::NEG_INFINITY;
    for b in 0..=255u8 {
        let v = stage.spectrum_log2(b);
        assert!(v > prev, "not increasing at {b}");
        prev = v;
    }
    assert_eq!(stage.spectrum_log2(0), -1.0);
    assert!(approx(stage.spectrum_log2(255), 1.0, 1e-6));
}

#[test]
fn linear_transforms() {
    assert_eq!(SampleStage::waveform_linear(255), 0.9921875);
    assert_eq!(SampleStage::waveform_linear(0), -1.0);
    assert_eq!(SampleStage::waveform_linear(128), 0.0);
    assert_eq!(SampleStage::spectrum_linear(0), -1.0);
    assert_eq!(SampleStage::spectrum_linear(128), 0.0);
    assert_eq!(SampleStage::spectrum_linear(192), 0.5);
}

#[test]
fn transform_dispatches_on_source_and_curve() {
    let stage = SampleStage::new();
    assert_eq!(stage.transform(192, SampleSource::Wave, false), 0.5);
    assert_eq!(stage.transform(192, SampleSource::Fft, false), 0.5);
    assert_eq!(
        stage.transform(192, SampleSource::Wave, true),
        stage.waveform_log2(192)
    );
    assert_eq!(
        stage.transform(192, SampleSource::Fft, true),
        stage.spectrum_log2(192)
    );
}

// ── convert / acquire ───────────────────────────────────────────────────────

#[test]
fn silence_maps_to_constant_sequences() {
    let stage = SampleStage::new();
    let mut out = Vec::new();
    for log2 in [false, true] {
        stage.convert(&[128; 16], &settings(SampleSource::Wave, log2, 1.0), &mut out);
        assert!(out.iter().all(|&v| v == 0.0));
        stage.convert(&[0; 16], &settings(SampleSource::Fft, log2, 1.0), &mut out);
        assert!(out.iter().all(|&v| v == -1.0));
        assert_eq!(out.len(), 16);
    }
}

#[test]
fn gain_scales_after_transform() {
    let stage = SampleStage::new();
    let mut out = Vec::new();
    for source in [SampleSource::Wave, SampleSource::Fft] {
        stage.convert(&[192], &settings(source, false, 2.0), &mut out);
        assert_eq!(out, vec![1.0], "{source:?}");
    }
    // Gain may push values outside the unit range.
    stage.convert(&[255], &settings(SampleSource::Wave, false, 3.0), &mut out);
    assert!(out[0] > 2.9);
}

#[test]
fn convert_reuses_output_buffer() {
    let stage = SampleStage::new();
    let mut out = vec![9.0; 64];
    stage.convert(&[255, 0], &settings(SampleSource::Wave, false, 1.0), &mut out);
    assert_eq!(out, vec![0.9921875, -1.0]);
}

#[test]
fn acquire_reads_the_configured_domain() {
    let stage = SampleStage::new();
    let (analyser, calls) = ScriptedAnalyser::new(48_000.0);
    let mut analyser = analyser.with_len(2).with_time(&[255, 0]).with_freq(&[64]);
    let mut bytes = vec![0u8; 2];
    let mut out = Vec::new();

    stage
        .acquire(&mut analyser, &mut bytes, &settings(SampleSource::Wave, false, 1.0), &mut out)
        .unwrap();
    assert_eq!(bytes, vec![255, 0]);
    assert_eq!(out, vec![0.9921875, -1.0]);

    stage
        .acquire(&mut analyser, &mut bytes, &settings(SampleSource::Fft, false, 1.0), &mut out)
        .unwrap();
    assert_eq!(bytes, vec![64, 64]);
    assert_eq!(out, vec![-0.5, -0.5]);
    assert_eq!(calls.fills.get(), 2);
}

#[test]
fn acquire_propagates_analyser_errors() {
    let stage = SampleStage::new();
    let (analyser, calls) = ScriptedAnalyser::new(48_000.0);
    let mut analyser = analyser.with_len(2);
    *calls.fail.borrow_mut() = Some(AnalyserError::Disconnected);
    let mut bytes = vec![0u8; 2];
    let mut out = Vec::new();
    let err = stage
        .acquire(&mut analyser, &mut bytes, &Settings::default(), &mut out)
        .unwrap_err();
    assert_eq!(err, AnalyserError::Disconnected);
}
