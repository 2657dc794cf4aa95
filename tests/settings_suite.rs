use clap::Parser;
use phasescope::config::{AudioSource, Config, RenderMode, RendererMode, SampleSource};
use phasescope::settings::{
    is_valid_fft_size, step_fft_size, Settings, SettingsError, SettingsUpdate,
};

#[test]
fn defaults_are_stable() {
    let s = Settings::default();
    assert_eq!(s.fft_size(), 1024);
    assert_eq!(s.fade_interval(), 0.2);
    assert_eq!(s.hue_speed(), 40.0);
    assert_eq!(s.gain(), 1.0);
    assert!(s.log2());
    assert_eq!(s.sample_source(), SampleSource::Wave);
    assert_eq!(s.mode(), RenderMode::Lissajous);
    assert!(s.rotate45());
}

#[test]
fn fft_sizes_must_be_bounded_powers_of_two() {
    for n in [32usize, 64, 1024, 32_768] {
        assert!(is_valid_fft_size(n), "{n}");
    }
    for n in [0usize, 1, 16, 48, 1000, 65_536] {
        assert!(!is_valid_fft_size(n), "{n}");
    }
    assert_eq!(step_fft_size(1024, true), 2048);
    assert_eq!(step_fft_size(1024, false), 512);
    assert_eq!(step_fft_size(32_768, true), 32_768);
    assert_eq!(step_fft_size(32, false), 32);
}

#[test]
fn invalid_updates_leave_settings_untouched() {
    let mut s = Settings::default();
    let cases = [
        (SettingsUpdate::FftSize(1000), SettingsError::InvalidFftSize(1000)),
        (
            SettingsUpdate::FadeInterval(f64::NAN),
            SettingsError::NonFiniteValue { field: "fade_interval" },
        ),
        (SettingsUpdate::FadeInterval(-0.5), SettingsError::NegativeFadeInterval(-0.5)),
        (
            SettingsUpdate::HueSpeed(f32::INFINITY),
            SettingsError::NonFiniteValue { field: "hue_speed" },
        ),
        (SettingsUpdate::Gain(-2.0), SettingsError::NegativeGain(-2.0)),
    ];
    for (update, err) in cases {
        assert_eq!(s.apply(update), Err(err));
    }
    assert_eq!(s, Settings::default());
}

#[test]
fn valid_updates_apply_in_order() {
    let s = Settings::default()
        .with_updates([
            SettingsUpdate::HueSpeed(-15.0),
            SettingsUpdate::FadeInterval(0.0),
            SettingsUpdate::Mode(RenderMode::Disc),
            SettingsUpdate::SampleSource(SampleSource::Fft),
            SettingsUpdate::Gain(0.0),
            SettingsUpdate::Mode(RenderMode::WaveShape),
        ])
        .unwrap();
    assert_eq!(s.hue_speed(), -15.0);
    assert_eq!(s.fade_interval(), 0.0);
    assert_eq!(s.mode(), RenderMode::WaveShape);
    assert_eq!(s.sample_source(), SampleSource::Fft);
    assert_eq!(s.gain(), 0.0);
}

#[test]
fn with_updates_stops_at_first_error() {
    let err = Settings::default()
        .with_updates([SettingsUpdate::Gain(2.0), SettingsUpdate::FftSize(3)])
        .unwrap_err();
    assert_eq!(err, SettingsError::InvalidFftSize(3));
    assert!(err.to_string().contains("power of two"));
}

#[test]
fn mode_cycle_visits_every_mode() {
    let mut m = RenderMode::Lissajous;
    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(m);
        m = m.next();
    }
    assert_eq!(seen, RenderMode::all().to_vec());
    assert_eq!(m, RenderMode::Lissajous);
    assert_eq!(SampleSource::Wave.toggled(), SampleSource::Fft);
}

// ── command line ────────────────────────────────────────────────────────────

#[test]
fn cli_defaults_match_settings_defaults() {
    let cfg = Config::try_parse_from(["phasescope"]).unwrap();
    assert_eq!(cfg.source, AudioSource::Mic);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.fps, 60);
    assert!(cfg.sync_updates);
    assert!(cfg.log_file.is_none());
    assert_eq!(cfg.settings().unwrap(), Settings::default());
}

#[test]
fn cli_overrides_and_aliases() {
    let cfg = Config::try_parse_from([
        "phasescope",
        "--source",
        "demo",
        "--renderer",
        "dots",
        "--mode",
        "radial",
        "--sample-source",
        "spectrum",
        "--fft-size",
        "4096",
        "--fade-interval",
        "0.5",
        "--hue-speed",
        "-20",
        "--gain",
        "1.5",
        "--log2",
        "false",
        "--rotate45",
        "false",
    ])
    .unwrap();
    assert_eq!(cfg.source, AudioSource::Synth);
    assert_eq!(cfg.renderer, RendererMode::Braille);

    let s = cfg.settings().unwrap();
    assert_eq!(s.mode(), RenderMode::Disc);
    assert_eq!(s.sample_source(), SampleSource::Fft);
    assert_eq!(s.fft_size(), 4096);
    assert_eq!(s.fade_interval(), 0.5);
    assert_eq!(s.hue_speed(), -20.0);
    assert_eq!(s.gain(), 1.5);
    assert!(!s.log2());
    assert!(!s.rotate45());
}

#[test]
fn cli_rejects_invalid_settings_after_parsing() {
    let cfg = Config::try_parse_from(["phasescope", "--fft-size", "1000"]).unwrap();
    assert_eq!(cfg.settings(), Err(SettingsError::InvalidFftSize(1000)));
    assert!(Config::try_parse_from(["phasescope", "--mode", "spiral"]).is_err());
}
