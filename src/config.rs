use crate::audio::DEFAULT_FFT_SIZE;
use crate::settings::{Settings, SettingsError, SettingsUpdate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "phasescope", version, about = "Fading stereo phase scope for the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Mic)]
    pub source: AudioSource,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = RenderMode::Lissajous)]
    pub mode: RenderMode,

    #[arg(long, value_enum, default_value_t = SampleSource::Wave)]
    pub sample_source: SampleSource,

    #[arg(long, default_value_t = DEFAULT_FFT_SIZE)]
    pub fft_size: usize,

    /// Seconds for a stroke to fade out completely.
    #[arg(long, default_value_t = 0.2)]
    pub fade_interval: f64,

    /// Hue rotation, degrees per second.
    #[arg(long, default_value_t = 40.0, allow_negative_numbers = true)]
    pub hue_speed: f32,

    #[arg(long, default_value_t = 1.0)]
    pub gain: f32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub log2: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub rotate45: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    /// Write logs here instead of stderr (the scope owns the terminal).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Validated painter settings for this command line.
    pub fn settings(&self) -> Result<Settings, SettingsError> {
        Settings::default().with_updates([
            SettingsUpdate::FftSize(self.fft_size),
            SettingsUpdate::FadeInterval(self.fade_interval),
            SettingsUpdate::HueSpeed(self.hue_speed),
            SettingsUpdate::Gain(self.gain),
            SettingsUpdate::Log2(self.log2),
            SettingsUpdate::SampleSource(self.sample_source),
            SettingsUpdate::Mode(self.mode),
            SettingsUpdate::Rotate45(self.rotate45),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    #[value(alias = "input", alias = "capture")]
    Mic,
    #[value(alias = "demo", alias = "synthetic")]
    Synth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleSource {
    #[value(alias = "waveform", alias = "time")]
    Wave,
    #[value(alias = "spectrum", alias = "freq")]
    Fft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    #[value(alias = "xy", alias = "phase")]
    Lissajous,
    #[value(name = "wave-shape", alias = "wave", alias = "waveform")]
    WaveShape,
    #[value(alias = "radial")]
    Disc,
}

impl SampleSource {
    pub fn toggled(self) -> Self {
        match self {
            Self::Wave => Self::Fft,
            Self::Fft => Self::Wave,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Fft => "fft",
        }
    }
}

impl RenderMode {
    pub const fn all() -> [Self; 3] {
        [Self::Lissajous, Self::WaveShape, Self::Disc]
    }

    pub fn next(self) -> Self {
        match self {
            Self::Lissajous => Self::WaveShape,
            Self::WaveShape => Self::Disc,
            Self::Disc => Self::Lissajous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lissajous => "lissajous",
            Self::WaveShape => "wave-shape",
            Self::Disc => "disc",
        }
    }
}
