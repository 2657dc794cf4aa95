use crate::audio::{DEFAULT_FFT_SIZE, MAX_FFT_SIZE, MIN_FFT_SIZE};
use crate::config::{RenderMode, SampleSource};
use std::fmt;

pub const DEFAULT_FADE_INTERVAL: f64 = 0.2;
pub const DEFAULT_HUE_SPEED: f32 = 40.0;

/// User-tunable painter parameters. Only reachable through [`SettingsUpdate`],
/// so a `Settings` value is always valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    fft_size: usize,
    fade_interval: f64,
    hue_speed: f32,
    gain: f32,
    log2: bool,
    sample_source: SampleSource,
    mode: RenderMode,
    rotate45: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            fade_interval: DEFAULT_FADE_INTERVAL,
            hue_speed: DEFAULT_HUE_SPEED,
            gain: 1.0,
            log2: true,
            sample_source: SampleSource::Wave,
            mode: RenderMode::Lissajous,
            rotate45: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsUpdate {
    FftSize(usize),
    /// Seconds.
    FadeInterval(f64),
    /// Degrees per second; negative runs the hue backwards.
    HueSpeed(f32),
    Gain(f32),
    Log2(bool),
    SampleSource(SampleSource),
    Mode(RenderMode),
    Rotate45(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    InvalidFftSize(usize),
    NonFiniteValue { field: &'static str },
    NegativeFadeInterval(f64),
    NegativeGain(f32),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFftSize(n) => write!(
                f,
                "fft size {n} must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}"
            ),
            Self::NonFiniteValue { field } => write!(f, "{field} must be a finite number"),
            Self::NegativeFadeInterval(v) => write!(f, "fade interval {v} must not be negative"),
            Self::NegativeGain(v) => write!(f, "gain {v} must not be negative"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl SettingsUpdate {
    pub fn validate(self) -> Result<Self, SettingsError> {
        match self {
            Self::FftSize(n) => {
                if !is_valid_fft_size(n) {
                    return Err(SettingsError::InvalidFftSize(n));
                }
            }
            Self::FadeInterval(v) => {
                finite("fade_interval", v)?;
                if v < 0.0 {
                    return Err(SettingsError::NegativeFadeInterval(v));
                }
            }
            Self::HueSpeed(v) => finite("hue_speed", v.into())?,
            Self::Gain(v) => {
                finite("gain", v.into())?;
                if v < 0.0 {
                    return Err(SettingsError::NegativeGain(v));
                }
            }
            Self::Log2(_) | Self::SampleSource(_) | Self::Mode(_) | Self::Rotate45(_) => {}
        }
        Ok(self)
    }
}

fn finite(field: &'static str, v: f64) -> Result<(), SettingsError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::NonFiniteValue { field })
    }
}

pub fn is_valid_fft_size(n: usize) -> bool {
    n.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&n)
}

/// Double or halve `n`, staying inside the analyser's supported range.
pub fn step_fft_size(n: usize, up: bool) -> usize {
    let next = if up { n.saturating_mul(2) } else { n / 2 };
    next.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
}

impl Settings {
    /// Validate and apply one update. On error nothing changes.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), SettingsError> {
        match update.validate()? {
            SettingsUpdate::FftSize(n) => self.fft_size = n,
            SettingsUpdate::FadeInterval(v) => self.fade_interval = v,
            SettingsUpdate::HueSpeed(v) => self.hue_speed = v,
            SettingsUpdate::Gain(v) => self.gain = v,
            SettingsUpdate::Log2(v) => self.log2 = v,
            SettingsUpdate::SampleSource(v) => self.sample_source = v,
            SettingsUpdate::Mode(v) => self.mode = v,
            SettingsUpdate::Rotate45(v) => self.rotate45 = v,
        }
        Ok(())
    }

    pub fn with_updates(
        mut self,
        updates: impl IntoIterator<Item = SettingsUpdate>,
    ) -> Result<Self, SettingsError> {
        for update in updates {
            self.apply(update)?;
        }
        Ok(self)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Record a resolution the caller already checked with
    /// [`is_valid_fft_size`].
    pub(crate) fn set_fft_size(&mut self, fft_size: usize) {
        debug_assert!(is_valid_fft_size(fft_size));
        self.fft_size = fft_size;
    }

    pub fn fade_interval(&self) -> f64 {
        self.fade_interval
    }

    pub fn hue_speed(&self) -> f32 {
        self.hue_speed
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn log2(&self) -> bool {
        self.log2
    }

    pub fn sample_source(&self) -> SampleSource {
        self.sample_source
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn rotate45(&self) -> bool {
        self.rotate45
    }
}
