//! Byte buffers from the analysers to amplitude sequences.

use crate::audio::{Analyser, AnalyserError};
use crate::config::SampleSource;
use crate::settings::Settings;

pub const LOG2_LUT_LEN: usize = 256;

/// Turns analyser bytes into amplitudes in roughly `-1..=1` (before gain).
///
/// Perceptual curves go through a 256-entry `log2(1 + i/255)` table.
pub struct SampleStage {
    lut: [f32; LOG2_LUT_LEN],
}

impl Default for SampleStage {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStage {
    pub fn new() -> Self {
        let mut lut = [0.0f32; LOG2_LUT_LEN];
        for (i, v) in lut.iter_mut().enumerate() {
            *v = (1.0 + i as f64 / 255.0).log2() as f32;
        }
        Self { lut }
    }

    #[inline]
    fn lookup(&self, index: usize) -> f32 {
        // Byte 0 lands on index 256; pin it to the last entry so the curve ends at -1.
        self.lut[index.min(LOG2_LUT_LEN - 1)]
    }

    #[inline]
    pub fn waveform_linear(b: u8) -> f32 {
        (b as f32 - 128.0) / 128.0
    }

    /// Sign-preserving log curve around 128; antisymmetric for `128 ± k`.
    #[inline]
    pub fn waveform_log2(&self, b: u8) -> f32 {
        if b >= 128 {
            self.lookup((b as usize - 128) << 1)
        } else {
            -self.lookup((128 - b as usize) << 1)
        }
    }

    #[inline]
    pub fn spectrum_linear(b: u8) -> f32 {
        b as f32 / 128.0 - 1.0
    }

    #[inline]
    pub fn spectrum_log2(&self, b: u8) -> f32 {
        self.lookup(b as usize) * 2.0 - 1.0
    }

    pub fn transform(&self, b: u8, source: SampleSource, log2: bool) -> f32 {
        match (source, log2) {
            (SampleSource::Wave, false) => Self::waveform_linear(b),
            (SampleSource::Wave, true) => self.waveform_log2(b),
            (SampleSource::Fft, false) => Self::spectrum_linear(b),
            (SampleSource::Fft, true) => self.spectrum_log2(b),
        }
    }

    /// Map already-acquired bytes into `out`, applying gain when it is not 1.
    pub fn convert(&self, bytes: &[u8], settings: &Settings, out: &mut Vec<f32>) {
        let source = settings.sample_source();
        let log2 = settings.log2();
        out.clear();
        out.extend(bytes.iter().map(|&b| self.transform(b, source, log2)));

        let gain = settings.gain();
        if gain != 1.0 {
            for v in out.iter_mut() {
                *v *= gain;
            }
        }
    }

    /// Fill `bytes` from the analyser (time or frequency domain per settings), then convert.
    pub fn acquire(
        &self,
        analyser: &mut dyn Analyser,
        bytes: &mut [u8],
        settings: &Settings,
        out: &mut Vec<f32>,
    ) -> Result<(), AnalyserError> {
        match settings.sample_source() {
            SampleSource::Wave => analyser.fill_time_domain(bytes)?,
            SampleSource::Fft => analyser.fill_frequency(bytes)?,
        }
        self.convert(bytes, settings, out);
        Ok(())
    }
}
