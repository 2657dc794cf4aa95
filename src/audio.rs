use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use ringbuf::HeapRb;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 1024;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;
pub const DEFAULT_SMOOTHING: f32 = 0.9;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyserError {
    /// The underlying stream has been torn down.
    Disconnected,
    Stream(String),
    LengthMismatch { expected: usize, got: usize },
}

impl fmt::Display for AnalyserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "audio source disconnected"),
            Self::Stream(msg) => write!(f, "audio stream error: {msg}"),
            Self::LengthMismatch { expected, got } => {
                write!(f, "buffer length mismatch (expected {expected}, got {got})")
            }
        }
    }
}

impl std::error::Error for AnalyserError {}

/// One channel of an analysing audio node.
///
/// Buffers handed to the fill methods must be exactly `buffer_len()` long;
/// they are overwritten in place.
pub trait Analyser {
    fn set_fft_size(&mut self, fft_size: usize);
    fn fft_size(&self) -> usize;
    /// Length of the byte buffers this analyser fills (half the FFT size).
    fn buffer_len(&self) -> usize;
    fn sample_rate(&self) -> f32;
    fn set_smoothing_time_constant(&mut self, value: f32);
    fn fill_time_domain(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError>;
    fn fill_frequency(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError>;
}

/// Rolling sample window plus the spectrum state shared by every concrete analyser.
pub(crate) struct AnalysisWindow {
    samples: Vec<f32>,
    write_pos: usize,
    smoothing: f32,
    fft: Arc<dyn Fft<f32>>,
    blackman: Vec<f32>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl AnalysisWindow {
    pub(crate) fn new(fft_size: usize) -> Self {
        let n = fft_size.max(2);
        let mut planner = FftPlanner::<f32>::new();
        Self {
            samples: vec![0.0; n],
            write_pos: 0,
            smoothing: DEFAULT_SMOOTHING,
            fft: planner.plan_fft_forward(n),
            blackman: blackman_window(n),
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; n / 2],
        }
    }

    pub(crate) fn fft_size(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.samples.len() / 2
    }

    pub(crate) fn set_smoothing(&mut self, value: f32) {
        self.smoothing = value.clamp(0.0, 1.0);
    }

    /// Re-plan for a new size, keeping the newest samples that still fit.
    pub(crate) fn resize(&mut self, fft_size: usize) {
        let n = fft_size.max(2);
        if n == self.samples.len() {
            return;
        }
        let old = self.ordered();
        let mut next = Self::new(n);
        next.smoothing = self.smoothing;
        let keep = old.len().min(n);
        for &s in &old[old.len() - keep..] {
            next.push(s);
        }
        *self = next;
    }

    pub(crate) fn push(&mut self, s: f32) {
        let n = self.samples.len();
        self.samples[self.write_pos] = s;
        self.write_pos = (self.write_pos + 1) % n;
    }

    fn ordered(&self) -> Vec<f32> {
        let n = self.samples.len();
        (0..n).map(|i| self.samples[(self.write_pos + i) % n]).collect()
    }

    /// Newest `buf.len()` samples as bytes centred on 128; the last byte is the newest sample.
    pub(crate) fn time_domain_bytes(&self, buf: &mut [u8]) {
        let n = self.samples.len();
        let count = buf.len().min(n);
        let start = self.write_pos + n - count;
        for (i, dst) in buf.iter_mut().take(count).enumerate() {
            *dst = sample_to_byte(self.samples[(start + i) % n]);
        }
        for dst in buf.iter_mut().skip(count) {
            *dst = 128;
        }
    }

    /// Smoothed dB magnitude spectrum mapped onto `0..=255`.
    pub(crate) fn frequency_bytes(&mut self, buf: &mut [u8]) {
        let n = self.samples.len();
        for i in 0..n {
            let s = self.samples[(self.write_pos + i) % n];
            self.fft_buf[i] = Complex { re: s * self.blackman[i], im: 0.0 };
        }
        self.fft.process(&mut self.fft_buf);

        let tau = self.smoothing;
        let scale = 1.0 / n as f32;
        for (k, c) in self.fft_buf.iter().take(self.smoothed.len()).enumerate() {
            let mag = (c.re * c.re + c.im * c.im).sqrt() * scale;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * mag;
        }

        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (k, dst) in buf.iter_mut().enumerate() {
            let Some(&mag) = self.smoothed.get(k) else {
                *dst = 0;
                continue;
            };
            let db = if mag > 0.0 { 20.0 * mag.log10() } else { f32::NEG_INFINITY };
            let scaled = 255.0 * (db - MIN_DECIBELS) / range;
            *dst = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

pub(crate) fn check_len(expected: usize, buf: &[u8]) -> Result<(), AnalyserError> {
    if buf.len() != expected {
        return Err(AnalyserError::LengthMismatch {
            expected,
            got: buf.len(),
        });
    }
    Ok(())
}

#[inline]
pub fn sample_to_byte(s: f32) -> u8 {
    (128.0 * (s + 1.0)).floor().clamp(0.0, 255.0) as u8
}

fn blackman_window(n: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42f32, 0.5f32, 0.08f32);
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let channels = dev
            .default_input_config()
            .map(|c| c.channels().to_string())
            .unwrap_or_else(|_| "?".to_string());
        writeln!(out, "  - {name} ({channels} ch)")?;
    }
    Ok(())
}

struct StreamHandle {
    _stream: cpal::Stream,
    failed: Arc<AtomicBool>,
}

/// One channel of a live stereo input stream.
///
/// The cpal callback de-interleaves into one ring buffer per channel; each
/// acquisition drains the ring into the rolling analysis window.
pub struct CaptureAnalyser {
    handle: Rc<StreamHandle>,
    cons: ringbuf::HeapCons<f32>,
    window: AnalysisWindow,
    sample_rate: f32,
}

impl CaptureAnalyser {
    /// Open the input device and return `(left, right)` analysers sharing one stream.
    /// Mono devices feed the same signal to both channels.
    pub fn open_stereo(device_query: Option<&str>) -> anyhow::Result<(Self, Self)> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb_capacity = (sample_rate_hz as usize).saturating_mul(4);
        let (mut left_prod, left_cons) = HeapRb::<f32>::new(rb_capacity).split();
        let (mut right_prod, right_cons) = HeapRb::<f32>::new(rb_capacity).split();

        let failed = Arc::new(AtomicBool::new(false));
        let failed_for_stream = Arc::clone(&failed);
        let err_fn = move |err| {
            log::error!("audio stream error: {err}");
            failed_for_stream.store(true, Ordering::Relaxed);
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| {
                    push_deinterleaved(data, channels, &mut left_prod, &mut right_prod)
                },
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| {
                    push_deinterleaved(data, channels, &mut left_prod, &mut right_prod)
                },
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| {
                    push_deinterleaved(data, channels, &mut left_prod, &mut right_prod)
                },
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };

        stream.play().context("start input stream")?;
        log::info!(
            "capturing {} ({} ch @ {} Hz)",
            device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            channels,
            sample_rate_hz
        );

        let handle = Rc::new(StreamHandle {
            _stream: stream,
            failed,
        });
        let sample_rate = sample_rate_hz as f32;
        let left = Self {
            handle: Rc::clone(&handle),
            cons: left_cons,
            window: AnalysisWindow::new(DEFAULT_FFT_SIZE),
            sample_rate,
        };
        let right = Self {
            handle,
            cons: right_cons,
            window: AnalysisWindow::new(DEFAULT_FFT_SIZE),
            sample_rate,
        };
        Ok((left, right))
    }

    fn drain(&mut self) -> Result<(), AnalyserError> {
        if self.handle.failed.load(Ordering::Relaxed) {
            return Err(AnalyserError::Disconnected);
        }
        while let Some(s) = self.cons.try_pop() {
            self.window.push(s);
        }
        Ok(())
    }
}

impl Analyser for CaptureAnalyser {
    fn set_fft_size(&mut self, fft_size: usize) {
        self.window.resize(fft_size);
    }

    fn fft_size(&self) -> usize {
        self.window.fft_size()
    }

    fn buffer_len(&self) -> usize {
        self.window.buffer_len()
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn set_smoothing_time_constant(&mut self, value: f32) {
        self.window.set_smoothing(value);
    }

    fn fill_time_domain(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError> {
        check_len(self.buffer_len(), buf)?;
        self.drain()?;
        self.window.time_domain_bytes(buf);
        Ok(())
    }

    fn fill_frequency(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError> {
        check_len(self.buffer_len(), buf)?;
        self.drain()?;
        self.window.frequency_bytes(buf);
        Ok(())
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let Some(want) = device_query.map(|s| s.to_lowercase()) else {
        return host
            .default_input_device()
            .ok_or_else(|| anyhow!("no default input device found"));
    };

    let mut devices = host.input_devices().context("enumerate input devices")?;
    devices
        .find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(&want))
                .unwrap_or(false)
        })
        .ok_or_else(|| anyhow!("no input device matching: {want}"))
}

fn push_deinterleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    left: &mut ringbuf::HeapProd<f32>,
    right: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let l = frame[0].to_float_sample();
        let r = frame.get(1).map(|s| s.to_float_sample()).unwrap_or(l);
        // A full ring means the render side stalled; newer audio is dropped until it drains.
        let _ = left.try_push(l);
        let _ = right.try_push(r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_domain_tail_is_newest() {
        let mut w = AnalysisWindow::new(8);
        for s in [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, -1.0] {
            w.push(s);
        }
        let mut buf = [0u8; 4];
        w.time_domain_bytes(&mut buf);
        assert_eq!(buf, [128, 128, 192, 0]);
    }

    #[test]
    fn resize_keeps_newest_samples() {
        let mut w = AnalysisWindow::new(8);
        for i in 0..8 {
            w.push(i as f32 / 8.0);
        }
        w.resize(4);
        assert_eq!(w.fft_size(), 4);
        assert_eq!(w.ordered(), vec![0.5, 0.625, 0.75, 0.875]);
    }

    #[test]
    fn silent_spectrum_is_zero() {
        let mut w = AnalysisWindow::new(64);
        let mut buf = vec![7u8; 32];
        w.frequency_bytes(&mut buf);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_lights_up_its_bin() {
        let n = 256usize;
        let mut w = AnalysisWindow::new(n);
        w.set_smoothing(0.0);
        for i in 0..n {
            // Quiet enough that the main lobe stays below the 255 ceiling.
            w.push((2.0 * PI * 16.0 * i as f32 / n as f32).sin() * 0.01);
        }
        let mut buf = vec![0u8; n / 2];
        w.frequency_bytes(&mut buf);
        let mut peak = 0usize;
        for (i, &b) in buf.iter().enumerate() {
            if b > buf[peak] {
                peak = i;
            }
        }
        assert_eq!(peak, 16);
        assert!(buf[16] > 150);
        assert!(buf[15] < buf[16] && buf[17] < buf[16]);
    }
}
