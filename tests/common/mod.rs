#![allow(dead_code)]

use phasescope::audio::{Analyser, AnalyserError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Call counters shared between a test and the analyser it handed to a painter.
#[derive(Debug, Default)]
pub struct Calls {
    pub set_fft_size: Cell<usize>,
    pub set_smoothing: Cell<usize>,
    pub last_smoothing: Cell<f32>,
    pub fills: Cell<usize>,
    pub fail: RefCell<Option<AnalyserError>>,
}

/// Analyser that replays fixed byte patterns.
pub struct ScriptedAnalyser {
    fft_size: usize,
    fixed_len: Option<usize>,
    sample_rate: f32,
    time: Vec<u8>,
    freq: Vec<u8>,
    calls: Rc<Calls>,
}

impl ScriptedAnalyser {
    pub fn new(sample_rate: f32) -> (Self, Rc<Calls>) {
        let calls = Rc::new(Calls::default());
        (
            Self {
                fft_size: 0,
                fixed_len: None,
                sample_rate,
                time: vec![128],
                freq: vec![0],
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }

    /// Report `len` as the buffer length whatever the fft size.
    pub fn with_len(mut self, len: usize) -> Self {
        self.fixed_len = Some(len);
        self
    }

    /// Time-domain bytes, repeated cyclically to fill the buffer.
    pub fn with_time(mut self, bytes: &[u8]) -> Self {
        self.time = bytes.to_vec();
        self
    }

    pub fn with_freq(mut self, bytes: &[u8]) -> Self {
        self.freq = bytes.to_vec();
        self
    }

    fn fill(&self, pattern: &[u8], buf: &mut [u8]) -> Result<(), AnalyserError> {
        self.calls.fills.set(self.calls.fills.get() + 1);
        if let Some(err) = self.calls.fail.borrow().clone() {
            return Err(err);
        }
        if buf.len() != self.buffer_len() {
            return Err(AnalyserError::LengthMismatch {
                expected: self.buffer_len(),
                got: buf.len(),
            });
        }
        for (dst, src) in buf.iter_mut().zip(pattern.iter().cycle()) {
            *dst = *src;
        }
        Ok(())
    }
}

impl Analyser for ScriptedAnalyser {
    fn set_fft_size(&mut self, fft_size: usize) {
        self.calls.set_fft_size.set(self.calls.set_fft_size.get() + 1);
        self.fft_size = fft_size;
    }

    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn buffer_len(&self) -> usize {
        self.fixed_len.unwrap_or(self.fft_size / 2)
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn set_smoothing_time_constant(&mut self, value: f32) {
        self.calls.set_smoothing.set(self.calls.set_smoothing.get() + 1);
        self.calls.last_smoothing.set(value);
    }

    fn fill_time_domain(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError> {
        self.fill(&self.time, buf)
    }

    fn fill_frequency(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError> {
        self.fill(&self.freq, buf)
    }
}

/// Both channels replaying the same pattern; returns the left channel's counters.
pub fn scripted_pair(
    sample_rate: f32,
    shape: impl Fn(ScriptedAnalyser) -> ScriptedAnalyser,
) -> (Box<dyn Analyser>, Box<dyn Analyser>, Rc<Calls>, Rc<Calls>) {
    let (l, lc) = ScriptedAnalyser::new(sample_rate);
    let (r, rc) = ScriptedAnalyser::new(sample_rate);
    (Box::new(shape(l)), Box::new(shape(r)), lc, rc)
}

pub fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}
