use crate::audio::{check_len, Analyser, AnalyserError, AnalysisWindow, DEFAULT_FFT_SIZE};
use std::f32::consts::TAU;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub left_hz: f32,
    /// Right-channel frequency as a multiple of `left_hz`.
    pub ratio: f32,
    /// Static phase offset of the right channel, radians.
    pub phase: f32,
    /// Slow phase walk of the right channel, Hz. Makes the figure turn.
    pub drift_hz: f32,
    pub amplitude: f32,
    pub noise: f32,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            left_hz: 110.0,
            ratio: 1.5,
            phase: 0.0,
            drift_hz: 0.25,
            amplitude: 0.7,
            noise: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
enum SynthClock {
    Wall(Instant),
    /// Samples are produced only through `advance`.
    Manual,
}

/// Deterministic stereo test signal; no audio device needed.
pub struct SyntheticAnalyser {
    channel: Channel,
    tone: Tone,
    clock: SynthClock,
    next_index: u64,
    window: AnalysisWindow,
    sample_rate: f32,
    rng: fastrand::Rng,
}

impl SyntheticAnalyser {
    /// A left/right pair driven by the wall clock from a shared start instant.
    pub fn pair(sample_rate: f32, tone: Tone) -> (Self, Self) {
        let clock = SynthClock::Wall(Instant::now());
        (
            Self::new(Channel::Left, sample_rate, tone, clock),
            Self::new(Channel::Right, sample_rate, tone, clock),
        )
    }

    /// A left/right pair that only moves when `advance` is called.
    pub fn manual_pair(sample_rate: f32, tone: Tone) -> (Self, Self) {
        (
            Self::new(Channel::Left, sample_rate, tone, SynthClock::Manual),
            Self::new(Channel::Right, sample_rate, tone, SynthClock::Manual),
        )
    }

    fn new(channel: Channel, sample_rate: f32, tone: Tone, clock: SynthClock) -> Self {
        let seed = match channel {
            Channel::Left => 0x5eed_1ef7,
            Channel::Right => 0x5eed_0419,
        };
        Self {
            channel,
            tone,
            clock,
            next_index: 0,
            window: AnalysisWindow::new(DEFAULT_FFT_SIZE),
            sample_rate: sample_rate.max(1.0),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Generate `count` further samples into the window.
    pub fn advance(&mut self, count: usize) {
        let target = self.next_index + count as u64;
        self.generate_until(target);
    }

    fn generate_until(&mut self, target: u64) {
        if target <= self.next_index {
            return;
        }
        let cap = self.window.fft_size() as u64;
        if target - self.next_index > cap {
            self.next_index = target - cap;
        }
        while self.next_index < target {
            let s = self.sample_at(self.next_index);
            self.window.push(s);
            self.next_index += 1;
        }
    }

    fn sample_at(&mut self, index: u64) -> f32 {
        let t = (index as f64 / self.sample_rate as f64) as f32;
        let tone = self.tone;
        let clean = match self.channel {
            Channel::Left => (TAU * tone.left_hz * t).sin(),
            Channel::Right => {
                let phase = tone.phase + TAU * tone.drift_hz * t;
                (TAU * tone.left_hz * tone.ratio * t + phase).sin()
            }
        };
        let noise = if tone.noise > 0.0 {
            (self.rng.f32() * 2.0 - 1.0) * tone.noise
        } else {
            0.0
        };
        (clean * tone.amplitude + noise).clamp(-1.0, 1.0)
    }

    fn catch_up(&mut self) {
        if let SynthClock::Wall(start) = self.clock {
            let elapsed = start.elapsed().as_secs_f64();
            let target = (elapsed * self.sample_rate as f64) as u64;
            self.generate_until(target);
        }
    }
}

impl Analyser for SyntheticAnalyser {
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
        self.catch_up();
        self.window.time_domain_bytes(buf);
        Ok(())
    }

    fn fill_frequency(&mut self, buf: &mut [u8]) -> Result<(), AnalyserError> {
        check_len(self.buffer_len(), buf)?;
        self.catch_up();
        self.window.frequency_bytes(buf);
        Ok(())
    }
}
