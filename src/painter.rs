use crate::audio::{Analyser, AnalyserError, DEFAULT_SMOOTHING};
use crate::color::{advance_hue, brightness, stroke_hue, Hsla, Rgba};
use crate::config::RenderMode;
use crate::geometry::{self, StrokePath};
use crate::sample::SampleStage;
use crate::settings::{Settings, SettingsError, SettingsUpdate};
use crate::surface::Surface;
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

/// Per-frame working values. Lives for one `draw_frame` call.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub dt: f32,
    pub fade: f32,
    pub hue: u16,
    pub brightness: f32,
    pub left: &'a [f32],
    pub right: &'a [f32],
}

/// What a frame did, for the host's HUD and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub dt: f32,
    pub fade: f32,
    /// Continuous hue after this frame's advance.
    pub hue: f32,
    pub stroke_hue: u16,
    pub brightness: f32,
    pub partition_len: usize,
    pub strokes: usize,
    pub points: usize,
    /// Set when sample acquisition failed and nothing was drawn.
    pub skipped: Option<AnalyserError>,
}

/// The render stage: owns both analysers, their byte buffers and all state
/// that survives between frames.
pub struct Painter {
    left: Box<dyn Analyser>,
    right: Box<dyn Analyser>,
    left_bytes: Vec<u8>,
    right_bytes: Vec<u8>,
    left_values: Vec<f32>,
    right_values: Vec<f32>,
    stage: SampleStage,
    settings: Settings,
    fft_size: usize,
    sample_rate: f32,
    hue: f32,
}

impl Painter {
    pub fn new(left: Box<dyn Analyser>, right: Box<dyn Analyser>, settings: Settings) -> Self {
        let mut painter = Self {
            left,
            right,
            left_bytes: Vec::new(),
            right_bytes: Vec::new(),
            left_values: Vec::new(),
            right_values: Vec::new(),
            stage: SampleStage::new(),
            settings,
            fft_size: 0,
            sample_rate: 0.0,
            hue: 0.0,
        };
        painter.reconfigure(settings.fft_size());
        painter
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn buffer_len(&self) -> usize {
        self.left_bytes.len()
    }

    /// Amplitudes from the last frame; both empty after a skipped frame.
    pub fn values(&self) -> (&[f32], &[f32]) {
        (&self.left_values, &self.right_values)
    }

    pub fn partition_len(&self) -> usize {
        geometry::partition_len(self.sample_rate, self.settings.fade_interval())
    }

    /// Change the analyser resolution. Returns `Ok(false)` when `fft_size` is
    /// already in effect; nothing is touched in that case.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<bool, SettingsError> {
        SettingsUpdate::FftSize(fft_size).validate()?;
        if fft_size == self.fft_size {
            return Ok(false);
        }
        self.reconfigure(fft_size);
        Ok(true)
    }

    fn reconfigure(&mut self, fft_size: usize) {
        for analyser in [&mut self.left, &mut self.right] {
            analyser.set_fft_size(fft_size);
            analyser.set_smoothing_time_constant(DEFAULT_SMOOTHING);
        }

        let (l, r) = (self.left.buffer_len(), self.right.buffer_len());
        if l != r {
            log::warn!("analysers disagree on buffer length ({l} vs {r}); using the shorter");
        }
        let len = l.min(r);
        self.left_bytes = vec![0; len];
        self.right_bytes = vec![0; len];
        self.left_values.clear();
        self.right_values.clear();
        self.sample_rate = self.left.sample_rate();
        self.fft_size = fft_size;
        self.settings.set_fft_size(fft_size);

        log::debug!(
            "resolution {fft_size}: {len} samples per channel @ {} Hz",
            self.sample_rate
        );
    }

    /// Validate and apply one update; resolution changes reallocate buffers.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), SettingsError> {
        match update {
            SettingsUpdate::FftSize(n) => self.set_fft_size(n).map(|_| ()),
            other => self.settings.apply(other),
        }
    }

    /// Render one frame `dt` seconds after the previous one.
    pub fn draw_frame(&mut self, dt: f32, surface: &mut dyn Surface) -> FrameReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.hue = advance_hue(self.hue, dt, self.settings.hue_speed());
        let hue = stroke_hue(self.hue);
        let light = brightness(hue as f32);
        let partition_len = self.partition_len();

        let mut report = FrameReport {
            dt,
            fade: 0.0,
            hue: self.hue,
            stroke_hue: hue,
            brightness: light,
            partition_len,
            strokes: 0,
            points: 0,
            skipped: None,
        };

        if let Err(err) = self.acquire() {
            log::warn!("skipping frame: {err}");
            surface.reset_transform();
            report.skipped = Some(err);
            return report;
        }

        let fade = fade_factor(dt, self.settings.fade_interval() as f32);
        report.fade = fade;
        let ctx = FrameContext {
            dt,
            fade,
            hue,
            brightness: light,
            left: &self.left_values,
            right: &self.right_values,
        };
        let paths = geometry::build(self.settings.mode(), ctx.left, ctx.right, partition_len);
        report.strokes = paths.len();
        report.points = paths.iter().map(StrokePath::point_count).sum();

        paint(surface, &self.settings, &ctx, &paths);
        report
    }

    /// Fill both value buffers, or leave both empty: a frame never pairs
    /// fresh samples from one channel with stale ones from the other.
    fn acquire(&mut self) -> Result<(), AnalyserError> {
        let result = self.acquire_channels();
        if result.is_err() {
            self.left_values.clear();
            self.right_values.clear();
        }
        result
    }

    fn acquire_channels(&mut self) -> Result<(), AnalyserError> {
        let settings = self.settings;
        self.stage.acquire(
            self.left.as_mut(),
            &mut self.left_bytes,
            &settings,
            &mut self.left_values,
        )?;
        self.stage.acquire(
            self.right.as_mut(),
            &mut self.right_bytes,
            &settings,
            &mut self.right_values,
        )
    }
}

/// Share of the previous image to darken this frame.
pub fn fade_factor(dt: f32, fade_interval: f32) -> f32 {
    if fade_interval <= 0.0 {
        return 1.0;
    }
    (dt / fade_interval).min(1.0)
}

fn paint(surface: &mut dyn Surface, settings: &Settings, ctx: &FrameContext<'_>, paths: &[StrokePath]) {
    let (w, h) = (surface.width(), surface.height());

    // Fade is drawn in device space, before any transform.
    surface.set_fill_style(Rgba::black(ctx.fade).into());
    surface.fill_rect(0.0, 0.0, w, h);

    let size = w.min(h);
    if size <= 0.0 {
        surface.reset_transform();
        return;
    }

    surface.set_line_width(1.0 / size);
    surface.translate(w / 2.0, h / 2.0);
    surface.scale(size, size);
    if settings.mode() == RenderMode::Lissajous && settings.rotate45() {
        surface.rotate(-FRAC_PI_4);
        surface.scale(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    }

    for path in paths {
        surface.set_stroke_style(Hsla::stroke(ctx.hue, path.opacity).into());
        surface.begin_path();
        for sub in &path.subpaths {
            let mut points = sub.iter();
            if let Some(first) = points.next() {
                surface.move_to(first.x, first.y);
            }
            for p in points {
                surface.line_to(p.x, p.y);
            }
        }
        surface.stroke();
    }

    surface.reset_transform();
}
