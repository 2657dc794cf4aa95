//! Pure path construction for the three scope modes.
//!
//! Everything here works in unit space: the painter later maps `[-0.5, 0.5]`
//! onto the largest square that fits the surface.

use crate::config::RenderMode;
use crate::surface::Point;
use std::f32::consts::TAU;

/// Opacity drop (percent) between consecutive lissajous partitions.
pub const OPACITY_STEP: u8 = 10;
/// Shortest fade interval used for partitioning, seconds.
pub const MIN_PARTITION_FADE: f64 = 0.1;
pub const DISC_RADIUS: f32 = 0.25;
pub const DISC_BAR_MAX: f32 = 0.25;

/// One `stroke()` call: a color opacity plus the subpaths drawn with it.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath {
    /// Percent, 0..=100.
    pub opacity: u8,
    pub subpaths: Vec<Vec<Point>>,
}

impl StrokePath {
    fn single(opacity: u8, points: Vec<Point>) -> Self {
        Self {
            opacity,
            subpaths: vec![points],
        }
    }

    pub fn point_count(&self) -> usize {
        self.subpaths.iter().map(Vec::len).sum()
    }
}

/// Samples per 10% opacity step of the fade:
/// `ceil(sample_rate * max(fade_interval, 0.1) / (100 / OPACITY_STEP))`.
pub fn partition_len(sample_rate: f32, fade_interval: f64) -> usize {
    let fade = fade_interval.max(MIN_PARTITION_FADE);
    let steps = f64::from(100 / OPACITY_STEP);
    let len = (f64::from(sample_rate) * fade / steps).ceil();
    if len.is_finite() && len > 0.0 {
        len as usize
    } else {
        1
    }
}

pub fn build(mode: RenderMode, left: &[f32], right: &[f32], partition_len: usize) -> Vec<StrokePath> {
    match mode {
        RenderMode::Lissajous => lissajous(left, right, partition_len),
        RenderMode::WaveShape => wave_shape(left, right),
        RenderMode::Disc => disc(left, right),
    }
}

/// Fading x/y trail, newest sample first.
///
/// The newest `partition_len` points are drawn at 100% opacity, the run before
/// them at 90%, and so on until the opacity would reach 0. Each run starts on
/// the last point of the previous one so the trail stays connected, which
/// means every run after the first adds `partition_len - 1` fresh samples.
pub fn lissajous(left: &[f32], right: &[f32], partition_len: usize) -> Vec<StrokePath> {
    let n = left.len().min(right.len());
    if n == 0 {
        return Vec::new();
    }
    // A run of one point could never move past the shared boundary sample.
    let step = partition_len.max(2);

    let mut out = Vec::new();
    let mut end = n;
    let mut opacity = 100u8;
    loop {
        let start = end.saturating_sub(step);
        let points = (start..end)
            .rev()
            .map(|i| Point::new(left[i] / 2.0, right[i] / 2.0))
            .collect();
        out.push(StrokePath::single(opacity, points));

        if start == 0 || opacity <= OPACITY_STEP {
            break;
        }
        end = start + 1;
        opacity -= OPACITY_STEP;
    }
    out
}

/// Both channels as stacked open polylines: left above centre, right below.
pub fn wave_shape(left: &[f32], right: &[f32]) -> Vec<StrokePath> {
    let n = left.len().min(right.len());
    if n == 0 {
        return Vec::new();
    }
    let trace = |values: &[f32], offset: f32| -> Vec<Point> {
        values[..n]
            .iter()
            .enumerate()
            .map(|(i, &v)| Point::new(i as f32 / n as f32 - 0.5, -v / 4.0 + offset))
            .collect()
    };
    vec![
        StrokePath::single(100, trace(left, -0.25)),
        StrokePath::single(100, trace(right, 0.25)),
    ]
}

/// Radial bars: left channel on the first half turn (the right side), right
/// channel mirrored on the second.
pub fn disc(left: &[f32], right: &[f32]) -> Vec<StrokePath> {
    let n = left.len().min(right.len());
    if n < 2 {
        return Vec::new();
    }
    let last = (n - 1) as f32;
    let mut bars = Vec::with_capacity(n * 2);
    for i in 0..n {
        let pos = i as f32 / last / 2.0;
        bars.push(disc_bar(pos, left[i]));
        bars.push(disc_bar(1.0 - pos, right[i]));
    }
    vec![StrokePath {
        opacity: 100,
        subpaths: bars,
    }]
}

/// Bar at `turns` around the circle: 0 points up, and on a y-down surface
/// 0.25 points right, so the sweep runs clockwise.
fn disc_bar(turns: f32, value: f32) -> Vec<Point> {
    let (sin, cos) = (TAU * turns).sin_cos();
    let (dx, dy) = (sin, -cos);
    let outer = DISC_RADIUS + value * DISC_BAR_MAX;
    vec![
        Point::new(DISC_RADIUS * dx, DISC_RADIUS * dy),
        Point::new(outer * dx, outer * dy),
    ]
}
