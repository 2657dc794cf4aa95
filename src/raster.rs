use crate::color::{Paint, Rgba};
use crate::surface::{Affine, Point, Surface};

/// CPU raster implementing [`Surface`].
///
/// Colors accumulate in `f32` so long fade trails decay all the way to black
/// instead of sticking at a rounding floor. Strokes collect per-pixel coverage
/// first and blend once, so overlapping segments of one path do not double up.
pub struct Raster {
    width: usize,
    height: usize,
    accum: Vec<[f32; 3]>,
    rgba: Vec<u8>,
    transform: Affine,
    subpaths: Vec<Vec<Point>>,
    stroke_style: Rgba,
    fill_style: Rgba,
    line_width: f32,
    coverage: Vec<f32>,
    touched: Vec<usize>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        let n = width.saturating_mul(height);
        Self {
            width,
            height,
            accum: vec![[0.0; 3]; n],
            rgba: vec![0; n.saturating_mul(4)],
            transform: Affine::IDENTITY,
            subpaths: Vec::new(),
            stroke_style: Rgba::new(255, 255, 255, 1.0),
            fill_style: Rgba::black(1.0),
            line_width: 1.0,
            coverage: vec![0.0; n],
            touched: Vec::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Reallocate for a new size; the image is cleared to black.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.accum.fill([0.0; 3]);
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [r, g, b] = self.accum[y * self.width + x];
        Some((to_byte(r), to_byte(g), to_byte(b)))
    }

    /// Opaque RGBA8 snapshot of the image, row-major.
    pub fn pixels_rgba(&mut self) -> &[u8] {
        for (px, dst) in self.accum.iter().zip(self.rgba.chunks_exact_mut(4)) {
            dst[0] = to_byte(px[0]);
            dst[1] = to_byte(px[1]);
            dst[2] = to_byte(px[2]);
            dst[3] = 255;
        }
        &self.rgba
    }

    fn blend(&mut self, idx: usize, color: Rgba, alpha: f32) {
        let src = [
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
        ];
        let dst = &mut self.accum[idx];
        for c in 0..3 {
            dst[c] = dst[c] * (1.0 - alpha) + src[c] * alpha;
        }
    }

    fn cover(&mut self, x: i64, y: i64, amount: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || amount <= 0.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let cov = &mut self.coverage[idx];
        if *cov == 0.0 {
            self.touched.push(idx);
        }
        *cov = cov.max(amount.min(1.0));
    }

    /// Antialiased one-pixel line (Wu), clipped to the raster.
    fn cover_line(&mut self, p0: Point, p1: Point) {
        let (mut x0, mut y0) = (p0.x - 0.5, p0.y - 0.5);
        let (mut x1, mut y1) = (p1.x - 0.5, p1.y - 0.5);
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }
        let dx = x1 - x0;
        let gradient = if dx < 1e-6 { 0.0 } else { (y1 - y0) / dx };

        let major = if steep { self.height } else { self.width } as i64;
        let start = (x0.round() as i64).max(-1);
        let end = (x1.round() as i64).min(major);
        for x in start..=end {
            let y = y0 + gradient * (x as f32 - x0);
            let yf = y.floor();
            let frac = y - yf;
            let yi = yf as i64;
            if steep {
                self.cover(yi, x, 1.0 - frac);
                self.cover(yi + 1, x, frac);
            } else {
                self.cover(x, yi, 1.0 - frac);
                self.cover(x, yi + 1, frac);
            }
        }
    }

    fn cover_segment(&mut self, p0: Point, p1: Point, width_px: f32) {
        let passes = width_px.round().max(1.0) as usize;
        if passes == 1 {
            self.cover_line(p0, p1);
            return;
        }
        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let len = (dx * dx + dy * dy).sqrt();
        let (nx, ny) = if len > 1e-6 { (-dy / len, dx / len) } else { (0.0, 1.0) };
        for k in 0..passes {
            let off = k as f32 - (passes - 1) as f32 / 2.0;
            let shift = |p: Point| Point::new(p.x + nx * off, p.y + ny * off);
            self.cover_line(shift(p0), shift(p1));
        }
    }

    fn flush_coverage(&mut self, color: Rgba) {
        let touched = std::mem::take(&mut self.touched);
        for &idx in &touched {
            let cov = std::mem::replace(&mut self.coverage[idx], 0.0);
            self.blend(idx, color, color.a * cov);
        }
        self.touched = touched;
        self.touched.clear();
    }
}

impl Surface for Raster {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let color = self.fill_style;
        if color.a <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let t = self.transform;
        let quad = [
            t.apply(Point::new(x, y)),
            t.apply(Point::new(x + w, y)),
            t.apply(Point::new(x + w, y + h)),
            t.apply(Point::new(x, y + h)),
        ];
        let min_x = quad.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let min_y = quad.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_x = quad.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil();
        let max_y = quad.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil();
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return;
        }
        let max_x = (max_x as usize).min(self.width);
        let max_y = (max_y as usize).min(self.height);

        for py in min_y as usize..max_y {
            for px in min_x as usize..max_x {
                let c = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                if inside_convex(&quad, c) {
                    self.blend(py * self.width + px, color, color.a);
                }
            }
        }
    }

    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.transform.apply(Point::new(x, y));
        self.subpaths.push(vec![p]);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.transform.apply(Point::new(x, y));
        match self.subpaths.last_mut() {
            Some(sub) => sub.push(p),
            // Canvas semantics: a lineTo on an empty path acts as moveTo.
            None => self.subpaths.push(vec![p]),
        }
    }

    fn stroke(&mut self) {
        let color = self.stroke_style;
        if color.a <= 0.0 {
            return;
        }
        let width_px = self.line_width * self.transform.scale_factor();
        let subpaths = std::mem::take(&mut self.subpaths);
        for sub in &subpaths {
            for seg in sub.windows(2) {
                let (p0, p1) = (seg[0], seg[1]);
                if [p0.x, p0.y, p1.x, p1.y].iter().all(|v| v.is_finite()) {
                    self.cover_segment(p0, p1, width_px);
                }
            }
        }
        self.subpaths = subpaths;
        self.flush_coverage(color);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform.translate(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.transform.rotate(radians);
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.transform.scale(x, y);
    }

    fn reset_transform(&mut self) {
        self.transform = Affine::IDENTITY;
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.stroke_style = paint.to_rgba();
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.fill_style = paint.to_rgba();
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn inside_convex(quad: &[Point; 4], p: Point) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
