use std::fmt;

/// Advance `hue` by `dt * speed` degrees, wrapped into `[0, 360)`.
pub fn advance_hue(hue: f32, dt: f32, speed: f32) -> f32 {
    let next = (hue + dt * speed).rem_euclid(360.0);
    if !next.is_finite() {
        return hue.rem_euclid(360.0);
    }
    // rem_euclid of a tiny negative can round up to exactly 360.
    if next >= 360.0 {
        0.0
    } else {
        next
    }
}

/// Lightness (percent) for a hue. Lifts the blue/violet range, which reads dim at 50%.
pub fn brightness(hue: f32) -> f32 {
    if hue <= 200.0 {
        50.0
    } else if hue <= 240.0 {
        50.0 + (hue - 200.0) * 20.0 / 40.0
    } else if hue <= 280.0 {
        70.0
    } else if hue <= 350.0 {
        70.0 - (hue - 280.0) * 20.0 / 70.0
    } else {
        50.0
    }
}

/// Whole-degree hue used for stroke colors.
pub fn stroke_hue(hue: f32) -> u16 {
    (hue.round() as u32 % 360) as u16
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0..=1
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black(a: f32) -> Self {
        Self::new(0, 0, 0, a)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Hue in degrees; saturation, lightness and alpha in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    pub a: f32,
}

impl Hsla {
    pub const fn new(h: f32, s: f32, l: f32, a: f32) -> Self {
        Self { h, s, l, a }
    }

    /// Fully saturated stroke color for `hue` at `opacity` percent.
    pub fn stroke(hue: u16, opacity: u8) -> Self {
        let h = hue as f32;
        Self::new(h, 100.0, brightness(h), opacity as f32)
    }

    pub fn to_rgba(self) -> Rgba {
        let h = self.h.rem_euclid(360.0) / 60.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba::new(
            to_u8(r1),
            to_u8(g1),
            to_u8(b1),
            (self.a / 100.0).clamp(0.0, 1.0),
        )
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsla({}, {}%, {}%, {}%)", self.h, self.s, self.l, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Rgba(Rgba),
    Hsla(Hsla),
}

impl Paint {
    pub fn to_rgba(self) -> Rgba {
        match self {
            Self::Rgba(c) => c,
            Self::Hsla(c) => c.to_rgba(),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Self::Rgba(c)
    }
}

impl From<Hsla> for Paint {
    fn from(c: Hsla) -> Self {
        Self::Hsla(c)
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgba(c) => c.fmt(f),
            Self::Hsla(c) => c.fmt(f),
        }
    }
}
