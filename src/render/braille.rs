use crate::render::{
    luma_u8, rgb_at, text_frame_begin, text_frame_end, ColorCache, Frame, Renderer,
};
use std::io::Write;

/// Dots dimmer than this stay off even in an otherwise dark cell, so the
/// faded tail of the trace does not light up as noise.
pub const LUMA_FLOOR: u8 = 24;

/// Bit for each dot, row-major over the 2x4 cell.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

/// 2x4 raster pixels per cell, one braille dot each.
#[derive(Debug, Default)]
pub struct BrailleRenderer {
    colors: ColorCache,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows, w)) = text_frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.colors.reset();

        for row in 0..rows {
            for col in 0..cols {
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                let mut lum = [0u8; 8];
                for (i, (c, l)) in rgb.iter_mut().zip(lum.iter_mut()).enumerate() {
                    *c = rgb_at(frame.pixels_rgba, w, col * 2 + i % 2, row * 4 + i / 2);
                    *l = luma_u8(c.0, c.1, c.2);
                }
                let (bits, fg, bg) = classify(&rgb, &lum);

                if bits == 0 {
                    self.colors.bg(out, bg)?;
                    out.write_all(b" ")?;
                    continue;
                }
                let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                self.colors.fg(out, fg)?;
                self.colors.bg(out, bg)?;
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, rows, out)
    }
}

/// Dot mask plus the mean colors of lit and unlit dots.
///
/// A dot is lit when it clears [`LUMA_FLOOR`] and is at least half as bright
/// as the brightest dot in its cell.
fn classify(rgb: &[(u8, u8, u8); 8], lum: &[u8; 8]) -> (u8, (u8, u8, u8), (u8, u8, u8)) {
    let peak = lum.iter().copied().max().unwrap_or(0);
    let threshold = LUMA_FLOOR.max(peak / 2);

    let mut bits = 0u8;
    let mut on = [0u32; 4];
    let mut off = [0u32; 4];
    for i in 0..8 {
        let (r, g, b) = rgb[i];
        let acc = if lum[i] >= threshold && lum[i] > 0 {
            bits |= DOT_BITS[i];
            &mut on
        } else {
            &mut off
        };
        acc[0] += r as u32;
        acc[1] += g as u32;
        acc[2] += b as u32;
        acc[3] += 1;
    }

    let mean = |acc: [u32; 4]| {
        if acc[3] == 0 {
            (0, 0, 0)
        } else {
            (
                (acc[0] / acc[3]) as u8,
                (acc[1] / acc[3]) as u8,
                (acc[2] / acc[3]) as u8,
            )
        }
    };
    (bits, mean(on), mean(off))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_cell_stays_blank() {
        let rgb = [(10, 10, 10); 8];
        let lum = [10; 8];
        let (bits, _, bg) = classify(&rgb, &lum);
        assert_eq!(bits, 0);
        assert_eq!(bg, (10, 10, 10));
    }

    #[test]
    fn single_bright_dot_sets_its_bit() {
        let mut rgb = [(0, 0, 0); 8];
        let mut lum = [0; 8];
        rgb[3] = (255, 255, 255);
        lum[3] = 255;
        let (bits, fg, bg) = classify(&rgb, &lum);
        assert_eq!(bits, DOT_BITS[3]);
        assert_eq!(fg, (255, 255, 255));
        assert_eq!(bg, (0, 0, 0));
    }
}
