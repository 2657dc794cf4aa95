use crate::render::{rgb_at, text_frame_begin, text_frame_end, ColorCache, Frame, Renderer};
use std::io::Write;

/// Two raster rows per cell: upper pixel as foreground of `▀`, lower as background.
#[derive(Debug, Default)]
pub struct HalfBlockRenderer {
    colors: ColorCache,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows, w)) = text_frame_begin(frame, 1, 2, out)? else {
            return Ok(());
        };
        self.colors.reset();

        for row in 0..rows {
            for x in 0..cols {
                let top = rgb_at(frame.pixels_rgba, w, x, row * 2);
                let bottom = rgb_at(frame.pixels_rgba, w, x, row * 2 + 1);
                if top == bottom && top == (0, 0, 0) {
                    self.colors.bg(out, bottom)?;
                    out.write_all(b" ")?;
                    continue;
                }
                self.colors.fg(out, top)?;
                self.colors.bg(out, bottom)?;
                out.write_all("\u{2580}".as_bytes())?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, rows, out)
    }
}
