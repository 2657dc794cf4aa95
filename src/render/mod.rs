mod braille;
mod halfblock;

pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;

use crate::config::RendererMode;
use crate::terminal;
use std::io::Write;

/// One terminal frame: the raster snapshot plus the text drawn around it.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    /// Rows given to the scope; the HUD takes the rest.
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    }
}

/// Raster pixels per terminal cell (columns, rows).
pub fn pixels_per_cell(mode: RendererMode) -> (usize, usize) {
    match mode {
        RendererMode::HalfBlock => (1, 2),
        RendererMode::Braille => (2, 4),
    }
}

/// Last SGR colors written, so runs of equal cells skip the escape.
#[derive(Debug, Default)]
pub(crate) struct ColorCache {
    fg: Option<(u8, u8, u8)>,
    bg: Option<(u8, u8, u8)>,
}

impl ColorCache {
    pub(crate) fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
    }

    pub(crate) fn fg(&mut self, out: &mut dyn Write, c: (u8, u8, u8)) -> std::io::Result<()> {
        if self.fg != Some(c) {
            write!(out, "\x1b[38;2;{};{};{}m", c.0, c.1, c.2)?;
            self.fg = Some(c);
        }
        Ok(())
    }

    pub(crate) fn bg(&mut self, out: &mut dyn Write, c: (u8, u8, u8)) -> std::io::Result<()> {
        if self.bg != Some(c) {
            write!(out, "\x1b[48;2;{};{};{}m", c.0, c.1, c.2)?;
            self.bg = Some(c);
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn rgb_at(pixels: &[u8], w: usize, x: usize, y: usize) -> (u8, u8, u8) {
    let i = (y * w + x) * 4;
    (pixels[i], pixels[i + 1], pixels[i + 2])
}

/// Rec.709 luma, integer approximation.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u8
}

/// Validate geometry and write the frame preamble. Returns
/// `(cols, visual_rows, pixel_width)` when the pixel buffer matches the
/// terminal at `px_w x px_h` pixels per cell, `None` when nothing should be drawn.
pub(crate) fn text_frame_begin(
    frame: &Frame<'_>,
    px_w: usize,
    px_h: usize,
    out: &mut dyn Write,
) -> anyhow::Result<Option<(usize, usize, usize)>> {
    let cols = frame.term_cols as usize;
    let rows = frame.visual_rows as usize;
    let (w, h) = (frame.pixel_width, frame.pixel_height);
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return Ok(None);
    }
    if w != cols.saturating_mul(px_w) || h != rows.saturating_mul(px_h) {
        log::debug!("raster {w}x{h} does not match terminal {cols}x{rows}; frame dropped");
        return Ok(None);
    }
    let need = w.saturating_mul(h).saturating_mul(4);
    if frame.pixels_rgba.len() < need {
        log::warn!(
            "pixel buffer too small (need {need}, got {})",
            frame.pixels_rgba.len()
        );
        return Ok(None);
    }

    terminal::begin_frame(out, frame.sync_updates)?;
    Ok(Some((cols, rows, w)))
}

/// HUD, overlay, then close the frame.
pub(crate) fn text_frame_end(
    frame: &Frame<'_>,
    cols: usize,
    visual_rows: usize,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut lines = frame.hud.lines();
    for i in 0..frame.hud_rows as usize {
        write_hud_line(out, visual_rows + i + 1, cols, lines.next())?;
    }
    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }
    terminal::end_frame(out, frame.sync_updates)?;
    Ok(())
}

fn write_hud_line(
    out: &mut dyn Write,
    row: usize,
    cols: usize,
    line: Option<&str>,
) -> anyhow::Result<()> {
    write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    if let Some(line) = line {
        let clipped: String = line.chars().take(cols).collect();
        out.write_all(b"\x1b[38;2;200;208;224m")?;
        out.write_all(clipped.as_bytes())?;
        out.write_all(b"\x1b[0m")?;
    }
    Ok(())
}

/// Split `text` into lines no wider than `width` characters.
pub fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for raw in text.lines() {
        if raw.is_empty() {
            out.push(String::new());
            continue;
        }
        let chars: Vec<char> = raw.chars().collect();
        out.extend(chars.chunks(width).map(|c| c.iter().collect::<String>()));
    }
    out
}

/// Centered boxed popup over a darkened screen. The first line is the title.
pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    let (cols, rows) = (term_cols as usize, term_rows as usize);
    if text.trim().is_empty() || cols < 8 || rows < 4 {
        return Ok(());
    }

    let lines = hard_wrap(text, cols.saturating_sub(6));
    let inner_w = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, cols.saturating_sub(6).max(1));
    let box_w = inner_w + 4;
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = body_h + 2;
    let left = (cols.saturating_sub(box_w)) / 2 + 1;
    let top = (rows.saturating_sub(box_h)) / 2 + 1;
    let rule = "-".repeat(box_w - 2);

    out.write_all(b"\x1b[0m\x1b[38;2;220;228;242m\x1b[48;2;2;4;10m")?;
    for row in 1..=rows {
        write!(out, "\x1b[{row};1H\x1b[2K")?;
    }

    out.write_all(b"\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{top};{left}H+{rule}+")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = top + 1 + i;
        let pad = inner_w.saturating_sub(line.chars().count());
        if i == 0 {
            write!(
                out,
                "\x1b[{row};{left}H| \x1b[1m\x1b[38;2;255;236;160m{line}\x1b[22m\x1b[38;2;220;228;242m{:pad$} |",
                ""
            )?;
        } else {
            write!(out, "\x1b[{row};{left}H| {line}{:pad$} |", "")?;
        }
    }
    write!(out, "\x1b[{};{left}H+{rule}+", top + box_h - 1)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
