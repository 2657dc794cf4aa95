//! Terminal session for the scope and the frame bracketing the cell
//! presenters share, so whatever a frame switches off is switched back on
//! when the session ends.

use anyhow::Context;
use crossterm::{cursor, queue, terminal};
use std::io::{self, stdout, BufWriter, Stdout, Write};

pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";
pub const SYNC_END: &[u8] = b"\x1b[?2026l";
pub const AUTOWRAP_OFF: &[u8] = b"\x1b[?7l";
pub const AUTOWRAP_ON: &[u8] = b"\x1b[?7h";
const HOME_AND_RESET: &[u8] = b"\x1b[H\x1b[0m";
const SGR_RESET: &[u8] = b"\x1b[0m";

/// Smallest terminal the scope draws into, (columns, rows).
pub const MIN_SIZE: (u16, u16) = (4, 2);

/// Open a frame: hold output when synchronized updates are on, home the
/// cursor and turn autowrap off so full-width rows never scroll.
pub fn begin_frame(out: &mut dyn Write, sync_updates: bool) -> io::Result<()> {
    if sync_updates {
        out.write_all(SYNC_BEGIN)?;
    }
    out.write_all(HOME_AND_RESET)?;
    out.write_all(AUTOWRAP_OFF)
}

/// Undo `begin_frame` and flush.
pub fn end_frame(out: &mut dyn Write, sync_updates: bool) -> io::Result<()> {
    out.write_all(AUTOWRAP_ON)?;
    if sync_updates {
        out.write_all(SYNC_END)?;
    }
    out.flush()
}

/// Bytes that leave the screen sane if a frame was cut off half way.
pub fn restore_sequence(sync_updates: bool) -> Vec<u8> {
    let mut seq = Vec::with_capacity(16);
    if sync_updates {
        seq.extend_from_slice(SYNC_END);
    }
    seq.extend_from_slice(AUTOWRAP_ON);
    seq.extend_from_slice(SGR_RESET);
    seq
}

pub fn check_size((cols, rows): (u16, u16)) -> anyhow::Result<(u16, u16)> {
    if cols < MIN_SIZE.0 || rows < MIN_SIZE.1 {
        anyhow::bail!(
            "terminal too small (need at least {}x{}, got {cols}x{rows})",
            MIN_SIZE.0,
            MIN_SIZE.1
        );
    }
    Ok((cols, rows))
}

/// Raw mode, alternate screen and hidden cursor until dropped.
pub struct TerminalSession {
    sync_updates: bool,
}

impl TerminalSession {
    pub fn enter(sync_updates: bool) -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // From here on Drop undoes raw mode, whatever fails next.
        let session = Self { sync_updates };

        let mut out = stdout();
        queue!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )
        .context("prepare alternate screen")?;
        out.flush().context("flush terminal setup")?;
        log::debug!("terminal session started (sync updates: {sync_updates})");

        Ok(session)
    }

    pub fn sync_updates(&self) -> bool {
        self.sync_updates
    }

    pub fn writer(&self) -> BufWriter<Stdout> {
        BufWriter::new(stdout())
    }

    /// Current (columns, rows).
    pub fn size(&self) -> anyhow::Result<(u16, u16)> {
        terminal::size().context("query terminal size")
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut out = stdout();
        let _ = out.write_all(&restore_sequence(self.sync_updates));
        let _ = queue!(out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
        log::debug!("terminal session restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_bracket_restores_what_it_disables() {
        let mut out = Vec::new();
        begin_frame(&mut out, true).unwrap();
        end_frame(&mut out, true).unwrap();
        assert_eq!(out, b"\x1b[?2026h\x1b[H\x1b[0m\x1b[?7l\x1b[?7h\x1b[?2026l");

        out.clear();
        begin_frame(&mut out, false).unwrap();
        end_frame(&mut out, false).unwrap();
        assert_eq!(out, b"\x1b[H\x1b[0m\x1b[?7l\x1b[?7h");
    }

    #[test]
    fn restore_only_ends_sync_when_it_was_used() {
        assert_eq!(restore_sequence(true), b"\x1b[?2026l\x1b[?7h\x1b[0m");
        assert_eq!(restore_sequence(false), b"\x1b[?7h\x1b[0m");
    }

    #[test]
    fn tiny_terminals_are_rejected() {
        assert_eq!(check_size((4, 2)).unwrap(), (4, 2));
        let err = check_size((3, 40)).unwrap_err();
        assert!(err.to_string().contains("got 3x40"));
        assert!(check_size((80, 1)).is_err());
    }
}
