use crate::painter::{FrameReport, Painter};
use crate::surface::Surface;
use std::time::Instant;

/// Single-threaded frame driver.
///
/// Holds at most one pending frame request. `on_frame` consumes it, re-arms
/// the next one while running, then draws with the time elapsed since the
/// previous frame (0 on the first).
pub struct Scheduler {
    painter: Painter,
    last_frame_at: Option<Instant>,
    pending: bool,
    running: bool,
}

impl Scheduler {
    pub fn new(painter: Painter) -> Self {
        Self {
            painter,
            last_frame_at: None,
            pending: false,
            running: false,
        }
    }

    /// Arm the first request. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = true;
        log::debug!("scheduler started");
    }

    /// Stop re-arming. An already pending request is dropped.
    pub fn stop(&mut self) {
        self.running = false;
        self.pending = false;
        self.last_frame_at = None;
        log::debug!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Service the pending request, if any. Returns `None` when nothing was due.
    pub fn on_frame(&mut self, now: Instant, surface: &mut dyn Surface) -> Option<FrameReport> {
        if !self.pending {
            return None;
        }
        self.pending = self.running;

        let dt = match self.last_frame_at {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame_at = Some(now);
        Some(self.painter.draw_frame(dt, surface))
    }

    pub fn painter(&self) -> &Painter {
        &self.painter
    }

    pub fn painter_mut(&mut self) -> &mut Painter {
        &mut self.painter
    }

    pub fn into_painter(self) -> Painter {
        self.painter
    }
}
