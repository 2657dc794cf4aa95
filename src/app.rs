use crate::audio::{Analyser, CaptureAnalyser};
use crate::config::{AudioSource, Config};
use crate::painter::{FrameReport, Painter};
use crate::raster::Raster;
use crate::render::{hard_wrap, make_renderer, pixels_per_cell, Frame};
use crate::scheduler::Scheduler;
use crate::settings::{step_fft_size, Settings, SettingsUpdate};
use crate::synth::{SyntheticAnalyser, Tone};
use crate::terminal::{self, TerminalSession};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

pub const SYNTH_SAMPLE_RATE: f32 = 48_000.0;
/// Key steps, as presses per unit so snapping divides by a whole number.
const GAIN_STEPS_PER_UNIT: f64 = 10.0;
const FADE_STEPS_PER_SECOND: f64 = 20.0;
const HUE_SPEED_STEP: f32 = 10.0;

/// What a key press asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Quit,
    Update(SettingsUpdate),
    ToggleHud,
    ToggleHelp,
    Ignore,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let settings = cfg.settings().context("invalid settings")?;
    let (left, right) = open_analysers(&cfg)?;
    let mut scheduler = Scheduler::new(Painter::new(left, right, settings));
    log::info!(
        "scope ready: {} Hz, fft {}, mode {}",
        scheduler.painter().sample_rate(),
        settings.fft_size(),
        settings.mode().label()
    );

    let session = TerminalSession::enter(cfg.sync_updates)?;
    let mut out = session.writer();
    let mut renderer = make_renderer(cfg.renderer);
    let (px_w, px_h) = pixels_per_cell(cfg.renderer);
    let mut size = terminal::check_size(session.size()?)?;

    let mut show_hud = true;
    let mut show_help = false;
    let mut status: Option<String> = None;
    let mut raster = Raster::new(0, 0);
    let mut fps = FpsCounter::new();
    let mut last_report: Option<FrameReport> = None;

    scheduler.start();
    while scheduler.is_running() {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let settings = *scheduler.painter().settings();
                    match key_action(k.code, k.modifiers, &settings) {
                        KeyAction::Quit => scheduler.stop(),
                        KeyAction::Update(update) => {
                            status = match scheduler.painter_mut().apply(update) {
                                Ok(()) => None,
                                Err(err) => {
                                    log::warn!("rejected {update:?}: {err}");
                                    Some(err.to_string())
                                }
                            };
                        }
                        KeyAction::ToggleHud => show_hud = !show_hud,
                        KeyAction::ToggleHelp => show_help = !show_help,
                        KeyAction::Ignore => {}
                    }
                }
                Event::Resize(c, r) => size = (c, r),
                _ => {}
            }
        }
        if !scheduler.is_running() {
            break;
        }

        // Resize events can be missed by some terminals.
        let polled = session.size()?;
        if polled != size {
            size = polled;
        }

        let (term_cols, term_rows) = size;
        let hud = if show_hud {
            build_hud(
                term_cols as usize,
                scheduler.painter(),
                last_report.as_ref(),
                fps.fps(),
                status.as_deref(),
                renderer.name(),
            )
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);
        raster.resize(
            (term_cols as usize).saturating_mul(px_w),
            (visual_rows as usize).saturating_mul(px_h),
        );

        if let Some(report) = scheduler.on_frame(now, &mut raster) {
            last_report = Some(report);
        }

        let (pixel_width, pixel_height) = raster.size();
        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width,
            pixel_height,
            pixels_rgba: raster.pixels_rgba(),
            hud: &hud,
            hud_rows,
            overlay: show_help.then_some(HELP_TEXT),
            sync_updates: session.sync_updates(),
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }

    log::info!("scope stopped");
    Ok(())
}

fn open_analysers(cfg: &Config) -> anyhow::Result<(Box<dyn Analyser>, Box<dyn Analyser>)> {
    match cfg.source {
        AudioSource::Mic => {
            let (left, right) = CaptureAnalyser::open_stereo(cfg.device.as_deref())
                .with_context(|| format!("start audio capture (device={:?})", cfg.device))?;
            Ok((Box::new(left), Box::new(right)))
        }
        AudioSource::Synth => {
            let (left, right) = SyntheticAnalyser::pair(SYNTH_SAMPLE_RATE, Tone::default());
            Ok((Box::new(left), Box::new(right)))
        }
    }
}

/// Map a key press onto a host action for the current settings.
pub fn key_action(code: KeyCode, mods: KeyModifiers, settings: &Settings) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }

    let update = match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Quit,
        KeyCode::Char('h') | KeyCode::Char('H') => return KeyAction::ToggleHud,
        KeyCode::Char('?') | KeyCode::F(1) => return KeyAction::ToggleHelp,
        KeyCode::Char('m') | KeyCode::Char('M') => SettingsUpdate::Mode(settings.mode().next()),
        KeyCode::Char('s') | KeyCode::Char('S') => {
            SettingsUpdate::SampleSource(settings.sample_source().toggled())
        }
        KeyCode::Char('l') | KeyCode::Char('L') => SettingsUpdate::Log2(!settings.log2()),
        KeyCode::Char('r') | KeyCode::Char('R') => SettingsUpdate::Rotate45(!settings.rotate45()),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            SettingsUpdate::Gain(step_gain(settings.gain(), 1.0))
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            SettingsUpdate::Gain(step_gain(settings.gain(), -1.0))
        }
        KeyCode::Char(']') => SettingsUpdate::FadeInterval(snap(
            settings.fade_interval(),
            1.0,
            FADE_STEPS_PER_SECOND,
        )),
        KeyCode::Char('[') => SettingsUpdate::FadeInterval(snap(
            settings.fade_interval(),
            -1.0,
            FADE_STEPS_PER_SECOND,
        )),
        KeyCode::Char('.') => SettingsUpdate::HueSpeed(settings.hue_speed() + HUE_SPEED_STEP),
        KeyCode::Char(',') => SettingsUpdate::HueSpeed(settings.hue_speed() - HUE_SPEED_STEP),
        KeyCode::Char('f') => SettingsUpdate::FftSize(step_fft_size(settings.fft_size(), true)),
        KeyCode::Char('F') => SettingsUpdate::FftSize(step_fft_size(settings.fft_size(), false)),
        _ => return KeyAction::Ignore,
    };
    KeyAction::Update(update)
}

/// Move `v` by `dir` steps of `1 / per_unit`, snapped to the step grid and
/// floored at 0. `n / per_unit` lands on the same value as the decimal literal.
fn snap(v: f64, dir: f64, per_unit: f64) -> f64 {
    ((v * per_unit).round() + dir).max(0.0) / per_unit
}

fn step_gain(gain: f32, dir: f64) -> f32 {
    snap(f64::from(gain), dir, GAIN_STEPS_PER_UNIT) as f32
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let wanted = hud.lines().count() as u16;
    wanted.min(term_rows.saturating_sub(1))
}

fn build_hud(
    cols: usize,
    painter: &Painter,
    report: Option<&FrameReport>,
    fps: f32,
    status: Option<&str>,
    renderer_name: &str,
) -> String {
    let s = painter.settings();
    let on_off = |b: bool| if b { "on" } else { "off" };
    let mut lines = vec![
        format!(
            "Mode: {} | Source: {} | Log2: {} | Rot45: {} | FFT: {} | Fade: {:.2}s | Hue: {:>3}° ({:+.0}°/s) | Gain: {:.2} | FPS: {:>4.1}",
            s.mode().label(),
            s.sample_source().label(),
            on_off(s.log2()),
            on_off(s.rotate45()),
            s.fft_size(),
            s.fade_interval(),
            painter.hue().round() as u32 % 360,
            s.hue_speed(),
            s.gain(),
            fps,
        ),
    ];

    let mut draw = match report {
        Some(FrameReport {
            skipped: Some(err), ..
        }) => format!("Frame skipped: {err}"),
        Some(r) => format!(
            "Strokes: {} | Points: {} | Partition: {} | Fade: {:.3} | {} Hz | Renderer: {}",
            r.strokes,
            r.points,
            r.partition_len,
            r.fade,
            painter.sample_rate(),
            renderer_name
        ),
        None => format!("Renderer: {renderer_name}"),
    };
    if let Some(msg) = status {
        draw.push_str(" | ");
        draw.push_str(msg);
    }
    lines.push(draw);
    lines.push(
        "Keys: m mode | s source | l log2 | r rotate | +/- gain | [/] fade | ,/. hue speed | f/F fft | h HUD | ? help | q quit"
            .to_string(),
    );

    hard_wrap(&lines.join("\n"), cols).join("\n")
}

const HELP_TEXT: &str = "Phase Scope Keys\n\
m  cycle mode: lissajous / wave-shape / disc\n\
s  toggle sample source: waveform / spectrum\n\
l  toggle perceptual (log2) scaling\n\
r  toggle 45 degree rotation (lissajous)\n\
+ / -  gain up / down\n\
] / [  longer / shorter fade\n\
. / ,  hue speed up / down\n\
f / F  double / halve fft size\n\
h  show/hide HUD\n\
?  toggle this help\n\
q or esc  quit";

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
