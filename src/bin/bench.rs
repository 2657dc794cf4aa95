use std::time::Instant;

use anyhow::Result;
use phasescope::config::{RenderMode, SampleSource};
use phasescope::painter::Painter;
use phasescope::raster::Raster;
use phasescope::render::{BrailleRenderer, Frame, HalfBlockRenderer, Renderer};
use phasescope::settings::{Settings, SettingsUpdate};
use phasescope::synth::{SyntheticAnalyser, Tone};

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    fft_size: usize,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 240,
        w: 160,
        h: 96,
        fft_size: 2048,
        ci_smoke: false,
        quick: false,
        max_ms: 16.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(2);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(4);
                }
                i += 2;
            }
            ("--fft-size", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.fft_size = n;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(60);
    }
    args
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

struct Sample {
    label: String,
    ms_per_frame: f64,
    lit: usize,
    points: usize,
}

fn bench_painter(args: &Args, mode: RenderMode, source: SampleSource) -> Result<Sample> {
    let settings = Settings::default().with_updates([
        SettingsUpdate::FftSize(args.fft_size),
        SettingsUpdate::Mode(mode),
        SettingsUpdate::SampleSource(source),
    ])?;
    let (left, right) = SyntheticAnalyser::pair(48_000.0, Tone::default());
    let mut painter = Painter::new(Box::new(left), Box::new(right), settings);
    let mut raster = Raster::new(args.w, args.h);

    let dt = 1.0 / 60.0;
    let mut points = 0usize;
    let start = Instant::now();
    for _ in 0..args.frames {
        let report = painter.draw_frame(dt, &mut raster);
        points += report.points;
    }
    let ms_per_frame = start.elapsed().as_secs_f64() * 1000.0 / args.frames as f64;

    let lit = raster
        .pixels_rgba()
        .chunks_exact(4)
        .filter(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
        .count();
    Ok(Sample {
        label: format!("{}/{}", mode.label(), source.label()),
        ms_per_frame,
        lit,
        points: points / args.frames,
    })
}

fn bench_presenters(args: &Args) -> Result<()> {
    let settings = Settings::default();
    let (left, right) = SyntheticAnalyser::pair(48_000.0, Tone::default());
    let mut painter = Painter::new(Box::new(left), Box::new(right), settings);

    let presenters: [(Box<dyn Renderer>, usize, usize); 2] = [
        (Box::new(HalfBlockRenderer::new()), 1, 2),
        (Box::new(BrailleRenderer::new()), 2, 4),
    ];
    for (mut renderer, px_w, px_h) in presenters {
        let cols = (args.w / px_w).max(1);
        let rows = (args.h / px_h).max(1);
        let mut raster = Raster::new(cols * px_w, rows * px_h);
        let mut sink = Vec::with_capacity(cols * rows * 24);
        let mut bytes = 0usize;

        let start = Instant::now();
        for _ in 0..args.frames {
            painter.draw_frame(1.0 / 60.0, &mut raster);
            sink.clear();
            let (pixel_width, pixel_height) = raster.size();
            let frame = Frame {
                term_cols: cols as u16,
                term_rows: rows as u16 + 1,
                visual_rows: rows as u16,
                pixel_width,
                pixel_height,
                pixels_rgba: raster.pixels_rgba(),
                hud: "bench",
                hud_rows: 1,
                overlay: None,
                sync_updates: true,
            };
            renderer.render(&frame, &mut sink)?;
            bytes += sink.len();
        }
        let ms = start.elapsed().as_secs_f64() * 1000.0 / args.frames as f64;
        println!(
            "present {:<10} {:>8.3} ms/frame  {:>7} bytes/frame  {}x{} cells",
            renderer.name(),
            ms,
            bytes / args.frames,
            cols,
            rows
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args = parse_args();
    println!(
        "phasescope bench: frames={} size={}x{} fft={}",
        args.frames, args.w, args.h, args.fft_size
    );

    let mut worst = 0.0f64;
    for mode in RenderMode::all() {
        for source in [SampleSource::Wave, SampleSource::Fft] {
            let s = bench_painter(&args, mode, source)?;
            println!(
                "draw {:<16} {:>8.3} ms/frame  points={:>6}  lit={:>6}",
                s.label, s.ms_per_frame, s.points, s.lit
            );
            worst = worst.max(s.ms_per_frame);
        }
    }
    bench_presenters(&args)?;

    if args.ci_smoke && worst > args.max_ms {
        return Err(anyhow::anyhow!(
            "slowest draw {worst:.3} ms/frame exceeds budget {:.3} ms",
            args.max_ms
        ));
    }
    Ok(())
}
