use phasescope::color::{Hsla, Rgba};
use phasescope::painter::Painter;
use phasescope::raster::Raster;
use phasescope::settings::Settings;
use phasescope::surface::Surface;
use phasescope::synth::{SyntheticAnalyser, Tone};

fn lit_pixels(raster: &mut Raster) -> usize {
    raster
        .pixels_rgba()
        .chunks_exact(4)
        .filter(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
        .count()
}

fn white() -> Rgba {
    Rgba::new(255, 255, 255, 1.0)
}

#[test]
fn new_raster_is_black_and_opaque() {
    let mut r = Raster::new(4, 3);
    assert_eq!(r.size(), (4, 3));
    let px = r.pixels_rgba();
    assert_eq!(px.len(), 4 * 3 * 4);
    assert!(px.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    assert_eq!(r.pixel(4, 0), None);
}

#[test]
fn fill_rect_blends_with_alpha() {
    let mut r = Raster::new(4, 4);
    r.set_fill_style(white().into());
    r.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(r.pixel(2, 2), Some((255, 255, 255)));

    r.set_fill_style(Rgba::black(0.5).into());
    r.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(r.pixel(0, 0), Some((128, 128, 128)));

    r.set_fill_style(Rgba::black(1.0).into());
    r.fill_rect(0.0, 0.0, 2.0, 4.0);
    assert_eq!(r.pixel(1, 0), Some((0, 0, 0)));
    assert_eq!(r.pixel(3, 0), Some((128, 128, 128)));
}

#[test]
fn repeated_fades_reach_black() {
    let mut r = Raster::new(2, 2);
    r.set_fill_style(white().into());
    r.fill_rect(0.0, 0.0, 2.0, 2.0);
    r.set_fill_style(Rgba::black(0.05).into());
    for _ in 0..400 {
        r.fill_rect(0.0, 0.0, 2.0, 2.0);
    }
    assert_eq!(r.pixel(1, 1), Some((0, 0, 0)));
}

#[test]
fn stroke_follows_the_transform() {
    let mut r = Raster::new(20, 20);
    r.set_stroke_style(white().into());
    r.translate(10.0, 10.0);
    r.scale(10.0, 10.0);
    r.set_line_width(0.1);
    r.begin_path();
    r.move_to(-1.0, 0.0);
    r.line_to(1.0, 0.0);
    r.stroke();
    r.reset_transform();

    // Full-width line straddling rows 9 and 10, nothing at the top.
    let lit = (0..20)
        .filter(|&x| r.pixel(x, 9).unwrap().0 > 0 && r.pixel(x, 10).unwrap().0 > 0)
        .count();
    assert_eq!(lit, 20);
    assert_eq!(r.pixel(10, 0), Some((0, 0, 0)));
    assert!(r.transform().is_identity());
}

#[test]
fn transparent_stroke_draws_nothing() {
    let mut r = Raster::new(8, 8);
    r.set_stroke_style(Hsla::stroke(0, 0).into());
    r.begin_path();
    r.move_to(0.0, 0.0);
    r.line_to(8.0, 8.0);
    r.stroke();
    assert_eq!(lit_pixels(&mut r), 0);
}

#[test]
fn overlapping_segments_do_not_double_blend() {
    let mut once = Raster::new(16, 4);
    let mut twice = Raster::new(16, 4);
    for (r, passes) in [(&mut once, 1), (&mut twice, 2)] {
        r.set_stroke_style(Hsla::stroke(0, 50).into());
        r.begin_path();
        for _ in 0..passes {
            r.move_to(0.0, 2.0);
            r.line_to(16.0, 2.0);
        }
        r.stroke();
    }
    for x in 0..16 {
        assert_eq!(once.pixel(x, 1), twice.pixel(x, 1));
    }
}

#[test]
fn offscreen_geometry_is_clipped() {
    let mut r = Raster::new(8, 8);
    r.set_stroke_style(white().into());
    r.begin_path();
    r.move_to(-100.0, -100.0);
    r.line_to(100.0, 100.0);
    r.move_to(1e9, 5.0);
    r.line_to(-1e9, 5.0);
    r.stroke();
    assert!(lit_pixels(&mut r) > 0);
}

#[test]
fn resize_clears_the_image() {
    let mut r = Raster::new(4, 4);
    r.set_fill_style(white().into());
    r.fill_rect(0.0, 0.0, 4.0, 4.0);
    r.resize(4, 4);
    assert_eq!(r.pixel(0, 0), Some((255, 255, 255)));
    r.resize(6, 2);
    assert_eq!(r.size(), (6, 2));
    assert_eq!(lit_pixels(&mut r), 0);
}

#[test]
fn painter_lights_up_a_raster() {
    let (mut left, mut right) = SyntheticAnalyser::manual_pair(48_000.0, Tone::default());
    left.advance(4096);
    right.advance(4096);
    let mut painter = Painter::new(Box::new(left), Box::new(right), Settings::default());
    let mut raster = Raster::new(96, 64);

    let report = painter.draw_frame(0.016, &mut raster);
    assert!(report.skipped.is_none());
    assert!(report.points > 0);
    assert!(lit_pixels(&mut raster) > 50);
    assert!(raster.transform().is_identity());

    // Full fade, then the same frozen signal again: same footprint, new hue.
    let before = lit_pixels(&mut raster);
    painter.draw_frame(10.0, &mut raster);
    let after = lit_pixels(&mut raster);
    assert!(after > 0 && after <= before + before / 10);
}
