//! CPU raster [`Surface`]: draw commands into an RGBA f64 buffer.
//!
//! Always available (no feature gate) so that the `png` snapshot path and
//! tests share the same pixels. Coverage is binary per pixel center; there
//! is no anti-aliasing. `Text` commands are skipped since no font is bundled.

use glam::DVec2;
use std::ops::Range;
use warpfield_core::color::Srgb;
use warpfield_core::error::EngineError;
use warpfield_core::render::{BlendMode, DrawCommand, Paint, Shape, Surface};

/// Pixel buffer with a solid background.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    background: Srgb,
    pixels: Vec<[f64; 4]>,
    available: bool,
}

impl Raster {
    /// Returns `EngineError::InvalidDimensions` for a zero width or height.
    pub fn new(width: usize, height: usize, background: Srgb) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let bg = [background.r, background.g, background.b, 1.0];
        Ok(Self {
            width,
            height,
            background,
            pixels: vec![bg; width * height],
            available: true,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGBA at `(x, y)`, components in [0, 1].
    pub fn pixel(&self, x: usize, y: usize) -> [f64; 4] {
        self.pixels[y * self.width + x]
    }

    /// Marks the raster as torn down (or restored).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Converts to RGBA8, row-major. The buffer length is `width * height * 4`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|px| px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    /// Pixel indices whose centers may fall in `[lo, hi]` along one axis.
    fn span(lo: f64, hi: f64, limit: usize) -> Range<usize> {
        if !(lo.is_finite() && hi.is_finite()) || hi < 0.0 || lo >= limit as f64 {
            return 0..0;
        }
        let start = (lo - 0.5).ceil().max(0.0) as usize;
        let end = ((hi - 0.5).floor() + 1.0).clamp(0.0, limit as f64) as usize;
        start..end.max(start)
    }

    /// Blends `paint` into every pixel in the box whose center satisfies `inside`.
    fn fill(&mut self, min: DVec2, max: DVec2, paint: Paint, inside: impl Fn(DVec2) -> bool) {
        let alpha = paint.color.alpha.clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }
        let src = paint.color.color;
        let src = [src.r, src.g, src.b];
        for y in Self::span(min.y, max.y, self.height) {
            for x in Self::span(min.x, max.x, self.width) {
                if !inside(DVec2::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    continue;
                }
                let px = &mut self.pixels[y * self.width + x];
                for c in 0..3 {
                    px[c] = match paint.blend {
                        BlendMode::Normal => src[c] * alpha + px[c] * (1.0 - alpha),
                        BlendMode::Additive => (px[c] + src[c] * alpha).min(1.0),
                    };
                }
            }
        }
    }

    fn stroke(&mut self, points: &[DVec2], width: f64, paint: Paint) {
        if points.len() < 2 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let (min, max) = bounds(points);
        let pad = DVec2::splat(half);
        self.fill(min - pad, max + pad, paint, |p| {
            points
                .windows(2)
                .any(|w| segment_distance(p, w[0], w[1]) <= half)
        });
    }
}

impl Surface for Raster {
    fn is_available(&self) -> bool {
        self.available
    }

    fn clear(&mut self) {
        let bg = [self.background.r, self.background.g, self.background.b, 1.0];
        self.pixels.fill(bg);
    }

    fn draw(&mut self, command: &DrawCommand) {
        let paint = command.paint;
        match &command.shape {
            Shape::Circle { center, radius } => {
                let r = radius.max(0.5);
                let c = *center;
                self.fill(c - r, c + r, paint, |p| p.distance(c) <= r);
            }
            Shape::Ring {
                center,
                radius,
                width,
            } => {
                let half = (width * 0.5).max(0.5);
                let outer = radius + half;
                let c = *center;
                self.fill(c - outer, c + outer, paint, |p| {
                    (p.distance(c) - radius).abs() <= half
                });
            }
            Shape::Line { from, to, width } => self.stroke(&[*from, *to], *width, paint),
            Shape::Polyline { points, width } => self.stroke(points, *width, paint),
            Shape::Polygon { points } => {
                if points.len() < 3 {
                    return;
                }
                let (min, max) = bounds(points);
                self.fill(min, max, paint, |p| contains(points, p));
            }
            Shape::Text { .. } => {}
        }
    }
}

fn bounds(points: &[DVec2]) -> (DVec2, DVec2) {
    points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    )
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Even-odd point-in-polygon test.
fn contains(points: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpfield_core::config::SimConfig;
    use warpfield_core::render::{Layer, Renderer};
    use warpfield_core::simulation::Simulation;
    use warpfield_core::world::World;

    fn raster() -> Raster {
        Raster::new(20, 10, Srgb::BLACK).unwrap()
    }

    fn cmd(paint: Paint, shape: Shape) -> DrawCommand {
        DrawCommand {
            layer: Layer::Entities,
            paint,
            shape,
        }
    }

    // =====================================================================
    // Construction and conversion
    // =====================================================================

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Raster::new(0, 4, Srgb::BLACK),
            Err(EngineError::InvalidDimensions)
        ));
    }

    #[test]
    fn to_rgba8_correct_length_and_opaque() {
        let r = raster();
        let buf = r.to_rgba8();
        assert_eq!(buf.len(), 20 * 10 * 4);
        assert!(buf.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    // =====================================================================
    // Shapes
    // =====================================================================

    #[test]
    fn circle_covers_its_center_only() {
        let mut r = raster();
        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 1.0),
            Shape::Circle {
                center: DVec2::new(5.0, 5.0),
                radius: 2.0,
            },
        ));
        assert_eq!(r.pixel(4, 4), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(r.pixel(15, 5), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn ring_leaves_its_middle_empty() {
        let mut r = Raster::new(40, 40, Srgb::BLACK).unwrap();
        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 1.0),
            Shape::Ring {
                center: DVec2::new(20.0, 20.0),
                radius: 10.0,
                width: 2.0,
            },
        ));
        assert_eq!(r.pixel(20, 20)[0], 0.0);
        assert_eq!(r.pixel(29, 19)[0], 1.0);
    }

    #[test]
    fn line_and_polyline_stroke_pixels() {
        let mut r = raster();
        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 1.0),
            Shape::Line {
                from: DVec2::new(0.0, 2.5),
                to: DVec2::new(20.0, 2.5),
                width: 1.0,
            },
        ));
        assert!((0..20).all(|x| r.pixel(x, 2)[0] == 1.0));
        assert_eq!(r.pixel(5, 7)[0], 0.0);

        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 1.0),
            Shape::Polyline {
                points: vec![DVec2::new(0.5, 9.5), DVec2::new(10.5, 9.5), DVec2::new(10.5, 5.5)],
                width: 1.0,
            },
        ));
        assert_eq!(r.pixel(3, 9)[0], 1.0);
        assert_eq!(r.pixel(10, 6)[0], 1.0);
    }

    #[test]
    fn polygon_fills_interior() {
        let mut r = raster();
        let square = vec![
            DVec2::new(2.0, 2.0),
            DVec2::new(8.0, 2.0),
            DVec2::new(8.0, 8.0),
            DVec2::new(2.0, 8.0),
        ];
        r.draw(&cmd(
            Paint::new(Srgb::from_u8(255, 0, 0), 1.0),
            Shape::Polygon { points: square },
        ));
        assert_eq!(r.pixel(5, 5), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(r.pixel(9, 5), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn offscreen_and_degenerate_shapes_are_ignored() {
        let mut r = raster();
        let before = r.to_rgba8();
        let paint = Paint::new(Srgb::WHITE, 1.0);
        r.draw(&cmd(
            paint,
            Shape::Circle {
                center: DVec2::new(-50.0, -50.0),
                radius: 3.0,
            },
        ));
        r.draw(&cmd(
            paint,
            Shape::Circle {
                center: DVec2::new(f64::NAN, 1.0),
                radius: 3.0,
            },
        ));
        r.draw(&cmd(paint, Shape::Polygon { points: vec![DVec2::ZERO] }));
        r.draw(&cmd(
            paint,
            Shape::Text {
                at: DVec2::new(1.0, 1.0),
                text: "hud".into(),
                size: 12.0,
            },
        ));
        assert_eq!(r.to_rgba8(), before);
    }

    // =====================================================================
    // Blending
    // =====================================================================

    #[test]
    fn normal_blend_mixes_by_alpha() {
        let mut r = raster();
        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 0.25),
            Shape::Circle {
                center: DVec2::new(5.0, 5.0),
                radius: 1.0,
            },
        ));
        assert!((r.pixel(5, 5)[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn additive_blend_accumulates_and_saturates() {
        let mut r = raster();
        let glow = cmd(
            Paint::new(Srgb::WHITE, 0.4).additive(),
            Shape::Circle {
                center: DVec2::new(5.0, 5.0),
                radius: 1.0,
            },
        );
        r.draw(&glow);
        r.draw(&glow);
        assert!((r.pixel(5, 5)[0] - 0.8).abs() < 1e-12);
        r.draw(&glow);
        assert_eq!(r.pixel(5, 5)[0], 1.0);
    }

    #[test]
    fn clear_restores_background() {
        let mut r = Raster::new(4, 4, Srgb::from_u8(0, 0, 255)).unwrap();
        r.draw(&cmd(
            Paint::new(Srgb::WHITE, 1.0),
            Shape::Circle {
                center: DVec2::new(2.0, 2.0),
                radius: 5.0,
            },
        ));
        r.clear();
        assert_eq!(r.pixel(1, 1), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn renders_a_world_scene() {
        let world = World::new(SimConfig::default()).unwrap();
        let scene = world.scene();
        let mut r = Raster::new(scene.bounds.x as usize, scene.bounds.y as usize, Srgb::BLACK).unwrap();
        Renderer::default().render(&scene, &mut r);
        assert!(r.to_rgba8().chunks(4).any(|px| px[..3] != [0, 0, 0]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pixels_stay_in_unit_range(
                x in -50.0f64..70.0,
                y in -50.0f64..60.0,
                radius in 0.0f64..30.0,
                alpha in 0.0f64..1.0,
                additive in any::<bool>(),
            ) {
                let mut r = Raster::new(20, 10, Srgb::from_u8(30, 60, 90)).unwrap();
                let paint = Paint::new(Srgb::from_u8(250, 128, 10), alpha);
                let paint = if additive { paint.additive() } else { paint };
                for _ in 0..3 {
                    r.draw(&cmd(paint, Shape::Circle { center: DVec2::new(x, y), radius }));
                }
                for py in 0..10 {
                    for px in 0..20 {
                        let p = r.pixel(px, py);
                        prop_assert!(p.iter().all(|c| (0.0..=1.0).contains(c)));
                    }
                }
            }
        }
    }
}
