//! Triangle rasterization
//!
//! Coverage comes from an edge-walked scanline table: every edge writes the
//! columns where it crosses each row's pixel centers, which leaves each row
//! with a conservative `[min, max]` span. Inside the span the three edge
//! functions are stepped by constant deltas and tested with a top-left fill
//! rule, so adjacent triangles never cover a shared pixel twice.

use super::framebuffer::Framebuffer;
use super::math::{signed_area, Vec3};
use super::stats::{CoverageStats, RejectReason, TriangleOutcome};
use super::types::{Rgba, Triangle};

/// Alpha at or above which a sample is written straight to the opaque planes
pub const OPAQUE_THRESHOLD: f32 = 0.98;

/// Screen areas (doubled) below this are treated as degenerate
pub const DEGENERATE_EPSILON: f32 = 1e-6;

/// One edge function in sign-normalized form (positive inside)
#[derive(Clone, Copy)]
struct Edge {
    /// Change per pixel to the right
    step_x: f32,
    /// Change per row down
    step_y: f32,
    /// Pixels exactly on this edge are covered
    top_left: bool,
}

impl Edge {
    fn new(step_x: f32, step_y: f32) -> Self {
        Self {
            step_x,
            step_y,
            top_left: step_x > 0.0 || (step_x == 0.0 && step_y > 0.0),
        }
    }

    #[inline]
    fn covers(&self, w: f32) -> bool {
        w > 0.0 || (w == 0.0 && self.top_left)
    }
}

/// Rasterize one projected triangle into the framebuffer's opaque or
/// transparency planes
///
/// Off-screen and degenerate triangles are skipped and reported in the
/// returned outcome; the framebuffer's frame statistics record it either way.
pub fn rasterize(fb: &mut Framebuffer, tri: &Triangle) -> TriangleOutcome {
    let outcome = match draw_triangle(fb, tri) {
        Ok(coverage) => TriangleOutcome::Drawn(coverage),
        Err(reason) => {
            tracing::trace!(?reason, "triangle skipped");
            TriangleOutcome::Rejected(reason)
        }
    };
    fb.stats.record(&outcome);
    outcome
}

fn on_screen(fb: &Framebuffer, p: Vec3) -> bool {
    p.is_finite()
        && p.x >= 0.0
        && p.y >= 0.0
        && p.x <= fb.width as f32 - 1.0
        && p.y <= fb.height as f32 - 1.0
}

fn draw_triangle(fb: &mut Framebuffer, tri: &Triangle) -> Result<CoverageStats, RejectReason> {
    let [v1, v2, v3] = tri.positions;

    // No clipping: anything poking outside the viewport is dropped whole
    if !(on_screen(fb, v1) && on_screen(fb, v2) && on_screen(fb, v3)) {
        return Err(RejectReason::OffScreen);
    }

    let denom = signed_area(v1, v2, v3);
    if denom.abs() < DEGENERATE_EPSILON {
        return Err(RejectReason::Degenerate);
    }

    // Normalize winding so every edge function is positive inside
    let s = denom.signum();
    let area = denom.abs();
    let e1 = Edge::new(s * (v2.y - v3.y), s * (v3.x - v2.x));
    let e2 = Edge::new(s * (v3.y - v1.y), s * (v1.x - v3.x));
    let e3 = Edge::new(s * (v1.y - v2.y), s * (v2.x - v1.x));

    let xmin = v1.x.min(v2.x).min(v3.x).floor() as i32;
    let xmax = v1.x.max(v2.x).max(v3.x).ceil() as i32;
    let ymin = v1.y.min(v2.y).min(v3.y).floor() as i32;
    let ymax = v1.y.max(v2.y).max(v3.y).ceil() as i32;

    for row in ymin as usize..=ymax as usize {
        fb.span_min[row] = xmax + 1;
        fb.span_max[row] = xmin - 1;
    }
    for (a, b) in [(v1, v2), (v2, v3), (v3, v1)] {
        walk_edge(fb, a, b, (ymin, ymax), (xmin, xmax));
    }

    let inv_area = 1.0 / area;
    let depths = [v1.z, v2.z, v3.z];
    let colors = tri.colors.map(Rgba::to_array);
    let mut coverage = CoverageStats::default();

    for py in ymin..=ymax {
        let row = py as usize;
        let (left, right) = (fb.span_min[row], fb.span_max[row]);
        if left > right {
            continue;
        }

        // Edge functions at the first pixel center of the span
        let fx = left as f32 + 0.5 - v3.x;
        let fy = py as f32 + 0.5 - v3.y;
        let mut w1 = e1.step_x * fx + e1.step_y * fy;
        let mut w2 = e2.step_x * fx + e2.step_y * fy;
        let mut w3 = area - w1 - w2;

        let base = row * fb.width;
        for px in left..=right {
            if e1.covers(w1) && e2.covers(w2) && e3.covers(w3) {
                let weights = [w1 * inv_area, w2 * inv_area, w3 * inv_area];
                let z = interpolate(weights, depths);
                let color = Rgba::from_array(
                    std::array::from_fn(|lane| {
                        interpolate(weights, [colors[0][lane], colors[1][lane], colors[2][lane]])
                    }),
                );
                shade(fb, base + px as usize, z, color, &mut coverage);
            }

            w1 += e1.step_x;
            w2 += e2.step_x;
            w3 += e3.step_x;
        }
    }

    Ok(coverage)
}

/// Widen the spans of every row whose pixel center this edge crosses
fn walk_edge(fb: &mut Framebuffer, a: Vec3, b: Vec3, rows: (i32, i32), cols: (i32, i32)) {
    let (top, bottom) = if a.y <= b.y { (a, b) } else { (b, a) };
    let dy = bottom.y - top.y;
    if dy == 0.0 {
        // horizontal edges are covered by the endpoints of the other two
        return;
    }

    let dxdy = (bottom.x - top.x) / dy;
    let first = ((top.y - 0.5).ceil() as i32).max(rows.0);
    let last = ((bottom.y - 0.5).floor() as i32).min(rows.1);

    for y in first..=last {
        let x = top.x + dxdy * (y as f32 + 0.5 - top.y) - 0.5;
        let lo = (x.floor() as i32).clamp(cols.0, cols.1);
        let hi = (x.ceil() as i32).clamp(cols.0, cols.1);
        let row = y as usize;
        fb.span_min[row] = fb.span_min[row].min(lo);
        fb.span_max[row] = fb.span_max[row].max(hi);
    }
}

#[inline]
fn interpolate(weights: [f32; 3], values: [f32; 3]) -> f32 {
    weights[0] * values[0] + weights[1] * values[1] + weights[2] * values[2]
}

/// Depth test and route one sample to the opaque or transparency planes
#[inline]
fn shade(fb: &mut Framebuffer, idx: usize, z: f32, color: Rgba, coverage: &mut CoverageStats) {
    coverage.covered += 1;

    // also drops NaN depths
    if !(z < fb.opaque_depth[idx]) {
        coverage.hidden += 1;
        return;
    }

    if color.a >= OPAQUE_THRESHOLD {
        fb.opaque_color[idx] = color;
        fb.opaque_depth[idx] = z;
        coverage.opaque += 1;
    } else {
        fb.insert_fragment(idx, color, z);
        coverage.translucent += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::FAR_DEPTH;

    fn tri(p: [(f32, f32, f32); 3], color: Rgba) -> Triangle {
        Triangle::flat(p.map(|(x, y, z)| Vec3::new(x, y, z)), color)
    }

    /// Barycentric weights of pixel (px, py)'s center, in f64
    fn center_weights(t: &Triangle, px: usize, py: usize) -> [f64; 3] {
        let [a, b, c] = t.positions.map(|v| (v.x as f64, v.y as f64));
        let (x, y) = (px as f64 + 0.5, py as f64 + 0.5);
        let d = (a.0 - c.0) * (b.1 - c.1) - (b.0 - c.0) * (a.1 - c.1);
        let w1 = ((b.1 - c.1) * (x - c.0) + (c.0 - b.0) * (y - c.1)) / d;
        let w2 = ((c.1 - a.1) * (x - c.0) + (a.0 - c.0) * (y - c.1)) / d;
        [w1, w2, 1.0 - w1 - w2]
    }

    fn assert_covers_interior_once(t: Triangle) {
        let mut fb = Framebuffer::new(64, 48);
        let t = Triangle { colors: [Rgba::WHITE.alpha(0.5); 3], ..t };
        assert!(rasterize(&mut fb, &t).is_drawn());

        for py in 0..fb.height() {
            for px in 0..fb.width() {
                let w = center_weights(&t, px, py);
                let count = fb.fragment_count(px, py);
                if w.iter().all(|&w| w > 1e-4) {
                    assert_eq!(count, 1, "interior pixel ({px}, {py}) of {t:?}");
                } else if w.iter().any(|&w| w < -1e-4) {
                    assert_eq!(count, 0, "exterior pixel ({px}, {py}) of {t:?}");
                }
            }
        }
    }

    #[test]
    fn test_coverage_matches_edge_functions() {
        let white = Rgba::WHITE;
        assert_covers_interior_once(tri([(10.0, 10.0, 0.5), (50.0, 10.0, 0.5), (30.0, 40.0, 0.5)], white));
        // opposite winding
        assert_covers_interior_once(tri([(50.0, 10.0, 0.5), (10.0, 10.0, 0.5), (30.0, 40.0, 0.5)], white));
        // fractional vertices
        assert_covers_interior_once(tri([(3.3, 1.7, 0.1), (61.9, 20.2, 0.4), (17.5, 46.6, 0.9)], white));
        // touching the viewport bounds
        assert_covers_interior_once(tri([(0.0, 0.0, 0.5), (63.0, 0.0, 0.5), (0.0, 47.0, 0.5)], white));
        // long sliver
        assert_covers_interior_once(tri([(1.0, 2.0, 0.5), (62.0, 5.5, 0.5), (2.0, 4.0, 0.5)], white));
        // tall and steep
        assert_covers_interior_once(tri([(30.2, 0.4, 0.5), (31.9, 46.8, 0.5), (28.1, 23.3, 0.5)], white));
    }

    #[test]
    fn test_shared_edge_covered_once() {
        let mut fb = Framebuffer::new(40, 40);
        let c = Rgba::BLUE.alpha(0.4);
        let upper = tri([(10.0, 10.0, 0.5), (30.0, 10.0, 0.5), (30.0, 30.0, 0.5)], c);
        let lower = tri([(10.0, 10.0, 0.5), (30.0, 30.0, 0.5), (10.0, 30.0, 0.5)], c);
        rasterize(&mut fb, &upper);
        rasterize(&mut fb, &lower);

        for py in 0..40 {
            for px in 0..40 {
                let inside = (10..30).contains(&px) && (10..30).contains(&py);
                let expected = if inside { 1 } else { 0 };
                assert_eq!(fb.fragment_count(px, py), expected, "pixel ({px}, {py})");
            }
        }
        assert_eq!(fb.stats().translucent, 400);
    }

    #[test]
    fn test_reject_off_screen() {
        let mut fb = Framebuffer::new(100, 100);
        let t = tri([(-1.0, 10.0, 0.5), (50.0, 10.0, 0.5), (30.0, 40.0, 0.5)], Rgba::WHITE);
        assert_eq!(rasterize(&mut fb, &t), TriangleOutcome::Rejected(RejectReason::OffScreen));

        let t = tri([(10.0, 10.0, 0.5), (99.5, 10.0, 0.5), (30.0, 40.0, 0.5)], Rgba::WHITE);
        assert_eq!(rasterize(&mut fb, &t), TriangleOutcome::Rejected(RejectReason::OffScreen));

        let t = tri([(10.0, f32::NAN, 0.5), (50.0, 10.0, 0.5), (30.0, 40.0, 0.5)], Rgba::WHITE);
        assert_eq!(rasterize(&mut fb, &t), TriangleOutcome::Rejected(RejectReason::OffScreen));

        assert_eq!(fb.opaque_depth(30, 20), FAR_DEPTH);
        assert_eq!(fb.stats().off_screen, 3);
    }

    #[test]
    fn test_reject_degenerate() {
        let mut fb = Framebuffer::new(100, 100);
        let collinear = tri([(10.0, 10.0, 0.5), (20.0, 20.0, 0.5), (30.0, 30.0, 0.5)], Rgba::WHITE);
        assert_eq!(rasterize(&mut fb, &collinear), TriangleOutcome::Rejected(RejectReason::Degenerate));

        let point = tri([(5.0, 5.0, 0.5); 3], Rgba::WHITE);
        assert_eq!(rasterize(&mut fb, &point), TriangleOutcome::Rejected(RejectReason::Degenerate));

        assert_eq!(fb.stats().degenerate, 2);
        assert_eq!(fb.stats().covered, 0);
    }

    #[test]
    fn test_nearer_opaque_wins_in_any_order() {
        let verts = |z| tri([(10.0, 10.0, z), (50.0, 10.0, z), (30.0, 40.0, z)], Rgba::WHITE);
        let far = Triangle { colors: [Rgba::RED; 3], ..verts(0.8) };
        let near = Triangle { colors: [Rgba::GREEN; 3], ..verts(0.2) };

        for order in [[far, near], [near, far]] {
            let mut fb = Framebuffer::new(100, 100);
            for t in &order {
                rasterize(&mut fb, t);
            }
            assert_eq!(fb.opaque_color(30, 20), Rgba::GREEN);
            assert!((fb.opaque_depth(30, 20) - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_translucent_over_farther_opaque() {
        let mut fb = Framebuffer::new(100, 100);
        let wall = tri([(0.0, 0.0, 0.9), (99.0, 0.0, 0.9), (0.0, 99.0, 0.9)], Rgba::RED);
        rasterize(&mut fb, &wall);

        let glass = tri([(10.0, 10.0, 0.3), (50.0, 10.0, 0.3), (30.0, 40.0, 0.3)], Rgba::BLUE.alpha(0.5));
        let outcome = rasterize(&mut fb, &glass);

        assert_eq!(fb.opaque_color(30, 20), Rgba::RED);
        assert!((fb.opaque_depth(30, 20) - 0.9).abs() < 1e-6);
        assert_eq!(fb.fragment_count(30, 20), 1);
        let frag = fb.fragments(30, 20).next().map(|f| (f.color, f.depth));
        assert_eq!(frag.map(|(c, _)| c), Some(Rgba::BLUE.alpha(0.5)));

        match outcome {
            TriangleOutcome::Drawn(c) => {
                assert_eq!(c.translucent, c.covered);
                assert_eq!(c.hidden, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_translucent_behind_opaque_is_hidden() {
        let mut fb = Framebuffer::new(100, 100);
        let wall = tri([(0.0, 0.0, 0.2), (99.0, 0.0, 0.2), (0.0, 99.0, 0.2)], Rgba::RED);
        rasterize(&mut fb, &wall);

        let glass = tri([(10.0, 10.0, 0.6), (50.0, 10.0, 0.6), (30.0, 40.0, 0.6)], Rgba::BLUE.alpha(0.5));
        match rasterize(&mut fb, &glass) {
            TriangleOutcome::Drawn(c) => {
                assert!(c.covered > 0);
                assert_eq!(c.hidden, c.covered);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fb.fragment_count(30, 20), 0);
        assert!(fb.arena().is_empty());
    }

    #[test]
    fn test_threshold_alpha_counts_as_opaque() {
        let mut fb = Framebuffer::new(100, 100);
        let t = tri([(10.0, 10.0, 0.5), (50.0, 10.0, 0.5), (30.0, 40.0, 0.5)], Rgba::GREEN.alpha(OPAQUE_THRESHOLD));
        rasterize(&mut fb, &t);
        assert_eq!(fb.fragment_count(30, 20), 0);
        assert_eq!(fb.opaque_color(30, 20).g, 1.0);
    }

    #[test]
    fn test_depth_is_interpolated_linearly() {
        // z = x / 100 across the whole face
        let mut fb = Framebuffer::new(64, 64);
        let t = tri([(0.0, 0.0, 0.0), (60.0, 0.0, 0.6), (0.0, 60.0, 0.0)], Rgba::WHITE);
        rasterize(&mut fb, &t);
        assert!((fb.opaque_depth(20, 10) - 0.205).abs() < 1e-4);
        assert!((fb.opaque_depth(5, 40) - 0.055).abs() < 1e-4);
    }

    #[test]
    fn test_color_is_interpolated() {
        let mut fb = Framebuffer::new(64, 64);
        let t = Triangle::new(
            [Vec3::new(0.0, 0.0, 0.5), Vec3::new(60.0, 0.0, 0.5), Vec3::new(0.0, 60.0, 0.5)],
            [Rgba::RED, Rgba::GREEN, Rgba::BLUE],
        );
        rasterize(&mut fb, &t);

        let near_red = fb.opaque_color(1, 1);
        assert!(near_red.r > 0.9 && near_red.g < 0.1 && near_red.b < 0.1);

        // center pixel of the hypotenuse region mixes green and blue
        let mid = fb.opaque_color(29, 29);
        assert!(mid.r < 0.05);
        assert!((mid.g - mid.b).abs() < 0.01);
        assert!((mid.r + mid.g + mid.b - 1.0).abs() < 1e-4);
        assert!((mid.a - 1.0).abs() < 1e-6);
    }
}
