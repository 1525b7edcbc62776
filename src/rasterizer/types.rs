//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use super::math::Vec3;

/// Straight-alpha RGBA color, 0.0-1.0 per channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::with_alpha(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0);
    pub const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_array([r, g, b, a].map(|c| c as f32 / 255.0))
    }

    /// Same color, different alpha
    pub fn alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self { r: c[0], g: c[1], b: c[2], a: c[3] }
    }

    /// Composite `self` over `dst` (straight alpha, "over" operator)
    #[inline]
    pub fn over(self, dst: Rgba) -> Rgba {
        let inv = 1.0 - self.a;
        Rgba {
            r: self.r * self.a + dst.r * inv,
            g: self.g * self.a + dst.g * inv,
            b: self.b * self.a + dst.b * inv,
            a: self.a + dst.a * inv,
        }
    }
}

/// A projected triangle ready for rasterization
///
/// Positions are in viewport pixel coordinates, `z` carries depth (smaller is
/// nearer). Each vertex has its own color; colors are interpolated across the
/// face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub colors: [Rgba; 3],
}

impl Triangle {
    pub fn new(positions: [Vec3; 3], colors: [Rgba; 3]) -> Self {
        Self { positions, colors }
    }

    /// Triangle with one color on every vertex
    pub fn flat(positions: [Vec3; 3], color: Rgba) -> Self {
        Self { positions, colors: [color; 3] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_over_opaque_replaces() {
        let c = Rgba::RED.over(Rgba::BLUE);
        assert_eq!(c, Rgba::RED);
    }

    #[test]
    fn test_over_half_alpha_mixes() {
        let c = Rgba::WHITE.alpha(0.5).over(Rgba::BLACK);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.a - 1.0).abs() < 1e-6);

        let c = Rgba::WHITE.alpha(0.5).over(Rgba::TRANSPARENT);
        assert!((c.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_rgba8() {
        let c = Rgba::from_rgba8(255, 0, 51, 255);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
    }
}
