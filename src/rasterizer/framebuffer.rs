//! Framebuffer for software rendering
//!
//! Planes are stored struct-of-arrays, one entry per pixel in row-major order:
//! opaque color, opaque depth and the head of the pixel's transparency list.
//! The packed RGBA8 output is only written by [`merge`](super::merge).

use super::arena::{Fragment, FragmentArena, FragmentRef};
use super::stats::FrameStats;
use super::types::Rgba;

/// Depth of a pixel nothing has been drawn to yet
pub const FAR_DEPTH: f32 = f32::INFINITY;

pub struct Framebuffer {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// RGBA, 4 bytes per pixel
    pub(crate) pixels: Vec<u8>,
    pub(crate) opaque_color: Vec<Rgba>,
    pub(crate) opaque_depth: Vec<f32>,
    pub(crate) transparent: Vec<Option<FragmentRef>>,
    /// Leftmost covered column per row of the triangle being drawn
    pub(crate) span_min: Vec<i32>,
    /// Rightmost covered column per row
    pub(crate) span_max: Vec<i32>,
    pub(crate) arena: FragmentArena,
    pub(crate) stats: FrameStats,
}

impl Framebuffer {
    /// Allocate every plane for `width x height` pixels
    ///
    /// The arena starts with one fragment slot per pixel.
    pub fn new(width: usize, height: usize) -> Self {
        let count = width * height;
        Self {
            width,
            height,
            pixels: vec![0; count * 4],
            opaque_color: vec![Rgba::TRANSPARENT; count],
            opaque_depth: vec![FAR_DEPTH; count],
            transparent: vec![None; count],
            span_min: vec![0; height],
            span_max: vec![0; height],
            arena: FragmentArena::new(count),
            stats: FrameStats::default(),
        }
    }

    /// Reset every plane for a new frame
    ///
    /// Nothing is reallocated; the arena keeps its head generation.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.opaque_color.fill(Rgba::TRANSPARENT);
        self.opaque_depth.fill(FAR_DEPTH);
        self.transparent.fill(None);
        self.arena.reset();
        self.stats = FrameStats::default();
    }

    /// Change dimensions, reallocating only when they differ
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        tracing::debug!(width, height, "resizing framebuffer");
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Packed RGBA8 output of the last merge, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        y * self.width + x
    }

    /// Packed output at (x, y)
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.index(x, y) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    pub fn opaque_color(&self, x: usize, y: usize) -> Rgba {
        self.opaque_color[self.index(x, y)]
    }

    pub fn opaque_depth(&self, x: usize, y: usize) -> f32 {
        self.opaque_depth[self.index(x, y)]
    }

    /// Transparency list at (x, y), farthest first
    pub fn fragments(&self, x: usize, y: usize) -> Fragments<'_> {
        Fragments {
            arena: &self.arena,
            next: self.transparent[self.index(x, y)],
        }
    }

    pub fn fragment_count(&self, x: usize, y: usize) -> usize {
        self.fragments(x, y).count()
    }

    pub fn arena(&self) -> &FragmentArena {
        &self.arena
    }

    /// Counters since the last clear
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Insert a translucent sample into the list at pixel `idx`
    ///
    /// Lists are kept in descending depth order; a sample lands after every
    /// existing sample at the same or greater depth.
    pub(crate) fn insert_fragment(&mut self, idx: usize, color: Rgba, depth: f32) {
        let new = self.arena.allocate(Fragment::new(color, depth));
        let head = self.transparent[idx];

        match head {
            Some(first) if self.arena.get(first).depth >= depth => {
                let mut cur = first;
                while let Some(next) = self.arena.get(cur).next {
                    if self.arena.get(next).depth < depth {
                        break;
                    }
                    cur = next;
                }
                let after = self.arena.get(cur).next;
                self.arena.get_mut(new).next = after;
                self.arena.get_mut(cur).next = Some(new);
            }
            _ => {
                self.arena.get_mut(new).next = head;
                self.transparent[idx] = Some(new);
            }
        }
    }
}

/// Iterator over one pixel's transparency list
pub struct Fragments<'a> {
    arena: &'a FragmentArena,
    next: Option<FragmentRef>,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = &'a Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        let fragment = self.arena.get(self.next?);
        self.next = fragment.next;
        Some(fragment)
    }
}
