//! Per-triangle outcomes and per-frame counters

use std::fmt;

/// Why a triangle produced no pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A vertex lies outside the viewport (or is not finite)
    OffScreen,
    /// Zero or near-zero screen area
    Degenerate,
}

/// Pixel counts for one rasterized triangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageStats {
    /// Pixels inside the triangle
    pub covered: usize,
    /// Written to the opaque planes
    pub opaque: usize,
    /// Stored as transparency fragments
    pub translucent: usize,
    /// Discarded by the depth test
    pub hidden: usize,
}

/// Result of [`rasterize`](super::rasterize)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleOutcome {
    Drawn(CoverageStats),
    Rejected(RejectReason),
}

impl TriangleOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, TriangleOutcome::Drawn(_))
    }
}

/// Counters accumulated over one frame, reset by `Framebuffer::clear`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles: usize,
    pub drawn: usize,
    pub off_screen: usize,
    pub degenerate: usize,
    pub covered: usize,
    pub opaque: usize,
    pub translucent: usize,
    pub hidden: usize,
}

impl FrameStats {
    pub fn record(&mut self, outcome: &TriangleOutcome) {
        self.triangles += 1;
        match outcome {
            TriangleOutcome::Drawn(c) => {
                self.drawn += 1;
                self.covered += c.covered;
                self.opaque += c.opaque;
                self.translucent += c.translucent;
                self.hidden += c.hidden;
            }
            TriangleOutcome::Rejected(RejectReason::OffScreen) => self.off_screen += 1,
            TriangleOutcome::Rejected(RejectReason::Degenerate) => self.degenerate += 1,
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tris {}/{} (off {}, degen {}) | px {} opaque {} faint {} hidden {}",
            self.drawn,
            self.triangles,
            self.off_screen,
            self.degenerate,
            self.covered,
            self.opaque,
            self.translucent,
            self.hidden,
        )
    }
}
