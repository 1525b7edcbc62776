//! CPU triangle rasterizer with order-independent transparency
//!
//! Per frame:
//! - `Framebuffer::clear` resets the planes and rewinds the fragment arena
//! - `rasterize` is called once per projected triangle
//! - `merge` blends the transparency lists and packs RGBA8 output
//!
//! Opaque samples (alpha >= `OPAQUE_THRESHOLD`) go through a classic z-buffer.
//! Translucent samples are kept per pixel in depth-sorted linked lists whose
//! nodes live in a `FragmentArena`, so the result does not depend on the
//! order triangles are submitted in.

mod arena;
mod compose;
mod framebuffer;
mod math;
mod raster;
mod stats;
mod types;

pub use arena::*;
pub use compose::*;
pub use framebuffer::*;
pub use math::*;
pub use raster::*;
pub use stats::*;
pub use types::*;
