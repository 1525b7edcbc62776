//! softpipe: a CPU-only triangle rasterizer
//!
//! - Scanline edge-table coverage with a top-left fill rule
//! - Opaque z-buffering plus order-independent transparency through
//!   per-pixel fragment lists
//! - Doubling fragment arena, reused across frames
//! - Packed RGBA8 output ready for any presentation surface

pub mod config;
pub mod error;
pub mod rasterizer;

pub use error::{Result, SoftpipeError};
