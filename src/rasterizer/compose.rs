//! Final compositing pass: transparency lists over opaque color, then RGBA8

use super::framebuffer::Framebuffer;
use super::types::Rgba;

/// Convert a 0.0-1.0 color to RGBA8, rounding to nearest
///
/// The same clamp-scale-round runs on all four lanes, which keeps the loop
/// free of branches so it vectorizes.
#[inline]
pub fn pack_rgba(color: Rgba) -> [u8; 4] {
    color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Resolve every pixel into the packed output plane
///
/// Each transparency list is stored farthest first, so blending walks it
/// back-to-front. Fragments that ended up behind the pixel's opaque sample
/// (written after them) are skipped. Allocation free.
pub fn merge(fb: &mut Framebuffer) {
    let Framebuffer {
        pixels,
        opaque_color,
        opaque_depth,
        transparent,
        arena,
        ..
    } = fb;

    let planes = opaque_color.iter().zip(opaque_depth.iter()).zip(transparent.iter());
    for (out, ((&base, &depth), &head)) in pixels.chunks_exact_mut(4).zip(planes) {
        let mut color = base;
        let mut next = head;
        while let Some(r) = next {
            let fragment = arena.get(r);
            if fragment.depth < depth {
                color = fragment.color.over(color);
            }
            next = fragment.next;
        }
        out.copy_from_slice(&pack_rgba(color));
    }
}
