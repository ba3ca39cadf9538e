//! Palette mapping for decoded chunks.
//!
//! Byte 0 marks a point inside the set and renders as the black sentinel;
//! every other value runs through a jet-style gradient on the *inverted*
//! normalized count, so low escape counts (far from the set) sit at the cool
//! end and near-boundary points glow hot.

use mandelgrid_core::Chunk;
use rayon::prelude::*;

/// Map one normalized escape byte to an RGB pixel.
pub fn color_for_value(value: u8) -> [u8; 3] {
    if value == 0 {
        return [0, 0, 0];
    }
    let x = 1.0 - value as f32 / 256.0;
    [ramp(x, 3.0), ramp(x, 2.0), ramp(x, 1.0)]
}

/// One channel of the jet colormap: a triangular bump centered at
/// `offset / 4` along the gradient.
fn ramp(x: f32, offset: f32) -> u8 {
    let v = (1.5 - (4.0 * x - offset).abs()).clamp(0.0, 1.0);
    (v * 255.0).round() as u8
}

/// Flatten a chunk into an RGB buffer, `3 · W · W` bytes, rows colorized in
/// parallel.
pub fn colorize(chunk: &Chunk) -> Vec<u8> {
    chunk
        .as_bytes()
        .par_chunks(chunk.width())
        .flat_map_iter(|row| row.iter().flat_map(|&value| color_for_value(value)))
        .collect()
}
