//! Whole-image compression: 4x4 tiling, edge masks, and block parallelism.
//!
//! Blocks are independent, so images split into rows of blocks that rayon
//! processes without any shared mutable state.

use rayon::prelude::*;

use crate::{compress_with, decompress, CompressOptions, Flags};

/// The number of bytes needed to hold `width x height` pixels compressed
/// under `flags`. Partial edge blocks round up to whole blocks.
pub fn storage_requirements(width: usize, height: usize, flags: Flags) -> usize {
    let blocks = width.div_ceil(4) * height.div_ceil(4);
    blocks * flags.format().block_size()
}

/// Compresses an RGBA f32 image. `rgba` is row-major, 4 floats per pixel.
///
/// # Panics
/// Panics if `rgba.len() != width * height * 4`.
pub fn compress_image(rgba: &[f32], width: usize, height: usize, flags: Flags) -> Vec<u8> {
    assert_eq!(rgba.len(), width * height * 4, "pixel buffer size mismatch");

    let block_size = flags.format().block_size();
    let blocks_x = width.div_ceil(4);
    let options = CompressOptions::default();
    let mut out = vec![0_u8; storage_requirements(width, height, flags)];
    if out.is_empty() {
        return out;
    }

    out.par_chunks_mut(blocks_x * block_size)
        .enumerate()
        .for_each(|(by, row)| {
            for bx in 0..blocks_x {
                let mut tile = [[0.0_f32; 4]; 16];
                let mut mask = 0_u16;
                for py in 0..4 {
                    for px in 0..4 {
                        let x = bx * 4 + px;
                        let y = by * 4 + py;
                        if x < width && y < height {
                            let src = (y * width + x) * 4;
                            tile[py * 4 + px] =
                                [rgba[src], rgba[src + 1], rgba[src + 2], rgba[src + 3]];
                            mask |= 1 << (py * 4 + px);
                        }
                    }
                }
                compress_with(
                    &tile,
                    mask,
                    flags,
                    &options,
                    &mut row[bx * block_size..][..block_size],
                );
            }
        });

    out
}

/// Decompresses an image back into row-major RGBA f32 pixels.
///
/// # Panics
/// Panics if `data` is shorter than
/// [`storage_requirements`]`(width, height, flags)`.
pub fn decompress_image(data: &[u8], width: usize, height: usize, flags: Flags) -> Vec<f32> {
    let needed = storage_requirements(width, height, flags);
    assert!(data.len() >= needed, "compressed buffer too short");

    let block_size = flags.format().block_size();
    let blocks_x = width.div_ceil(4);
    let mut out = vec![0.0_f32; width * height * 4];
    if out.is_empty() {
        return out;
    }

    out.par_chunks_mut(width * 4 * 4)
        .enumerate()
        .for_each(|(by, rows)| {
            let row_count = rows.len() / (width * 4);
            for bx in 0..blocks_x {
                let offset = (by * blocks_x + bx) * block_size;
                let tile = decompress(&data[offset..offset + block_size], flags);
                for py in 0..row_count {
                    for px in 0..4 {
                        let x = bx * 4 + px;
                        if x < width {
                            let dst = (py * width + x) * 4;
                            rows[dst..dst + 4].copy_from_slice(&tile[py * 4 + px]);
                        }
                    }
                }
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_rounds_partial_blocks_up() {
        assert_eq!(storage_requirements(4, 4, Flags::BC1), 8);
        assert_eq!(storage_requirements(5, 4, Flags::BC1), 16);
        assert_eq!(storage_requirements(1, 1, Flags::BC3), 16);
        assert_eq!(storage_requirements(16, 16, Flags::BC5), 16 * 16);
        assert_eq!(storage_requirements(0, 4, Flags::BC1), 0);
    }

    #[test]
    fn image_round_trip_is_stable() {
        let width = 10;
        let height = 6;
        let mut rgba = vec![0.0_f32; width * height * 4];
        for y in 0..height {
            for x in 0..width {
                let i = (y * width + x) * 4;
                rgba[i] = x as f32 / width as f32;
                rgba[i + 1] = y as f32 / height as f32;
                rgba[i + 2] = 0.5;
                rgba[i + 3] = 1.0;
            }
        }

        let flags = Flags::BC1;
        let compressed = compress_image(&rgba, width, height, flags);
        assert_eq!(compressed.len(), storage_requirements(width, height, flags));

        let decoded = decompress_image(&compressed, width, height, flags);
        assert_eq!(decoded.len(), rgba.len());
        // re-encoding the codec's own output reproduces it
        let again = compress_image(&decoded, width, height, flags);
        assert_eq!(compressed, again);
    }

    #[test]
    fn solid_image_decodes_solid() {
        let width = 8;
        let height = 8;
        let pixel = [128.0 / 255.0, 64.0 / 255.0, 200.0 / 255.0, 1.0];
        let rgba: Vec<f32> = pixel
            .iter()
            .copied()
            .cycle()
            .take(width * height * 4)
            .collect();
        let compressed = compress_image(&rgba, width, height, Flags::BC1);
        let decoded = decompress_image(&compressed, width, height, Flags::BC1);
        let expect = [132.0 / 255.0, 65.0 / 255.0, 198.0 / 255.0, 1.0];
        for px in decoded.chunks_exact(4) {
            for c in 0..4 {
                assert!((px[c] - expect[c]).abs() < 1e-6);
            }
        }
    }
}
