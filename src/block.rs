//! The 8-byte color block: two RGB565 endpoints and 16 2-bit indices.
//!
//! Writers canonicalize so every (endpoints, indices) combination has exactly
//! one byte encoding:
//!
//! - 4-entry mode stores `a >= b`. If the fitted order disagrees, endpoints
//!   swap and index bit 0 flips. Equal endpoints force all indices to 0.
//! - 3-entry mode stores `a <= b`, swapping only the two endpoint indices.

use glam::Vec3A;

use crate::color::{n5, n6};
use crate::lattice::GRID_565;

pub(crate) fn pack565(c: Vec3A) -> u16 {
    let [r, g, b, _] = GRID_565.quantize(c.extend(0.0));
    ((r as u16) << 11) | ((g as u16) << 5) | b as u16
}

fn unpack565(v: u16) -> Vec3A {
    Vec3A::new(
        n5::f32((v >> 11) as u8 & 0x1f),
        n6::f32((v >> 5) as u8 & 0x3f),
        n5::f32(v as u8 & 0x1f),
    )
}

fn write(a: u16, b: u16, indices: &[u8; 16], out: &mut [u8; 8]) {
    out[0..2].copy_from_slice(&a.to_le_bytes());
    out[2..4].copy_from_slice(&b.to_le_bytes());
    let mut packed = 0_u32;
    for (i, &idx) in indices.iter().enumerate() {
        debug_assert!(idx < 4);
        packed |= (idx as u32) << (i * 2);
    }
    out[4..8].copy_from_slice(&packed.to_le_bytes());
}

/// Writes a 4-entry block in canonical form.
pub(crate) fn write_color_4(start: Vec3A, end: Vec3A, indices: &[u8; 16], out: &mut [u8; 8]) {
    let mut a = pack565(start);
    let mut b = pack565(end);
    let mut indices = *indices;
    if a < b {
        std::mem::swap(&mut a, &mut b);
        for idx in &mut indices {
            *idx ^= 1;
        }
    } else if a == b {
        indices = [0; 16];
    }
    write(a, b, &indices, out);
}

/// Writes a 3-entry block in canonical form.
pub(crate) fn write_color_3(start: Vec3A, end: Vec3A, indices: &[u8; 16], out: &mut [u8; 8]) {
    let mut a = pack565(start);
    let mut b = pack565(end);
    let mut indices = *indices;
    if a > b {
        std::mem::swap(&mut a, &mut b);
        for idx in &mut indices {
            if *idx < 2 {
                *idx ^= 1;
            }
        }
    }
    write(a, b, &indices, out);
}

/// The palette the decoder will reconstruct for a 4-entry block.
pub(crate) fn codebook_4(start: Vec3A, end: Vec3A) -> [Vec3A; 4] {
    const THIRD: f32 = 1.0 / 3.0;
    [
        start,
        end,
        start * (2.0 * THIRD) + end * THIRD,
        start * THIRD + end * (2.0 * THIRD),
    ]
}

/// The palette the decoder will reconstruct for a 3-entry block. The fourth
/// entry is the punch-through slot and takes no part in fitting.
pub(crate) fn codebook_3(start: Vec3A, end: Vec3A) -> [Vec3A; 3] {
    [start, end, (start + end) * 0.5]
}

/// Decodes a color block into 16 RGBA values.
///
/// `punch_through` enables the 3-entry interpretation of `a <= b` blocks
/// (BC1). BC2/BC3 color blocks always decode with 4 entries.
pub(crate) fn decode_color(bytes: &[u8; 8], punch_through: bool) -> [[f32; 4]; 16] {
    let a = u16::from_le_bytes([bytes[0], bytes[1]]);
    let b = u16::from_le_bytes([bytes[2], bytes[3]]);
    let c0 = unpack565(a);
    let c1 = unpack565(b);

    let mut palette = [[0.0; 4]; 4];
    palette[0] = [c0.x, c0.y, c0.z, 1.0];
    palette[1] = [c1.x, c1.y, c1.z, 1.0];
    if !punch_through || a > b {
        let [p2, p3] = {
            let four = codebook_4(c0, c1);
            [four[2], four[3]]
        };
        palette[2] = [p2.x, p2.y, p2.z, 1.0];
        palette[3] = [p3.x, p3.y, p3.z, 1.0];
    } else {
        let mid = (c0 + c1) * 0.5;
        palette[2] = [mid.x, mid.y, mid.z, 1.0];
        palette[3] = [0.0, 0.0, 0.0, 0.0];
    }

    let packed = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    std::array::from_fn(|i| palette[(packed >> (i * 2)) as usize & 3])
}
