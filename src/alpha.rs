//! Scalar-channel blocks: explicit 4-bit alpha (BC2) and interpolated
//! 8-value alpha (BC3, and the BC4/BC5 channel blocks).

use crate::lattice::{lattice, LowBit};

/// Encodes 16 values as explicit 4-bit codes, two per byte, low nibble first.
pub(crate) fn compress_explicit(values: &[f32; 16], mask: u16, out: &mut [u8; 8]) {
    let lat = lattice(4, LowBit::Any);
    for (i, slot) in out.iter_mut().enumerate() {
        let quantize = |p: usize| {
            if mask & (1 << p) != 0 {
                lat.quantize(values[p])
            } else {
                0
            }
        };
        *slot = quantize(2 * i) | (quantize(2 * i + 1) << 4);
    }
}

pub(crate) fn decompress_explicit(bytes: &[u8; 8]) -> [f32; 16] {
    let lat = lattice(4, LowBit::Any);
    std::array::from_fn(|i| {
        let byte = bytes[i / 2];
        let code = if i % 2 == 0 { byte & 0xf } else { byte >> 4 };
        lat.value(code)
    })
}

/// The 8-value codebook for `c0 > c1`: both endpoints plus six interpolants.
fn codebook_7(c0: f32, c1: f32) -> [f32; 8] {
    std::array::from_fn(|i| match i {
        0 => c0,
        1 => c1,
        i => {
            let k = (i - 1) as f32;
            (c0 * (7.0 - k) + c1 * k) * (1.0 / 7.0)
        }
    })
}

/// The 8-value codebook for `c0 <= c1`: endpoints, four interpolants, and
/// explicit 0 and 1.
fn codebook_5(c0: f32, c1: f32) -> [f32; 8] {
    std::array::from_fn(|i| match i {
        0 => c0,
        1 => c1,
        6 => 0.0,
        7 => 1.0,
        i => {
            let k = (i - 1) as f32;
            (c0 * (5.0 - k) + c1 * k) * (1.0 / 5.0)
        }
    })
}

/// Assigns each masked-in value its nearest code and accumulates squared
/// error. Masked-out slots get index 0.
fn fit_codebook(values: &[f32; 16], mask: u16, codes: &[f32; 8]) -> ([u8; 16], f32) {
    let mut indices = [0_u8; 16];
    let mut error = 0.0;
    for i in 0..16 {
        if mask & (1 << i) == 0 {
            continue;
        }
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (j, &code) in codes.iter().enumerate() {
            let dist = (values[i] - code) * (values[i] - code);
            if dist < best_dist {
                best_dist = dist;
                best = j;
            }
        }
        indices[i] = best as u8;
        error += best_dist;
    }
    (indices, error)
}

fn pack_indices(c0: u8, c1: u8, indices: &[u8; 16], out: &mut [u8; 8]) {
    out[0] = c0;
    out[1] = c1;
    let mut packed = 0_u64;
    for (i, &idx) in indices.iter().enumerate() {
        debug_assert!(idx < 8);
        packed |= (idx as u64) << (i * 3);
    }
    out[2..8].copy_from_slice(&packed.to_le_bytes()[..6]);
}

/// Encodes 16 values as an interpolated 8-byte block, trying both codebook
/// modes and keeping the better one.
pub(crate) fn compress_interpolated(values: &[f32; 16], mask: u16, out: &mut [u8; 8]) {
    let lat = lattice(8, LowBit::Any);

    // extremes are tracked as quantized codes; the 5-value mode excludes
    // codes 0 and 255 from its endpoints, since their values are covered by
    // the explicit 0/1 entries and must never collide with them
    let mut min7 = 255_u8;
    let mut max7 = 0_u8;
    let mut min5 = 255_u8;
    let mut max5 = 0_u8;
    let mut any = false;
    let mut any5 = false;
    for i in 0..16 {
        if mask & (1 << i) == 0 {
            continue;
        }
        any = true;
        let code = lat.quantize(values[i]);
        min7 = min7.min(code);
        max7 = max7.max(code);
        if code != 0 && code != 255 {
            any5 = true;
            min5 = min5.min(code);
            max5 = max5.max(code);
        }
    }
    if !any {
        *out = [0; 8];
        return;
    }
    if !any5 {
        min5 = 0;
        max5 = 0;
    }

    let five = codebook_5(lat.value(min5), lat.value(max5));
    let (idx5, err5) = fit_codebook(values, mask, &five);

    // equal endpoints cannot be stored in 7-mode, its decode rule needs
    // c0 > c1
    if max7 > min7 {
        let seven = codebook_7(lat.value(max7), lat.value(min7));
        let (idx7, err7) = fit_codebook(values, mask, &seven);
        if err7 < err5 {
            pack_indices(max7, min7, &idx7, out);
            return;
        }
    }
    pack_indices(min5, max5, &idx5, out);
}

pub(crate) fn decompress_interpolated(bytes: &[u8; 8]) -> [f32; 16] {
    let lat = lattice(8, LowBit::Any);
    let c0 = lat.value(bytes[0]);
    let c1 = lat.value(bytes[1]);
    let codes = if bytes[0] > bytes[1] {
        codebook_7(c0, c1)
    } else {
        codebook_5(c0, c1)
    };

    let mut packed = 0_u64;
    for (i, &b) in bytes[2..8].iter().enumerate() {
        packed |= (b as u64) << (i * 8);
    }
    std::array::from_fn(|i| codes[(packed >> (i * 3)) as usize & 7])
}
