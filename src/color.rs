//! Helpers for converting between quantized unorm values and `f32`.
//!
//! Each `nX` module converts **from UnormX** values to other formats.

/// Functions for converting **FROM Unorm5** values to other formats.
pub(crate) mod n5 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 31);
        (x << 3) | (x >> 2)
    }
    // division, not multiplication by a reciprocal: the result must be
    // bitwise identical to the lattice reconstruction values
    #[inline(always)]
    pub fn f32(x: u8) -> f32 {
        n8(x) as f32 / 255.0
    }
}

/// Functions for converting **FROM Unorm6** values to other formats.
pub(crate) mod n6 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 63);
        (x << 2) | (x >> 4)
    }
    #[inline(always)]
    pub fn f32(x: u8) -> f32 {
        n8(x) as f32 / 255.0
    }
}

/// Functions for converting **FROM Unorm8** values to other formats.
pub(crate) mod n8 {
    #[inline(always)]
    pub fn f32(x: u8) -> f32 {
        x as f32 / 255.0
    }

    pub fn from_f32(x: f32) -> u8 {
        (x.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    }
}

/// The sRGB transfer function, mapping linear values to encoded values.
pub(crate) fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.0031308 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// The inverse sRGB transfer function, mapping encoded values to linear values.
pub(crate) fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.04045 {
        x * (1.0 / 12.92)
    } else {
        ((x + 0.055) * (1.0 / 1.055)).powf(2.4)
    }
}
