//! Quantization lattices.
//!
//! A lattice is the set of values an N-bit unorm channel can represent after
//! bit-replicated expansion to 8 bits. `snap` returns the nearest
//! representable value, which is never worse than truncating the low bits.
//!
//! All lattices are built once and shared read-only for the process lifetime.

use std::sync::LazyLock;

use glam::{Vec3A, Vec4};
use half::f16;

/// Constraint on the lowest code bit, used for shared-bit trials where one
/// stored bit feeds several channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowBit {
    /// Every code is representable.
    Any,
    /// The low bit is forced to 0.
    Clear,
    /// The low bit is forced to 1.
    Set,
}

/// A single-channel lattice for one bit depth.
pub struct Lattice {
    /// Reconstructed value of each code, as `expanded_u8 / 255`.
    values: [f32; 256],
    /// Nearest representable code for each 8-bit input.
    nearest: [u8; 256],
}

/// Bit-replicates an N-bit code into 8 bits, matching hardware expansion.
fn replicate(code: u32, bits: u32) -> u8 {
    debug_assert!(bits >= 1 && bits <= 8);
    debug_assert!(code < (1 << bits));
    let mut v = 0_u32;
    let mut shift = 8_i32 - bits as i32;
    while shift > -(bits as i32) {
        v |= if shift >= 0 {
            code << shift
        } else {
            code >> -shift
        };
        shift -= bits as i32;
    }
    v as u8
}

impl Lattice {
    fn build(bits: u32, low: LowBit) -> Self {
        let count = 1_u32 << bits;
        let mut values = [0.0; 256];
        for code in 0..count {
            values[code as usize] = replicate(code, bits) as f32 / 255.0;
        }

        let mut nearest = [0; 256];
        for (input, slot) in nearest.iter_mut().enumerate() {
            let mut best_code = 0;
            let mut best_dist = i32::MAX;
            for code in 0..count {
                let allowed = match low {
                    LowBit::Any => true,
                    LowBit::Clear => code & 1 == 0,
                    LowBit::Set => code & 1 == 1,
                };
                if !allowed {
                    continue;
                }
                let dist = (replicate(code, bits) as i32 - input as i32).abs();
                if dist < best_dist {
                    best_dist = dist;
                    best_code = code;
                }
            }
            *slot = best_code as u8;
        }

        Self { values, nearest }
    }

    /// Nearest representable code for a value in `[0, 1]`.
    #[inline]
    pub fn quantize(&self, x: f32) -> u8 {
        let i = (x.clamp(0.0, 1.0) * 255.0 + 0.5) as usize;
        self.nearest[i]
    }

    /// Reconstructed value of a code.
    #[inline]
    pub fn value(&self, code: u8) -> f32 {
        self.values[code as usize]
    }

    /// Nearest representable value for a value in `[0, 1]`.
    #[inline]
    pub fn snap(&self, x: f32) -> f32 {
        self.value(self.quantize(x))
    }
}

/// `LATTICES[bits - 1][variant]` for bit depths 1..=8. Variant order matches
/// [`LowBit`]: any, clear, set.
static LATTICES: LazyLock<Box<[[Lattice; 3]; 8]>> = LazyLock::new(|| {
    Box::new(std::array::from_fn(|i| {
        let bits = i as u32 + 1;
        [
            Lattice::build(bits, LowBit::Any),
            Lattice::build(bits, LowBit::Clear),
            Lattice::build(bits, LowBit::Set),
        ]
    }))
});

pub fn lattice(bits: u32, low: LowBit) -> &'static Lattice {
    debug_assert!(bits >= 1 && bits <= 8);
    let variant = match low {
        LowBit::Any => 0,
        LowBit::Clear => 1,
        LowBit::Set => 2,
    };
    &LATTICES[bits as usize - 1][variant]
}

/// A joint lattice over up to four channels with independent bit depths.
/// A zero bit depth marks an inactive channel, which passes through
/// unquantized.
#[derive(Clone, Copy)]
pub struct RgbaLattice {
    channels: [Option<u32>; 4],
}

impl RgbaLattice {
    pub const fn new(r: u32, g: u32, b: u32, a: u32) -> Self {
        const fn depth(bits: u32) -> Option<u32> {
            if bits == 0 {
                None
            } else {
                Some(bits)
            }
        }
        Self {
            channels: [depth(r), depth(g), depth(b), depth(a)],
        }
    }

    fn snap_channel(bits: Option<u32>, low: LowBit, x: f32) -> f32 {
        match bits {
            Some(bits) => lattice(bits, low).snap(x),
            None => x,
        }
    }

    pub fn snap(&self, v: Vec4) -> Vec4 {
        let c = self.channels;
        Vec4::new(
            Self::snap_channel(c[0], LowBit::Any, v.x),
            Self::snap_channel(c[1], LowBit::Any, v.y),
            Self::snap_channel(c[2], LowBit::Any, v.z),
            Self::snap_channel(c[3], LowBit::Any, v.w),
        )
    }

    /// Snaps the RGB part of a point, leaving the fourth lane untouched.
    pub fn snap3(&self, v: Vec3A) -> Vec3A {
        let c = self.channels;
        Vec3A::new(
            Self::snap_channel(c[0], LowBit::Any, v.x),
            Self::snap_channel(c[1], LowBit::Any, v.y),
            Self::snap_channel(c[2], LowBit::Any, v.z),
        )
    }

    pub fn quantize(&self, v: Vec4) -> [u8; 4] {
        let q = |bits: Option<u32>, x: f32| match bits {
            Some(bits) => lattice(bits, LowBit::Any).quantize(x),
            None => 0,
        };
        let c = self.channels;
        [
            q(c[0], v.x),
            q(c[1], v.y),
            q(c[2], v.z),
            q(c[3], v.w),
        ]
    }

    fn snap_forced(&self, v: Vec4, low: LowBit) -> Vec4 {
        let c = self.channels;
        Vec4::new(
            Self::snap_channel(c[0], low, v.x),
            Self::snap_channel(c[1], low, v.y),
            Self::snap_channel(c[2], low, v.z),
            Self::snap_channel(c[3], low, v.w),
        )
    }

    /// Snaps with a single shared low bit across all active channels. Both
    /// assignments of the shared bit are tried and the one with the lower
    /// squared reconstruction error wins. Returns the snapped point and the
    /// winning shared bit.
    pub fn snap_shared(&self, v: Vec4) -> (Vec4, u8) {
        let clear = self.snap_forced(v, LowBit::Clear);
        let set = self.snap_forced(v, LowBit::Set);
        if (clear - v).length_squared() <= (set - v).length_squared() {
            (clear, 0)
        } else {
            (set, 1)
        }
    }
}

/// The RGB565 lattice used by color endpoints.
pub(crate) const GRID_565: RgbaLattice = RgbaLattice::new(5, 6, 5, 0);

/// A lattice over the positive half-float number line.
///
/// The base value maps through the monotonic half-float bit pattern into a
/// 16-bit code space whose low `trunc` bits are zeroed. A second value is
/// stored as a signed `delta_bits`-wide offset from the base, clamped into
/// range and re-scaled by the truncation step.
pub struct HalfDeltaLattice {
    trunc: u32,
    delta_bits: u32,
}

impl HalfDeltaLattice {
    pub fn new(trunc: u32, delta_bits: u32) -> Self {
        debug_assert!(trunc < 16);
        debug_assert!(delta_bits >= 2 && delta_bits <= 16);
        Self { trunc, delta_bits }
    }

    /// The largest finite positive half-float bit pattern is 0x7BFF; codes
    /// are spread over [0, 0xFFFF] relative to the infinity pattern 0x7C00.
    fn raw_code(x: f32) -> u32 {
        let h = f16::from_f32(x.max(0.0)).to_bits() as u32;
        let h = h.min(0x7BFF);
        (h << 16) / 0x7C00
    }

    pub fn quantize(&self, x: f32) -> u16 {
        let step = 1_u32 << self.trunc;
        let mut p = Self::raw_code(x) & !(step - 1);
        if p == 0 && x > 0.0 {
            // avoid collapsing small non-zero values onto exact zero
            p = step >> 1;
        }
        if p == (0xFFFF & !(step - 1)) {
            p = 0xFFFF;
        }
        p as u16
    }

    /// Quantizes `x` as a clamped signed delta relative to `base`, returning
    /// the reconstructed absolute code.
    pub fn quantize_delta(&self, x: f32, base: u16) -> u16 {
        let step = 1_i32 << self.trunc;
        let max_delta = (1_i32 << (self.delta_bits - 1)) - 1;
        let raw = Self::raw_code(x) as i32 & !(step - 1);
        let delta = ((raw - base as i32) >> self.trunc).clamp(-max_delta, max_delta);
        (base as i32 + (delta << self.trunc)).clamp(0, 0xFFFF) as u16
    }

    pub fn value(&self, code: u16) -> f32 {
        let bits = ((code as u32 * 0x7C00) >> 16) as u16;
        f16::from_bits(bits).to_f32()
    }

    pub fn snap(&self, x: f32) -> f32 {
        self.value(self.quantize(x))
    }
}
