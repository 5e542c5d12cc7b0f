//! Fixed-ratio lossy block texture compression.
//!
//! This crate compresses 4x4 pixel tiles into the BC1 to BC5 family of
//! GPU-decodable blocks and decompresses them again. The encoder is built
//! around a weighted least-squares cluster fit over principal-axis orderings,
//! with a fast range fit as the low-quality path.
//!
//! ```
//! use blocktex::{compress, decompress, Flags};
//!
//! let tile: [[f32; 4]; 16] = std::array::from_fn(|i| {
//!     let t = i as f32 / 15.0;
//!     [t, 1.0 - t, 0.5, 1.0]
//! });
//!
//! let mut block = [0_u8; 8];
//! compress(&tile, 0xffff, Flags::BC1, &mut block);
//! let decoded = decompress(&block, Flags::BC1);
//! assert_eq!(decoded.len(), 16);
//! ```
//!
//! Blocks are fully independent and all shared state is immutable, so
//! compressing many blocks in parallel needs no synchronization.
//! [`compress_image`] and [`decompress_image`] do exactly that.

#![forbid(unsafe_code)]

mod alpha;
mod block;
mod color;
mod fit;
mod flags;
mod format;
mod image;
pub mod lattice;
pub mod math;
mod set;

pub use flags::Flags;
pub use format::Format;
pub use image::{compress_image, decompress_image, storage_requirements};
pub use math::PcaMethod;

use color::linear_to_srgb;
use set::PixelSet;

/// Policies of the fitting engine that are independent of the [`Flags`]
/// bitfield.
#[derive(Debug, Clone, Copy)]
pub struct FitConfig {
    /// How principal axes are extracted from the covariance matrix.
    pub pca_method: PcaMethod,
    /// With [`Flags::WEIGHT_BY_ALPHA`], drop fully transparent pixels from
    /// the color fit instead of letting their hidden colors skew it.
    pub ignore_alpha_zero: bool,
    /// Refine range-fit endpoints by re-projecting onto the line through
    /// the quantized extremes.
    pub project_on_principal_axis: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            pca_method: PcaMethod::PowerIteration,
            ignore_alpha_zero: true,
            project_on_principal_axis: true,
        }
    }
}

/// Options for [`compress_with`].
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    pub fit: FitConfig,
    /// Channel weights used with [`Flags::METRIC_CUSTOM`]. Normalized
    /// before use.
    pub custom_metric: [f32; 3],
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            custom_metric: [1.0 / 3.0; 3],
        }
    }
}

/// Compresses one 4x4 tile with default options.
///
/// `rgba` holds the tile in row-major order, all channels in `[0, 1]`
/// (or `[-1, 1]` for BC4/BC5 with [`Flags::SIGNED`]). `mask` enables each of
/// the 16 pixel slots; disabled slots never influence the output.
///
/// # Panics
/// Panics if `block` is shorter than the format's
/// [`block_size`](Format::block_size).
pub fn compress(rgba: &[[f32; 4]; 16], mask: u16, flags: Flags, block: &mut [u8]) {
    compress_with(rgba, mask, flags, &CompressOptions::default(), block);
}

/// Compresses one 4x4 tile. See [`compress`].
pub fn compress_with(
    rgba: &[[f32; 4]; 16],
    mask: u16,
    flags: Flags,
    options: &CompressOptions,
    block: &mut [u8],
) {
    let params = flags.sanitize();
    let size = params.format.block_size();
    assert!(block.len() >= size, "block buffer too short for {:?}", params.format);

    let mut first = [0_u8; 8];
    let mut second = [0_u8; 8];

    match params.format {
        Format::Bc1 => {
            let set = PixelSet::new(rgba, mask, &params, &options.fit);
            fit::compress_color(&set, &params, &options.fit, options.custom_metric, &mut first);
        }
        Format::Bc2 => {
            let alphas = channel_values(rgba, 3, false);
            alpha::compress_explicit(&alphas, mask, &mut first);
            let set = weighted_color_set(
                rgba,
                alpha::decompress_explicit(&first),
                mask,
                &params,
                &options.fit,
            );
            fit::compress_color(&set, &params, &options.fit, options.custom_metric, &mut second);
        }
        Format::Bc3 => {
            let alphas = channel_values(rgba, 3, false);
            alpha::compress_interpolated(&alphas, mask, &mut first);
            let set = weighted_color_set(
                rgba,
                alpha::decompress_interpolated(&first),
                mask,
                &params,
                &options.fit,
            );
            fit::compress_color(&set, &params, &options.fit, options.custom_metric, &mut second);
        }
        Format::Bc4 => {
            let values = channel_values(rgba, 0, params.signed);
            alpha::compress_interpolated(&values, mask, &mut first);
        }
        Format::Bc5 => {
            let r = channel_values(rgba, 0, params.signed);
            alpha::compress_interpolated(&r, mask, &mut first);
            let g = channel_values(rgba, 1, params.signed);
            alpha::compress_interpolated(&g, mask, &mut second);
        }
    }

    block[..8].copy_from_slice(&first);
    if size == 16 {
        block[8..16].copy_from_slice(&second);
    }
}

/// Compresses a tile given as 8-bit RGBA, 4 bytes per pixel.
pub fn compress_u8(rgba: &[u8; 64], mask: u16, flags: Flags, block: &mut [u8]) {
    let tile: [[f32; 4]; 16] = std::array::from_fn(|i| {
        [
            color::n8::f32(rgba[i * 4]),
            color::n8::f32(rgba[i * 4 + 1]),
            color::n8::f32(rgba[i * 4 + 2]),
            color::n8::f32(rgba[i * 4 + 3]),
        ]
    });
    compress(&tile, mask, flags, block);
}

/// Decompresses one block into 16 RGBA f32 pixels.
///
/// This is a pure function of the block bytes and the format selected by
/// `flags`; any well-formed byte pattern decodes.
///
/// # Panics
/// Panics if `block` is shorter than the format's
/// [`block_size`](Format::block_size).
pub fn decompress(block: &[u8], flags: Flags) -> [[f32; 4]; 16] {
    let params = flags.sanitize();
    let size = params.format.block_size();
    assert!(block.len() >= size, "block buffer too short for {:?}", params.format);

    let mut first = [0_u8; 8];
    first.copy_from_slice(&block[..8]);
    let mut second = [0_u8; 8];
    if size == 16 {
        second.copy_from_slice(&block[8..16]);
    }

    let mut out = match params.format {
        Format::Bc1 => block::decode_color(&first, true),
        Format::Bc2 => {
            let mut px = block::decode_color(&second, false);
            let alphas = alpha::decompress_explicit(&first);
            for (p, a) in px.iter_mut().zip(alphas) {
                p[3] = a;
            }
            px
        }
        Format::Bc3 => {
            let mut px = block::decode_color(&second, false);
            let alphas = alpha::decompress_interpolated(&first);
            for (p, a) in px.iter_mut().zip(alphas) {
                p[3] = a;
            }
            px
        }
        Format::Bc4 => {
            let values = alpha::decompress_interpolated(&first);
            std::array::from_fn(|i| [unmap_signed(values[i], params.signed), 0.0, 0.0, 1.0])
        }
        Format::Bc5 => {
            let r = alpha::decompress_interpolated(&first);
            let g = alpha::decompress_interpolated(&second);
            std::array::from_fn(|i| {
                [
                    unmap_signed(r[i], params.signed),
                    unmap_signed(g[i], params.signed),
                    0.0,
                    1.0,
                ]
            })
        }
    };

    if params.srgb && params.format.has_color() {
        for p in &mut out {
            p[0] = linear_to_srgb(p[0]);
            p[1] = linear_to_srgb(p[1]);
            p[2] = linear_to_srgb(p[2]);
        }
    }

    out
}

/// Decompresses one block into 8-bit RGBA pixels.
pub fn decompress_u8(block: &[u8], flags: Flags) -> [[u8; 4]; 16] {
    let px = decompress(block, flags);
    std::array::from_fn(|i| px[i].map(color::n8::from_f32))
}

/// Decompresses one block into 16-bit RGBA pixels.
pub fn decompress_u16(block: &[u8], flags: Flags) -> [[u16; 4]; 16] {
    let px = decompress(block, flags);
    std::array::from_fn(|i| px[i].map(|x| (x.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16))
}

/// Builds the color fit set for formats with a separate alpha block.
///
/// With [`Flags::WEIGHT_BY_ALPHA`] the weights come from the alpha the block
/// will decode to, not the raw input, so encoding the codec's own output
/// again sees the same weights and reproduces the same bytes.
fn weighted_color_set(
    rgba: &[[f32; 4]; 16],
    decoded_alpha: [f32; 16],
    mask: u16,
    params: &flags::Params,
    config: &FitConfig,
) -> PixelSet {
    if !params.weight_by_alpha {
        return PixelSet::new(rgba, mask, params, config);
    }
    let mut tile = *rgba;
    for (px, a) in tile.iter_mut().zip(decoded_alpha) {
        px[3] = a;
    }
    PixelSet::new(&tile, mask, params, config)
}

/// Extracts one channel, remapping signed input into the unorm fit domain.
fn channel_values(rgba: &[[f32; 4]; 16], channel: usize, signed: bool) -> [f32; 16] {
    std::array::from_fn(|i| {
        let v = rgba[i][channel];
        if signed {
            v.clamp(-1.0, 1.0) * 0.5 + 0.5
        } else {
            v
        }
    })
}

fn unmap_signed(v: f32, signed: bool) -> f32 {
    if signed {
        v * 2.0 - 1.0
    } else {
        v
    }
}
