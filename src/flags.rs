//! Compression flags and their sanitized internal form.
//!
//! Flags pack a format selector, a color metric selector, a fit selector with
//! an iteration count, and a handful of policy bits into one `u32`.
//! Unknown or conflicting combinations never fail; [`Flags::sanitize`]
//! resolves them to defaults.

use bitflags::bitflags;
use glam::Vec3A;

use crate::format::Format;

bitflags! {
    /// Options for [`compress`](crate::compress) and
    /// [`decompress`](crate::decompress).
    ///
    /// Combine with `|`. Exactly one format constant should be present; the
    /// metric and fit selectors are optional and default to
    /// [`Flags::METRIC_PERCEPTUAL`] and a single cluster-fit iteration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Encode or decode BC1 blocks.
        const BC1 = 1;
        /// Encode or decode BC2 blocks.
        const BC2 = 2;
        /// Encode or decode BC3 blocks.
        const BC3 = 3;
        /// Encode or decode BC4 blocks.
        const BC4 = 4;
        /// Encode or decode BC5 blocks.
        const BC5 = 5;

        /// Weight color channels by perceptual luminance (default).
        const METRIC_PERCEPTUAL = 1 << 4;
        /// Weight all color channels equally.
        const METRIC_UNIFORM = 2 << 4;
        /// Weight for unit-vector (normal map) content stored in RG.
        const METRIC_UNIT = 3 << 4;
        /// Weight for grayscale content.
        const METRIC_GRAY = 4 << 4;
        /// Use the caller-supplied weights from
        /// [`CompressOptions::custom_metric`](crate::CompressOptions).
        const METRIC_CUSTOM = 7 << 4;

        /// Weight each pixel's influence on the fit by its alpha value.
        const WEIGHT_BY_ALPHA = 1 << 10;

        /// Treat color input as sRGB-encoded; fitting happens in linear
        /// space and decompression re-encodes.
        const SRGB = 1 << 12;
        /// Treat BC4/BC5 input as signed values in `[-1, 1]`.
        const SIGNED = 1 << 13;

        /// Use the fast range fit instead of the iterative cluster fit.
        const RANGE_FIT = 1 << 14;

        /// Use the cluster fit with one iteration. For more iterations see
        /// [`Flags::cluster_iterations`].
        const CLUSTER_FIT = 1 << 16;

        const _ = !0;
    }
}

const FORMAT_MASK: u32 = 0xf;
const METRIC_MASK: u32 = 0x7 << 4;
const ITERATIONS_MASK: u32 = 0xf << 16;

impl Flags {
    /// Cluster fit with `count` iterations. The count is clamped to 1..=15.
    pub fn cluster_iterations(count: u32) -> Self {
        Self::from_bits_retain(count.clamp(1, 15) << 16)
    }

    /// The format selected by these flags, defaulting to BC1.
    pub fn format(self) -> Format {
        match self.bits() & FORMAT_MASK {
            2 => Format::Bc2,
            3 => Format::Bc3,
            4 => Format::Bc4,
            5 => Format::Bc5,
            _ => Format::Bc1,
        }
    }

    /// Resolves the raw bits into a fully defaulted parameter set.
    pub(crate) fn sanitize(self) -> Params {
        let metric = match (self.bits() & METRIC_MASK) >> 4 {
            2 => Metric::Uniform,
            3 => Metric::Unit,
            4 => Metric::Gray,
            7 => Metric::Custom,
            _ => Metric::Perceptual,
        };

        let quality = if self.contains(Flags::RANGE_FIT) {
            Quality::Range
        } else {
            let iterations = (self.bits() & ITERATIONS_MASK) >> 16;
            Quality::Cluster(iterations.clamp(1, 15) as u8)
        };

        Params {
            format: self.format(),
            metric,
            quality,
            weight_by_alpha: self.contains(Flags::WEIGHT_BY_ALPHA),
            srgb: self.contains(Flags::SRGB),
            signed: self.contains(Flags::SIGNED),
        }
    }
}

/// The color error metric, as channel weights applied before squaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Metric {
    Perceptual,
    Uniform,
    Unit,
    Gray,
    Custom,
}

impl Metric {
    pub fn weights(self, custom: [f32; 3]) -> Vec3A {
        match self {
            Metric::Perceptual => Vec3A::new(0.2126, 0.7152, 0.0722),
            Metric::Uniform | Metric::Gray => Vec3A::splat(1.0 / 3.0),
            Metric::Unit => Vec3A::new(0.5, 0.5, 0.0),
            Metric::Custom => {
                let w = Vec3A::from_array(custom).abs();
                let sum = w.element_sum();
                if sum > 0.0 {
                    w / sum
                } else {
                    Vec3A::splat(1.0 / 3.0)
                }
            }
        }
    }
}

/// How the color endpoints are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quality {
    Range,
    /// Cluster fit with 1..=15 iterations.
    Cluster(u8),
}

/// Flags resolved into an unambiguous configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Params {
    pub format: Format,
    pub metric: Metric,
    pub quality: Quality,
    pub weight_by_alpha: bool,
    pub srgb: bool,
    pub signed: bool,
}
