//! Endpoint search strategies for the color block.

use glam::Vec3A;

use crate::block::{write_color_3, write_color_4};
use crate::flags::{Params, Quality};
use crate::format::Format;
use crate::lattice::GRID_565;
use crate::set::PixelSet;

mod cluster;
mod range;

pub(crate) use cluster::ClusterFit;
pub(crate) use range::RangeFit;

use crate::FitConfig;

/// Which color codebook the block will decode with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaletteMode {
    /// Endpoints, one interpolant, and the punch-through slot.
    Three,
    /// Endpoints and two interpolants.
    Four,
}

/// An all-transparent 3-entry block: equal endpoints, every index on the
/// punch-through slot.
const TRANSPARENT_BLOCK: [u8; 8] = [0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];

/// Fits and writes the color half of a block.
pub(crate) fn compress_color(
    set: &PixelSet,
    params: &Params,
    config: &FitConfig,
    custom_metric: [f32; 3],
    out: &mut [u8; 8],
) {
    let mode = if params.format == Format::Bc1 && set.transparent() {
        PaletteMode::Three
    } else {
        PaletteMode::Four
    };

    match set.count() {
        0 => {
            *out = match mode {
                PaletteMode::Three => TRANSPARENT_BLOCK,
                PaletteMode::Four => [0; 8],
            };
        }
        1 => {
            let snapped = GRID_565.snap3(set.points()[0]);
            let indices = set.remap_indices(&[0], 3);
            match mode {
                PaletteMode::Three => write_color_3(snapped, snapped, &indices, out),
                PaletteMode::Four => write_color_4(snapped, snapped, &indices, out),
            }
        }
        _ => {
            let metric = params.metric.weights(custom_metric);
            let mut best = f32::INFINITY;
            RangeFit::new(set, metric, config).compress(mode, &mut best, out);
            if let Quality::Cluster(iterations) = params.quality {
                ClusterFit::new(set, metric, config, iterations).compress(mode, &mut best, out);
            }
        }
    }
}

/// The decoder's palette for the given mode, minus the punch-through slot.
fn codebook(mode: PaletteMode, start: Vec3A, end: Vec3A) -> ([Vec3A; 4], usize) {
    match mode {
        PaletteMode::Three => {
            let book = crate::block::codebook_3(start, end);
            ([book[0], book[1], book[2], Vec3A::ZERO], 3)
        }
        PaletteMode::Four => (crate::block::codebook_4(start, end), 4),
    }
}

/// Nearest palette entry for every point under the metric.
fn closest_indices(
    set: &PixelSet,
    metric: Vec3A,
    book: &[Vec3A],
    out: &mut [u8; 16],
) -> f32 {
    let mut error = 0.0;
    for (i, (p, w)) in set.points().iter().zip(set.weights()).enumerate() {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (j, code) in book.iter().enumerate() {
            let d = metric * (*p - *code);
            let dist = d.length_squared();
            if dist < best_dist {
                best_dist = dist;
                best = j;
            }
        }
        out[i] = best as u8;
        error += w * best_dist;
    }
    error
}

/// Orders the endpoints canonically before expanding per-point indices to
/// pixel slots, so masked-out slots always store the same default bits no
/// matter which orientation the fit happened to find.
fn write_block(
    mode: PaletteMode,
    set: &PixelSet,
    mut start: Vec3A,
    mut end: Vec3A,
    closest: &mut [u8],
    out: &mut [u8; 8],
) {
    let a = crate::block::pack565(start);
    let b = crate::block::pack565(end);
    let swap = match mode {
        PaletteMode::Three => a > b,
        PaletteMode::Four => a < b,
    };
    if swap {
        std::mem::swap(&mut start, &mut end);
        for idx in closest.iter_mut() {
            if mode == PaletteMode::Four || *idx < 2 {
                *idx ^= 1;
            }
        }
    }
    let indices = set.remap_indices(closest, 3);
    match mode {
        PaletteMode::Three => write_color_3(start, end, &indices, out),
        PaletteMode::Four => write_color_4(start, end, &indices, out),
    }
}
