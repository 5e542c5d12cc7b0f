//! Deduplicated, weighted point sets built from a 4x4 tile.

use glam::Vec3A;

use crate::color::srgb_to_linear;
use crate::flags::Params;
use crate::format::Format;
use crate::FitConfig;

/// The colors of one tile, deduplicated and weighted, ready for fitting.
///
/// At most 16 points. `remap` maps each of the 16 pixel slots to its point
/// index, or -1 for slots that do not participate in the fit.
pub(crate) struct PixelSet {
    points: [Vec3A; 16],
    weights: [f32; 16],
    count: usize,
    remap: [i8; 16],
    unweighted: bool,
    transparent: bool,
}

impl PixelSet {
    pub fn new(rgba: &[[f32; 4]; 16], mask: u16, params: &Params, config: &FitConfig) -> Self {
        let mut set = Self {
            points: [Vec3A::ZERO; 16],
            weights: [0.0; 16],
            count: 0,
            remap: [-1; 16],
            unweighted: true,
            transparent: false,
        };

        // BC1 has only a punch-through alpha; pixels below the threshold
        // become transparent and must not drag the color fit around
        let punch_through = params.format == Format::Bc1;
        let mut alpha_zeroed = 0_u16;

        for i in 0..16 {
            if mask & (1 << i) == 0 {
                continue;
            }
            let [r, g, b, a] = rgba[i];
            if punch_through && a < 0.5 {
                set.transparent = true;
                continue;
            }
            if config.ignore_alpha_zero && params.weight_by_alpha && a <= 0.0 {
                alpha_zeroed |= 1 << i;
                continue;
            }

            let mut p = Vec3A::new(r, g, b);
            if params.srgb {
                p = Vec3A::new(srgb_to_linear(p.x), srgb_to_linear(p.y), srgb_to_linear(p.z));
            }
            let w = if params.weight_by_alpha {
                set.unweighted = false;
                // a tiny floor keeps fully transparent pixels from
                // producing a zero-weight set
                a.max(1.0 / 255.0)
            } else {
                1.0
            };

            // exact match against an earlier point folds into its weight
            let mut found = false;
            for j in 0..i {
                let pj = set.remap[j];
                if pj >= 0 && set.points[pj as usize] == p {
                    set.weights[pj as usize] += w;
                    set.remap[i] = pj;
                    set.unweighted = false;
                    found = true;
                    break;
                }
            }
            if !found {
                set.points[set.count] = p;
                set.weights[set.count] = w;
                set.remap[i] = set.count as i8;
                set.count += 1;
            }
        }

        // if alpha weighting suppressed every pixel, fit their average so
        // the block still decodes to something sensible
        if set.count == 0 && alpha_zeroed != 0 {
            let mut sum = Vec3A::ZERO;
            let mut n = 0;
            for i in 0..16 {
                if alpha_zeroed & (1 << i) != 0 {
                    let [r, g, b, _] = rgba[i];
                    sum += Vec3A::new(r, g, b);
                    n += 1;
                    set.remap[i] = 0;
                }
            }
            set.points[0] = sum / n as f32;
            set.weights[0] = 1.0;
            set.count = 1;
            set.unweighted = true;
        }

        set
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn points(&self) -> &[Vec3A] {
        &self.points[..self.count]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights[..self.count]
    }

    /// Whether every point carries a weight of exactly 1.
    pub fn unweighted(&self) -> bool {
        self.unweighted
    }

    /// Whether any masked-in pixel fell below the punch-through threshold.
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    /// Expands per-point palette indices back to the 16 pixel slots.
    /// Slots outside the fit get `default`.
    pub fn remap_indices(&self, closest: &[u8], default: u8) -> [u8; 16] {
        debug_assert!(closest.len() >= self.count);
        let mut out = [default; 16];
        for i in 0..16 {
            let p = self.remap[i];
            if p >= 0 {
                out[i] = closest[p as usize];
            }
        }
        out
    }
}
