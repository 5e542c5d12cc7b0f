//! Range fit: endpoints from the extreme projections on the principal axis.

use glam::Vec3A;

use crate::lattice::GRID_565;
use crate::math::Sym3x3;
use crate::set::PixelSet;
use crate::FitConfig;

use super::{closest_indices, codebook, write_block, PaletteMode};

pub(crate) struct RangeFit<'a> {
    set: &'a PixelSet,
    metric: Vec3A,
    start: Vec3A,
    end: Vec3A,
}

impl<'a> RangeFit<'a> {
    pub fn new(set: &'a PixelSet, metric: Vec3A, config: &FitConfig) -> Self {
        let points = set.points();
        let weights = set.weights();
        debug_assert!(points.len() >= 2);

        let mut total = 0.0;
        let mut centroid = Vec3A::ZERO;
        for (p, w) in points.iter().zip(weights) {
            total += w;
            centroid += *p * *w;
        }
        centroid /= total;

        let cov = Sym3x3::covariance(points, weights);
        let axis = cov.dominant_axis(config.pca_method);

        let (min_t, max_t) = projection_range(points, centroid, axis);
        let mut start = GRID_565.snap3((centroid + axis * min_t).clamp(Vec3A::ZERO, Vec3A::ONE));
        let mut end = GRID_565.snap3((centroid + axis * max_t).clamp(Vec3A::ZERO, Vec3A::ONE));

        if config.project_on_principal_axis {
            // one refinement pass onto the line through the quantized
            // extremes, which usually tightens the interval
            let line = end - start;
            let len_sq = line.length_squared();
            if len_sq > f32::EPSILON {
                let (min_t, max_t) = projection_range(points, start, line);
                let min_t = (min_t / len_sq).clamp(0.0, 1.0);
                let max_t = (max_t / len_sq).clamp(0.0, 1.0);
                let s = start + line * min_t;
                let e = start + line * max_t;
                start = GRID_565.snap3(s);
                end = GRID_565.snap3(e);
            }
        }

        Self {
            set,
            metric,
            start,
            end,
        }
    }

    /// Writes the block if this fit beats `best`.
    pub fn compress(&self, mode: PaletteMode, best: &mut f32, out: &mut [u8; 8]) {
        let (book, entries) = codebook(mode, self.start, self.end);
        let mut closest = [0_u8; 16];
        let error = closest_indices(self.set, self.metric, &book[..entries], &mut closest);
        if error < *best {
            *best = error;
            let count = self.set.count();
            write_block(mode, self.set, self.start, self.end, &mut closest[..count], out);
        }
    }
}

fn projection_range(points: &[Vec3A], origin: Vec3A, axis: Vec3A) -> (f32, f32) {
    let mut min_t = f32::INFINITY;
    let mut max_t = f32::NEG_INFINITY;
    for p in points {
        let t = (*p - origin).dot(axis);
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }
    (min_t, max_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::set::PixelSet;

    fn fit_set(colors: &[[f32; 4]], flags: Flags) -> ([u8; 8], f32) {
        let rgba: [[f32; 4]; 16] = std::array::from_fn(|i| colors[i % colors.len()]);
        let params = flags.sanitize();
        let config = FitConfig::default();
        let set = PixelSet::new(&rgba, 0xffff, &params, &config);
        let metric = Vec3A::splat(1.0 / 3.0);
        let fit = RangeFit::new(&set, metric, &config);
        let mut best = f32::INFINITY;
        let mut out = [0; 8];
        fit.compress(PaletteMode::Four, &mut best, &mut out);
        (out, best)
    }

    #[test]
    fn two_lattice_points_are_exact() {
        // both colors already sit on the RGB565 lattice
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [1.0, 1.0, 1.0, 1.0];
        let (_, error) = fit_set(&[a, b], Flags::BC1);
        assert!(error < 1e-10, "error = {error}");
    }

    #[test]
    fn endpoints_span_the_range() {
        let a = [0.1, 0.2, 0.3, 1.0];
        let b = [0.7, 0.8, 0.9, 1.0];
        let (out, error) = fit_set(&[a, b], Flags::BC1);
        assert!(error < 0.01);
        // distinct endpoints must survive canonicalization
        let c0 = u16::from_le_bytes([out[0], out[1]]);
        let c1 = u16::from_le_bytes([out[2], out[3]]);
        assert!(c0 > c1);
    }
}
