//! Cluster fit: least-squares endpoint search over contiguous partitions of
//! the points ordered along an axis.
//!
//! Each iteration orders the points by their projection onto an axis
//! (initially the principal axis, then the axis through the previous winning
//! endpoints), sweeps every contiguous split into 3 or 4 clusters, solves the
//! cluster least-squares problem in closed form, snaps the endpoints through
//! the lattice, and scores the snapped pair by its exact weighted error under
//! the best index assignment. A candidate whose palette reproduces every
//! point scores exactly zero, so refitting a decoded block is a fixed point.
//! Orderings seen before are skipped, so iterations stop as soon as the axis
//! settles.

use glam::{Vec3A, Vec4};

use crate::lattice::GRID_565;
use crate::math::Sym3x3;
use crate::set::PixelSet;
use crate::FitConfig;

use super::{closest_indices, codebook, write_block, PaletteMode};

const MAX_ITERATIONS: usize = 15;

pub(crate) struct ClusterFit<'a> {
    set: &'a PixelSet,
    metric: Vec3A,
    iterations: u8,
    principal: Vec3A,
    /// Weighted points in ordered position: `(x*w, y*w, z*w, w)`.
    points_weights: [Vec4; 16],
    orderings: [[u8; 16]; MAX_ITERATIONS + 1],
    order_count: usize,
}

/// The best snapped endpoint pair found so far.
struct Candidate {
    start: Vec3A,
    end: Vec3A,
    error: f32,
}

impl<'a> ClusterFit<'a> {
    pub fn new(set: &'a PixelSet, metric: Vec3A, config: &FitConfig, iterations: u8) -> Self {
        debug_assert!(set.count() >= 2);
        let cov = Sym3x3::covariance(set.points(), set.weights());
        Self {
            set,
            metric,
            iterations: iterations.clamp(1, MAX_ITERATIONS as u8),
            principal: cov.dominant_axis(config.pca_method),
            points_weights: [Vec4::ZERO; 16],
            orderings: [[0; 16]; MAX_ITERATIONS + 1],
            order_count: 0,
        }
    }

    /// Sorts the points along `axis` and loads the ordered weighted points.
    /// Returns false when the resulting ordering was already tried.
    fn construct_ordering(&mut self, axis: Vec3A) -> bool {
        let count = self.set.count();
        let points = self.set.points();

        let mut dps = [0.0_f32; 16];
        let mut order = [0_u8; 16];
        for i in 0..count {
            dps[i] = points[i].dot(axis);
            order[i] = i as u8;
            let mut j = i;
            while j > 0 && dps[order[j - 1] as usize] > dps[order[j] as usize] {
                order.swap(j - 1, j);
                j -= 1;
            }
        }

        for prev in &self.orderings[..self.order_count] {
            if prev[..count] == order[..count] {
                return false;
            }
        }
        self.orderings[self.order_count] = order;
        self.order_count += 1;

        let weights = self.set.weights();
        for (slot, &p) in self.points_weights[..count].iter_mut().zip(&order[..count]) {
            let point = points[p as usize];
            *slot = if self.set.unweighted() {
                Vec4::new(point.x, point.y, point.z, 1.0)
            } else {
                let w = weights[p as usize];
                Vec4::new(point.x * w, point.y * w, point.z * w, w)
            };
        }
        true
    }

    /// Runs the iterative search and writes the block if the winner beats
    /// `best`.
    pub fn compress(&mut self, mode: PaletteMode, best: &mut f32, out: &mut [u8; 8]) {
        let mut winner = Candidate {
            start: Vec3A::ZERO,
            end: Vec3A::ZERO,
            error: f32::INFINITY,
        };

        let mut axis = self.principal;
        self.construct_ordering(axis);
        for iteration in 0.. {
            let improved = match mode {
                PaletteMode::Three => self.sweep_3(&mut winner),
                PaletteMode::Four => self.sweep_4(&mut winner),
            };
            if !improved || iteration + 1 == self.iterations as usize {
                break;
            }
            axis = winner.end - winner.start;
            if axis.length_squared() <= f32::EPSILON || !self.construct_ordering(axis) {
                break;
            }
        }

        if winner.error < *best {
            *best = winner.error;
            let (book, entries) = codebook(mode, winner.start, winner.end);
            let mut closest = [0_u8; 16];
            closest_indices(self.set, self.metric, &book[..entries], &mut closest);
            let count = self.set.count();
            write_block(
                mode,
                self.set,
                winner.start,
                winner.end,
                &mut closest[..count],
                out,
            );
        }
    }

    /// Exact weighted error of a snapped endpoint pair under the best index
    /// assignment. Independent of the partition that produced the pair.
    fn endpoint_error(&self, mode: PaletteMode, start: Vec3A, end: Vec3A) -> f32 {
        let (book, entries) = codebook(mode, start, end);
        let mut scratch = [0_u8; 16];
        closest_indices(self.set, self.metric, &book[..entries], &mut scratch)
    }

    fn sweep_3(&mut self, winner: &mut Candidate) -> bool {
        let count = self.set.count();
        let prefix = self.prefix_sums();
        let total = prefix[count];

        let mut improved = false;
        for i in 0..=count {
            for j in i..=count {
                let part0 = prefix[i];
                let part1 = prefix[j] - prefix[i];
                let part2 = total - prefix[j];

                let alphax = vec3(part0) + vec3(part1) * 0.5;
                let alpha2 = part0.w + part1.w * 0.25;
                let betax = vec3(part2) + vec3(part1) * 0.5;
                let beta2 = part2.w + part1.w * 0.25;
                let alphabeta = part1.w * 0.25;

                if let Some((start, end)) = self.solve(alphax, alpha2, betax, beta2, alphabeta) {
                    let error = self.endpoint_error(PaletteMode::Three, start, end);
                    if error < winner.error {
                        *winner = Candidate { start, end, error };
                        improved = true;
                    }
                }
            }
        }
        improved
    }

    fn sweep_4(&mut self, winner: &mut Candidate) -> bool {
        let count = self.set.count();
        let prefix = self.prefix_sums();
        let total = prefix[count];

        const THIRD: f32 = 1.0 / 3.0;
        const TWO_THIRDS: f32 = 2.0 / 3.0;
        const NINTH: f32 = 1.0 / 9.0;
        const FOUR_NINTHS: f32 = 4.0 / 9.0;
        const TWO_NINTHS: f32 = 2.0 / 9.0;

        let mut improved = false;
        for i in 0..=count {
            for j in i..=count {
                for k in j..=count {
                    let part0 = prefix[i];
                    let part1 = prefix[j] - prefix[i];
                    let part2 = prefix[k] - prefix[j];
                    let part3 = total - prefix[k];

                    let alphax =
                        vec3(part0) + vec3(part1) * TWO_THIRDS + vec3(part2) * THIRD;
                    let alpha2 = part0.w + part1.w * FOUR_NINTHS + part2.w * NINTH;
                    let betax =
                        vec3(part3) + vec3(part2) * TWO_THIRDS + vec3(part1) * THIRD;
                    let beta2 = part3.w + part2.w * FOUR_NINTHS + part1.w * NINTH;
                    let alphabeta = (part1.w + part2.w) * TWO_NINTHS;

                    if let Some((start, end)) =
                        self.solve(alphax, alpha2, betax, beta2, alphabeta)
                    {
                        let error = self.endpoint_error(PaletteMode::Four, start, end);
                        if error < winner.error {
                            *winner = Candidate { start, end, error };
                            improved = true;
                        }
                    }
                }
            }
        }
        improved
    }

    fn prefix_sums(&self) -> [Vec4; 17] {
        let count = self.set.count();
        let mut prefix = [Vec4::ZERO; 17];
        for i in 0..count {
            prefix[i + 1] = prefix[i] + self.points_weights[i];
        }
        prefix
    }

    /// Solves the cluster least-squares problem and snaps the endpoints.
    fn solve(
        &self,
        alphax: Vec3A,
        alpha2: f32,
        betax: Vec3A,
        beta2: f32,
        alphabeta: f32,
    ) -> Option<(Vec3A, Vec3A)> {
        let denom = alpha2 * beta2 - alphabeta * alphabeta;
        if denom.abs() < 1e-10 {
            return None;
        }
        let factor = 1.0 / denom;
        let a = (alphax * beta2 - betax * alphabeta) * factor;
        let b = (betax * alpha2 - alphax * alphabeta) * factor;

        let a = GRID_565.snap3(a.clamp(Vec3A::ZERO, Vec3A::ONE));
        let b = GRID_565.snap3(b.clamp(Vec3A::ZERO, Vec3A::ONE));
        Some((a, b))
    }
}

#[inline]
fn vec3(v: Vec4) -> Vec3A {
    Vec3A::new(v.x, v.y, v.z)
}
