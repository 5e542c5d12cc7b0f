//! Compact symmetric matrices and principal-component extraction.
//!
//! Covariance matrices of weighted point clouds are symmetric, so only the
//! upper triangle is stored: 3 entries for 2x2, 6 for 3x3, 10 for 4x4.

use glam::{Vec2, Vec3A, Vec4};

/// How the dominant eigenvector of a covariance matrix is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcaMethod {
    /// Fixed-count power iteration. Fast and accurate enough for fitting.
    #[default]
    PowerIteration,
    /// Analytic (2x2, 3x3) or Jacobi (4x4) eigensolve.
    ExactEigensolve,
}

const POWER_ITERATIONS: usize = 8;

/// Symmetric 2x2 matrix. Entries are `[m00, m01, m11]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sym2x2(pub [f32; 3]);

/// Symmetric 3x3 matrix. Entries are `[m00, m01, m02, m11, m12, m22]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sym3x3(pub [f32; 6]);

/// Symmetric 4x4 matrix. Entries are the upper triangle in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sym4x4(pub [f32; 10]);

impl Sym2x2 {
    /// Weighted covariance of `points` around their weighted centroid.
    pub fn covariance(points: &[Vec2], weights: &[f32]) -> Self {
        debug_assert_eq!(points.len(), weights.len());

        let mut total = 0.0;
        let mut centroid = Vec2::ZERO;
        for (p, w) in points.iter().zip(weights) {
            total += w;
            centroid += *p * *w;
        }
        if total > 0.0 {
            centroid /= total;
        }

        let mut m = [0.0; 3];
        for (p, w) in points.iter().zip(weights) {
            let d = (*p - centroid) * *w;
            m[0] += d.x * (p.x - centroid.x);
            m[1] += d.x * (p.y - centroid.y);
            m[2] += d.y * (p.y - centroid.y);
        }
        Self(m)
    }

    fn mul(&self, v: Vec2) -> Vec2 {
        let m = &self.0;
        Vec2::new(m[0] * v.x + m[1] * v.y, m[1] * v.x + m[2] * v.y)
    }

    pub fn dominant_axis(&self, method: PcaMethod) -> Vec2 {
        match method {
            PcaMethod::PowerIteration => {
                let mut v = Vec2::ONE;
                for _ in 0..POWER_ITERATIONS {
                    v = self.mul(v).normalize_or(v);
                }
                v.normalize_or(Vec2::X)
            }
            PcaMethod::ExactEigensolve => {
                let [a, b, c] = self.0;
                if b.abs() < 1e-12 {
                    return if a >= c { Vec2::X } else { Vec2::Y };
                }
                // largest root of l^2 - (a+c) l + (ac - b^2)
                let half_tr = 0.5 * (a + c);
                let det = a * c - b * b;
                let l = half_tr + (half_tr * half_tr - det).max(0.0).sqrt();
                Vec2::new(b, l - a).normalize_or(Vec2::X)
            }
        }
    }
}

impl Sym3x3 {
    /// Weighted covariance of `points` around their weighted centroid.
    pub fn covariance(points: &[Vec3A], weights: &[f32]) -> Self {
        debug_assert_eq!(points.len(), weights.len());

        let mut total = 0.0;
        let mut centroid = Vec3A::ZERO;
        for (p, w) in points.iter().zip(weights) {
            total += w;
            centroid += *p * *w;
        }
        if total > 0.0 {
            centroid /= total;
        }

        let mut m = [0.0; 6];
        for (p, w) in points.iter().zip(weights) {
            let d = *p - centroid;
            let wd = d * *w;
            m[0] += wd.x * d.x;
            m[1] += wd.x * d.y;
            m[2] += wd.x * d.z;
            m[3] += wd.y * d.y;
            m[4] += wd.y * d.z;
            m[5] += wd.z * d.z;
        }
        Self(m)
    }

    fn mul(&self, v: Vec3A) -> Vec3A {
        let m = &self.0;
        Vec3A::new(
            m[0] * v.x + m[1] * v.y + m[2] * v.z,
            m[1] * v.x + m[3] * v.y + m[4] * v.z,
            m[2] * v.x + m[4] * v.y + m[5] * v.z,
        )
    }

    /// Dominant eigenvector. Returns a unit vector; a zero (or near-zero)
    /// matrix yields a canonical axis instead of NaN.
    pub fn dominant_axis(&self, method: PcaMethod) -> Vec3A {
        match method {
            PcaMethod::PowerIteration => {
                let mut v = Vec3A::ONE;
                for _ in 0..POWER_ITERATIONS {
                    v = self.mul(v).normalize_or(v);
                }
                v.normalize_or(Vec3A::X)
            }
            PcaMethod::ExactEigensolve => self.exact_axis(),
        }
    }

    fn exact_axis(&self) -> Vec3A {
        let [a, b, c, d, e, f] = self.0;

        let off = b * b + c * c + e * e;
        if off < 1e-12 {
            // already diagonal
            return if a >= d && a >= f {
                Vec3A::X
            } else if d >= f {
                Vec3A::Y
            } else {
                Vec3A::Z
            };
        }

        // largest eigenvalue via the trigonometric form of the cubic
        let q = (a + d + f) / 3.0;
        let p2 = (a - q) * (a - q) + (d - q) * (d - q) + (f - q) * (f - q) + 2.0 * off;
        let p = (p2 / 6.0).sqrt();
        let inv_p = 1.0 / p;
        let ba = (a - q) * inv_p;
        let bd = (d - q) * inv_p;
        let bf = (f - q) * inv_p;
        let bb = b * inv_p;
        let bc = c * inv_p;
        let be = e * inv_p;
        let half_det = 0.5
            * (ba * (bd * bf - be * be) - bb * (bb * bf - be * bc) + bc * (bb * be - bd * bc));
        let phi = half_det.clamp(-1.0, 1.0).acos() / 3.0;
        let lambda = q + 2.0 * p * phi.cos();

        // the eigenvector spans the null space of (M - lambda I); the cross
        // product of its two most independent rows recovers it
        let r0 = Vec3A::new(a - lambda, b, c);
        let r1 = Vec3A::new(b, d - lambda, e);
        let r2 = Vec3A::new(c, e, f - lambda);
        let c01 = r0.cross(r1);
        let c02 = r0.cross(r2);
        let c12 = r1.cross(r2);
        let mut best = c01;
        if c02.length_squared() > best.length_squared() {
            best = c02;
        }
        if c12.length_squared() > best.length_squared() {
            best = c12;
        }
        best.normalize_or(Vec3A::X)
    }
}

impl Sym4x4 {
    /// Weighted covariance of `points` around their weighted centroid.
    pub fn covariance(points: &[Vec4], weights: &[f32]) -> Self {
        debug_assert_eq!(points.len(), weights.len());

        let mut total = 0.0;
        let mut centroid = Vec4::ZERO;
        for (p, w) in points.iter().zip(weights) {
            total += w;
            centroid += *p * *w;
        }
        if total > 0.0 {
            centroid /= total;
        }

        let mut m = [0.0; 10];
        for (p, w) in points.iter().zip(weights) {
            let d = *p - centroid;
            let wd = d * *w;
            m[0] += wd.x * d.x;
            m[1] += wd.x * d.y;
            m[2] += wd.x * d.z;
            m[3] += wd.x * d.w;
            m[4] += wd.y * d.y;
            m[5] += wd.y * d.z;
            m[6] += wd.y * d.w;
            m[7] += wd.z * d.z;
            m[8] += wd.z * d.w;
            m[9] += wd.w * d.w;
        }
        Self(m)
    }

    fn full(&self) -> [[f32; 4]; 4] {
        let m = &self.0;
        [
            [m[0], m[1], m[2], m[3]],
            [m[1], m[4], m[5], m[6]],
            [m[2], m[5], m[7], m[8]],
            [m[3], m[6], m[8], m[9]],
        ]
    }

    fn mul(&self, v: Vec4) -> Vec4 {
        let m = self.full();
        Vec4::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3] * v.w,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3] * v.w,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3] * v.w,
            m[3][0] * v.x + m[3][1] * v.y + m[3][2] * v.z + m[3][3] * v.w,
        )
    }

    pub fn dominant_axis(&self, method: PcaMethod) -> Vec4 {
        match method {
            PcaMethod::PowerIteration => {
                let mut v = Vec4::ONE;
                for _ in 0..POWER_ITERATIONS {
                    v = self.mul(v).normalize_or(v);
                }
                v.normalize_or(Vec4::X)
            }
            PcaMethod::ExactEigensolve => self.jacobi_axis(),
        }
    }

    /// Cyclic Jacobi sweeps. 4x4 has no practical closed form, so the exact
    /// path diagonalizes instead.
    fn jacobi_axis(&self) -> Vec4 {
        let mut m = self.full();
        let mut v = [
            [1.0_f32, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        for _ in 0..16 {
            let mut off = 0.0_f32;
            for p in 0..4 {
                for q in (p + 1)..4 {
                    off += m[p][q] * m[p][q];
                }
            }
            if off < 1e-18 {
                break;
            }

            for p in 0..4 {
                for q in (p + 1)..4 {
                    if m[p][q].abs() < 1e-20 {
                        continue;
                    }
                    let theta = (m[q][q] - m[p][p]) / (2.0 * m[p][q]);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;
                    for k in 0..4 {
                        let (mkp, mkq) = (m[k][p], m[k][q]);
                        m[k][p] = c * mkp - s * mkq;
                        m[k][q] = s * mkp + c * mkq;
                    }
                    for k in 0..4 {
                        let (mpk, mqk) = (m[p][k], m[q][k]);
                        m[p][k] = c * mpk - s * mqk;
                        m[q][k] = s * mpk + c * mqk;
                    }
                    for k in 0..4 {
                        let (vkp, vkq) = (v[k][p], v[k][q]);
                        v[k][p] = c * vkp - s * vkq;
                        v[k][q] = s * vkp + c * vkq;
                    }
                }
            }
        }

        let mut best = 0;
        for i in 1..4 {
            if m[i][i] > m[best][best] {
                best = i;
            }
        }
        Vec4::new(v[0][best], v[1][best], v[2][best], v[3][best]).normalize_or(Vec4::X)
    }
}
