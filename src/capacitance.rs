//! Capacitance-matrix correction for masked domains.
//!
//! The sine-transform solve enforces psi = 0 only on the outer
//! rectangle. For domains with interior walls or obstacles the
//! streamfunction must also vanish at the M irregular corner points on
//! the mask boundary. The capacitance-matrix method patches the fast
//! solver instead of abandoning it:
//!
//! 1. precompute (once) the M x M Green's matrix G, column c = response
//!    of the unmasked solve at all M points to a unit source at point c,
//!    and invert it;
//! 2. per solve: take the baseline solution, read its (nonzero) values
//!    at the M points, map them through -G^{-1} to M point-source
//!    strengths, add those to the right-hand side, and re-solve.
//!
//! The corrected solution vanishes at all M points to rounding
//! precision at the cost of exactly one extra spectral solve. G depends
//! only on the geometry and beta_m, never on the evolving fields; the
//! matrices are built at model construction and geometry is immutable
//! afterwards, so they can never go stale.

use faer::{linalg::solvers::Solve, Mat};

use crate::helmholtz::HelmholtzSolver;

/// Per-mode inverted capacitance matrices over the irregular points.
pub struct CapacitanceMatrices {
    /// Irregular corner points in interior-grid coordinates.
    pub points: Vec<(usize, usize)>,
    /// One inverted M x M matrix per mode.
    inv: Vec<Mat<f64>>,
}

impl CapacitanceMatrices {
    /// Build the inverted capacitance matrix for every mode of `solver`
    /// from unit point-source responses at `points`.
    ///
    /// With no irregular points this is free and the corrected solve
    /// degenerates to the plain spectral solve.
    pub fn build(solver: &HelmholtzSolver, points: &[(usize, usize)]) -> Self {
        let m = points.len();
        let n = solver.interior_len();
        let ny = solver.ny_int;
        let mut inv = Vec::with_capacity(solver.n_modes);

        for mode in 0..solver.n_modes {
            if m == 0 {
                inv.push(Mat::zeros(0, 0));
                continue;
            }

            // Green's responses, one unmasked solve per boundary point.
            let mut g = Mat::zeros(m, m);
            let mut rhs = vec![0.0; n];
            for (c, &(ic, jc)) in points.iter().enumerate() {
                rhs.fill(0.0);
                rhs[ic * ny + jc] = 1.0;
                solver.solve_mode(&mut rhs, mode);
                for (r, &(ir, jr)) in points.iter().enumerate() {
                    g[(r, c)] = rhs[ir * ny + jr];
                }
            }

            // Invert with LU, solving G * G_inv = I column by column.
            let lu = g.as_ref().full_piv_lu();
            let mut g_inv = Mat::zeros(m, m);
            for c in 0..m {
                let mut e = Mat::zeros(m, 1);
                e[(c, 0)] = 1.0;
                let col = lu.solve(&e);
                for r in 0..m {
                    g_inv[(r, c)] = col[(r, 0)];
                }
            }
            inv.push(g_inv);
        }

        Self {
            points: points.to_vec(),
            inv,
        }
    }

    /// Number of irregular boundary points.
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Solve (Laplacian - beta_m) psi = rhs with psi = 0 at every
    /// irregular point, in place on the interior slab.
    ///
    /// With M = 0 this is exactly [`HelmholtzSolver::solve_mode`].
    pub fn solve_corrected(&self, solver: &HelmholtzSolver, slab: &mut [f64], mode: usize) {
        if self.points.is_empty() {
            solver.solve_mode(slab, mode);
            return;
        }

        let ny = solver.ny_int;
        let m = self.points.len();

        // Baseline solve on a copy; the rhs is still needed.
        let mut baseline = slab.to_vec();
        solver.solve_mode(&mut baseline, mode);

        // Residuals at the boundary points -> point-source strengths.
        let residual: Vec<f64> = self
            .points
            .iter()
            .map(|&(i, j)| baseline[i * ny + j])
            .collect();
        let inv = &self.inv[mode];
        for (r, &(i, j)) in self.points.iter().enumerate() {
            let mut alpha = 0.0;
            for c in 0..m {
                alpha -= inv[(r, c)] * residual[c];
            }
            slab[i * ny + j] += alpha;
        }

        solver.solve_mode(slab, mode);
    }
}
