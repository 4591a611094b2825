//! Direct Helmholtz solve on the full rectangle.
//!
//! Solves (Laplacian - beta_m) psi = rhs on the interior corner grid
//! with psi = 0 on the outer boundary, for every vertical mode m. The
//! 5-point Laplacian with Dirichlet ends is diagonal in the DST-I
//! basis, so the solve is: forward transform, divide each coefficient
//! by (lambda_i + lambda_j - beta_m), inverse transform. No iteration,
//! no tolerance; exact up to rounding.
//!
//! A denominator at rounding distance from zero (possible only for a
//! beta = 0 mode paired with a zero eigenvalue, which the Dirichlet
//! sine basis excludes, but kept as policy for degenerate
//! configurations) forces that coefficient to zero instead of dividing:
//! the compatibility choice for a zero-mean mode.

use crate::dst::{laplacian_eigenvalues, Dst2D};

/// Planned per-mode Helmholtz solver over the interior corner grid.
pub struct HelmholtzSolver {
    /// Interior corners in x (nx - 1 for nx cells).
    pub nx_int: usize,
    /// Interior corners in y.
    pub ny_int: usize,
    /// Number of vertical modes.
    pub n_modes: usize,
    dst: Dst2D,
    /// Per-mode deformation wavenumbers.
    beta: Vec<f64>,
    /// Per-mode spectral denominators, n_modes planes of
    /// nx_int * ny_int; exact zeros mark suppressed coefficients.
    denom: Vec<f64>,
}

impl HelmholtzSolver {
    /// Plan a solver for an nx x ny cell grid with spacings dx, dy and
    /// one deformation wavenumber `beta_m >= 0` per mode.
    ///
    /// Callers validate `nx, ny >= 3` before construction (see
    /// `QgParams::validate`); grids without an interior are refused
    /// here.
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64, beta: &[f64]) -> Self {
        assert!(nx >= 2 && ny >= 2, "grid must have interior corners");
        let nx_int = nx - 1;
        let ny_int = ny - 1;
        let lx = laplacian_eigenvalues(nx_int, dx);
        let ly = laplacian_eigenvalues(ny_int, dy);

        let mut denom = Vec::with_capacity(beta.len() * nx_int * ny_int);
        for &b in beta {
            // Coefficients are suppressed below rounding distance of the
            // operator's spectral scale.
            let tol = 1e-14 * (lx[nx_int - 1].abs() + ly[ny_int - 1].abs() + b);
            for &ex in &lx {
                for &ey in &ly {
                    let d = ex + ey - b;
                    denom.push(if d.abs() <= tol { 0.0 } else { d });
                }
            }
        }

        Self {
            nx_int,
            ny_int,
            n_modes: beta.len(),
            dst: Dst2D::plan(nx_int, ny_int),
            beta: beta.to_vec(),
            denom,
        }
    }

    /// Points on the interior slab.
    #[inline]
    pub fn interior_len(&self) -> usize {
        self.nx_int * self.ny_int
    }

    /// Solve (Laplacian - beta_m) psi = rhs in place for one mode.
    ///
    /// `slab` holds the interior right-hand side on entry and the
    /// interior solution on exit, y fastest.
    pub fn solve_mode(&self, slab: &mut [f64], mode: usize) {
        let n = self.interior_len();
        assert_eq!(slab.len(), n, "interior slab shape mismatch");
        assert!(mode < self.n_modes, "mode index out of range");

        self.dst.transform_2d(slab);
        let denom = &self.denom[mode * n..(mode + 1) * n];
        for (c, &d) in slab.iter_mut().zip(denom.iter()) {
            *c = if d == 0.0 { 0.0 } else { *c / d };
        }
        self.dst.transform_2d(slab);
    }

    /// Apply the forward operator (Laplacian - beta_m) to an interior
    /// field with an implicit zero ring, writing into `out`.
    ///
    /// The pointwise inverse of [`Self::solve_mode`]; used by
    /// diagnostics and tests to verify the solve against the discrete
    /// operator actually inverted.
    pub fn apply_operator(&self, slab: &[f64], mode: usize, dx: f64, dy: f64, out: &mut [f64]) {
        let (nx, ny) = (self.nx_int, self.ny_int);
        assert_eq!(slab.len(), nx * ny);
        assert_eq!(out.len(), nx * ny);
        let beta = self.beta[mode];
        for i in 0..nx {
            for j in 0..ny {
                let c = slab[i * ny + j];
                let w = if i > 0 { slab[(i - 1) * ny + j] } else { 0.0 };
                let e = if i + 1 < nx { slab[(i + 1) * ny + j] } else { 0.0 };
                let s = if j > 0 { slab[i * ny + j - 1] } else { 0.0 };
                let n = if j + 1 < ny { slab[i * ny + j + 1] } else { 0.0 };
                out[i * ny + j] =
                    (w + e - 2.0 * c) / (dx * dx) + (s + n - 2.0 * c) / (dy * dy) - beta * c;
            }
        }
    }

}
