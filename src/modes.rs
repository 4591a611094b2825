//! Vertical mode decomposition for the layered stratification.
//!
//! The rigid-lid stretching operator couples the nl layers through the
//! tridiagonal matrix A = diag(1/H) T, where T holds the inverse
//! buoyancy jumps at the layer interfaces. Diagonalizing A decouples
//! the multi-layer elliptic problem into nl independent 2D Helmholtz
//! problems, one per vertical mode, each with its own squared inverse
//! deformation radius beta_m = f0^2 * lambda_m.
//!
//! A is similar to the symmetric matrix S = D^{1/2} A D^{-1/2} with
//! D = diag(H), so the decomposition reduces to a symmetric
//! eigenproblem and the inverse transform is available in closed form:
//!
//! - mode -> layer: Cm2l = D^{-1/2} V
//! - layer -> mode: Cl2m = V^T D^{1/2}
//!
//! with V the orthonormal eigenvectors of S. Modes are sorted by
//! ascending lambda, so mode 0 is barotropic (lambda = 0, row sums of A
//! vanish under the rigid lid). For nl = 1 both transforms degenerate
//! to the scalar 1 and beta_0 = 0.

use faer::Mat;
use nalgebra::{DMatrix, SymmetricEigen};
use thiserror::Error;

/// Error for a vertical mode decomposition that cannot be used.
#[derive(Debug, Error)]
pub enum DecompositionError {
    /// The recomposed transform pair deviates from the identity.
    #[error("vertical mode basis is singular: |Cm2l * Cl2m - I| = {residual:.3e}")]
    SingularBasis {
        /// Max-norm deviation from the identity.
        residual: f64,
    },
    /// The eigensolver produced a non-finite eigenvalue.
    #[error("vertical mode eigenproblem produced non-finite eigenvalue for mode {mode}")]
    NonFiniteEigenvalue { mode: usize },
}

/// Layer <-> mode transforms and per-mode deformation wavenumbers.
#[derive(Clone, Debug)]
pub struct VerticalModes {
    /// Layer-to-mode transform, (nl, nl): x_mode = cl2m * x_layer.
    pub cl2m: Mat<f64>,
    /// Mode-to-layer transform, (nl, nl): x_layer = cm2l * x_mode.
    pub cm2l: Mat<f64>,
    /// Squared inverse deformation radius per mode, ascending,
    /// beta[0] = 0 for the barotropic mode.
    pub beta: Vec<f64>,
    /// Number of layers (= number of modes).
    pub nl: usize,
}

impl VerticalModes {
    /// Decompose the stratification given per-layer thickness `h` and
    /// interface buoyancy jumps `g_prime` (entry i = jump below layer i;
    /// indices 0..nl-2 are used, trailing entries are ignored).
    ///
    /// Precondition (validated by the caller): h and g_prime entries in
    /// use are strictly positive, `h.len() == nl`,
    /// `g_prime.len() >= nl - 1`.
    pub fn decompose(h: &[f64], g_prime: &[f64], f0: f64) -> Result<Self, DecompositionError> {
        let nl = h.len();

        if nl == 1 {
            let mut one = Mat::zeros(1, 1);
            one[(0, 0)] = 1.0;
            return Ok(Self {
                cl2m: one.clone(),
                cm2l: one,
                beta: vec![0.0],
                nl,
            });
        }

        // Symmetrized stretching matrix S[i][j] = T[i][j] / sqrt(H_i H_j).
        let s = DMatrix::from_fn(nl, nl, |i, j| {
            let t = if i == j {
                let below = if i < nl - 1 { 1.0 / g_prime[i] } else { 0.0 };
                let above = if i > 0 { 1.0 / g_prime[i - 1] } else { 0.0 };
                below + above
            } else if j == i + 1 {
                -1.0 / g_prime[i]
            } else if i == j + 1 {
                -1.0 / g_prime[j]
            } else {
                0.0
            };
            t / (h[i] * h[j]).sqrt()
        });

        let eig = SymmetricEigen::new(s);

        // Sort modes by ascending stretching eigenvalue.
        let mut order: Vec<usize> = (0..nl).collect();
        order.sort_by(|&a, &b| {
            eig.eigenvalues[a]
                .partial_cmp(&eig.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cl2m = Mat::zeros(nl, nl);
        let mut cm2l = Mat::zeros(nl, nl);
        let mut beta = Vec::with_capacity(nl);
        for (m, &k) in order.iter().enumerate() {
            let lambda = eig.eigenvalues[k];
            if !lambda.is_finite() {
                return Err(DecompositionError::NonFiniteEigenvalue { mode: m });
            }
            // The barotropic eigenvalue is zero analytically; clamp the
            // rounding-level negative part.
            beta.push(f0 * f0 * lambda.max(0.0));
            for l in 0..nl {
                let v = eig.eigenvectors[(l, k)];
                cm2l[(l, m)] = v / h[l].sqrt();
                cl2m[(m, l)] = v * h[l].sqrt();
            }
        }

        // Recomposition check: Cm2l * Cl2m must be the identity.
        let mut residual: f64 = 0.0;
        for i in 0..nl {
            for j in 0..nl {
                let mut sum = 0.0;
                for k in 0..nl {
                    sum += cm2l[(i, k)] * cl2m[(k, j)];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                residual = residual.max((sum - expected).abs());
            }
        }
        if residual > 1e-8 {
            return Err(DecompositionError::SingularBasis { residual });
        }

        Ok(Self {
            cl2m,
            cm2l,
            beta,
            nl,
        })
    }

    /// Apply the layer-to-mode transform to a set of per-layer planes.
    ///
    /// `layers` holds nl contiguous planes of `plane_len` values;
    /// `modes_out` receives the nl mode planes.
    pub fn to_modes(&self, layers: &[f64], modes_out: &mut [f64], plane_len: usize) {
        apply_transform(&self.cl2m, self.nl, layers, modes_out, plane_len);
    }

    /// Apply the mode-to-layer transform (inverse of [`Self::to_modes`]).
    pub fn to_layers(&self, modes: &[f64], layers_out: &mut [f64], plane_len: usize) {
        apply_transform(&self.cm2l, self.nl, modes, layers_out, plane_len);
    }
}

fn apply_transform(m: &Mat<f64>, nl: usize, input: &[f64], output: &mut [f64], plane_len: usize) {
    assert_eq!(input.len(), nl * plane_len);
    assert_eq!(output.len(), nl * plane_len);
    output.fill(0.0);
    for r in 0..nl {
        for c in 0..nl {
            let w = m[(r, c)];
            if w == 0.0 {
                continue;
            }
            let src = &input[c * plane_len..(c + 1) * plane_len];
            let dst = &mut output[r * plane_len..(r + 1) * plane_len];
            for (d, &s) in dst.iter_mut().zip(src.iter()) {
                *d += w * s;
            }
        }
    }
}
