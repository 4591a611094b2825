//! Type-I discrete sine transform (DST-I), 1D and 2D.
//!
//! The DST-I is the eigenbasis of the 5-point Laplacian with
//! homogeneous Dirichlet ends, which is what makes the direct Helmholtz
//! solve possible. With orthonormal scaling
//!
//!   X[k] = sqrt(2/(n+1)) * sum_{j=1}^{n} x[j] sin(pi j k / (n+1))
//!
//! the transform is involutive (it is its own inverse), so the solver
//! applies the same routine forward and backward.
//!
//! Each length-n DST is evaluated through a complex FFT of the odd
//! extension of length 2(n+1): for that sequence the FFT output is
//! purely imaginary with Im(X_fft[k]) = -2 * sum x[j] sin(pi j k/(n+1)).
//! FFT plans are created once and reused for every solve.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Planned 2D DST-I over an (nx, ny) slab, y index fastest.
pub struct Dst2D {
    /// Points in x.
    pub nx: usize,
    /// Points in y.
    pub ny: usize,
    fft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    norm_x: f64,
    norm_y: f64,
}

impl Dst2D {
    /// Plan transforms for an (nx, ny) slab.
    pub fn plan(nx: usize, ny: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_x = planner.plan_fft_forward(2 * (nx + 1));
        let fft_y = planner.plan_fft_forward(2 * (ny + 1));
        Self {
            nx,
            ny,
            fft_x,
            fft_y,
            norm_x: (2.0 / (nx + 1) as f64).sqrt(),
            norm_y: (2.0 / (ny + 1) as f64).sqrt(),
        }
    }

    /// Orthonormal DST-I along both directions, in place.
    ///
    /// `slab` has nx * ny values with y fastest. Involutive: applying
    /// this twice restores the input up to rounding.
    pub fn transform_2d(&self, slab: &mut [f64]) {
        assert_eq!(slab.len(), self.nx * self.ny, "slab shape mismatch");

        // Along y: lines are contiguous.
        let mut buf = vec![Complex::new(0.0, 0.0); 2 * (self.ny + 1)];
        for line in slab.chunks_exact_mut(self.ny) {
            dst_line(line, &mut buf, self.fft_y.as_ref(), self.norm_y);
        }

        // Along x: gather strided lines into a scratch vector.
        let mut buf = vec![Complex::new(0.0, 0.0); 2 * (self.nx + 1)];
        let mut line = vec![0.0; self.nx];
        for j in 0..self.ny {
            for i in 0..self.nx {
                line[i] = slab[i * self.ny + j];
            }
            dst_line(&mut line, &mut buf, self.fft_x.as_ref(), self.norm_x);
            for i in 0..self.nx {
                slab[i * self.ny + j] = line[i];
            }
        }
    }
}

/// One orthonormal DST-I line via the odd-extension FFT.
fn dst_line(line: &mut [f64], buf: &mut [Complex<f64>], fft: &dyn Fft<f64>, norm: f64) {
    let n = line.len();
    debug_assert_eq!(buf.len(), 2 * (n + 1));

    buf[0] = Complex::new(0.0, 0.0);
    buf[n + 1] = Complex::new(0.0, 0.0);
    for (j, &v) in line.iter().enumerate() {
        buf[j + 1] = Complex::new(v, 0.0);
        buf[2 * n + 1 - j] = Complex::new(-v, 0.0);
    }

    fft.process(buf);

    // Im(X_fft[k]) = -2 * S[k]; fold in the orthonormal factor.
    let scale = -0.5 * norm;
    for k in 0..n {
        line[k] = scale * buf[k + 1].im;
    }
}

/// Eigenvalues of the 1D 5-point Laplacian under the DST-I basis.
///
/// For n interior points with spacing d (n + 1 cells across the
/// domain), mode k has eigenvalue 2 (cos(pi (k+1) / (n+1)) - 1) / d^2,
/// all strictly negative.
pub fn laplacian_eigenvalues(n: usize, d: f64) -> Vec<f64> {
    let m = (n + 1) as f64;
    (0..n)
        .map(|k| 2.0 * ((std::f64::consts::PI * (k + 1) as f64 / m).cos() - 1.0) / (d * d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dst_is_involutive() {
        let (nx, ny) = (7, 12);
        let dst = Dst2D::plan(nx, ny);
        let original: Vec<f64> = (0..nx * ny)
            .map(|k| ((k * 37 % 101) as f64 - 50.0) / 17.0)
            .collect();
        let mut slab = original.clone();
        dst.transform_2d(&mut slab);
        dst.transform_2d(&mut slab);
        for (k, (&a, &b)) in original.iter().zip(slab.iter()).enumerate() {
            assert!(
                (a - b).abs() < 1e-12,
                "involution failed at {}: {} vs {}",
                k,
                a,
                b
            );
        }
    }

    #[test]
    fn test_dst_diagonalizes_sine_mode() {
        // A pure sine mode transforms to a single coefficient.
        let n = 15;
        let dst = Dst2D::plan(n, n);
        let kx = 3usize;
        let ky = 5usize;
        let m = (n + 1) as f64;
        let mut slab = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                slab[i * n + j] = (std::f64::consts::PI * kx as f64 * (i + 1) as f64 / m).sin()
                    * (std::f64::consts::PI * ky as f64 * (j + 1) as f64 / m).sin();
            }
        }
        dst.transform_2d(&mut slab);
        // Input has l2 norm m/2, so the orthonormal transform puts m/2
        // into the single matching coefficient.
        let expected = m / 2.0;
        for i in 0..n {
            for j in 0..n {
                let want = if i + 1 == kx && j + 1 == ky { expected } else { 0.0 };
                assert!(
                    (slab[i * n + j] - want).abs() < 1e-12,
                    "coefficient ({},{}) = {}, want {}",
                    i,
                    j,
                    slab[i * n + j],
                    want
                );
            }
        }
    }

    #[test]
    fn test_laplacian_eigenvalues_sign_and_extremes() {
        let ev = laplacian_eigenvalues(31, 0.5);
        assert_eq!(ev.len(), 31);
        assert!(ev.iter().all(|&l| l < 0.0));
        // Monotonically decreasing towards -4/d^2.
        for w in ev.windows(2) {
            assert!(w[1] < w[0]);
        }
        assert!(ev[30] > -4.0 / 0.25);
    }
}
