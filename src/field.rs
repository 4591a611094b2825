//! Batched dense fields over (ensemble, layer, x, y).
//!
//! A [`Field`] stores one scalar variable for every ensemble member and
//! every layer on a fixed 2D grid, backed by a flat `Vec<f64>` in
//! plane-major order: the (ensemble, layer) plane is contiguous with the
//! y index fastest. Contiguous planes are what the sine-transform solver
//! and the flux kernels iterate over.
//!
//! Point-type shapes on the staggered grid:
//! - potential vorticity q at cell centers: (nx, ny)
//! - streamfunction psi at cell corners: (nx+1, ny+1)
//! - u velocity on x-edges: (nx+1, ny)
//! - v velocity on y-edges: (nx, ny+1)

/// Batched field over (n_ens, nl, nx, ny).
///
/// `nx`/`ny` are the dimensions of this field's own point type, not
/// necessarily the number of grid cells.
#[derive(Clone, Debug)]
pub struct Field {
    /// Flat storage, length n_ens * nl * nx * ny.
    pub data: Vec<f64>,
    /// Number of ensemble members.
    pub n_ens: usize,
    /// Number of layers.
    pub nl: usize,
    /// Points in x.
    pub nx: usize,
    /// Points in y.
    pub ny: usize,
}

impl Field {
    /// Create a zero-initialized field.
    pub fn zeros(n_ens: usize, nl: usize, nx: usize, ny: usize) -> Self {
        Self {
            data: vec![0.0; n_ens * nl * nx * ny],
            n_ens,
            nl,
            nx,
            ny,
        }
    }

    /// Number of points in one (ensemble, layer) plane.
    #[inline]
    pub fn plane_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Flat index of (i, j) within a plane.
    #[inline]
    pub fn pidx(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    /// Flat index of (ensemble, layer, i, j).
    #[inline]
    pub fn idx(&self, e: usize, l: usize, i: usize, j: usize) -> usize {
        ((e * self.nl + l) * self.nx + i) * self.ny + j
    }

    #[inline]
    pub fn get(&self, e: usize, l: usize, i: usize, j: usize) -> f64 {
        self.data[self.idx(e, l, i, j)]
    }

    #[inline]
    pub fn set(&mut self, e: usize, l: usize, i: usize, j: usize, value: f64) {
        let k = self.idx(e, l, i, j);
        self.data[k] = value;
    }

    /// Borrow one (ensemble, layer) plane.
    pub fn plane(&self, e: usize, l: usize) -> &[f64] {
        let n = self.plane_len();
        let start = (e * self.nl + l) * n;
        &self.data[start..start + n]
    }

    /// Mutably borrow one (ensemble, layer) plane.
    pub fn plane_mut(&mut self, e: usize, l: usize) -> &mut [f64] {
        let n = self.plane_len();
        let start = (e * self.nl + l) * n;
        &mut self.data[start..start + n]
    }

    /// Scale in place: self <- c * self.
    pub fn scale(&mut self, c: f64) {
        for v in &mut self.data {
            *v *= c;
        }
    }

    /// Add a scaled field: self <- self + c * other.
    ///
    /// Panics if shapes differ.
    pub fn axpy(&mut self, c: f64, other: &Field) {
        assert_eq!(self.data.len(), other.data.len(), "Field shape mismatch");
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += c * b;
        }
    }

    /// Maximum absolute value over all points.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, &v| m.max(v.abs()))
    }

    /// Sum over all points (all members, all layers).
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// True if any value is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }

    /// Zero every point excluded by `mask` in every plane.
    ///
    /// `mask` has plane shape; excluded points are forced back to the
    /// prescribed boundary value (zero).
    pub fn apply_plane_mask(&mut self, mask: &[bool]) {
        let n = self.plane_len();
        assert_eq!(mask.len(), n, "mask length must match plane size");
        for plane in self.data.chunks_exact_mut(n) {
            for (v, &ok) in plane.iter_mut().zip(mask.iter()) {
                if !ok {
                    *v = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_layout() {
        let mut f = Field::zeros(2, 3, 4, 5);
        f.set(1, 2, 3, 4, 7.0);
        let plane = f.plane(1, 2);
        assert_eq!(plane[3 * 5 + 4], 7.0);
        assert_eq!(f.get(1, 2, 3, 4), 7.0);
        assert_eq!(f.get(0, 0, 3, 4), 0.0);
    }

    #[test]
    fn test_axpy_scale() {
        let mut a = Field::zeros(1, 1, 2, 2);
        let mut b = Field::zeros(1, 1, 2, 2);
        for v in &mut b.data {
            *v = 2.0;
        }
        a.axpy(0.5, &b);
        a.scale(3.0);
        assert!(a.data.iter().all(|&v| (v - 3.0).abs() < 1e-15));
        assert_eq!(a.max_abs(), 3.0);
        assert_eq!(a.sum(), 12.0);
    }

    #[test]
    fn test_apply_plane_mask() {
        let mut f = Field::zeros(1, 2, 2, 2);
        for v in &mut f.data {
            *v = 1.0;
        }
        let mask = vec![true, false, true, false];
        f.apply_plane_mask(&mask);
        for l in 0..2 {
            assert_eq!(f.get(0, l, 0, 0), 1.0);
            assert_eq!(f.get(0, l, 0, 1), 0.0);
            assert_eq!(f.get(0, l, 1, 1), 0.0);
        }
    }

    #[test]
    fn test_non_finite_detection() {
        let mut f = Field::zeros(1, 1, 2, 2);
        assert!(!f.has_non_finite());
        f.data[2] = f64::NAN;
        assert!(f.has_non_finite());
    }
}
