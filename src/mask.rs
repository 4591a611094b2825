//! Wet/dry masks on the staggered grid.
//!
//! From a caller-supplied base pattern over cell centers, derives the
//! masks for every staggered point type plus the list of irregular
//! corner points consumed by the capacitance-matrix correction:
//!
//! - center mask (nx, ny): the base pattern, true = fluid
//! - x-edge mask (nx+1, ny): edge wet iff both adjacent centers wet
//! - y-edge mask (nx, ny+1): same in y
//! - corner interior mask (nx+1, ny+1): corner wet iff all four
//!   adjacent centers wet (everything outside the rectangle counts as
//!   dry, so the outer ring is never interior)
//!
//! An irregular corner is an interior-rectangle corner whose 2x2 center
//! neighborhood is mixed wet/dry: the streamfunction must be pinned to
//! zero there, which the spectral solver alone cannot do. Dangling
//! partial stencils cannot occur: any corner with an incomplete wet
//! neighborhood is excluded or irregular by construction.
//!
//! A degenerate base pattern is not rejected here; an all-dry pattern
//! simply has zero wet points and is refused at model construction.

/// Masks for all staggered point types plus the irregular corner set.
#[derive(Clone, Debug)]
pub struct Masks {
    /// Cells in x.
    pub nx: usize,
    /// Cells in y.
    pub ny: usize,
    /// Cell-center mask, (nx, ny), row-major with y fastest.
    pub center: Vec<bool>,
    /// x-edge mask, (nx+1, ny).
    pub edge_u: Vec<bool>,
    /// y-edge mask, (nx, ny+1).
    pub edge_v: Vec<bool>,
    /// Corner interior mask, (nx+1, ny+1).
    pub corner: Vec<bool>,
    /// Irregular corner points in interior-grid coordinates:
    /// (i, j) refers to corner (i + 1, j + 1) on the (nx-1, ny-1)
    /// interior slab the spectral solver operates on. Fixed for the run.
    pub irregular: Vec<(usize, usize)>,
}

impl Masks {
    /// Derive all masks from a base center pattern (true = fluid).
    ///
    /// `base` has length nx * ny with y fastest. Panics on a length
    /// mismatch; everything else is accepted.
    pub fn derive(nx: usize, ny: usize, base: &[bool]) -> Self {
        assert_eq!(base.len(), nx * ny, "base mask must have nx * ny entries");
        let center = base.to_vec();

        // Dry outside the rectangle.
        let wet = |i: isize, j: isize| -> bool {
            i >= 0 && j >= 0 && (i as usize) < nx && (j as usize) < ny && center[i as usize * ny + j as usize]
        };

        let mut edge_u = vec![false; (nx + 1) * ny];
        for i in 0..=nx {
            for j in 0..ny {
                edge_u[i * ny + j] = wet(i as isize - 1, j as isize) && wet(i as isize, j as isize);
            }
        }

        let mut edge_v = vec![false; nx * (ny + 1)];
        for i in 0..nx {
            for j in 0..=ny {
                edge_v[i * (ny + 1) + j] = wet(i as isize, j as isize - 1) && wet(i as isize, j as isize);
            }
        }

        let mut corner = vec![false; (nx + 1) * (ny + 1)];
        let mut irregular = Vec::new();
        for i in 0..=nx {
            for j in 0..=ny {
                let ii = i as isize;
                let jj = j as isize;
                let neighbors = [
                    wet(ii - 1, jj - 1),
                    wet(ii, jj - 1),
                    wet(ii - 1, jj),
                    wet(ii, jj),
                ];
                let n_wet = neighbors.iter().filter(|&&w| w).count();
                corner[i * (ny + 1) + j] = n_wet == 4;
                // Mixed neighborhood strictly inside the rectangle: the
                // outer ring is already pinned by the sine basis.
                if n_wet > 0 && n_wet < 4 && i >= 1 && i <= nx - 1 && j >= 1 && j <= ny - 1 {
                    irregular.push((i - 1, j - 1));
                }
            }
        }

        Self {
            nx,
            ny,
            center,
            edge_u,
            edge_v,
            corner,
            irregular,
        }
    }

    /// Fully wet masks (no obstacles).
    pub fn all_wet(nx: usize, ny: usize) -> Self {
        Self::derive(nx, ny, &vec![true; nx * ny])
    }

    /// Number of wet cell centers.
    pub fn n_wet_centers(&self) -> usize {
        self.center.iter().filter(|&&w| w).count()
    }

    #[inline]
    pub fn center_at(&self, i: usize, j: usize) -> bool {
        self.center[i * self.ny + j]
    }

    #[inline]
    pub fn corner_at(&self, i: usize, j: usize) -> bool {
        self.corner[i * (self.ny + 1) + j]
    }
}
