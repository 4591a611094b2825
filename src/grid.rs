//! Uniform staggered grid for the QG model.
//!
//! Cell centers carry potential vorticity, cell corners carry the
//! streamfunction. The grid is immutable after construction; all
//! geometry consumed by the operators and the elliptic solver derives
//! from it.

/// Immutable rectangular grid.
#[derive(Clone, Debug)]
pub struct Grid {
    /// Number of cells in x.
    pub nx: usize,
    /// Number of cells in y.
    pub ny: usize,
    /// Physical extent in x (m).
    pub lx: f64,
    /// Physical extent in y (m).
    pub ly: f64,
    /// Cell size in x (m).
    pub dx: f64,
    /// Cell size in y (m).
    pub dy: f64,
}

impl Grid {
    /// Build a uniform grid covering [0, lx] x [0, ly] with nx x ny cells.
    ///
    /// Callers validate dimensions and extents before construction
    /// (see `QgParams::validate`); this constructor assumes them sane.
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            dx: lx / nx as f64,
            dy: ly / ny as f64,
        }
    }

    /// x coordinates of cell centers, length nx.
    pub fn x_centers(&self) -> Vec<f64> {
        (0..self.nx).map(|i| (i as f64 + 0.5) * self.dx).collect()
    }

    /// y coordinates of cell centers, length ny.
    pub fn y_centers(&self) -> Vec<f64> {
        (0..self.ny).map(|j| (j as f64 + 0.5) * self.dy).collect()
    }

    /// x coordinates of cell corners, length nx + 1.
    pub fn x_corners(&self) -> Vec<f64> {
        (0..=self.nx).map(|i| i as f64 * self.dx).collect()
    }

    /// y coordinates of cell corners, length ny + 1.
    pub fn y_corners(&self) -> Vec<f64> {
        (0..=self.ny).map(|j| j as f64 * self.dy).collect()
    }

    /// Cell area (m^2).
    pub fn cell_area(&self) -> f64 {
        self.dx * self.dy
    }
}
