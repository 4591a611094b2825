//! The QG model state and its fixed-step integrator.
//!
//! [`QgModel`] owns everything with run lifetime: the grid, the masks,
//! the vertical mode basis, the planned spectral solver, the
//! capacitance matrices, and the evolving fields q (potential
//! vorticity, cell centers) and psi (streamfunction, cell corners).
//! psi is never an independent degree of freedom: it is recomputed from
//! q by elliptic inversion at construction and after every step.
//!
//! `step()` advances q by exactly one fixed dt:
//! 1. (u, v) = grad_perp(psi) at the staggered edges
//! 2. upwind flux divergence of q (configurable stencil width)
//! 3. wind-stress curl on the top layer, bottom drag on the bottom
//!    layer, planetary vorticity advection when beta != 0
//! 4. q <- q + dt * rhs, center mask re-applied
//! 5. psi re-derived through layer->mode transform, per-mode
//!    (capacitance-corrected) Helmholtz solve, mode->layer transform
//!
//! The integrator performs no stability or NaN detection: the caller
//! picks dt against the CFL bound (see [`QgModel::max_speed`]) and
//! checks [`QgModel::has_non_finite`] periodically. A blown-up run is
//! terminal by design; there is no retry or step-size reduction.
//!
//! The integrator is not reentrant; a given model must be stepped from
//! one thread at a time. Ensemble members are independent batches and
//! are inverted in parallel under the `parallel` feature.

use thiserror::Error;

use crate::capacitance::CapacitanceMatrices;
use crate::field::Field;
use crate::flux::advective_divergence;
use crate::grid::Grid;
use crate::helmholtz::HelmholtzSolver;
use crate::mask::Masks;
use crate::modes::{DecompositionError, VerticalModes};
use crate::operators::{grad_perp, interp_center_to_corner, interp_corner_to_center, laplacian};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Construction-time configuration error. Fatal; never recovered
/// internally.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid dimension {name} must be at least {min}, got {value}")]
    InvalidDimension {
        name: &'static str,
        value: usize,
        min: usize,
    },
    #[error("physical extent {name} must be positive and finite, got {value}")]
    InvalidExtent { name: &'static str, value: f64 },
    #[error("layer thickness H[{layer}] must be positive, got {value}")]
    NonPositiveThickness { layer: usize, value: f64 },
    #[error("buoyancy jump g'[{interface}] must be positive, got {value}")]
    NonPositiveBuoyancyJump { interface: usize, value: f64 },
    #[error("expected {expected} entries for {name}, got {actual}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("flux stencil width must be 1, 3 or 5, got {width}")]
    InvalidStencil { width: usize },
    #[error("base mask excludes every cell center")]
    EmptyMask,
}

/// Any fatal model-construction failure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),
}

/// Construction parameters for [`QgModel`].
///
/// `dt` may be zero at construction; drivers typically measure the
/// initial velocities first and set the step afterwards with
/// [`QgModel::set_dt`].
#[derive(Clone, Debug)]
pub struct QgParams {
    /// Cells in x.
    pub nx: usize,
    /// Cells in y.
    pub ny: usize,
    /// Layers.
    pub nl: usize,
    /// Ensemble members.
    pub n_ens: usize,
    /// Domain extent in x (m).
    pub lx: f64,
    /// Domain extent in y (m).
    pub ly: f64,
    /// Layer thicknesses, length nl (m).
    pub h: Vec<f64>,
    /// Interface buoyancy jumps (m/s^2); entry i is the jump below
    /// layer i, indices 0..nl-2 are used.
    pub g_prime: Vec<f64>,
    /// Coriolis parameter (1/s).
    pub f0: f64,
    /// Planetary vorticity gradient (1/(m s)).
    pub beta: f64,
    /// Wind stress magnitude (m^2/s^2); curl applied to the top layer.
    pub tau0: f64,
    /// Linear bottom drag coefficient (1/s).
    pub bottom_drag_coef: f64,
    /// Advective stencil width: 1, 3 or 5 cells.
    pub flux_stencil: usize,
    /// Fixed time step (s).
    pub dt: f64,
    /// Base validity pattern over cell centers (true = fluid);
    /// `None` means fully valid.
    pub mask: Option<Vec<bool>>,
}

impl QgParams {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value, min) in [
            ("nx", self.nx, 3),
            ("ny", self.ny, 3),
            ("nl", self.nl, 1),
            ("n_ens", self.n_ens, 1),
        ] {
            if value < min {
                return Err(ConfigError::InvalidDimension { name, value, min });
            }
        }
        for (name, value) in [("Lx", self.lx), ("Ly", self.ly)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidExtent { name, value });
            }
        }
        if self.h.len() != self.nl {
            return Err(ConfigError::LengthMismatch {
                name: "H",
                expected: self.nl,
                actual: self.h.len(),
            });
        }
        for (layer, &value) in self.h.iter().enumerate() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositiveThickness { layer, value });
            }
        }
        if self.g_prime.len() + 1 < self.nl {
            return Err(ConfigError::LengthMismatch {
                name: "g_prime",
                expected: self.nl - 1,
                actual: self.g_prime.len(),
            });
        }
        for interface in 0..self.nl.saturating_sub(1) {
            let value = self.g_prime[interface];
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositiveBuoyancyJump { interface, value });
            }
        }
        if !matches!(self.flux_stencil, 1 | 3 | 5) {
            return Err(ConfigError::InvalidStencil {
                width: self.flux_stencil,
            });
        }
        if let Some(mask) = &self.mask {
            if mask.len() != self.nx * self.ny {
                return Err(ConfigError::LengthMismatch {
                    name: "mask",
                    expected: self.nx * self.ny,
                    actual: mask.len(),
                });
            }
        }
        Ok(())
    }
}

/// Multi-layer QG simulation state.
pub struct QgModel {
    /// Immutable grid geometry.
    pub grid: Grid,
    /// Immutable staggered masks and irregular corner set.
    pub masks: Masks,
    /// Vertical mode basis.
    pub modes: VerticalModes,
    helmholtz: HelmholtzSolver,
    capacitance: CapacitanceMatrices,
    params: QgParams,
    /// Wind-stress curl per cell center, applied to the top layer.
    wind_curl: Vec<f64>,
    q: Field,
    psi: Field,
    t: f64,
    dt: f64,
}

impl QgModel {
    /// Validate, precompute, and assemble a model with zero initial PV.
    pub fn new(params: QgParams) -> Result<Self, ModelError> {
        params.validate()?;

        let grid = Grid::new(params.nx, params.ny, params.lx, params.ly);
        let masks = match &params.mask {
            Some(base) => Masks::derive(params.nx, params.ny, base),
            None => Masks::all_wet(params.nx, params.ny),
        };
        if masks.n_wet_centers() == 0 {
            return Err(ConfigError::EmptyMask.into());
        }

        let modes = VerticalModes::decompose(&params.h, &params.g_prime, params.f0)?;
        let helmholtz = HelmholtzSolver::new(params.nx, params.ny, grid.dx, grid.dy, &modes.beta);
        let capacitance = CapacitanceMatrices::build(&helmholtz, &masks.irregular);

        // Double-gyre wind curl profile, tau0 * 2 pi / Ly * sin(2 pi y / Ly),
        // scaled by the top-layer thickness.
        let two_pi = 2.0 * std::f64::consts::PI;
        let y_centers = grid.y_centers();
        let mut wind_curl = vec![0.0; params.nx * params.ny];
        for i in 0..params.nx {
            for (j, &y) in y_centers.iter().enumerate() {
                wind_curl[i * params.ny + j] =
                    params.tau0 * two_pi / params.ly * (two_pi * y / params.ly).sin()
                        / params.h[0];
            }
        }

        let q = Field::zeros(params.n_ens, params.nl, params.nx, params.ny);
        let psi = Field::zeros(params.n_ens, params.nl, params.nx + 1, params.ny + 1);
        let dt = params.dt;

        Ok(Self {
            grid,
            masks,
            modes,
            helmholtz,
            capacitance,
            params,
            wind_curl,
            q,
            psi,
            t: 0.0,
            dt,
        })
    }

    /// Potential vorticity, read-only.
    pub fn q(&self) -> &Field {
        &self.q
    }

    /// Potential vorticity, mutable.
    ///
    /// psi goes stale after any external write: call
    /// [`Self::invert_pv`] before reading it again.
    pub fn q_mut(&mut self) -> &mut Field {
        &mut self.q
    }

    /// Streamfunction, read-only. Fully determined by q.
    pub fn psi(&self) -> &Field {
        &self.psi
    }

    /// Elapsed simulation time (s).
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Current fixed step (s).
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Replace the fixed step. Drivers do this after measuring the
    /// initial velocities for their CFL bound.
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    /// Number of irregular boundary points consumed by the
    /// capacitance-matrix correction.
    pub fn n_irregular_points(&self) -> usize {
        self.capacitance.n_points()
    }

    /// Recompute psi from q by per-mode elliptic inversion.
    pub fn invert_pv(&mut self) {
        let members: Vec<usize> = (0..self.q.n_ens).collect();

        #[cfg(feature = "parallel")]
        let blocks: Vec<Vec<f64>> = members
            .par_iter()
            .map(|&e| self.invert_member(e))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let blocks: Vec<Vec<f64>> = members.iter().map(|&e| self.invert_member(e)).collect();

        let block_len = self.psi.nl * self.psi.plane_len();
        for (e, block) in blocks.into_iter().enumerate() {
            let start = e * block_len;
            self.psi.data[start..start + block_len].copy_from_slice(&block);
        }
    }

    /// Invert one ensemble member, returning its nl psi planes.
    fn invert_member(&self, e: usize) -> Vec<f64> {
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let n_int = self.helmholtz.interior_len();
        let (nx_int, ny_int) = (self.helmholtz.nx_int, self.helmholtz.ny_int);
        let nl = self.params.nl;

        // Right-hand side: q interpolated to interior corners, zeroed
        // outside the fluid interior, per layer.
        let mut rhs_layers = vec![0.0; nl * n_int];
        for l in 0..nl {
            let corner = interp_center_to_corner(self.q.plane(e, l), &self.masks);
            let slab = &mut rhs_layers[l * n_int..(l + 1) * n_int];
            for i in 0..nx_int {
                for j in 0..ny_int {
                    let ci = i + 1;
                    let cj = j + 1;
                    if self.masks.corner_at(ci, cj) {
                        slab[i * ny_int + j] = corner[ci * (ny + 1) + cj];
                    }
                }
            }
        }

        // Layer -> mode, one 2D solve per mode, mode -> layer.
        let mut rhs_modes = vec![0.0; nl * n_int];
        self.modes.to_modes(&rhs_layers, &mut rhs_modes, n_int);
        for m in 0..nl {
            let slab = &mut rhs_modes[m * n_int..(m + 1) * n_int];
            self.capacitance
                .solve_corrected(&self.helmholtz, slab, m);
        }
        let mut psi_layers = vec![0.0; nl * n_int];
        self.modes.to_layers(&rhs_modes, &mut psi_layers, n_int);

        // Embed with the zero ring, corner-masked.
        let plane_len = (nx + 1) * (ny + 1);
        let mut out = vec![0.0; nl * plane_len];
        for l in 0..nl {
            let slab = &psi_layers[l * n_int..(l + 1) * n_int];
            let plane = &mut out[l * plane_len..(l + 1) * plane_len];
            for i in 0..nx_int {
                for j in 0..ny_int {
                    let ci = i + 1;
                    let cj = j + 1;
                    if self.masks.corner_at(ci, cj) {
                        plane[ci * (ny + 1) + cj] = slab[i * ny_int + j];
                    }
                }
            }
        }
        out
    }

    /// Advance the state by exactly one fixed dt.
    pub fn step(&mut self) {
        let rhs = self.compute_rhs();
        self.q.axpy(self.dt, &rhs);
        self.q.apply_plane_mask(&self.masks.center);
        self.invert_pv();
        self.t += self.dt;
    }

    /// Tendency of q: advection, wind forcing, bottom drag, beta term.
    fn compute_rhs(&self) -> Field {
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let (dx, dy) = (self.grid.dx, self.grid.dy);
        let nl = self.params.nl;
        let mut rhs = Field::zeros(self.q.n_ens, nl, nx, ny);

        for e in 0..self.q.n_ens {
            for l in 0..nl {
                let psi_plane = self.psi.plane(e, l);
                let (u, v) = grad_perp(psi_plane, &self.masks, dx, dy);
                let div = advective_divergence(
                    self.q.plane(e, l),
                    &u,
                    &v,
                    &self.masks,
                    dx,
                    dy,
                    self.params.flux_stencil,
                );

                let out = rhs.plane_mut(e, l);
                for k in 0..nx * ny {
                    out[k] = -div[k];
                }

                if l == 0 && self.params.tau0 != 0.0 {
                    for (o, &w) in out.iter_mut().zip(self.wind_curl.iter()) {
                        *o += w;
                    }
                }

                if l == nl - 1 && self.params.bottom_drag_coef != 0.0 {
                    let omega = laplacian(psi_plane, nx, ny, dx, dy);
                    let omega_c = interp_corner_to_center(&omega, &self.masks);
                    for (o, &w) in out.iter_mut().zip(omega_c.iter()) {
                        *o -= self.params.bottom_drag_coef * w;
                    }
                }

                if self.params.beta != 0.0 {
                    for i in 0..nx {
                        for j in 0..ny {
                            if self.masks.center[i * ny + j] {
                                let v_c = 0.5 * (v[i * (ny + 1) + j] + v[i * (ny + 1) + j + 1]);
                                out[i * ny + j] -= self.params.beta * v_c;
                            }
                        }
                    }
                }

                // Excluded cells hold their prescribed value.
                for k in 0..nx * ny {
                    if !self.masks.center[k] {
                        out[k] = 0.0;
                    }
                }
            }
        }
        rhs
    }

    /// Diagnostic staggered velocities for every member and layer:
    /// u on x-edges (nx+1, ny), v on y-edges (nx, ny+1).
    pub fn velocities(&self) -> (Field, Field) {
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let mut u = Field::zeros(self.q.n_ens, self.params.nl, nx + 1, ny);
        let mut v = Field::zeros(self.q.n_ens, self.params.nl, nx, ny + 1);
        for e in 0..self.q.n_ens {
            for l in 0..self.params.nl {
                let (up, vp) = grad_perp(self.psi.plane(e, l), &self.masks, self.grid.dx, self.grid.dy);
                u.plane_mut(e, l).copy_from_slice(&up);
                v.plane_mut(e, l).copy_from_slice(&vp);
            }
        }
        (u, v)
    }

    /// Diagnostic relative vorticity laplacian(psi), corner-shaped.
    pub fn vorticity(&self) -> Field {
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let mut w = Field::zeros(self.q.n_ens, self.params.nl, nx + 1, ny + 1);
        for e in 0..self.q.n_ens {
            for l in 0..self.params.nl {
                let omega = laplacian(self.psi.plane(e, l), nx, ny, self.grid.dx, self.grid.dy);
                w.plane_mut(e, l).copy_from_slice(&omega);
            }
        }
        w
    }

    /// Largest velocity component over all members and layers, the
    /// caller's input for its CFL bound.
    pub fn max_speed(&self) -> f64 {
        let (u, v) = self.velocities();
        u.max_abs().max(v.max_abs())
    }

    /// True if q or psi contains a NaN or infinity. Run termination is
    /// the caller's decision.
    pub fn has_non_finite(&self) -> bool {
        self.q.has_non_finite() || self.psi.has_non_finite()
    }
}
