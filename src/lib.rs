//! # qg-rs
//!
//! Multi-layer quasi-geostrophic (QG) solver core on a rectangular,
//! possibly obstacle-masked grid.
//!
//! The crate provides the two numerically non-trivial pieces of a QG
//! simulation and the plumbing between them:
//! - elliptic inversion of potential vorticity into a streamfunction:
//!   a direct sine-transform Helmholtz solve per vertical mode, with a
//!   capacitance-matrix correction enforcing psi = 0 on irregular mask
//!   boundaries
//! - a fixed-step finite-volume integrator advecting potential
//!   vorticity with upwind-biased fluxes, wind forcing and bottom drag
//!
//! Experiment setup, visualization, output, and CFL-based step
//! selection are the caller's concern; see `demos/vortex_wall.rs` for
//! the exercised usage pattern.
//!
//! All operations are batched over independent ensemble members; with
//! the `parallel` feature the elliptic inversion fans members out
//! across threads.

pub mod capacitance;
pub mod dst;
pub mod field;
pub mod flux;
pub mod grid;
pub mod helmholtz;
pub mod mask;
pub mod model;
pub mod modes;
pub mod operators;

pub use capacitance::CapacitanceMatrices;
pub use field::Field;
pub use grid::Grid;
pub use helmholtz::HelmholtzSolver;
pub use mask::Masks;
pub use model::{ConfigError, ModelError, QgModel, QgParams};
pub use modes::{DecompositionError, VerticalModes};
pub use operators::{grad_perp, interp_center_to_corner, interp_corner_to_center, laplacian};
