//! Mask-aware differential operators on the staggered grid.
//!
//! All operators are pure functions of an input plane, the grid
//! spacings, and the immutable masks; no hidden state. Conventions:
//!
//! - streamfunction psi lives on corners (nx+1, ny+1)
//! - u on x-edges (nx+1, ny), v on y-edges (nx, ny+1)
//! - potential vorticity q on centers (nx, ny)
//!
//! `grad_perp` produces the exact staggered velocities used by the
//! flux-form advection, so the discrete velocity field is
//! divergence-free by construction.

use crate::mask::Masks;

/// Perpendicular gradient of a corner field:
/// u = -d(psi)/dy on x-edges, v = d(psi)/dx on y-edges.
///
/// Dry edges are zeroed through the edge masks.
pub fn grad_perp(psi: &[f64], masks: &Masks, dx: f64, dy: f64) -> (Vec<f64>, Vec<f64>) {
    let (nx, ny) = (masks.nx, masks.ny);
    assert_eq!(psi.len(), (nx + 1) * (ny + 1));

    let mut u = vec![0.0; (nx + 1) * ny];
    for i in 0..=nx {
        for j in 0..ny {
            if masks.edge_u[i * ny + j] {
                u[i * ny + j] = -(psi[i * (ny + 1) + j + 1] - psi[i * (ny + 1) + j]) / dy;
            }
        }
    }

    let mut v = vec![0.0; nx * (ny + 1)];
    for i in 0..nx {
        for j in 0..=ny {
            if masks.edge_v[i * (ny + 1) + j] {
                v[i * (ny + 1) + j] = (psi[(i + 1) * (ny + 1) + j] - psi[i * (ny + 1) + j]) / dx;
            }
        }
    }

    (u, v)
}

/// 5-point Laplacian of a corner field, zero on the outer ring.
///
/// Identical stencil to the operator the spectral solver inverts, so
/// laplacian(solve(rhs)) reproduces rhs on an unmasked domain (up to
/// the beta term).
pub fn laplacian(psi: &[f64], nx: usize, ny: usize, dx: f64, dy: f64) -> Vec<f64> {
    assert_eq!(psi.len(), (nx + 1) * (ny + 1));
    let stride = ny + 1;
    let mut out = vec![0.0; (nx + 1) * (ny + 1)];
    for i in 1..nx {
        for j in 1..ny {
            let c = psi[i * stride + j];
            out[i * stride + j] = (psi[(i - 1) * stride + j] + psi[(i + 1) * stride + j]
                - 2.0 * c)
                / (dx * dx)
                + (psi[i * stride + j - 1] + psi[i * stride + j + 1] - 2.0 * c) / (dy * dy);
        }
    }
    out
}

/// Interpolate a center field to corners, averaging only the wet
/// contributing centers and renormalizing the weights.
///
/// Corners with no wet neighbor get zero.
pub fn interp_center_to_corner(q: &[f64], masks: &Masks) -> Vec<f64> {
    let (nx, ny) = (masks.nx, masks.ny);
    assert_eq!(q.len(), nx * ny);
    let stride = ny + 1;
    let mut out = vec![0.0; (nx + 1) * (ny + 1)];
    for i in 0..=nx {
        for j in 0..=ny {
            let mut sum = 0.0;
            let mut count = 0usize;
            for (ci, cj) in [
                (i.wrapping_sub(1), j.wrapping_sub(1)),
                (i, j.wrapping_sub(1)),
                (i.wrapping_sub(1), j),
                (i, j),
            ] {
                if ci < nx && cj < ny && masks.center[ci * ny + cj] {
                    sum += q[ci * ny + cj];
                    count += 1;
                }
            }
            if count > 0 {
                out[i * stride + j] = sum / count as f64;
            }
        }
    }
    out
}

/// Interpolate a corner field to centers, averaging only the corners
/// inside the fluid interior and renormalizing the weights.
///
/// Centers surrounded by no interior corner (single-cell slivers next
/// to walls) get zero.
pub fn interp_corner_to_center(w: &[f64], masks: &Masks) -> Vec<f64> {
    let (nx, ny) = (masks.nx, masks.ny);
    assert_eq!(w.len(), (nx + 1) * (ny + 1));
    let stride = ny + 1;
    let mut out = vec![0.0; nx * ny];
    for i in 0..nx {
        for j in 0..ny {
            if !masks.center[i * ny + j] {
                continue;
            }
            let mut sum = 0.0;
            let mut count = 0usize;
            for (ci, cj) in [(i, j), (i + 1, j), (i, j + 1), (i + 1, j + 1)] {
                if masks.corner[ci * stride + cj] {
                    sum += w[ci * stride + cj];
                    count += 1;
                }
            }
            if count > 0 {
                out[i * ny + j] = sum / count as f64;
            }
        }
    }
    out
}
