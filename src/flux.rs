//! Flux-form advection of potential vorticity.
//!
//! The advective tendency is the conservative divergence of edge
//! fluxes F = (u q_e, v q_e), with the edge value q_e reconstructed by
//! an upwind-biased interpolation of configurable width:
//!
//! - width 1: donor cell (first order)
//! - width 3: linear-upwind parabola, weights (-1, 5, 2)/6
//! - width 5: fifth-order upwind, weights (2, -13, 47, 27, -3)/60
//!
//! (the classic WENO-JS linear weights). Edges whose full stencil would
//! reach outside the domain or into dry cells degrade 5 -> 3 -> 1
//! one-sided; the classification is purely mask/geometry driven and
//! static for the run. Because the edge velocities are the perpendicular
//! gradient of psi, the discrete field is divergence-free and the cell
//! integral of q is conserved exactly by this form (dry and outer edges
//! carry zero flux).

use crate::mask::Masks;

/// Upwind edge reconstruction from up to five candidate cells.
///
/// `cells` holds the values at offsets -3..=+1 relative to the donor
/// side (donor at index 2), `valid` marks which of them are usable wet
/// cells. The donor cell itself is guaranteed valid by the edge mask.
#[inline]
fn reconstruct(cells: &[f64; 5], valid: &[bool; 5], width: usize) -> f64 {
    if width >= 5 && valid.iter().all(|&v| v) {
        (2.0 * cells[0] - 13.0 * cells[1] + 47.0 * cells[2] + 27.0 * cells[3] - 3.0 * cells[4])
            / 60.0
    } else if width >= 3 && valid[1] && valid[3] {
        (-cells[1] + 5.0 * cells[2] + 2.0 * cells[3]) / 6.0
    } else {
        cells[2]
    }
}

/// Divergence of the advective flux of one (ensemble, layer) plane of
/// q, given staggered edge velocities. Returns a center-shaped plane;
/// dry centers get zero.
pub fn advective_divergence(
    q: &[f64],
    u: &[f64],
    v: &[f64],
    masks: &Masks,
    dx: f64,
    dy: f64,
    stencil: usize,
) -> Vec<f64> {
    let (nx, ny) = (masks.nx, masks.ny);
    assert_eq!(q.len(), nx * ny);
    assert_eq!(u.len(), (nx + 1) * ny);
    assert_eq!(v.len(), nx * (ny + 1));

    let cell = |i: isize, j: isize| -> (f64, bool) {
        if i >= 0 && j >= 0 && (i as usize) < nx && (j as usize) < ny {
            let k = i as usize * ny + j as usize;
            (q[k], masks.center[k])
        } else {
            (0.0, false)
        }
    };

    // x-fluxes on wet x-edges.
    let mut fx = vec![0.0; (nx + 1) * ny];
    for i in 0..=nx {
        for j in 0..ny {
            let vel = u[i * ny + j];
            if !masks.edge_u[i * ny + j] || vel == 0.0 {
                continue;
            }
            let ii = i as isize;
            let jj = j as isize;
            // Cell indices from far-upwind to one-downwind; the donor
            // cell (left of the edge for vel > 0) sits at slot 2.
            let offsets: [isize; 5] = if vel > 0.0 {
                [ii - 3, ii - 2, ii - 1, ii, ii + 1]
            } else {
                [ii + 2, ii + 1, ii, ii - 1, ii - 2]
            };
            let mut cells = [0.0; 5];
            let mut valid = [false; 5];
            for (k, &ci) in offsets.iter().enumerate() {
                let (val, ok) = cell(ci, jj);
                cells[k] = val;
                valid[k] = ok;
            }
            fx[i * ny + j] = vel * reconstruct(&cells, &valid, stencil);
        }
    }

    // y-fluxes on wet y-edges.
    let mut fy = vec![0.0; nx * (ny + 1)];
    for i in 0..nx {
        for j in 0..=ny {
            let vel = v[i * (ny + 1) + j];
            if !masks.edge_v[i * (ny + 1) + j] || vel == 0.0 {
                continue;
            }
            let ii = i as isize;
            let jj = j as isize;
            let offsets: [isize; 5] = if vel > 0.0 {
                [jj - 3, jj - 2, jj - 1, jj, jj + 1]
            } else {
                [jj + 2, jj + 1, jj, jj - 1, jj - 2]
            };
            let mut cells = [0.0; 5];
            let mut valid = [false; 5];
            for (k, &cj) in offsets.iter().enumerate() {
                let (val, ok) = cell(ii, cj);
                cells[k] = val;
                valid[k] = ok;
            }
            fy[i * (ny + 1) + j] = vel * reconstruct(&cells, &valid, stencil);
        }
    }

    // Conservative divergence at wet centers.
    let mut div = vec![0.0; nx * ny];
    for i in 0..nx {
        for j in 0..ny {
            if masks.center[i * ny + j] {
                div[i * ny + j] = (fx[(i + 1) * ny + j] - fx[i * ny + j]) / dx
                    + (fy[i * (ny + 1) + j + 1] - fy[i * (ny + 1) + j]) / dy;
            }
        }
    }
    div
}
