//! One-layer vortex / wall interaction run.
//!
//! A Rankine-like vortex spins up next to a thin wall strip; the
//! capacitance-matrix correction keeps the streamfunction pinned to
//! zero along the wall while the vortex sheds filaments around it.
//!
//! Run with: `cargo run --release --example vortex_wall`

use qg_rs::{ModelError, QgModel, QgParams};

fn main() -> Result<(), ModelError> {
    let (nx, ny) = (256usize, 256usize);
    let l = 100_000.0_f64;

    // Burger and Rossby numbers fix the Coriolis parameter and the
    // vortex amplitude.
    let bu = 1.0_f64;
    let ro = 0.01_f64;
    let r0 = l / 16.0;

    let h = 1000.0_f64;
    let g_prime = 10.0_f64;
    let f0 = (g_prime * h / bu / (r0 * r0)).sqrt();

    // Thin wall strip reaching a quarter of the way into the domain.
    let mut mask = vec![true; nx * ny];
    for i in nx / 2..nx / 2 + 2 {
        for j in 0..ny / 4 {
            mask[i * ny + j] = false;
        }
    }

    let params = QgParams {
        nx,
        ny,
        nl: 1,
        n_ens: 1,
        lx: l,
        ly: l,
        h: vec![h],
        g_prime: vec![g_prime],
        f0,
        beta: 0.0,
        tau0: 0.0,
        bottom_drag_coef: 0.0,
        flux_stencil: 5,
        dt: 0.0,
        mask: Some(mask),
    };
    let mut model = QgModel::new(params)?;
    println!(
        "grid {}x{}, {} irregular boundary points",
        nx,
        ny,
        model.n_irregular_points()
    );

    // Soft-edged vortex south-west of the wall tip, normalized to unit
    // mean PV before amplitude scaling.
    let (x_vor, y_vor) = (l / 4.0, l / 2.0 - 6.0 * l / 14.0);
    let (dx, dy) = (model.grid.dx, model.grid.dy);
    let mut total = 0.0;
    let mut pv = vec![0.0; nx * ny];
    for i in 0..nx {
        for j in 0..ny {
            let x = (i as f64 + 0.5) * dx;
            let y = (j as f64 + 0.5) * dy;
            let r = ((x - x_vor).powi(2) + (y - y_vor).powi(2)).sqrt();
            let v = 1.0 / (1.0 + (-(r0 - r) / 100.0).exp());
            pv[i * ny + j] = v;
            total += v;
        }
    }
    let mean = total / (nx * ny) as f64;
    for i in 0..nx {
        for j in 0..ny {
            model.q_mut().set(0, 0, i, j, pv[i * ny + j] / mean);
        }
    }
    model.invert_pv();

    // Rescale so the peak velocity matches the target Rossby number.
    let u_norm_max = model.max_speed();
    let factor = ro * f0 * r0 / u_norm_max;
    model.q_mut().scale(factor);
    model.invert_pv();

    let u_max = model.max_speed();
    println!("u_max {:.2e} m/s", u_max);

    let cfl = 0.3;
    let dt = cfl * dx.min(dy) / u_max;
    model.set_dt(dt);

    // Eddy turnover time from the rms initial vorticity.
    let omega = model.vorticity();
    let omega_rms =
        (omega.data.iter().map(|w| w * w).sum::<f64>() / omega.data.len() as f64).sqrt();
    let tau = 1.0 / omega_rms;
    println!("tau = {:.2} f0^-1, dt = {:.2} s", tau * f0, dt);

    let t_end = 22.0 * tau;
    let n_steps = (t_end / dt) as usize + 1;
    let freq_checknan = 10;
    let freq_log = 200;

    for n in 1..=n_steps {
        model.step();

        if n % freq_checknan == 0 && model.has_non_finite() {
            eprintln!("stopping, non-finite value in psi at iteration {}", n);
            std::process::exit(1);
        }

        if n % freq_log == 0 {
            let (u, v) = model.velocities();
            let u_mean = u.sum() / u.data.len() as f64;
            let v_mean = v.sum() / v.data.len() as f64;
            let q_min = model.q().data.iter().fold(f64::INFINITY, |m, &q| m.min(q));
            println!(
                "n={:06}, t={:.2} tau, u: {:+.1e}, {:.1e}, v: {:+.1e}, {:.2e}, q min: {:+.3e}",
                n,
                model.time() / tau,
                u_mean,
                u.max_abs(),
                v_mean,
                v.max_abs(),
                q_min
            );
        }
    }

    println!("done, t = {:.2} tau after {} steps", model.time() / tau, n_steps);
    Ok(())
}
