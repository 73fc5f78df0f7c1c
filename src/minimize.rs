// src/minimize.rs
//
// Damping-only energy minimiser.
// One effective-field build per iteration.
//
// Update direction: d = (m × B) × m = B - m (m·B)
// This is the damping-only descent direction (up to a scalar factor).
//
// Only cells with Ms > 0 are updated; vacuum stays at m = 0 and is excluded
// from every torque statistic.
//
// Stop: max |m × B| < torque_threshold (Tesla), or a max-dm plateau that passes
// the torque gates, or a stalled mean torque, or the iteration cap.

use serde::{Deserialize, Serialize};

use crate::effective_field::exchange::{for_each_neighbour, harmonic_mean};
use crate::effective_field::{build_b_eff, FieldTerms};
use crate::grid::Grid3D;
use crate::material::MaterialField;
use crate::vec3::cross;
use crate::vector_field::VectorField3D;

use rayon::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizeSettings {
    pub torque_threshold: f64, // Tesla
    pub max_iters: usize,

    // Pseudo-step size for descent (1/Tesla). Capped internally by the exchange
    // stiffness of the mesh so the explicit update stays stable.
    pub lambda0: f64,
    pub lambda_min: f64,
    pub lambda_max: f64,
    pub grow: f64,
    pub shrink: f64,

    // Stall detection: mean torque fails to improve by `stall_rel` for `stall_iters` iterations.
    pub stall_iters: usize,
    pub stall_rel: f64,
    pub min_iters_before_stall: usize,

    /// Converge once the last `dm_samples` values of max |Δm| are all below this.
    pub dm_stop: Option<f64>,
    pub dm_samples: usize,

    /// Mean-torque gate for dm-based convergence. If dm_stop fires with the torque
    /// still above the gate, the report has `dm_converged=true`, `converged=false`.
    pub dm_torque_gate: Option<f64>,
    /// Max-torque gate, used alongside `dm_torque_gate`.
    pub dm_torque_gate_max: Option<f64>,
    pub dm_min_iters: usize,

    /// Rayon parallelism for the per-cell update/metric pass.
    pub parallel: bool,

    /// Log progress every N iterations at debug level (0 disables).
    pub log_every: usize,
}

impl Default for MinimizeSettings {
    fn default() -> Self {
        Self {
            torque_threshold: 5e-4,
            max_iters: 20_000,

            lambda0: 2e-2,
            lambda_min: 1e-5,
            lambda_max: 5e-2,
            grow: 1.05,
            shrink: 0.8,

            stall_iters: 5000,
            stall_rel: 5e-4,
            min_iters_before_stall: 500,

            dm_stop: Some(1e-6),
            dm_samples: 10,
            dm_torque_gate: Some(2e-3),
            dm_torque_gate_max: Some(5e-3),
            dm_min_iters: 50,

            parallel: false,

            log_every: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MinimizeReport {
    pub iters: usize,
    pub final_torque: f64,
    pub converged: bool,
    pub stalled: bool,
    pub final_max_dm: f64,
    pub dm_converged: bool,
    pub final_tmean: f64,
    pub final_lambda: f64,
}

/// Largest exchange stiffness Σ_n 2 A_in / (Ms_i d²) over magnetic cells (Tesla).
/// Steps above 1/bound are unstable for the highest-frequency exchange mode; the
/// minimiser caps lambda at half of that.
pub fn exchange_stiffness_bound(grid: &Grid3D, mat: &MaterialField) -> f64 {
    let mut bound: f64 = 0.0;
    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let idx = grid.idx(i, j, k);
                let ms = mat.ms[idx];
                if ms <= 0.0 {
                    continue;
                }
                let mut s = 0.0;
                for_each_neighbour(grid, i, j, k, |n, d| {
                    if mat.ms[n] > 0.0 {
                        s += 2.0 * harmonic_mean(mat.a_ex[idx], mat.a_ex[n]) / (ms * d * d);
                    }
                });
                bound = bound.max(s);
            }
        }
    }
    bound
}

/// One descent step on a single cell. Returns (|torque|, |Δm|).
#[inline]
fn descend_cell(mi: &mut [f64; 3], b: [f64; 3], lambda: f64) -> (f64, f64) {
    let m0 = *mi;
    let t = cross(m0, b);
    let tmag = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();

    let d = cross(t, m0);
    let mut x = m0[0] + lambda * d[0];
    let mut y = m0[1] + lambda * d[1];
    let mut z = m0[2] + lambda * d[2];

    let n2 = x * x + y * y + z * z;
    if n2 > 0.0 {
        let inv = 1.0 / n2.sqrt();
        x *= inv;
        y *= inv;
        z *= inv;
    }

    let (dx, dy, dz) = (x - m0[0], y - m0[1], z - m0[2]);
    *mi = [x, y, z];
    (tmag, (dx * dx + dy * dy + dz * dz).sqrt())
}

/// Minimise in-place. Returns report (converged/stalled).
pub fn minimize_damping_only(
    grid: &Grid3D,
    m: &mut VectorField3D,
    material: &MaterialField,
    b_ext: [f64; 3],
    terms: FieldTerms,
    settings: &MinimizeSettings,
) -> MinimizeReport {
    let active: Vec<bool> = material.magnetic_mask();
    let n_active = active.iter().filter(|&&a| a).count();
    m.zero_outside(&active);

    if n_active == 0 {
        return MinimizeReport {
            converged: true,
            ..MinimizeReport::default()
        };
    }

    let mut b_eff = VectorField3D::zeros(*grid);

    let stiffness = exchange_stiffness_bound(grid, material);
    let lambda_cap = if stiffness > 0.0 {
        settings.lambda_max.min(0.5 / stiffness)
    } else {
        settings.lambda_max
    };
    let lambda_floor = settings.lambda_min.min(lambda_cap);

    const CHUNK: usize = 2048;
    let use_parallel = settings.parallel;
    let n_chunks = m.data.len().div_ceil(CHUNK);
    // Per-chunk stats aggregated in a fixed order keep the parallel path deterministic.
    let mut stats_buf: Vec<(f64, f64, f64)> = vec![(0.0, 0.0, 0.0); n_chunks];

    let mut lambda = settings.lambda0.min(lambda_cap);
    let mut t_prev_mean = f64::INFINITY;
    let mut stall_count = 0usize;
    let mut dm_hist: VecDeque<f64> = VecDeque::new();
    let mut last_max_dm = f64::INFINITY;
    let mut last_tmax = f64::INFINITY;
    let mut last_tmean = f64::INFINITY;

    for it in 0..settings.max_iters {
        build_b_eff(grid, m, &mut b_eff, material, b_ext, terms);

        let mut tmax: f64 = 0.0;
        let mut tsum = 0.0;
        let mut max_dm: f64 = 0.0;

        if use_parallel {
            let lambda_step = lambda;
            stats_buf
                .par_iter_mut()
                .zip(
                    m.data
                        .par_chunks_mut(CHUNK)
                        .zip(b_eff.data.par_chunks(CHUNK))
                        .zip(active.par_chunks(CHUNK)),
                )
                .for_each(|(slot, ((m_chunk, b_chunk), a_chunk))| {
                    let mut ltmax: f64 = 0.0;
                    let mut ltsum = 0.0;
                    let mut lmax_dm: f64 = 0.0;
                    for ((mi, bi), &on) in m_chunk.iter_mut().zip(b_chunk.iter()).zip(a_chunk.iter()) {
                        if !on {
                            continue;
                        }
                        let (t, dm) = descend_cell(mi, *bi, lambda_step);
                        ltsum += t;
                        ltmax = ltmax.max(t);
                        lmax_dm = lmax_dm.max(dm);
                    }
                    *slot = (ltmax, ltsum, lmax_dm);
                });

            for &(ltmax, ltsum, lmax_dm) in stats_buf.iter() {
                tsum += ltsum;
                tmax = tmax.max(ltmax);
                max_dm = max_dm.max(lmax_dm);
            }
        } else {
            for ((mi, bi), &on) in m.data.iter_mut().zip(b_eff.data.iter()).zip(active.iter()) {
                if !on {
                    continue;
                }
                let (t, dm) = descend_cell(mi, *bi, lambda);
                tsum += t;
                tmax = tmax.max(t);
                max_dm = max_dm.max(dm);
            }
        }

        let tmean = tsum / n_active as f64;
        last_tmean = tmean;
        last_tmax = tmax;
        last_max_dm = max_dm;

        if settings.log_every > 0 && it % settings.log_every == 0 {
            log::debug!(
                "[minimize] it={}  tmax={:.3e}  tmean={:.3e}  lambda={:.3e}",
                it, tmax, tmean, lambda
            );
        }

        if tmax < settings.torque_threshold {
            return MinimizeReport {
                iters: it + 1,
                final_torque: tmax,
                converged: true,
                stalled: false,
                final_max_dm: max_dm,
                dm_converged: false,
                final_tmean: tmean,
                final_lambda: lambda,
            };
        }

        if let Some(dm_stop) = settings.dm_stop {
            if it + 1 >= settings.dm_min_iters {
                let samples = settings.dm_samples.max(1);
                dm_hist.push_back(max_dm);
                while dm_hist.len() > samples {
                    dm_hist.pop_front();
                }
                if dm_hist.len() == samples && dm_hist.iter().all(|&v| v < dm_stop) {
                    let mean_ok = settings.dm_torque_gate.map_or(true, |g| tmean <= g);
                    let max_ok = settings.dm_torque_gate_max.map_or(true, |g| tmax <= g);
                    return MinimizeReport {
                        iters: it + 1,
                        final_torque: tmax,
                        converged: mean_ok && max_ok,
                        stalled: false,
                        final_max_dm: max_dm,
                        dm_converged: true,
                        final_tmean: tmean,
                        final_lambda: lambda,
                    };
                }
            }
        }

        // step-size control on mean torque (no extra field builds)
        if tmean < t_prev_mean {
            lambda = (lambda * settings.grow).min(lambda_cap);
        } else {
            lambda = (lambda * settings.shrink).max(lambda_floor);
        }

        if it + 1 >= settings.min_iters_before_stall && t_prev_mean.is_finite() {
            let need = settings.stall_rel * t_prev_mean.abs().max(1e-30);
            if t_prev_mean - tmean <= need {
                stall_count += 1;
            } else {
                stall_count = 0;
            }
        }

        // Hitting lambda_min is not a stall by itself; only the plateau counter is.
        if stall_count >= settings.stall_iters {
            return MinimizeReport {
                iters: it + 1,
                final_torque: tmax,
                converged: false,
                stalled: true,
                final_max_dm: max_dm,
                dm_converged: false,
                final_tmean: tmean,
                final_lambda: lambda,
            };
        }

        t_prev_mean = tmean;
    }

    MinimizeReport {
        iters: settings.max_iters,
        final_torque: last_tmax,
        converged: false,
        stalled: false,
        final_max_dm: last_max_dm,
        dm_converged: false,
        final_tmean: last_tmean,
        final_lambda: lambda,
    }
}
