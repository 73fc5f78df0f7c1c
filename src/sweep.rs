// src/sweep.rs
//
// Temperature sweep: for each temperature, rescale the per-region material
// parameters, relax the particle and record scalar observables.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{InitConfig, SimConfig};
use crate::energy::{compute_energy, EnergyBreakdown};
use crate::error::{SimError, SimResult};
use crate::geometry::{magnetic_mask, region_counts, region_map, CoreShellGeometry, Region, RegionCounts};
use crate::grid::Grid3D;
use crate::initial_states::{init_random, init_uniform_with_noise, init_vortex, InitKind};
use crate::material::MaterialField;
use crate::minimize::{minimize_damping_only, MinimizeReport};
use crate::vec3::{norm, normalize};
use crate::vector_field::VectorField3D;

/// Observables at one temperature.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepPoint {
    /// Position in the sweep; temperatures may repeat.
    pub index: usize,
    pub temperature: f64,
    /// Mean reduced magnetisation over cells that are magnetic at this temperature.
    pub m_avg: [f64; 3],
    pub m_norm: f64,
    /// Mean Ms·m over the whole particle volume (A/m).
    pub magnetisation: [f64; 3],
    /// Mean Ms over the particle volume (A/m).
    pub ms_avg: f64,
    pub core_m: [f64; 3],
    pub shell_m: [f64; 3],
    pub energy: EnergyBreakdown,
    pub report: MinimizeReport,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub grid: Grid3D,
    pub counts: RegionCounts,
    pub points: Vec<SweepPoint>,
}

impl SweepPoint {
    /// File-name stem unique within a sweep, e.g. `003_T0300p00`.
    pub fn file_tag(&self) -> String {
        format!("{:03}_T{:07.2}", self.index, self.temperature).replace('.', "p")
    }
}

impl SweepReport {
    pub fn write_csv(&self, path: &Path) -> SimResult<()> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(
            w,
            "index,temperature_K,mx,my,mz,m_norm,Mx_A_per_m,My_A_per_m,Mz_A_per_m,ms_avg_A_per_m,\
core_mz,shell_mz,e_exchange_J,e_anisotropy_J,e_zeeman_J,e_total_J,\
iters,converged,final_torque_T"
        )?;
        for p in &self.points {
            writeln!(
                w,
                "{},{:.6},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{:.9e},{},{},{:.6e}",
                p.index,
                p.temperature,
                p.m_avg[0],
                p.m_avg[1],
                p.m_avg[2],
                p.m_norm,
                p.magnetisation[0],
                p.magnetisation[1],
                p.magnetisation[2],
                p.ms_avg,
                p.core_m[2],
                p.shell_m[2],
                p.energy.exchange,
                p.energy.anisotropy,
                p.energy.zeeman,
                p.energy.total,
                p.report.iters,
                p.report.converged,
                p.report.final_torque,
            )?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }
}

/// Seed `m` inside `active` according to `init`. A vortex circulates about the
/// particle centre with a core the size of the magnetic core.
pub fn seed_state(m: &mut VectorField3D, init: &InitConfig, active: &[bool], geometry: &CoreShellGeometry) {
    match init.kind {
        InitKind::Uniform => init_uniform_with_noise(m, init.direction, init.noise, init.seed, active),
        InitKind::Random => init_random(m, init.seed, active),
        InitKind::Vortex => init_vortex(m, geometry.center, geometry.r_core, active),
    }
}

/// Keep the previous state where it exists; cells that have just become magnetic
/// take the seed direction and cells that lost their moment are cleared.
fn carry_state(m: &mut VectorField3D, init: &InitConfig, active: &[bool]) {
    let dir = normalize(init.direction);
    for (v, &on) in m.data.iter_mut().zip(active.iter()) {
        if !on {
            *v = [0.0; 3];
        } else if norm(*v) == 0.0 {
            *v = dir;
        }
    }
}

fn region_average(m: &VectorField3D, regions: &[Region], active: &[bool], which: Region) -> [f64; 3] {
    let mask: Vec<bool> = regions
        .iter()
        .zip(active.iter())
        .map(|(r, &on)| on && *r == which)
        .collect();
    m.average_over(&mask)
}

fn observe(
    index: usize,
    t: f64,
    m: &VectorField3D,
    material: &MaterialField,
    particle: &[bool],
    energy: EnergyBreakdown,
    report: MinimizeReport,
) -> SweepPoint {
    let active = material.magnetic_mask();
    let m_avg = m.average_over(&active);

    let n_particle = particle.iter().filter(|&&p| p).count().max(1) as f64;
    let mut mag = [0.0; 3];
    let mut ms_sum = 0.0;
    for ((v, &ms), &inside) in m.data.iter().zip(material.ms.iter()).zip(particle.iter()) {
        if !inside {
            continue;
        }
        ms_sum += ms;
        mag[0] += ms * v[0];
        mag[1] += ms * v[1];
        mag[2] += ms * v[2];
    }

    SweepPoint {
        index,
        temperature: t,
        m_avg,
        m_norm: norm(m_avg),
        magnetisation: [mag[0] / n_particle, mag[1] / n_particle, mag[2] / n_particle],
        ms_avg: ms_sum / n_particle,
        core_m: region_average(m, &material.region, &active, Region::Core),
        shell_m: region_average(m, &material.region, &active, Region::Shell),
        energy,
        report,
    }
}

/// Run the full sweep. `observer` sees every relaxed state (e.g. to write snapshots).
pub fn run_sweep<F>(config: &SimConfig, mut observer: F) -> SimResult<SweepReport>
where
    F: FnMut(&SweepPoint, &VectorField3D, &MaterialField) -> SimResult<()>,
{
    config.validate()?;

    let grid = config.build_grid();
    let regions = region_map(&grid, &config.geometry);
    let counts = region_counts(&regions);
    if counts.magnetic() == 0 {
        return Err(SimError::Geometry(format!(
            "no cell centre falls inside the particle (cell {:e} m, r_outer {:e} m)",
            config.mesh.cell_size, config.geometry.r_outer
        )));
    }
    let particle = magnetic_mask(&regions);

    log::info!(
        "grid {}x{}x{} (cell {:.2e} m): core={} interface={} shell={} vacuum={}",
        grid.nx,
        grid.ny,
        grid.nz,
        grid.dx,
        counts.core,
        counts.interface,
        counts.shell,
        counts.vacuum
    );

    let terms = config.fields.terms();
    let b_ext = config.fields.b_ext;
    let mut m = VectorField3D::zeros(grid);
    let mut points = Vec::with_capacity(config.sweep.temperatures.len());

    for (n, &t) in config.sweep.temperatures.iter().enumerate() {
        let material = MaterialField::at_temperature(&regions, &config.materials, t);
        let active = material.magnetic_mask();

        if n == 0 || !config.sweep.carry_state {
            seed_state(&mut m, &config.sweep.init, &active, &config.geometry);
        } else {
            carry_state(&mut m, &config.sweep.init, &active);
        }

        let report = minimize_damping_only(&grid, &mut m, &material, b_ext, terms, &config.minimizer);
        if !report.converged {
            log::warn!(
                "T={} K: minimiser did not converge (iters={}, max torque={:.3e} T, stalled={})",
                t,
                report.iters,
                report.final_torque,
                report.stalled
            );
        }

        let energy = compute_energy(&grid, &m, &material, b_ext, terms);
        let point = observe(n, t, &m, &material, &particle, energy, report);

        log::info!(
            "T={:>7.1} K  <m>=({:+.4}, {:+.4}, {:+.4})  |<m>|={:.4}  <Ms>={:.3e} A/m  E={:.4e} J  iters={}",
            t,
            point.m_avg[0],
            point.m_avg[1],
            point.m_avg[2],
            point.m_norm,
            point.ms_avg,
            point.energy.total,
            report.iters
        );

        observer(&point, &m, &material)?;
        points.push(point);
    }

    Ok(SweepReport { grid, counts, points })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_state_fills_new_cells_and_clears_dead_ones() {
        let grid = Grid3D::new(3, 1, 1, 1.0, 1.0, 1.0);
        let mut m = VectorField3D::zeros(grid);
        m.data[0] = [1.0, 0.0, 0.0];
        let init = InitConfig::default();
        carry_state(&mut m, &init, &[true, true, false]);
        assert_eq!(m.data[0], [1.0, 0.0, 0.0]);
        assert_eq!(m.data[1], [0.0, 0.0, 1.0]);
        assert_eq!(m.data[2], [0.0; 3]);
    }

    #[test]
    fn file_tags_stay_unique_for_repeated_temperatures() {
        let point = |index, temperature| SweepPoint {
            index,
            temperature,
            m_avg: [0.0; 3],
            m_norm: 0.0,
            magnetisation: [0.0; 3],
            ms_avg: 0.0,
            core_m: [0.0; 3],
            shell_m: [0.0; 3],
            energy: EnergyBreakdown::default(),
            report: MinimizeReport::default(),
        };
        assert_eq!(point(3, 300.0).file_tag(), "003_T0300p00");

        let tags: Vec<String> = [0.001, 0.004, 300.0, 300.0]
            .iter()
            .enumerate()
            .map(|(n, &t)| point(n, t).file_tag())
            .collect();
        for (a, tag) in tags.iter().enumerate() {
            assert!(tags[a + 1..].iter().all(|other| other != tag), "duplicate tag {}", tag);
        }
    }

    #[test]
    fn vortex_seed_follows_an_off_centre_particle() {
        let grid = Grid3D::new(8, 8, 1, 1.0, 1.0, 1.0);
        let geometry = CoreShellGeometry {
            r_core: 0.5,
            interface_thickness: 0.0,
            r_outer: 3.0,
            center: [1.0, 0.0, 0.0],
        };
        let init = InitConfig {
            kind: InitKind::Vortex,
            ..InitConfig::default()
        };
        let mut m = VectorField3D::zeros(grid);
        seed_state(&mut m, &init, &vec![true; grid.n_cells()], &geometry);
        // cell centre (3.5, 0.5): 2.5 right of the particle axis, so +y circulation
        let v = m.data[grid.idx(7, 4, 0)];
        assert!(v[1] > 0.9, "v={:?}", v);
        // cell centre (0.5, 0.5): right of the mesh centre but left of the particle axis
        let v = m.data[grid.idx(4, 4, 0)];
        assert!(v[1] < -0.5, "v={:?}", v);
    }

    #[test]
    fn region_average_only_counts_matching_cells() {
        let grid = Grid3D::new(3, 1, 1, 1.0, 1.0, 1.0);
        let mut m = VectorField3D::new(grid);
        m.data[2] = [1.0, 0.0, 0.0];
        let regions = [Region::Core, Region::Shell, Region::Shell];
        let shell = region_average(&m, &regions, &[true, true, false], Region::Shell);
        assert_eq!(shell, [0.0, 0.0, 1.0]);
        let core = region_average(&m, &regions, &[false, true, true], Region::Core);
        assert_eq!(core, [0.0; 3]);
    }
}
