// tests/sweep.rs
//
// End-to-end temperature sweeps on a small core-shell particle.

use coreshell_sim::config::SimConfig;
use coreshell_sim::error::SimError;
use coreshell_sim::geometry::CoreShellGeometry;
use coreshell_sim::sweep::run_sweep;

fn small_config() -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.geometry = CoreShellGeometry {
        r_core: 2e-9,
        interface_thickness: 0.5e-9,
        r_outer: 4e-9,
        center: [0.0; 3],
    };
    cfg.mesh.cell_size = 1e-9;
    cfg.sweep.init.noise = 0.0;
    cfg.output.ovf = false;
    cfg.output.plots = false;
    cfg
}

#[test]
fn sweep_tracks_curie_temperatures_of_each_region() {
    let mut cfg = small_config();
    // shell Tc = 858 K, interface 950.5 K, core 1043 K
    cfg.sweep.temperatures = vec![0.0, 300.0, 900.0, 1100.0];

    let mut seen = Vec::new();
    let report = run_sweep(&cfg, |p, m, material| {
        assert_eq!(m.data.len(), material.len());
        assert_eq!(p.index, seen.len());
        seen.push(p.temperature);
        Ok(())
    })
    .unwrap();

    assert_eq!(seen, cfg.sweep.temperatures);
    assert_eq!(report.points.len(), 4);
    assert_eq!(report.grid.nx, 8);
    assert!(report.counts.core > 0 && report.counts.shell > 0);

    let p = &report.points;
    assert!(p[0].ms_avg > p[1].ms_avg && p[1].ms_avg > p[2].ms_avg && p[2].ms_avg > p[3].ms_avg);
    assert_eq!(p[3].ms_avg, 0.0);
    assert_eq!(p[3].m_norm, 0.0);

    // above the shell Curie point only the core and interface remain magnetic
    assert_eq!(p[2].shell_m, [0.0; 3]);
    assert!(p[2].core_m[2] > 0.99);

    for point in &p[..3] {
        assert!(point.report.converged, "T={} {:?}", point.temperature, point.report);
        assert!(point.m_norm > 0.999, "T={} |<m>|={}", point.temperature, point.m_norm);
        assert!(point.magnetisation[2] > 0.0);
    }
}

#[test]
fn carried_state_reseeds_shell_after_cooling_below_its_curie_point() {
    let mut cfg = small_config();
    cfg.sweep.temperatures = vec![900.0, 0.0];
    cfg.sweep.carry_state = true;

    let report = run_sweep(&cfg, |_, m, material| {
        // vacuum and paramagnetic cells never carry a moment
        for (v, &ms) in m.data.iter().zip(material.ms.iter()) {
            if ms == 0.0 {
                assert_eq!(*v, [0.0; 3]);
            }
        }
        Ok(())
    })
    .unwrap();

    let hot = &report.points[0];
    let cold = &report.points[1];
    assert_eq!(hot.shell_m, [0.0; 3]);
    assert!(cold.shell_m[2] > 0.99, "shell <m>={:?}", cold.shell_m);
    assert!(cold.ms_avg > hot.ms_avg);
}

#[test]
fn continuing_from_a_relaxed_state_does_not_raise_the_energy() {
    let mut cfg = small_config();
    cfg.sweep.temperatures = vec![300.0, 300.0];
    cfg.sweep.carry_state = true;
    cfg.sweep.init.kind = coreshell_sim::initial_states::InitKind::Random;
    cfg.sweep.init.seed = 5;
    cfg.minimizer.max_iters = 1500;

    let report = run_sweep(&cfg, |_, _, _| Ok(())).unwrap();
    let (first, second) = (&report.points[0], &report.points[1]);
    assert!(second.report.iters <= first.report.iters);
    let tol = 1e-9 * first.energy.total.abs().max(1e-30);
    assert!(
        second.energy.total <= first.energy.total + tol,
        "first={:?} second={:?}",
        first.energy,
        second.energy
    );
}

#[test]
fn default_seed_is_noisy_enough_to_need_relaxing() {
    let mut cfg = small_config();
    cfg.sweep.init = SimConfig::default().sweep.init;
    cfg.sweep.temperatures = vec![300.0];

    let report = run_sweep(&cfg, |_, _, _| Ok(())).unwrap();
    let p = &report.points[0];
    assert!(p.report.iters > 1, "{:?}", p.report);
    assert!(p.m_norm > 0.99, "|<m>|={}", p.m_norm);
    assert!(p.m_avg[2] > 0.99);
    assert!(p.energy.total >= 0.0);
}

#[test]
fn csv_has_one_row_per_temperature() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = small_config();
    cfg.sweep.temperatures = vec![0.0, 500.0];

    let report = run_sweep(&cfg, |_, _, _| Ok(())).unwrap();
    let path = dir.path().join("sweep.csv");
    report.write_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("index,temperature_K,"));
    let cols = lines[0].split(',').count();
    assert!(lines[1..].iter().all(|l| l.split(',').count() == cols));
    assert!(lines[2].starts_with("1,500.000000,"));
}

#[test]
fn invalid_sweeps_are_rejected() {
    let mut cfg = small_config();
    cfg.sweep.temperatures.clear();
    assert!(matches!(run_sweep(&cfg, |_, _, _| Ok(())), Err(SimError::Config(_))));

    let mut cfg = small_config();
    cfg.geometry.interface_thickness = 3e-9;
    assert!(matches!(run_sweep(&cfg, |_, _, _| Ok(())), Err(SimError::Geometry(_))));
}

#[test]
fn observer_errors_abort_the_sweep() {
    let cfg = small_config();
    let mut calls = 0;
    let res = run_sweep(&cfg, |_, _, _| {
        calls += 1;
        Err(SimError::Plot("stop".into()))
    });
    assert!(res.is_err());
    assert_eq!(calls, 1);
}
