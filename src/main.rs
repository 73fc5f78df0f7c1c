// src/main.rs
//
// Temperature sweep driver for a core-shell nanoparticle.
//
// Outputs are written to `runs/<run_id>/` (or the directory given via `out=`):
//
//   runs/<run_id>/
//     ├── config.json          resolved configuration + run info
//     ├── sweep.csv            one row per temperature
//     ├── ovf/regions.ovf      region index per cell
//     ├── ovf/m_NNN_T*.ovf     relaxed magnetisation per sweep point
//     ├── ovf/ms_NNN_T*.ovf    per-cell Ms per sweep point
//     ├── m_vs_T.png
//     └── mz_slice_NNN_T*.png  mid-plane m_z per sweep point
//
// Examples:
//
//   cargo run --release -- temps=0,150,300,450 bext=0,0,0.05
//   cargo run --release -- config=particle.json out=runs/fe_fe3o4 carry=on
//   RUST_LOG=debug cargo run --release -- cell=2e-9 anis=off ovf=off

use std::env;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use coreshell_sim::config::{write_run_record, RunInfo, SimConfig};
use coreshell_sim::error::{SimError, SimResult};
use coreshell_sim::geometry::{region_map, Region};
use coreshell_sim::ovf::{write_magnetisation, write_ovf2, OvfData, OvfMeta};
use coreshell_sim::sweep::run_sweep;
use coreshell_sim::visualisation::{save_m_vs_t_plot, save_mz_slice_plot};

fn print_usage() {
    eprintln!(
        r#"Usage:
  coreshell_sim [config=FILE.json] [key=value ...]

Keys (override the JSON file / defaults):
  temps=T1,T2,...        temperatures in K
  r_core=M r_outer=M interface=M cell=M pad=N
  bext=BX,BY,BZ          applied induction in T
  anis=on|off
  init=uniform|random|vortex dir=X,Y,Z noise=VAL seed=N carry=on|off
  max_iters=N torque=VAL parallel=on|off
  out=DIR run=RUN_ID ovf=on|off ovf_format=text|binary4 plots=on|off

Logging level is taken from RUST_LOG (default: info).
"#
    );
}

fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn unix_now() -> Option<u64> {
    SystemTime::now().duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn unique_run_dir(out_root: &Path, run_id: &str) -> PathBuf {
    let dir = out_root.join(run_id);
    if !dir.exists() {
        return dir;
    }
    (1..1000)
        .map(|k| out_root.join(format!("{}_{}", run_id, k)))
        .find(|cand| !cand.exists())
        .unwrap_or(dir)
}

fn run(args: Vec<String>) -> SimResult<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut run_id: Option<String> = None;
    let mut overrides: Vec<(String, String)> = Vec::new();

    for arg in &args {
        if arg == "help" || arg == "--help" || arg == "-h" {
            print_usage();
            return Ok(());
        }
        let Some((k, v)) = arg.split_once('=') else {
            print_usage();
            return Err(SimError::Config(format!("expected key=value, got '{}'", arg)));
        };
        match k {
            "config" => config_path = Some(PathBuf::from(v)),
            "run" => run_id = Some(sanitize_run_id(v)),
            _ => overrides.push((k.to_string(), v.to_string())),
        }
    }

    let mut config = match &config_path {
        Some(p) => {
            log::info!("loading configuration from {:?}", p);
            SimConfig::from_json_file(p)?
        }
        None => SimConfig::default(),
    };
    for (k, v) in &overrides {
        config.apply_override(k, v)?;
    }
    config.validate()?;

    let out_root = PathBuf::from(&config.output.dir);
    let run_id = run_id.unwrap_or_else(|| format!("{}_coreshell", unix_now().unwrap_or(0)));
    let run_dir = unique_run_dir(&out_root, &run_id);
    create_dir_all(&run_dir)?;
    log::info!("writing outputs to {:?}", run_dir);

    let grid = config.build_grid();
    let run_info = RunInfo {
        binary: "coreshell_sim".to_string(),
        run_id: run_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        grid: [grid.nx, grid.ny, grid.nz],
        timestamp_unix: unix_now(),
    };
    write_run_record(&run_dir, &config, &run_info)?;

    let ovf_dir = run_dir.join("ovf");
    let output = config.output.clone();
    let init = config.sweep.init.kind;
    let geometry_line = format!(
        "Geometry: r_core {:e} m, interface {:e} m, r_outer {:e} m",
        config.geometry.r_core, config.geometry.interface_thickness, config.geometry.r_outer
    );

    if output.ovf {
        let regions = region_map(&grid, &config.geometry);
        let index: Vec<f64> = regions.iter().map(|r| *r as u8 as f64).collect();
        let mut meta = OvfMeta::scalar("region", "1");
        let legend = [Region::Core, Region::Interface, Region::Shell, Region::Vacuum]
            .iter()
            .map(|r| format!("{}={}", *r as u8, r.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        meta.push_desc_line(format!("Regions: {}", legend));
        meta.push_desc_line(geometry_line.clone());
        write_ovf2(&ovf_dir.join("regions.ovf"), &grid, OvfData::Scalar(&index), &meta, output.ovf_format)?;
    }

    let report = run_sweep(&config, |point, m, material| {
        let tag = point.file_tag();
        if output.ovf {
            let mut meta = OvfMeta::magnetization().with_temperature(point.temperature);
            meta.push_desc_line(geometry_line.clone());
            meta.push_desc_line(format!("Initial state: {}", init.as_str()));
            write_magnetisation(&ovf_dir.join(format!("m_{}.ovf", tag)), m, &meta, output.ovf_format)?;
            write_ovf2(
                &ovf_dir.join(format!("ms_{}.ovf", tag)),
                &m.grid,
                OvfData::Scalar(&material.ms),
                &OvfMeta::scalar("Ms", "A/m").with_temperature(point.temperature),
                output.ovf_format,
            )?;
        }
        if output.plots {
            let mask = material.magnetic_mask();
            let mid = m.grid.nz / 2;
            if let Err(e) = save_mz_slice_plot(m, &mask, mid, &run_dir.join(format!("mz_slice_{}.png", tag))) {
                log::warn!("could not draw m_z slice: {}", e);
            }
        }
        Ok(())
    })?;

    let csv = run_dir.join("sweep.csv");
    report.write_csv(&csv)?;
    log::info!("wrote {:?}", csv);

    if output.plots {
        if let Err(e) = save_m_vs_t_plot(&report, &run_dir.join("m_vs_T.png")) {
            log::warn!("could not draw m(T): {}", e);
        }
    }

    let unconverged = report.points.iter().filter(|p| !p.report.converged).count();
    if unconverged > 0 {
        log::warn!("{} of {} temperatures did not converge", unconverged, report.points.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
