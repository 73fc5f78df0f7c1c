// src/config.rs
//
// Run configuration: JSON on disk (serde), `key=value` overrides from the CLI,
// and the resolved record written next to the outputs as `config.json`.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::effective_field::FieldTerms;
use crate::error::{SimError, SimResult};
use crate::geometry::CoreShellGeometry;
use crate::grid::Grid3D;
use crate::initial_states::InitKind;
use crate::material::MaterialSet;
use crate::minimize::MinimizeSettings;
use crate::ovf::OvfFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub geometry: CoreShellGeometry,
    pub materials: MaterialSet,
    pub mesh: MeshConfig,
    pub fields: FieldConfig,
    pub sweep: SweepConfig,
    pub minimizer: MinimizeSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Cubic cell edge (m).
    pub cell_size: f64,
    /// Extra vacuum cells on every side of the particle.
    pub padding_cells: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.5e-9,
            padding_cells: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Applied induction (T).
    pub b_ext: [f64; 3],
    pub anisotropy: bool,
    pub zeeman: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let t = FieldTerms::default();
        Self {
            b_ext: [0.0; 3],
            anisotropy: t.anisotropy,
            zeeman: t.zeeman,
        }
    }
}

impl FieldConfig {
    pub fn terms(&self) -> FieldTerms {
        FieldTerms {
            anisotropy: self.anisotropy,
            zeeman: self.zeeman,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub kind: InitKind,
    pub direction: [f64; 3],
    /// Random tilt amplitude added to every cell (0 = perfectly uniform).
    pub noise: f64,
    pub seed: u64,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            kind: InitKind::Uniform,
            direction: [0.0, 0.0, 1.0],
            noise: 0.05,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Temperatures in K, visited in order.
    pub temperatures: Vec<f64>,
    pub init: InitConfig,
    /// Start each temperature from the previous relaxed state instead of re-seeding.
    pub carry_state: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            temperatures: vec![0.0, 100.0, 200.0, 300.0],
            init: InitConfig::default(),
            carry_state: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub ovf: bool,
    pub ovf_format: OvfFormat,
    pub plots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "runs".to_string(),
            ovf: true,
            ovf_format: OvfFormat::Binary4,
            plots: true,
        }
    }
}

/// Largest mesh `validate` accepts (2^27 cells, a few GB of working fields).
pub const MAX_CELLS: usize = 1 << 27;

impl SimConfig {
    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let file = File::open(path)?;
        let cfg: SimConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.geometry.validate()?;

        let cell = self.mesh.cell_size;
        if !(cell.is_finite() && cell > 0.0) {
            return Err(SimError::Config(format!("cell_size must be positive, got {:e}", cell)));
        }
        if cell > self.geometry.r_outer {
            return Err(SimError::Config(format!(
                "cell_size {:e} m is larger than the particle radius {:e} m",
                cell, self.geometry.r_outer
            )));
        }
        self.check_mesh_size()?;
        self.materials.validate()?;

        if self.sweep.temperatures.is_empty() {
            return Err(SimError::Config("temperature list is empty".into()));
        }
        if let Some(t) = self
            .sweep
            .temperatures
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return Err(SimError::Config(format!("invalid temperature {} K", t)));
        }
        if self.minimizer.max_iters == 0 {
            return Err(SimError::Config("minimizer.max_iters must be > 0".into()));
        }
        Ok(())
    }

    /// Half-width of the mesh: particle reach from the origin plus padding.
    fn mesh_half_width(&self) -> f64 {
        let cell = self.mesh.cell_size;
        let pad = self.mesh.padding_cells as f64 * cell;
        let reach = self.geometry.r_outer
            + self
                .geometry
                .center
                .iter()
                .fold(0.0_f64, |acc, c| acc.max(c.abs()));
        reach + pad
    }

    /// Reject meshes whose cell count overflows or exceeds `MAX_CELLS`.
    fn check_mesh_size(&self) -> SimResult<()> {
        let per_axis = (2.0 * self.mesh_half_width() / self.mesh.cell_size).ceil();
        let too_big = || {
            SimError::Config(format!(
                "mesh of {:.3e} cells per axis exceeds the limit of {} cells",
                per_axis, MAX_CELLS
            ))
        };
        if !(per_axis.is_finite() && per_axis <= MAX_CELLS as f64) {
            return Err(too_big());
        }
        let n = (per_axis as usize).max(1);
        n.checked_mul(n)
            .and_then(|nn| nn.checked_mul(n))
            .filter(|&cells| cells <= MAX_CELLS)
            .map(|_| ())
            .ok_or_else(too_big)
    }

    /// Mesh enclosing the particle (plus padding), centred on the origin.
    pub fn build_grid(&self) -> Grid3D {
        Grid3D::enclosing_sphere(self.mesh_half_width(), self.mesh.cell_size)
    }

    /// Apply one `key=value` override from the command line.
    pub fn apply_override(&mut self, key: &str, value: &str) -> SimResult<()> {
        match key {
            "temps" | "temperatures" => self.sweep.temperatures = parse_list(key, value)?,
            "cell" => self.mesh.cell_size = parse_f64(key, value)?,
            "pad" => self.mesh.padding_cells = parse_usize(key, value)?,
            "r_core" => self.geometry.r_core = parse_f64(key, value)?,
            "interface" => self.geometry.interface_thickness = parse_f64(key, value)?,
            "r_outer" => self.geometry.r_outer = parse_f64(key, value)?,
            "bext" => self.fields.b_ext = parse_vec3(key, value)?,
            "anis" | "anisotropy" => self.fields.anisotropy = parse_on_off(key, value)?,
            "init" => {
                self.sweep.init.kind = match value {
                    "uniform" => InitKind::Uniform,
                    "random" => InitKind::Random,
                    "vortex" => InitKind::Vortex,
                    _ => return Err(bad_value(key, value)),
                }
            }
            "dir" => self.sweep.init.direction = parse_vec3(key, value)?,
            "noise" => self.sweep.init.noise = parse_f64(key, value)?,
            "seed" => self.sweep.init.seed = parse_usize(key, value)? as u64,
            "carry" => self.sweep.carry_state = parse_on_off(key, value)?,
            "max_iters" => self.minimizer.max_iters = parse_usize(key, value)?,
            "torque" => self.minimizer.torque_threshold = parse_f64(key, value)?,
            "parallel" => self.minimizer.parallel = parse_on_off(key, value)?,
            "out" => self.output.dir = value.to_string(),
            "ovf" => self.output.ovf = parse_on_off(key, value)?,
            "ovf_format" => {
                self.output.ovf_format = match value {
                    "text" => OvfFormat::Text,
                    "binary4" | "bin" => OvfFormat::Binary4,
                    _ => return Err(bad_value(key, value)),
                }
            }
            "plots" => self.output.plots = parse_on_off(key, value)?,
            _ => return Err(SimError::Config(format!("unknown option '{}'", key))),
        }
        Ok(())
    }
}

fn bad_value(key: &str, value: &str) -> SimError {
    SimError::Config(format!("invalid value '{}' for '{}'", value, key))
}

fn parse_f64(key: &str, value: &str) -> SimResult<f64> {
    value.trim().parse::<f64>().map_err(|_| bad_value(key, value))
}

fn parse_usize(key: &str, value: &str) -> SimResult<usize> {
    value.trim().parse::<usize>().map_err(|_| bad_value(key, value))
}

fn parse_on_off(key: &str, value: &str) -> SimResult<bool> {
    match value {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(bad_value(key, value)),
    }
}

fn parse_list(key: &str, value: &str) -> SimResult<Vec<f64>> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_f64(key, s))
        .collect()
}

fn parse_vec3(key: &str, value: &str) -> SimResult<[f64; 3]> {
    let v = parse_list(key, value)?;
    match v.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(bad_value(key, value)),
    }
}

/// Provenance block written next to the resolved configuration.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
    pub version: String,
    pub grid: [usize; 3],
    pub timestamp_unix: Option<u64>,
}

#[derive(Serialize)]
struct RunRecord<'a> {
    config: &'a SimConfig,
    run: &'a RunInfo,
}

pub fn write_run_record(out_dir: &Path, config: &SimConfig, run: &RunInfo) -> SimResult<()> {
    let file = File::create(out_dir.join("config.json"))?;
    serde_json::to_writer_pretty(file, &RunRecord { config, run })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::RegionMaterial;

    #[test]
    fn defaults_validate() {
        let cfg = SimConfig::default();
        cfg.validate().unwrap();
        let g = cfg.build_grid();
        assert_eq!(g.nx, 16); // 24 nm / 1.5 nm
        assert_eq!(g.nx, g.nz);
    }

    #[test]
    fn default_seed_carries_symmetry_breaking_noise() {
        let init = SimConfig::default().sweep.init;
        assert_eq!(init.kind, InitKind::Uniform);
        assert!(init.noise > 0.0 && init.noise < 0.2);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "geometry": { "r_core": 5e-9, "r_outer": 9e-9 },
            "sweep": { "temperatures": [10, 300] },
            "fields": { "zeeman": false }
        }"#;
        let cfg: SimConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.geometry.r_core, 5e-9);
        assert_eq!(cfg.geometry.interface_thickness, 1e-9);
        assert_eq!(cfg.sweep.temperatures, vec![10.0, 300.0]);
        assert!(!cfg.fields.zeeman);
        assert!(cfg.fields.anisotropy);
        assert_eq!(cfg.minimizer.max_iters, MinimizeSettings::default().max_iters);
        cfg.validate().unwrap();
    }

    #[test]
    fn overrides_parse_and_reject_garbage() {
        let mut cfg = SimConfig::default();
        cfg.apply_override("temps", "0,150,450").unwrap();
        cfg.apply_override("bext", "0,0,0.05").unwrap();
        cfg.apply_override("anis", "off").unwrap();
        cfg.apply_override("ovf_format", "text").unwrap();
        assert_eq!(cfg.sweep.temperatures, vec![0.0, 150.0, 450.0]);
        assert_eq!(cfg.fields.b_ext, [0.0, 0.0, 0.05]);
        assert!(!cfg.fields.anisotropy);
        assert_eq!(cfg.output.ovf_format, OvfFormat::Text);

        assert!(cfg.apply_override("carry", "maybe").is_err());
        assert!(cfg.apply_override("bext", "1,2").is_err());
        assert!(cfg.apply_override("nonsense", "1").is_err());
    }

    #[test]
    fn validate_catches_bad_sweeps_and_mesh() {
        let mut cfg = SimConfig::default();
        cfg.sweep.temperatures.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.sweep.temperatures = vec![100.0, -5.0];
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.mesh.cell_size = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.geometry.r_core = 20e-9;
        assert!(matches!(cfg.validate(), Err(SimError::Geometry(_))));
    }

    #[test]
    fn validate_rejects_meshes_too_large_to_allocate() {
        let mut cfg = SimConfig::default();
        cfg.mesh.cell_size = 1e-20;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        // 600^3 cells: each axis fits, the product is over the cap
        let mut cfg = SimConfig::default();
        cfg.mesh.cell_size = 2.0 * cfg.geometry.r_outer / 600.0;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        let mut cfg = SimConfig::default();
        cfg.mesh.padding_cells = usize::MAX;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        // 500^3 is under the cap
        let mut cfg = SimConfig::default();
        cfg.mesh.cell_size = 2.0 * cfg.geometry.r_outer / 500.0;
        cfg.validate().unwrap();
        assert!(cfg.build_grid().n_cells() <= MAX_CELLS);
    }

    #[test]
    fn validate_rejects_negative_material_parameters() {
        let mut cfg = SimConfig::default();
        cfg.materials.shell.a0 = -1e-12;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        let mut cfg = SimConfig::default();
        cfg.materials.core.ms0 = -1.0;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));

        let mut cfg = SimConfig::default();
        cfg.materials.interface = Some(RegionMaterial {
            tc: -10.0,
            ..cfg.materials.core
        });
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn run_record_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SimConfig::default();
        let run = RunInfo {
            binary: "test".into(),
            run_id: "r1".into(),
            version: "0".into(),
            grid: [1, 1, 1],
            timestamp_unix: None,
        };
        write_run_record(dir.path(), &cfg, &run).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("config.json")).unwrap()).unwrap();
        assert_eq!(v["run"]["run_id"], "r1");
        assert_eq!(v["config"]["sweep"]["temperatures"][3], 300.0);
    }
}
