// src/ovf.rs
//
// OOMMF OVF 2.0 rectangular-mesh writers:
//  - text data (MuMax-like)
//  - binary4 data (fast + compact)
//
// Supports vector fields (valuedim 3, e.g. m) and scalar fields (valuedim 1,
// e.g. per-cell Ms). Binary4 uses little-endian floats and starts with the OVF2
// check value 1234567.0f. Cell ordering is x fastest, then y, then z.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::Grid3D;
use crate::vector_field::VectorField3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvfFormat {
    Text,
    Binary4,
}

#[derive(Clone, Debug, Default)]
pub struct OvfMeta {
    pub title: String,
    pub desc_lines: Vec<String>,
    pub valuelabels: Vec<String>,
    pub valueunits: Vec<String>,
}

impl OvfMeta {
    pub fn magnetization() -> Self {
        Self {
            title: "m".to_string(),
            desc_lines: vec![],
            valuelabels: vec!["m_x".into(), "m_y".into(), "m_z".into()],
            valueunits: vec!["1".into(), "1".into(), "1".into()],
        }
    }

    pub fn scalar(title: &str, unit: &str) -> Self {
        Self {
            title: title.to_string(),
            desc_lines: vec![],
            valuelabels: vec![title.to_string()],
            valueunits: vec![unit.to_string()],
        }
    }

    pub fn with_temperature(mut self, t_k: f64) -> Self {
        self.desc_lines.push(format!("Temperature:  {:.6e}  K", t_k));
        self
    }

    pub fn push_desc_line<S: Into<String>>(&mut self, s: S) {
        self.desc_lines.push(s.into());
    }
}

/// Cell data to serialise.
#[derive(Clone, Copy, Debug)]
pub enum OvfData<'a> {
    Vector(&'a [[f64; 3]]),
    Scalar(&'a [f64]),
}

impl OvfData<'_> {
    fn len(&self) -> usize {
        match self {
            Self::Vector(v) => v.len(),
            Self::Scalar(v) => v.len(),
        }
    }

    fn valuedim(&self) -> usize {
        match self {
            Self::Vector(_) => 3,
            Self::Scalar(_) => 1,
        }
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(())
}

fn write_header<W: Write>(w: &mut W, grid: &Grid3D, meta: &OvfMeta, valuedim: usize) -> std::io::Result<()> {
    let ext = grid.extent();

    writeln!(w, "# OOMMF OVF 2.0")?;
    writeln!(w, "# Segment count: 1")?;
    writeln!(w, "# Begin: Segment")?;
    writeln!(w, "# Begin: Header")?;
    writeln!(w, "# Title: {}", meta.title)?;
    for d in &meta.desc_lines {
        writeln!(w, "# Desc: {}", d)?;
    }
    writeln!(w, "# meshtype: rectangular")?;
    writeln!(w, "# meshunit: m")?;

    writeln!(w, "# xmin: 0")?;
    writeln!(w, "# ymin: 0")?;
    writeln!(w, "# zmin: 0")?;
    writeln!(w, "# xmax: {:.16e}", ext[0])?;
    writeln!(w, "# ymax: {:.16e}", ext[1])?;
    writeln!(w, "# zmax: {:.16e}", ext[2])?;

    writeln!(w, "# valuedim: {}", valuedim)?;
    writeln!(w, "# valuelabels: {}", meta.valuelabels.join(" "))?;
    writeln!(w, "# valueunits: {}", meta.valueunits.join(" "))?;

    writeln!(w, "# xbase: {:.16e}", 0.5 * grid.dx)?;
    writeln!(w, "# ybase: {:.16e}", 0.5 * grid.dy)?;
    writeln!(w, "# zbase: {:.16e}", 0.5 * grid.dz)?;
    writeln!(w, "# xnodes: {}", grid.nx)?;
    writeln!(w, "# ynodes: {}", grid.ny)?;
    writeln!(w, "# znodes: {}", grid.nz)?;
    writeln!(w, "# xstepsize: {:.16e}", grid.dx)?;
    writeln!(w, "# ystepsize: {:.16e}", grid.dy)?;
    writeln!(w, "# zstepsize: {:.16e}", grid.dz)?;
    writeln!(w, "# End: Header")?;
    Ok(())
}

/// Write one OVF 2.0 file in the requested encoding.
pub fn write_ovf2(
    path: &Path,
    grid: &Grid3D,
    data: OvfData<'_>,
    meta: &OvfMeta,
    format: OvfFormat,
) -> std::io::Result<()> {
    if data.len() != grid.n_cells() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "OVF data length mismatch: got {}, expected {} (nx*ny*nz)",
                data.len(),
                grid.n_cells()
            ),
        ));
    }
    if meta.valuelabels.len() != data.valuedim() || meta.valueunits.len() != data.valuedim() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("OVF metadata does not describe {} components", data.valuedim()),
        ));
    }

    ensure_parent_dir(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    write_header(&mut w, grid, meta, data.valuedim())?;

    match format {
        OvfFormat::Text => {
            writeln!(w, "# Begin: Data Text")?;
            match data {
                OvfData::Vector(v) => {
                    for c in v {
                        writeln!(w, "{:.10e} {:.10e} {:.10e}", c[0], c[1], c[2])?;
                    }
                }
                OvfData::Scalar(v) => {
                    for c in v {
                        writeln!(w, "{:.10e}", c)?;
                    }
                }
            }
            writeln!(w, "# End: Data Text")?;
        }
        OvfFormat::Binary4 => {
            writeln!(w, "# Begin: Data Binary 4")?;
            let check: f32 = 1234567.0;
            w.write_all(&check.to_le_bytes())?;
            match data {
                OvfData::Vector(v) => {
                    for c in v {
                        for x in c {
                            w.write_all(&(*x as f32).to_le_bytes())?;
                        }
                    }
                }
                OvfData::Scalar(v) => {
                    for x in v {
                        w.write_all(&(*x as f32).to_le_bytes())?;
                    }
                }
            }
            writeln!(w)?;
            writeln!(w, "# End: Data Binary 4")?;
        }
    }

    writeln!(w, "# End: Segment")?;
    w.flush()
}

pub fn write_magnetisation(
    path: &Path,
    m: &VectorField3D,
    meta: &OvfMeta,
    format: OvfFormat,
) -> std::io::Result<()> {
    write_ovf2(path, &m.grid, OvfData::Vector(&m.data), meta, format)
}
