// src/geometry.rs
//
// Radial core / interface / shell classifier for spherical particles.
//
// Conventions:
// - Positions are centred cell centres (origin at the mesh centre), in metres.
// - Band boundaries belong to the outer band; the particle surface r = r_outer
//   is inclusive so a cell sitting exactly on it is still shell.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::grid::Grid3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Core,
    Interface,
    Shell,
    Vacuum,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Interface => "interface",
            Self::Shell => "shell",
            Self::Vacuum => "vacuum",
        }
    }

    #[inline]
    pub fn is_magnetic(&self) -> bool {
        !matches!(self, Self::Vacuum)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreShellGeometry {
    pub r_core: f64,
    pub interface_thickness: f64,
    pub r_outer: f64,
    pub center: [f64; 3],
}

impl Default for CoreShellGeometry {
    fn default() -> Self {
        Self {
            r_core: 8e-9,
            interface_thickness: 1e-9,
            r_outer: 12e-9,
            center: [0.0; 3],
        }
    }
}

impl CoreShellGeometry {
    pub fn validate(&self) -> SimResult<()> {
        let finite = [self.r_core, self.interface_thickness, self.r_outer]
            .iter()
            .chain(self.center.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(SimError::Geometry("radii and centre must be finite".into()));
        }
        if self.r_core < 0.0 || self.interface_thickness < 0.0 || self.r_outer <= 0.0 {
            return Err(SimError::Geometry(format!(
                "radii must be non-negative and r_outer positive (r_core={:e}, interface={:e}, r_outer={:e})",
                self.r_core, self.interface_thickness, self.r_outer
            )));
        }
        if self.r_core + self.interface_thickness > self.r_outer {
            return Err(SimError::Geometry(format!(
                "core + interface ({:e} m) exceeds the particle radius ({:e} m)",
                self.r_core + self.interface_thickness,
                self.r_outer
            )));
        }
        Ok(())
    }

    /// Material region of the point `pos`.
    pub fn classify(&self, pos: [f64; 3]) -> Region {
        let dx = pos[0] - self.center[0];
        let dy = pos[1] - self.center[1];
        let dz = pos[2] - self.center[2];
        let r = (dx * dx + dy * dy + dz * dz).sqrt();

        if r < self.r_core {
            Region::Core
        } else if r < self.r_core + self.interface_thickness {
            Region::Interface
        } else if r <= self.r_outer {
            Region::Shell
        } else {
            Region::Vacuum
        }
    }
}

/// Classify every cell centre of `grid`.
pub fn region_map(grid: &Grid3D, geometry: &CoreShellGeometry) -> Vec<Region> {
    let mut regions = Vec::with_capacity(grid.n_cells());
    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                regions.push(geometry.classify(grid.cell_center_centered(i, j, k)));
            }
        }
    }
    regions
}

pub fn magnetic_mask(regions: &[Region]) -> Vec<bool> {
    regions.iter().map(Region::is_magnetic).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub core: usize,
    pub interface: usize,
    pub shell: usize,
    pub vacuum: usize,
}

impl RegionCounts {
    pub fn magnetic(&self) -> usize {
        self.core + self.interface + self.shell
    }
}

pub fn region_counts(regions: &[Region]) -> RegionCounts {
    let mut c = RegionCounts::default();
    for r in regions {
        match r {
            Region::Core => c.core += 1,
            Region::Interface => c.interface += 1,
            Region::Shell => c.shell += 1,
            Region::Vacuum => c.vacuum += 1,
        }
    }
    c
}
