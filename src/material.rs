// src/material.rs

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::geometry::Region;
use crate::temperature::ScalingLaw;
use crate::vec3::normalize;

/// Zero-temperature parameters of one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionMaterial {
    /// Saturation magnetisation at 0 K (A/m).
    pub ms0: f64,
    /// Exchange stiffness at 0 K (J/m).
    pub a0: f64,
    /// Uniaxial anisotropy constant at 0 K (J/m^3).
    pub ku0: f64,
    pub easy_axis: [f64; 3],
    /// Curie temperature (K).
    pub tc: f64,
}

impl RegionMaterial {
    /// Ms, A and Tc must be finite and non-negative; Ku may be negative (easy plane).
    pub fn validate(&self, name: &str) -> SimResult<()> {
        let checks = [("ms0", self.ms0), ("a0", self.a0), ("tc", self.tc)];
        if let Some((key, v)) = checks.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            return Err(SimError::Config(format!(
                "materials.{}.{} must be finite and non-negative, got {}",
                name, key, v
            )));
        }
        if !self.ku0.is_finite() || !self.easy_axis.iter().all(|c| c.is_finite()) {
            return Err(SimError::Config(format!(
                "materials.{}: ku0 and easy_axis must be finite",
                name
            )));
        }
        Ok(())
    }

    /// Parameter-wise mean of two materials (easy axis taken from `a`).
    pub fn mean(a: &RegionMaterial, b: &RegionMaterial) -> Self {
        Self {
            ms0: 0.5 * (a.ms0 + b.ms0),
            a0: 0.5 * (a.a0 + b.a0),
            ku0: 0.5 * (a.ku0 + b.ku0),
            easy_axis: a.easy_axis,
            tc: 0.5 * (a.tc + b.tc),
        }
    }
}

/// Materials of all regions plus the temperature laws applied to them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSet {
    pub core: RegionMaterial,
    /// `None` uses the mean of core and shell.
    pub interface: Option<RegionMaterial>,
    pub shell: RegionMaterial,
    pub scaling: ScalingLaw,
}

impl Default for MaterialSet {
    /// bcc Fe core in a magnetite (Fe3O4) shell.
    fn default() -> Self {
        Self {
            core: RegionMaterial {
                ms0: 1.71e6,
                a0: 2.1e-11,
                ku0: 4.8e4,
                easy_axis: [0.0, 0.0, 1.0],
                tc: 1043.0,
            },
            interface: None,
            shell: RegionMaterial {
                ms0: 4.8e5,
                a0: 1.3e-11,
                ku0: 1.1e4,
                easy_axis: [0.0, 0.0, 1.0],
                tc: 858.0,
            },
            scaling: ScalingLaw::default(),
        }
    }
}

impl MaterialSet {
    pub fn validate(&self) -> SimResult<()> {
        self.core.validate("core")?;
        if let Some(interface) = &self.interface {
            interface.validate("interface")?;
        }
        self.shell.validate("shell")?;

        let law = &self.scaling;
        if !(law.beta.is_finite() && law.beta > 0.0) {
            return Err(SimError::Config(format!(
                "materials.scaling.beta must be positive, got {}",
                law.beta
            )));
        }
        for (key, v) in [
            ("exchange_exponent", law.exchange_exponent),
            ("anisotropy_exponent", law.anisotropy_exponent),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SimError::Config(format!(
                    "materials.scaling.{} must be finite and non-negative, got {}",
                    key, v
                )));
            }
        }
        Ok(())
    }

    pub fn region(&self, region: Region) -> Option<RegionMaterial> {
        match region {
            Region::Core => Some(self.core),
            Region::Interface => Some(
                self.interface
                    .unwrap_or_else(|| RegionMaterial::mean(&self.core, &self.shell)),
            ),
            Region::Shell => Some(self.shell),
            Region::Vacuum => None,
        }
    }

    /// (Ms, A, Ku) of `region` at temperature `t`. Vacuum is all zero.
    pub fn params_at(&self, region: Region, t: f64) -> (f64, f64, f64) {
        match self.region(region) {
            Some(mat) => (
                self.scaling.ms(mat.ms0, t, mat.tc),
                self.scaling.exchange(mat.a0, t, mat.tc),
                self.scaling.anisotropy(mat.ku0, t, mat.tc),
            ),
            None => (0.0, 0.0, 0.0),
        }
    }
}

/// Per-cell material parameters at one temperature.
#[derive(Debug, Clone)]
pub struct MaterialField {
    pub temperature: f64,
    pub region: Vec<Region>,
    pub ms: Vec<f64>,
    pub a_ex: Vec<f64>,
    pub k_u: Vec<f64>,
    pub easy_axis: Vec<[f64; 3]>,
}

impl MaterialField {
    pub fn at_temperature(regions: &[Region], set: &MaterialSet, t: f64) -> Self {
        let n = regions.len();
        let mut field = Self {
            temperature: t,
            region: regions.to_vec(),
            ms: Vec::with_capacity(n),
            a_ex: Vec::with_capacity(n),
            k_u: Vec::with_capacity(n),
            easy_axis: Vec::with_capacity(n),
        };

        // Evaluate each region once; every cell of a region shares its values.
        let lookup = |r: Region| {
            let (ms, a, k) = set.params_at(r, t);
            let u = set
                .region(r)
                .map(|m| normalize(m.easy_axis))
                .unwrap_or([0.0; 3]);
            (ms, a, k, u)
        };
        let table = [
            lookup(Region::Core),
            lookup(Region::Interface),
            lookup(Region::Shell),
            lookup(Region::Vacuum),
        ];

        for r in regions {
            let (ms, a, k, u) = table[region_slot(*r)];
            field.ms.push(ms);
            field.a_ex.push(a);
            field.k_u.push(k);
            field.easy_axis.push(u);
        }
        field
    }

    pub fn len(&self) -> usize {
        self.ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ms.is_empty()
    }

    /// Cells that carry magnetisation at this temperature (Ms > 0).
    pub fn magnetic_mask(&self) -> Vec<bool> {
        self.ms.iter().map(|&ms| ms > 0.0).collect()
    }

    /// Mean Ms over the cells of `region` (0 if the region is empty).
    pub fn mean_ms_in(&self, region: Region) -> f64 {
        let mut sum = 0.0;
        let mut n = 0usize;
        for (r, ms) in self.region.iter().zip(self.ms.iter()) {
            if *r == region {
                sum += ms;
                n += 1;
            }
        }
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}

#[inline]
fn region_slot(r: Region) -> usize {
    match r {
        Region::Core => 0,
        Region::Interface => 1,
        Region::Shell => 2,
        Region::Vacuum => 3,
    }
}
