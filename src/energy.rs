// src/energy.rs

use serde::Serialize;

use crate::effective_field::anisotropy::anisotropy_energy;
use crate::effective_field::exchange::exchange_energy;
use crate::effective_field::zeeman::zeeman_energy;
use crate::effective_field::FieldTerms;
use crate::grid::Grid3D;
use crate::material::MaterialField;
use crate::vector_field::VectorField3D;

/// Micromagnetic energy terms in Joule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    pub exchange: f64,
    pub anisotropy: f64,
    pub zeeman: f64,
    pub total: f64,
}

/// Evaluate every enabled term.
pub fn compute_energy(
    grid: &Grid3D,
    m: &VectorField3D,
    mat: &MaterialField,
    b_ext: [f64; 3],
    terms: FieldTerms,
) -> EnergyBreakdown {
    let vol = grid.cell_volume();

    let exchange = exchange_energy(grid, m, mat);
    let anisotropy = if terms.anisotropy {
        anisotropy_energy(m, mat, vol)
    } else {
        0.0
    };
    let zeeman = if terms.zeeman {
        zeeman_energy(m, b_ext, mat, vol)
    } else {
        0.0
    };

    EnergyBreakdown {
        exchange,
        anisotropy,
        zeeman,
        total: exchange + anisotropy + zeeman,
    }
}
