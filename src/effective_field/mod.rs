// src/effective_field/mod.rs
//
// Effective induction B_eff (Tesla) = -(1/Ms) δE/δm, summed over the enabled terms.
pub mod anisotropy;
pub mod exchange;
pub mod zeeman;

use serde::{Deserialize, Serialize};

use crate::grid::Grid3D;
use crate::material::MaterialField;
use crate::vector_field::VectorField3D;

/// Which optional energy terms take part. Exchange is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldTerms {
    pub anisotropy: bool,
    pub zeeman: bool,
}

impl Default for FieldTerms {
    fn default() -> Self {
        Self {
            anisotropy: true,
            zeeman: true,
        }
    }
}

impl FieldTerms {
    pub fn exchange_only() -> Self {
        Self {
            anisotropy: false,
            zeeman: false,
        }
    }
}

/// Build B_eff into `b_eff` (overwrites). Vacuum cells end up with B = 0.
pub fn build_b_eff(
    grid: &Grid3D,
    m: &VectorField3D,
    b_eff: &mut VectorField3D,
    mat: &MaterialField,
    b_ext: [f64; 3],
    terms: FieldTerms,
) {
    b_eff.set_uniform(0.0, 0.0, 0.0);

    if terms.zeeman {
        zeeman::add_zeeman_field(b_eff, b_ext, mat);
    }

    exchange::add_exchange_field(grid, m, b_eff, mat);

    if terms.anisotropy {
        anisotropy::add_uniaxial_anisotropy_field(m, b_eff, mat);
    }
}
