// src/effective_field/anisotropy.rs

use crate::material::MaterialField;
use crate::vec3::dot;
use crate::vector_field::VectorField3D;

/// Add uniaxial anisotropy contribution to B_eff (Tesla).
///
/// For w_ani = K_u [1 - (m·u)^2] per cell:
///   B_ani = (2 K_u / M_s) (m·u) u
pub fn add_uniaxial_anisotropy_field(m: &VectorField3D, b_eff: &mut VectorField3D, mat: &MaterialField) {
    for (idx, (m_cell, b_cell)) in m.data.iter().zip(b_eff.data.iter_mut()).enumerate() {
        let (k_u, ms) = (mat.k_u[idx], mat.ms[idx]);
        if k_u == 0.0 || ms <= 0.0 {
            continue;
        }
        let u = mat.easy_axis[idx];
        let c = 2.0 * k_u / ms * dot(*m_cell, u);
        b_cell[0] += c * u[0];
        b_cell[1] += c * u[1];
        b_cell[2] += c * u[2];
    }
}

/// Anisotropy energy (J), zero when every cell lies along its easy axis.
pub fn anisotropy_energy(m: &VectorField3D, mat: &MaterialField, cell_volume: f64) -> f64 {
    m.data
        .iter()
        .enumerate()
        .filter(|&(idx, _)| mat.ms[idx] > 0.0 && mat.k_u[idx] != 0.0)
        .map(|(idx, v)| {
            let mu = dot(*v, mat.easy_axis[idx]);
            mat.k_u[idx] * cell_volume * (1.0 - mu * mu)
        })
        .sum()
}
