// src/effective_field/zeeman.rs

use crate::material::MaterialField;
use crate::vec3::dot;
use crate::vector_field::VectorField3D;

/// Add a uniform external induction B_ext (Tesla) to every magnetic cell.
pub fn add_zeeman_field(b_eff: &mut VectorField3D, b_ext: [f64; 3], mat: &MaterialField) {
    if b_ext == [0.0; 3] {
        return;
    }
    for (b, &ms) in b_eff.data.iter_mut().zip(mat.ms.iter()) {
        if ms > 0.0 {
            b[0] += b_ext[0];
            b[1] += b_ext[1];
            b[2] += b_ext[2];
        }
    }
}

/// Zeeman energy (J): -Σ Ms V m·B_ext. Exactly +0 without an applied field.
pub fn zeeman_energy(m: &VectorField3D, b_ext: [f64; 3], mat: &MaterialField, cell_volume: f64) -> f64 {
    if b_ext == [0.0; 3] {
        return 0.0;
    }
    -m.data
        .iter()
        .zip(mat.ms.iter())
        .map(|(v, &ms)| ms * cell_volume * dot(*v, b_ext))
        .sum::<f64>()
}
