// src/effective_field/exchange.rs
//
// Six-point exchange with spatially varying stiffness.
//
//   B_ex,i = (2 / Ms_i) Σ_n A_in (m_n - m_i) / d_n^2
//
// A_in is the harmonic mean of the two cell stiffnesses, so the coupling
// vanishes if either side has A = 0. Vacuum neighbours (Ms = 0) and the mesh
// edge contribute nothing (free boundary).

use crate::grid::Grid3D;
use crate::material::MaterialField;
use crate::vector_field::VectorField3D;

#[inline]
pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    let s = a + b;
    if s <= 0.0 { 0.0 } else { 2.0 * a * b / s }
}

/// Visit the face neighbours of cell (i, j, k) as `(flat_index, spacing)`.
#[inline]
pub(crate) fn for_each_neighbour<F: FnMut(usize, f64)>(
    grid: &Grid3D,
    i: usize,
    j: usize,
    k: usize,
    mut f: F,
) {
    if i > 0 {
        f(grid.idx(i - 1, j, k), grid.dx);
    }
    if i + 1 < grid.nx {
        f(grid.idx(i + 1, j, k), grid.dx);
    }
    if j > 0 {
        f(grid.idx(i, j - 1, k), grid.dy);
    }
    if j + 1 < grid.ny {
        f(grid.idx(i, j + 1, k), grid.dy);
    }
    if k > 0 {
        f(grid.idx(i, j, k - 1), grid.dz);
    }
    if k + 1 < grid.nz {
        f(grid.idx(i, j, k + 1), grid.dz);
    }
}

/// Add the exchange induction (Tesla) to `b_eff`.
pub fn add_exchange_field(
    grid: &Grid3D,
    m: &VectorField3D,
    b_eff: &mut VectorField3D,
    mat: &MaterialField,
) {
    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let idx = grid.idx(i, j, k);
                let ms_i = mat.ms[idx];
                let a_i = mat.a_ex[idx];
                if ms_i <= 0.0 || a_i <= 0.0 {
                    continue;
                }
                let mi = m.data[idx];
                let mut acc = [0.0; 3];

                for_each_neighbour(grid, i, j, k, |n, d| {
                    if mat.ms[n] <= 0.0 {
                        return;
                    }
                    let a = harmonic_mean(a_i, mat.a_ex[n]);
                    if a == 0.0 {
                        return;
                    }
                    let c = 2.0 * a / (ms_i * d * d);
                    let mn = m.data[n];
                    acc[0] += c * (mn[0] - mi[0]);
                    acc[1] += c * (mn[1] - mi[1]);
                    acc[2] += c * (mn[2] - mi[2]);
                });

                let b = &mut b_eff.data[idx];
                b[0] += acc[0];
                b[1] += acc[1];
                b[2] += acc[2];
            }
        }
    }
}

/// Exchange energy (J): Σ over neighbour pairs of A_in V |m_i - m_n|^2 / d^2.
pub fn exchange_energy(grid: &Grid3D, m: &VectorField3D, mat: &MaterialField) -> f64 {
    let vol = grid.cell_volume();
    let mut e = 0.0;

    let mut pair = |a: usize, b: usize, d: f64| {
        if mat.ms[a] <= 0.0 || mat.ms[b] <= 0.0 {
            return;
        }
        let a_eff = harmonic_mean(mat.a_ex[a], mat.a_ex[b]);
        if a_eff == 0.0 {
            return;
        }
        let (ma, mb) = (m.data[a], m.data[b]);
        let d2 = (mb[0] - ma[0]).powi(2) + (mb[1] - ma[1]).powi(2) + (mb[2] - ma[2]).powi(2);
        e += a_eff * vol * d2 / (d * d);
    };

    // forward neighbours only, so each pair is counted once
    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let idx = grid.idx(i, j, k);
                if i + 1 < grid.nx {
                    pair(idx, grid.idx(i + 1, j, k), grid.dx);
                }
                if j + 1 < grid.ny {
                    pair(idx, grid.idx(i, j + 1, k), grid.dy);
                }
                if k + 1 < grid.nz {
                    pair(idx, grid.idx(i, j, k + 1), grid.dz);
                }
            }
        }
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Region;
    use crate::material::{MaterialSet, RegionMaterial};

    fn uniform_material(n: usize, a: f64) -> MaterialField {
        let set = MaterialSet {
            core: RegionMaterial {
                ms0: 8.0e5,
                a0: a,
                ku0: 0.0,
                easy_axis: [0.0, 0.0, 1.0],
                tc: 1000.0,
            },
            ..MaterialSet::default()
        };
        MaterialField::at_temperature(&vec![Region::Core; n], &set, 0.0)
    }

    #[test]
    fn harmonic_mean_vanishes_with_either_side() {
        assert_eq!(harmonic_mean(0.0, 1e-11), 0.0);
        assert_eq!(harmonic_mean(0.0, 0.0), 0.0);
        assert!((harmonic_mean(1e-11, 1e-11) - 1e-11).abs() < 1e-25);
        assert!((harmonic_mean(1.0, 3.0) - 1.5).abs() < 1e-15);
    }

    #[test]
    fn uniform_state_has_no_exchange_field_or_energy() {
        let grid = Grid3D::new(3, 3, 3, 2e-9, 2e-9, 2e-9);
        let m = VectorField3D::new(grid);
        let mat = uniform_material(grid.n_cells(), 1.3e-11);
        let mut b = VectorField3D::zeros(grid);
        add_exchange_field(&grid, &m, &mut b, &mat);
        assert!(b.data.iter().all(|v| v.iter().all(|c| c.abs() < 1e-20)));
        assert_eq!(exchange_energy(&grid, &m, &mat), 0.0);
    }

    #[test]
    fn field_matches_negative_energy_gradient() {
        let grid = Grid3D::new(3, 2, 2, 2e-9, 2e-9, 2e-9);
        let mut m = VectorField3D::new(grid);
        for (n, v) in m.data.iter_mut().enumerate() {
            let th = 0.3 * n as f64;
            *v = [th.sin(), 0.0, th.cos()];
        }
        let mat = uniform_material(grid.n_cells(), 1.3e-11);

        let mut b = VectorField3D::zeros(grid);
        add_exchange_field(&grid, &m, &mut b, &mat);

        // B_i = -(1 / (Ms V)) dE/dm_i
        let cell = 5;
        let h = 1e-6;
        let vol = grid.cell_volume();
        for c in 0..3 {
            let mut mp = m.clone();
            mp.data[cell][c] += h;
            let mut mm = m.clone();
            mm.data[cell][c] -= h;
            let grad = (exchange_energy(&grid, &mp, &mat) - exchange_energy(&grid, &mm, &mat)) / (2.0 * h);
            let expected = -grad / (mat.ms[cell] * vol);
            let got = b.data[cell][c];
            assert!(
                (got - expected).abs() <= 1e-6 * expected.abs().max(1e-3),
                "component {}: field={} gradient={}",
                c,
                got,
                expected
            );
        }
    }

    #[test]
    fn vacuum_neighbours_do_not_couple() {
        let grid = Grid3D::new(2, 1, 1, 1e-9, 1e-9, 1e-9);
        let mut mat = uniform_material(2, 1.3e-11);
        mat.ms[1] = 0.0;
        mat.a_ex[1] = 0.0;

        let mut m = VectorField3D::new(grid);
        m.data[1] = [1.0, 0.0, 0.0];
        let mut b = VectorField3D::zeros(grid);
        add_exchange_field(&grid, &m, &mut b, &mat);
        assert_eq!(b.data[0], [0.0; 3]);
        assert_eq!(exchange_energy(&grid, &m, &mat), 0.0);
    }
}
