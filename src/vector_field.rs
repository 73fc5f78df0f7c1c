// src/vector_field.rs

use crate::grid::Grid3D;

/// Unit magnetisation (or induction) field on a 3D grid.
/// Each cell stores (x, y, z); vacuum cells hold (0, 0, 0).
#[derive(Debug, Clone)]
pub struct VectorField3D {
    pub grid: Grid3D,
    pub data: Vec<[f64; 3]>,
}

impl VectorField3D {
    /// Create a new field on the given grid, initialised along +z.
    pub fn new(grid: Grid3D) -> Self {
        let n = grid.n_cells();
        Self {
            grid,
            data: vec![[0.0, 0.0, 1.0]; n],
        }
    }

    pub fn zeros(grid: Grid3D) -> Self {
        Self {
            grid,
            data: vec![[0.0; 3]; grid.n_cells()],
        }
    }

    pub fn set_uniform(&mut self, x: f64, y: f64, z: f64) {
        for cell in &mut self.data {
            *cell = [x, y, z];
        }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        self.grid.idx(i, j, k)
    }

    /// Zero every cell where `mask` is false.
    pub fn zero_outside(&mut self, mask: &[bool]) {
        assert_eq!(self.data.len(), mask.len());
        for (v, &inside) in self.data.iter_mut().zip(mask.iter()) {
            if !inside {
                *v = [0.0; 3];
            }
        }
    }

    /// Arithmetic mean over the cells where `mask` is true; zero if the mask is empty.
    pub fn average_over(&self, mask: &[bool]) -> [f64; 3] {
        assert_eq!(self.data.len(), mask.len());
        let mut sum = [0.0; 3];
        let mut n = 0usize;
        for (v, _) in self.data.iter().zip(mask.iter()).filter(|(_, inside)| **inside) {
            sum[0] += v[0];
            sum[1] += v[1];
            sum[2] += v[2];
            n += 1;
        }
        if n == 0 {
            return [0.0; 3];
        }
        let inv = 1.0 / n as f64;
        [sum[0] * inv, sum[1] * inv, sum[2] * inv]
    }
}
