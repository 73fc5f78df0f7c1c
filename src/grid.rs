// src/grid.rs

/// Regular 3D finite-difference mesh. Cell (i, j, k) spans
/// `[i*dx, (i+1)*dx) × [j*dy, (j+1)*dy) × [k*dz, (k+1)*dz)` in mesh coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Grid3D {
    pub fn new(nx: usize, ny: usize, nz: usize, dx: f64, dy: f64, dz: f64) -> Self {
        Self { nx, ny, nz, dx, dy, dz }
    }

    /// Smallest cubic mesh of cubic cells (edge `cell`) that contains a sphere of `radius`
    /// centred on the mesh centre.
    pub fn enclosing_sphere(radius: f64, cell: f64) -> Self {
        // shave round-off so an exact multiple of the cell does not gain a layer
        let n = ((2.0 * radius / cell * (1.0 - 1e-12)).ceil() as usize).max(1);
        Self::new(n, n, n, cell, cell, cell)
    }

    pub fn n_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn cell_volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }

    /// Flat index with x running fastest, then y, then z (OVF ordering).
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        (k * self.ny + j) * self.nx + i
    }

    /// Cell-centre position with the origin at the mesh centre, in metres.
    #[inline]
    pub fn cell_center_centered(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [
            (i as f64 + 0.5 - 0.5 * self.nx as f64) * self.dx,
            (j as f64 + 0.5 - 0.5 * self.ny as f64) * self.dy,
            (k as f64 + 0.5 - 0.5 * self.nz as f64) * self.dz,
        ]
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.nx as f64 * self.dx,
            self.ny as f64 * self.dy,
            self.nz as f64 * self.dz,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexing_is_consistent() {
        let g = Grid3D::new(4, 3, 2, 1.0, 1.0, 1.0);
        assert_eq!(g.idx(0, 0, 0), 0);
        assert_eq!(g.idx(1, 0, 0), 1);
        assert_eq!(g.idx(0, 1, 0), 4);
        assert_eq!(g.idx(0, 0, 1), 12);
        assert_eq!(g.idx(3, 2, 1), 23); // (1*3 + 2)*4 + 3
        assert_eq!(g.n_cells(), 24);
    }

    #[test]
    fn centered_coordinates_are_symmetric() {
        let g = Grid3D::new(4, 4, 4, 2.0, 2.0, 2.0);
        let lo = g.cell_center_centered(0, 0, 0);
        let hi = g.cell_center_centered(3, 3, 3);
        for a in 0..3 {
            assert_eq!(lo[a], -3.0);
            assert_eq!(hi[a], 3.0);
        }
    }

    #[test]
    fn enclosing_sphere_covers_diameter() {
        let g = Grid3D::enclosing_sphere(10e-9, 3e-9);
        // 20 nm / 3 nm -> 7 cells
        assert_eq!(g.nx, 7);
        assert!(g.extent()[0] >= 20e-9);
    }
}
