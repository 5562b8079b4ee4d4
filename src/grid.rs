// src/grid.rs

use serde::{Deserialize, Serialize};

use crate::params::{lattice_constant, SQRT3};

/// Vortex arrangement in the plane perpendicular to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeSymmetry {
    Triangular,
    Square,
}

impl LatticeSymmetry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triangular => "triangular",
            Self::Square => "square",
        }
    }
}

/// Simple square N x N sampling grid over one rectangular cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid2D {
    pub n: usize,
}

impl Grid2D {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.n * self.n
    }

    /// Convert (col, row) indices to a flat index into a 1D array.
    #[inline]
    pub fn idx(&self, col: usize, row: usize) -> usize {
        debug_assert!(col < self.n && row < self.n);
        row * self.n + col
    }

    /// Flat index of the second vortex core of the triangular cell.
    #[inline]
    pub fn centre_idx(&self) -> usize {
        (self.n + 1) * (self.n / 2)
    }
}

/// Physical extent of the sampled cell.
///
/// For the triangular lattice the rectangle is sqrt(3) a wide (x, columns) and a high
/// (y, rows); it holds two vortices, at the origin and at the centre. The square cell is
/// a x a with a single vortex at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub symmetry: LatticeSymmetry,
    /// Inter-vortex distance (nm).
    pub lattice_constant: f64,
    /// Extent along x (nm).
    pub width: f64,
    /// Extent along y (nm).
    pub height: f64,
}

impl UnitCell {
    pub fn new(symmetry: LatticeSymmetry, lattice_constant: f64) -> Self {
        let width = match symmetry {
            LatticeSymmetry::Triangular => SQRT3 * lattice_constant,
            LatticeSymmetry::Square => lattice_constant,
        };
        Self {
            symmetry,
            lattice_constant,
            width,
            height: lattice_constant,
        }
    }

    /// Cell for a mean field `field` in Gauss.
    pub fn for_field(symmetry: LatticeSymmetry, field: f64) -> Self {
        Self::new(symmetry, lattice_constant(symmetry, field))
    }

    /// Grid spacing (dx, dy) in nm for an N x N sampling.
    pub fn spacing(&self, grid: Grid2D) -> (f64, f64) {
        let n = grid.n as f64;
        (self.width / n, self.height / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indexing_is_consistent() {
        let g = Grid2D::new(4);
        assert_eq!(g.idx(0, 0), 0);
        assert_eq!(g.idx(1, 0), 1);
        assert_eq!(g.idx(0, 1), 4);
        assert_eq!(g.idx(3, 2), 11);
        assert_eq!(g.n_cells(), 16);
        assert_eq!(g.centre_idx(), g.idx(2, 2));
    }

    #[test]
    fn triangular_cell_is_sqrt3_wide() {
        let cell = UnitCell::new(LatticeSymmetry::Triangular, 2.0);
        assert!((cell.width - 2.0 * SQRT3).abs() < 1e-14);
        assert_eq!(cell.height, 2.0);

        // second vortex sits one lattice constant away from the origin
        let d = (0.25 * cell.width * cell.width + 0.25 * cell.height * cell.height).sqrt();
        assert!((d - cell.lattice_constant).abs() < 1e-12);

        let (dx, dy) = cell.spacing(Grid2D::new(8));
        assert!((dx - cell.width / 8.0).abs() < 1e-14);
        assert!((dy - 0.25).abs() < 1e-14);
    }
}
