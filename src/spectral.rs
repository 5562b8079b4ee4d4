// src/spectral.rs
//
// Reciprocal-lattice bookkeeping for the full N x N complex FFT buffer.
//
// Slot (row, col) holds the Fourier component with signed frequencies (k, l), where k is
// the column frequency (x) and l the row frequency (y); indices >= N/2 fold to index - N.
// For the triangular cell (sqrt(3) a by a) the reciprocal vector of that slot is
//   G = (2 pi k / (sqrt(3) a), 2 pi l / a),  |G|^2 = (4 pi^2 / 3 a^2) (k^2 + 3 l^2),
// and only slots with k + l even belong to the hexagonal lattice. The square cell admits
// every slot and |G|^2 = (2 pi / a)^2 (k^2 + l^2).
//
// Everything that touches the selection rule goes through this type.

use rayon::prelude::*;
use rustfft::num_complex::Complex;

use crate::grid::LatticeSymmetry;

/// Which frequency component a directional filter multiplies by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Column frequency k.
    X,
    /// Row frequency l.
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectralIndexMapping {
    n: usize,
    symmetry: LatticeSymmetry,
}

impl SpectralIndexMapping {
    pub fn new(n: usize, symmetry: LatticeSymmetry) -> Self {
        debug_assert!(n >= 2 && n % 2 == 0, "grid resolution must be even");
        Self { n, symmetry }
    }

    pub fn triangular(n: usize) -> Self {
        Self::new(n, LatticeSymmetry::Triangular)
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, LatticeSymmetry::Square)
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn symmetry(&self) -> LatticeSymmetry {
        self.symmetry
    }

    /// Signed frequency of an FFT index.
    #[inline]
    pub fn signed(&self, idx: usize) -> i64 {
        if idx >= self.n / 2 {
            idx as i64 - self.n as i64
        } else {
            idx as i64
        }
    }

    #[inline]
    pub fn is_admitted(&self, row: usize, col: usize) -> bool {
        match self.symmetry {
            // N even, so folding does not change parity
            LatticeSymmetry::Triangular => (row + col) % 2 == 0,
            LatticeSymmetry::Square => true,
        }
    }

    #[inline]
    pub fn is_dc(&self, row: usize, col: usize) -> bool {
        row == 0 && col == 0
    }

    /// Reduced |G|^2: k^2 + 3 l^2 (triangular) or k^2 + l^2 (square).
    #[inline]
    pub fn reduced_g2(&self, row: usize, col: usize) -> f64 {
        let k = self.signed(col) as f64;
        let l = self.signed(row) as f64;
        match self.symmetry {
            LatticeSymmetry::Triangular => k * k + 3.0 * l * l,
            LatticeSymmetry::Square => k * k + l * l,
        }
    }

    /// Signed frequency of slot (row, col) along `dir`.
    #[inline]
    pub fn frequency(&self, dir: Direction, row: usize, col: usize) -> i64 {
        match dir {
            Direction::X => self.signed(col),
            Direction::Y => self.signed(row),
        }
    }

    /// Overwrite `buf` with real coefficients `f(k, l, reduced |G|^2)` on admitted slots and
    /// zero elsewhere.
    pub fn fill<F>(&self, buf: &mut [Complex<f64>], f: F)
    where
        F: Fn(i64, i64, f64) -> f64 + Sync,
    {
        let n = self.n;
        debug_assert_eq!(buf.len(), n * n);
        buf.par_chunks_mut(n).enumerate().for_each(|(row, line)| {
            let l = self.signed(row);
            for (col, c) in line.iter_mut().enumerate() {
                *c = if self.is_admitted(row, col) {
                    Complex::new(f(self.signed(col), l, self.reduced_g2(row, col)), 0.0)
                } else {
                    Complex::new(0.0, 0.0)
                };
            }
        });
    }

    /// Multiply the real part of every admitted non-DC slot by `f(reduced |G|^2)`.
    /// Imaginary parts, non-admitted slots and the DC slot are cleared.
    pub fn rescale<F>(&self, buf: &mut [Complex<f64>], f: F)
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let n = self.n;
        debug_assert_eq!(buf.len(), n * n);
        buf.par_chunks_mut(n).enumerate().for_each(|(row, line)| {
            for (col, c) in line.iter_mut().enumerate() {
                *c = if self.is_admitted(row, col) && !self.is_dc(row, col) {
                    Complex::new(c.re * f(self.reduced_g2(row, col)), 0.0)
                } else {
                    Complex::new(0.0, 0.0)
                };
            }
        });
    }

    /// dst = src * factor * freq(dir), the spectral form of a first derivative along `dir`
    /// (up to the length scale carried by `factor`).
    pub fn derivative_filter(
        &self,
        src: &[Complex<f64>],
        dst: &mut [Complex<f64>],
        dir: Direction,
        factor: f64,
    ) {
        self.directional(src, dst, dir, |freq, _| factor * freq);
    }

    /// dst = src * factor * freq(dir) / reduced |G|^2, used to turn field coefficients into
    /// the supervelocity correction.
    pub fn supervelocity_filter(
        &self,
        src: &[Complex<f64>],
        dst: &mut [Complex<f64>],
        dir: Direction,
        factor: f64,
    ) {
        self.directional(src, dst, dir, |freq, g2| factor * freq / g2);
    }

    // The Nyquist slot of `dir` has no partner at +N/2, so its sine vanishes on the grid.
    fn directional<F>(&self, src: &[Complex<f64>], dst: &mut [Complex<f64>], dir: Direction, f: F)
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        let n = self.n;
        let nyquist = n / 2;
        debug_assert_eq!(src.len(), n * n);
        debug_assert_eq!(dst.len(), n * n);

        dst.par_chunks_mut(n)
            .zip(src.par_chunks(n))
            .enumerate()
            .for_each(|(row, (out, inp))| {
                for col in 0..n {
                    let along = match dir {
                        Direction::X => col,
                        Direction::Y => row,
                    };
                    out[col] = if !self.is_admitted(row, col)
                        || self.is_dc(row, col)
                        || along == nyquist
                    {
                        Complex::new(0.0, 0.0)
                    } else {
                        let freq = self.frequency(dir, row, col) as f64;
                        inp[col] * f(freq, self.reduced_g2(row, col))
                    };
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rule_and_g2_table() {
        let m = SpectralIndexMapping::triangular(8);
        assert!(m.is_admitted(0, 0));
        assert!(m.is_admitted(1, 1));
        assert!(!m.is_admitted(0, 1));
        assert!(!m.is_admitted(3, 2));
        // folded indices keep parity
        assert!(m.is_admitted(7, 1));

        assert_eq!(m.signed(3), 3);
        assert_eq!(m.signed(4), -4);
        assert_eq!(m.signed(7), -1);

        // (k, l) = (1, 1) and (-1, -1)
        assert_eq!(m.reduced_g2(1, 1), 4.0);
        assert_eq!(m.reduced_g2(7, 7), 4.0);
        // (k, l) = (2, 0): first shell of the hexagonal lattice has |G|^2 ~ 4 as well
        assert_eq!(m.reduced_g2(0, 2), 4.0);
        assert_eq!(m.reduced_g2(2, 0), 12.0);

        let sq = SpectralIndexMapping::square(8);
        assert!(sq.is_admitted(0, 1));
        assert_eq!(sq.reduced_g2(1, 2), 5.0);
    }

    #[test]
    fn fill_and_rescale_respect_selection_rule() {
        let n = 8;
        let m = SpectralIndexMapping::triangular(n);
        let mut buf = vec![Complex::new(1.0, 1.0); n * n];
        m.fill(&mut buf, |_, _, _| 2.0);
        let admitted = buf.iter().filter(|c| c.re != 0.0).count();
        assert_eq!(admitted, n * n / 2);
        assert!(buf.iter().all(|c| c.im == 0.0));

        m.rescale(&mut buf, |g2| 1.0 / g2);
        assert_eq!(buf[0].re, 0.0);
        assert!((buf[n + 1].re - 0.5).abs() < 1e-15);
        assert_eq!(buf[1].re, 0.0);
    }

    #[test]
    fn directional_filter_is_odd_and_drops_nyquist() {
        let n = 8;
        let m = SpectralIndexMapping::triangular(n);
        let mut src = vec![Complex::new(0.0, 0.0); n * n];
        m.fill(&mut src, |_, _, _| 1.0);
        let mut dst = vec![Complex::new(0.0, 0.0); n * n];

        m.supervelocity_filter(&src, &mut dst, Direction::Y, 1.0);
        // (k, l) = (1, 1) and (-1, -1)
        assert!((dst[n + 1].re - 0.25).abs() < 1e-15);
        assert!((dst[7 * n + 7].re + 0.25).abs() < 1e-15);
        // Nyquist row
        assert!(dst[4 * n..5 * n].iter().all(|c| c.re == 0.0));
        assert_eq!(dst[0].re, 0.0);

        m.derivative_filter(&src, &mut dst, Direction::X, 2.0);
        assert_eq!(dst[2].re, 4.0);
        assert_eq!(dst[6].re, -4.0);
        assert_eq!(dst[4].re, 0.0);
    }
}
