// src/params.rs

use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::grid::LatticeSymmetry;

/// Magnetic flux quantum in Gauss times square nanometres.
pub const FLUX_QUANTUM: f64 = 2.067833667e7;

pub const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Upper critical field (Gauss) for a coherence length `xi` (nm).
pub fn hc2_from_xi(xi: f64) -> f64 {
    if xi == 0.0 {
        0.0
    } else {
        FLUX_QUANTUM / (2.0 * std::f64::consts::PI * xi * xi)
    }
}

/// Coherence length (nm) for an upper critical field `hc2` (Gauss).
pub fn xi_from_hc2(hc2: f64) -> f64 {
    if hc2 == 0.0 {
        0.0
    } else {
        (FLUX_QUANTUM / (2.0 * std::f64::consts::PI * hc2)).sqrt()
    }
}

/// Inter-vortex distance (nm) for a mean field `field` (Gauss).
pub fn lattice_constant(symmetry: LatticeSymmetry, field: f64) -> f64 {
    match symmetry {
        LatticeSymmetry::Triangular => (2.0 * FLUX_QUANTUM / (field * SQRT3)).sqrt(),
        LatticeSymmetry::Square => (FLUX_QUANTUM / field).sqrt(),
    }
}

/// Parameters of one field evaluation: applied field (G), penetration depth (nm)
/// and coherence length (nm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VortexParams {
    pub field: f64,
    pub lambda: f64,
    pub xi: f64,
}

impl VortexParams {
    /// Signs are dropped on construction.
    pub fn new(field: f64, lambda: f64, xi: f64) -> Self {
        Self {
            field: field.abs(),
            lambda: lambda.abs(),
            xi: xi.abs(),
        }
    }

    /// Build from the `[B, lambda, xi]` vector handed over by a fit function.
    pub fn from_slice(par: &[f64]) -> Result<Self, ParamError> {
        match par {
            [field, lambda, xi, ..] => Ok(Self::new(*field, *lambda, *xi)),
            _ => Err(ParamError::TooFew { got: par.len() }),
        }
    }

    pub fn hc2(&self) -> f64 {
        hc2_from_xi(self.xi)
    }

    pub fn kappa(&self) -> f64 {
        self.lambda / self.xi
    }

    /// Reduced field b = B / Hc2.
    pub fn reduced_field(&self) -> f64 {
        self.field / self.hc2()
    }

    /// True when the parameters describe the mixed state of a type-II superconductor:
    /// finite positive field below Hc2 and lambda >= xi / sqrt(2).
    pub fn is_mixed_state(&self) -> bool {
        let finite = self.field.is_finite() && self.lambda.is_finite() && self.xi.is_finite();
        finite
            && self.field > 0.0
            && self.field < self.hc2()
            && self.lambda >= self.xi / std::f64::consts::SQRT_2
    }
}

impl Default for VortexParams {
    fn default() -> Self {
        Self::new(100.0, 150.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hc2_and_xi_are_inverse() {
        let xi = 5.0;
        let hc2 = hc2_from_xi(xi);
        assert!((hc2 - 131_642.4).abs() / 131_642.4 < 1e-5, "hc2={hc2}");
        assert!((xi_from_hc2(hc2) - xi).abs() < 1e-12);
        assert_eq!(hc2_from_xi(0.0), 0.0);
        assert_eq!(xi_from_hc2(0.0), 0.0);
    }

    #[test]
    fn triangular_cell_area_holds_one_flux_quantum() {
        let b = 250.0;
        let a = lattice_constant(LatticeSymmetry::Triangular, b);
        // hexagonal Wigner-Seitz cell: sqrt(3)/2 a^2
        let flux = 0.5 * SQRT3 * a * a * b;
        assert!((flux - FLUX_QUANTUM).abs() / FLUX_QUANTUM < 1e-12);

        let a_sq = lattice_constant(LatticeSymmetry::Square, b);
        assert!((a_sq * a_sq * b - FLUX_QUANTUM).abs() / FLUX_QUANTUM < 1e-12);
    }

    #[test]
    fn from_slice_needs_three_values() {
        let p = VortexParams::from_slice(&[-100.0, 150.0, 5.0]).unwrap();
        assert_eq!(p.field, 100.0);
        assert!(VortexParams::from_slice(&[100.0, 150.0]).is_err());
    }

    #[test]
    fn mixed_state_window() {
        assert!(VortexParams::new(100.0, 150.0, 5.0).is_mixed_state());
        // above Hc2
        assert!(!VortexParams::new(2.0e5, 150.0, 5.0).is_mixed_state());
        // type I
        assert!(!VortexParams::new(100.0, 3.0, 5.0).is_mixed_state());
        // no field, no vortices
        assert!(!VortexParams::new(0.0, 150.0, 5.0).is_mixed_state());
        // xi = 0 gives Hc2 = 0
        assert!(!VortexParams::new(100.0, 150.0, 0.0).is_mixed_state());
    }
}
