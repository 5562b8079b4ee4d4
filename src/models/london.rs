// src/models/london.rs
//
// Closed-form field models: one inverse FFT of analytically known Fourier coefficients.
//
//   B(r) = B * sum_G c(G) exp(i G.r),  c(0) = 1
//
// so the cell average is B by construction.

use log::{debug, trace};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::calculator::{round_up_to, FieldGrid, FieldModel};
use crate::fft::Fft2D;
use crate::grid::{LatticeSymmetry, UnitCell};
use crate::params::VortexParams;
use crate::special::bessel_k1;
use crate::spectral::SpectralIndexMapping;

/// Which closed-form coefficient set to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LondonVariant {
    /// exp(-xi^2 G^2 / 2) / (1 + lambda^2 G^2) on the triangular lattice.
    Triangular,
    /// Same coefficients on the square lattice.
    Square,
    /// Triangular, with xi^2 and lambda^2 scaled by 1 / (1 - b).
    Modified,
    /// Triangular analytical Ginzburg-Landau (Hao-Clem / Yaouanc).
    AnalyticalGl,
}

#[derive(Debug, Clone)]
pub struct LondonModel {
    variant: LondonVariant,
    coeffs: Vec<Complex<f64>>,
}

impl LondonModel {
    pub fn new(variant: LondonVariant) -> Self {
        Self {
            variant,
            coeffs: Vec::new(),
        }
    }

    pub fn triangular() -> Self {
        Self::new(LondonVariant::Triangular)
    }

    pub fn square() -> Self {
        Self::new(LondonVariant::Square)
    }

    pub fn modified() -> Self {
        Self::new(LondonVariant::Modified)
    }

    pub fn analytical_gl() -> Self {
        Self::new(LondonVariant::AnalyticalGl)
    }

    pub fn variant(&self) -> LondonVariant {
        self.variant
    }
}

/// Coefficient of reduced |G|^2 for one parameter set.
enum Coefficient {
    Gaussian { xi_f: f64, lambda_f: f64 },
    Agl { f_inf: f64, xiv_over_lambda: f64, lambda_f: f64, norm: f64 },
}

impl Coefficient {
    fn build(variant: LondonVariant, params: &VortexParams, a: f64) -> Self {
        let pi = std::f64::consts::PI;
        let xi_term = (pi * params.xi / a).powi(2);
        let lambda_term = (pi * params.lambda / a).powi(2);
        match variant {
            LondonVariant::Triangular => Coefficient::Gaussian {
                xi_f: 2.0 / 3.0 * xi_term,
                lambda_f: 4.0 / 3.0 * lambda_term,
            },
            LondonVariant::Square => Coefficient::Gaussian {
                xi_f: 2.0 * xi_term,
                lambda_f: 4.0 * lambda_term,
            },
            LondonVariant::Modified => {
                let one_m_b = 1.0 - params.reduced_field();
                Coefficient::Gaussian {
                    xi_f: 2.0 / (3.0 * one_m_b) * xi_term,
                    lambda_f: 4.0 / (3.0 * one_m_b) * lambda_term,
                }
            }
            LondonVariant::AnalyticalGl => {
                let b = params.reduced_field();
                let b4 = b.powi(4);
                let f_inf = 1.0 - b4;
                let xi_v = params.xi
                    * (std::f64::consts::SQRT_2 - 0.75 * params.xi / params.lambda)
                    * ((1.0 + b4) * (1.0 - 2.0 * b * (1.0 - b).powi(2))).sqrt();
                let xiv_over_lambda = xi_v / params.lambda;
                Coefficient::Agl {
                    f_inf,
                    xiv_over_lambda,
                    lambda_f: 4.0 / 3.0 * lambda_term,
                    norm: bessel_k1(xiv_over_lambda * f_inf),
                }
            }
        }
    }

    #[inline]
    fn at(&self, g2: f64) -> f64 {
        match *self {
            Coefficient::Gaussian { xi_f, lambda_f } => (-xi_f * g2).exp() / (1.0 + lambda_f * g2),
            Coefficient::Agl {
                f_inf,
                xiv_over_lambda,
                lambda_f,
                norm,
            } => {
                if g2 == 0.0 {
                    return 1.0;
                }
                let u = (f_inf * f_inf + lambda_f * g2).sqrt();
                f_inf * bessel_k1(xiv_over_lambda * u) / (u * norm)
            }
        }
    }
}

impl FieldModel for LondonModel {
    fn name(&self) -> &'static str {
        match self.variant {
            LondonVariant::Triangular => "london",
            LondonVariant::Square => "london-square",
            LondonVariant::Modified => "modified-london",
            LondonVariant::AnalyticalGl => "analytical-gl",
        }
    }

    fn symmetry(&self) -> LatticeSymmetry {
        match self.variant {
            LondonVariant::Square => LatticeSymmetry::Square,
            _ => LatticeSymmetry::Triangular,
        }
    }

    fn round_steps(&self, steps: usize) -> usize {
        round_up_to(steps, 2)
    }

    fn compute(&mut self, params: &VortexParams, fft: &mut Fft2D) -> FieldGrid {
        let n = fft.n();
        let cell = UnitCell::for_field(self.symmetry(), params.field);

        if !params.is_mixed_state() {
            trace!("[{}] outside the mixed state, uniform field", self.name());
            return FieldGrid::uniform(cell, n, params.field);
        }

        let coeff = Coefficient::build(self.variant, params, cell.lattice_constant);
        let mapping = SpectralIndexMapping::new(n, self.symmetry());

        self.coeffs.resize(n * n, Complex::new(0.0, 0.0));
        mapping.fill(&mut self.coeffs, |_, _, g2| coeff.at(g2));
        fft.inverse(&mut self.coeffs);

        let field = params.field;
        let mut negative = 0usize;
        let data = self
            .coeffs
            .iter()
            .map(|c| {
                let b = c.re * field;
                if b < 0.0 {
                    negative += 1;
                }
                b.max(0.0)
            })
            .collect();
        if negative > 0 {
            debug!(
                "[{}] field negative at {negative} point(s), clamped to 0",
                self.name()
            );
        }

        FieldGrid {
            cell,
            steps: n,
            data,
            convergence: None,
        }
    }
}
