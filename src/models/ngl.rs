// src/models/ngl.rs
//
// Self-consistent solution of the Ginzburg-Landau equations for the triangular vortex
// lattice, following E.H. Brandt's iteration (Phys. Rev. Lett. 78, 2208 (1997)).
//
// Reduced units: lengths in lambda, fields in Hc2/kappa. The order parameter
// omega = |psi|^2 and the field are Fourier series over the reciprocal lattice,
//
//   omega(r) = sum_K a_K (1 - cos K.r),   B(r) = b_bar + sum_K b_K cos K.r,
//
// and the supervelocity Q = Q_A + correction from b_K. Coefficients a_K and b_K are
// relaxed alternately until the first row of both stops changing.

use log::{debug, warn};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::calculator::{round_up_to, ConvergenceReport, FieldGrid, FieldModel};
use crate::fft::Fft2D;
use crate::grid::{Grid2D, LatticeSymmetry, UnitCell};
use crate::params::{VortexParams, SQRT3};
use crate::spectral::{Direction, SpectralIndexMapping};

use std::f64::consts::PI;

/// How dω/dx and dω/dy are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientScheme {
    /// Central differences with periodic wrap.
    #[default]
    CentralDifference,
    /// Differentiate the Fourier series of omega.
    Spectral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NglSettings {
    /// Outer passes before giving up.
    pub max_iterations: usize,
    /// Coefficients below this magnitude count as converged.
    pub abs_tolerance: f64,
    /// Relative change below which a coefficient counts as converged.
    pub rel_tolerance: f64,
    pub gradient: GradientScheme,
}

impl Default for NglSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            abs_tolerance: 1.0e-4,
            rel_tolerance: 0.025,
            gradient: GradientScheme::CentralDifference,
        }
    }
}

/// Per-evaluation constants in Brandt's units.
#[derive(Debug, Clone, Copy)]
struct Reduced {
    kappa: f64,
    /// Mean field in units of Hc2/kappa.
    b_bar: f64,
    /// Lattice constant in units of lambda.
    a: f64,
    /// Hc2/kappa in Gauss.
    field_unit: f64,
}

impl Reduced {
    fn new(p: &VortexParams) -> Self {
        let kappa = p.kappa();
        let field_unit = p.hc2() / kappa;
        let b_bar = p.field / field_unit;
        Self {
            kappa,
            b_bar,
            a: (4.0 * PI / (SQRT3 * kappa * b_bar)).sqrt(),
            field_unit,
        }
    }
}

/// Abrikosov solution near Hc2: the starting point of the iteration.
fn abrikosov_coefficient(k: i64, l: i64, g2: f64) -> f64 {
    if k == 0 && l == 0 {
        return 0.0;
    }
    let sign = if k % 2 == 0 && ((k + l) / 2).rem_euclid(2) == 0 {
        -1.0
    } else {
        1.0
    };
    sign * (-PI * g2 / (4.0 * SQRT3)).exp()
}

fn first_row_converged(new: &[Complex<f64>], old: &[f64], s: &NglSettings) -> bool {
    new.iter().zip(old).all(|(c, &o)| {
        let v = c.re;
        v.abs() < s.abs_tolerance || ((v - o) / v).abs() < s.rel_tolerance
    })
}

#[derive(Debug, Clone, Default)]
pub struct NglModel {
    settings: NglSettings,
    n: usize,

    ak: Vec<Complex<f64>>,
    bk: Vec<Complex<f64>>,
    work: Vec<Complex<f64>>,

    omega: Vec<f64>,
    d_omega_dx: Vec<f64>,
    d_omega_dy: Vec<f64>,
    qa_x: Vec<f64>,
    qa_y: Vec<f64>,
    q_x: Vec<f64>,
    q_y: Vec<f64>,
    // reduced units until the final rescale
    field: Vec<f64>,

    check_ak: Vec<f64>,
    check_bk: Vec<f64>,
}

impl NglModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: NglSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &NglSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: NglSettings) {
        self.settings = settings;
    }

    /// omega = |psi|^2 of the last evaluation.
    pub fn omega(&self) -> &[f64] {
        &self.omega
    }

    /// (dω/dx, dω/dy) in reduced units.
    pub fn omega_gradient(&self) -> (&[f64], &[f64]) {
        (&self.d_omega_dx, &self.d_omega_dy)
    }

    /// Supervelocity (Qx, Qy) in reduced units.
    pub fn supervelocity(&self) -> (&[f64], &[f64]) {
        (&self.q_x, &self.q_y)
    }

    pub fn ak(&self) -> &[Complex<f64>] {
        &self.ak
    }

    pub fn bk(&self) -> &[Complex<f64>] {
        &self.bk
    }

    fn resize(&mut self, n: usize) {
        if self.n == n {
            return;
        }
        let nn = n * n;
        let zero = Complex::new(0.0, 0.0);
        self.n = n;
        self.ak = vec![zero; nn];
        self.bk = vec![zero; nn];
        self.work = vec![zero; nn];
        for v in [
            &mut self.omega,
            &mut self.d_omega_dx,
            &mut self.d_omega_dy,
            &mut self.qa_x,
            &mut self.qa_y,
            &mut self.q_x,
            &mut self.q_y,
            &mut self.field,
        ] {
            *v = vec![0.0; nn];
        }
        self.check_ak = vec![0.0; n];
        self.check_bk = vec![0.0; n];
    }

    /// Rebuild omega and its gradient from a_K. Returns sum a_K.
    fn update_omega(&mut self, red: &Reduced, mapping: &SpectralIndexMapping, fft: &mut Fft2D) -> f64 {
        let n = self.n;
        let core2 = Grid2D::new(n).centre_idx();

        let sum_ak: f64 = self.ak.iter().map(|c| c.re).sum();
        self.work.copy_from_slice(&self.ak);
        fft.inverse(&mut self.work);

        let work = &self.work;
        self.omega
            .par_iter_mut()
            .zip(work.par_iter())
            .for_each(|(w, c)| *w = sum_ak - c.re);

        let negative = self.omega.iter().filter(|&&w| w < 0.0).count();
        if negative > 0 {
            debug!("[ngl] omega negative at {negative} point(s), clamped to 0");
            self.omega.par_iter_mut().for_each(|w| *w = w.max(0.0));
        }

        self.omega[0] = 0.0;
        self.omega[core2] = 0.0;

        match self.settings.gradient {
            GradientScheme::CentralDifference => {
                let denom_x = 2.0 * SQRT3 * red.a / n as f64;
                let denom_y = 2.0 * red.a / n as f64;
                let omega = &self.omega;
                self.d_omega_dx
                    .par_chunks_mut(n)
                    .zip(self.d_omega_dy.par_chunks_mut(n))
                    .enumerate()
                    .for_each(|(row, (dx, dy))| {
                        let up = ((row + 1) % n) * n;
                        let down = ((row + n - 1) % n) * n;
                        let here = row * n;
                        for col in 0..n {
                            let right = (col + 1) % n;
                            let left = (col + n - 1) % n;
                            dx[col] = (omega[here + right] - omega[here + left]) / denom_x;
                            dy[col] = (omega[up + col] - omega[down + col]) / denom_y;
                        }
                    });
            }
            GradientScheme::Spectral => {
                let kx = 2.0 * PI / (SQRT3 * red.a);
                mapping.derivative_filter(&self.ak, &mut self.work, Direction::X, kx);
                fft.inverse(&mut self.work);
                for (d, c) in self.d_omega_dx.iter_mut().zip(&self.work) {
                    *d = c.im;
                }

                let ky = 2.0 * PI / red.a;
                mapping.derivative_filter(&self.ak, &mut self.work, Direction::Y, ky);
                fft.inverse(&mut self.work);
                for (d, c) in self.d_omega_dy.iter_mut().zip(&self.work) {
                    *d = c.im;
                }
            }
        }

        for i in [0, core2] {
            self.d_omega_dx[i] = 0.0;
            self.d_omega_dy[i] = 0.0;
        }

        sum_ak
    }

    /// (sum over the cell of omega (1 - Q^2) - g, sum of omega^2). Points with omega = 0
    /// borrow the contribution of the point one row further on.
    fn spatial_averages(&self, four_kappa_sq: f64) -> (f64, f64) {
        let n = self.n;
        let nn = n * n;
        let term = |j: usize| {
            let w = self.omega[j];
            let q2 = self.q_x[j] * self.q_x[j] + self.q_y[j] * self.q_y[j];
            let g = (self.d_omega_dx[j] * self.d_omega_dx[j]
                + self.d_omega_dy[j] * self.d_omega_dy[j])
                / (four_kappa_sq * w);
            w * (1.0 - q2) - g
        };

        let mut sum_sum = 0.0;
        let mut sum_omega_sq = 0.0;
        for l in 0..nn {
            let w = self.omega[l];
            sum_omega_sq += w * w;
            if w != 0.0 {
                sum_sum += term(l);
            } else if l < nn - n && self.omega[l + n] != 0.0 {
                sum_sum += term(l + n);
            }
        }
        (sum_sum, sum_omega_sq)
    }

    fn solve(&mut self, red: &Reduced, fft: &mut Fft2D) -> ConvergenceReport {
        let n = self.n;
        let nn = n * n;
        let core2 = Grid2D::new(n).centre_idx();
        let mapping = SpectralIndexMapping::triangular(n);
        let settings = self.settings;

        let kappa = red.kappa;
        let b_bar = red.b_bar;
        let four_kappa_sq = 4.0 * kappa * kappa;
        let c1 = 4.0 / 3.0 * (PI / red.a).powi(2);

        mapping.fill(&mut self.ak, abrikosov_coefficient);
        for (chk, c) in self.check_ak.iter_mut().zip(&self.ak[..n]) {
            *chk = c.re;
        }
        self.update_omega(red, &mapping, fft);

        {
            let omega = &self.omega;
            let (dx, dy) = (&self.d_omega_dx, &self.d_omega_dy);
            self.qa_x
                .par_iter_mut()
                .zip(self.qa_y.par_iter_mut())
                .enumerate()
                .for_each(|(i, (qx, qy))| {
                    if omega[i] == 0.0 || i == 0 || i == core2 {
                        *qx = 0.0;
                        *qy = 0.0;
                    } else {
                        let denom = 2.0 * kappa * omega[i];
                        *qx = dy[i] / denom;
                        *qy = -dx[i] / denom;
                    }
                });
        }
        self.q_x.copy_from_slice(&self.qa_x);
        self.q_y.copy_from_slice(&self.qa_y);
        self.field.fill(b_bar);

        let mut ak_converged = false;
        let mut bk_converged = false;
        let mut ak_initially_converged = false;
        let mut first_bk = true;
        let mut iterations = 0;

        while !(ak_converged && bk_converged) {
            if iterations >= settings.max_iterations {
                warn!(
                    "[ngl] no convergence after {iterations} iterations (ak={ak_converged}, bk={bk_converged}); keeping last field"
                );
                return ConvergenceReport {
                    iterations,
                    converged: false,
                };
            }
            iterations += 1;

            // a_K, first half-step: source term of the omega equation
            {
                let (omega, qx, qy) = (&self.omega, &self.q_x, &self.q_y);
                let (dx, dy) = (&self.d_omega_dx, &self.d_omega_dy);
                self.work.par_iter_mut().enumerate().for_each(|(i, c)| {
                    let w = omega[i];
                    let re = if w != 0.0 {
                        w * (w + qx[i] * qx[i] + qy[i] * qy[i] - 2.0)
                            + (dx[i] * dx[i] + dy[i] * dy[i]) / (four_kappa_sq * w)
                    } else {
                        0.0
                    };
                    *c = Complex::new(re, 0.0);
                });
            }
            // g diverges at the cores
            self.work[0].re = self.work[n].re;
            self.work[core2].re = self.work[0].re;

            fft.forward(&mut self.work);
            self.ak.copy_from_slice(&self.work);
            let c3 = 2.0 * kappa * kappa;
            let c2 = c3 / nn as f64;
            mapping.rescale(&mut self.ak, |g2| c2 / (c1 * g2 + c3));

            // second half-step: normalise by the spatial averages
            self.update_omega(red, &mapping, fft);
            let (sum_sum, sum_omega_sq) = self.spatial_averages(four_kappa_sq);
            let ratio = sum_sum / sum_omega_sq;
            self.ak
                .par_iter_mut()
                .for_each(|c| *c = Complex::new(c.re * ratio, 0.0));

            ak_converged = first_row_converged(&self.ak[..n], &self.check_ak, &settings);
            if ak_converged {
                ak_initially_converged = true;
            } else {
                for (chk, c) in self.check_ak.iter_mut().zip(&self.ak[..n]) {
                    *chk = c.re;
                }
            }

            let sum_ak = self.update_omega(red, &mapping, fft);

            if !ak_initially_converged {
                continue;
            }

            // b_K step: source term of the field equation
            {
                let (omega, qx, qy, field) = (&self.omega, &self.q_x, &self.q_y, &self.field);
                let (dx, dy) = (&self.d_omega_dx, &self.d_omega_dy);
                self.work.par_iter_mut().enumerate().for_each(|(i, c)| {
                    let re = omega[i] * field[i]
                        + sum_ak * (b_bar - field[i])
                        + qy[i] * dx[i]
                        - qx[i] * dy[i];
                    *c = Complex::new(re, 0.0);
                });
            }
            // Q diverges at the cores
            self.work[0].re = self.work[n].re;
            self.work[core2].re = self.work[0].re;

            fft.forward(&mut self.work);
            self.bk.copy_from_slice(&self.work);
            let c2 = -1.0 / nn as f64;
            mapping.rescale(&mut self.bk, |g2| c2 / (c1 * g2 + sum_ak));

            if first_bk {
                self.check_bk.fill(0.0);
                first_bk = false;
                ak_converged = false;
            }

            bk_converged = first_row_converged(&self.bk[..n], &self.check_bk, &settings);
            if !bk_converged {
                for (chk, c) in self.check_bk.iter_mut().zip(&self.bk[..n]) {
                    *chk = c.re;
                }
            }

            self.work.copy_from_slice(&self.bk);
            fft.inverse(&mut self.work);
            let mut negative = 0usize;
            for (b, c) in self.field.iter_mut().zip(&self.work) {
                let v = b_bar + c.re;
                if v < 0.0 {
                    negative += 1;
                }
                *b = v.max(0.0);
            }
            if negative > 0 {
                debug!("[ngl] field negative at {negative} point(s), clamped to 0");
            }

            if ak_converged && bk_converged {
                break;
            }

            // supervelocity from the field coefficients
            mapping.supervelocity_filter(&self.bk, &mut self.work, Direction::Y, 1.5 * red.a / PI);
            fft.inverse(&mut self.work);
            for ((q, qa), c) in self.q_x.iter_mut().zip(&self.qa_x).zip(&self.work) {
                *q = qa - c.im;
            }

            mapping.supervelocity_filter(
                &self.bk,
                &mut self.work,
                Direction::X,
                0.5 * SQRT3 * red.a / PI,
            );
            fft.inverse(&mut self.work);
            for ((q, qa), c) in self.q_y.iter_mut().zip(&self.qa_y).zip(&self.work) {
                *q = qa + c.im;
            }
        }

        debug!("[ngl] converged after {iterations} iteration(s)");
        ConvergenceReport {
            iterations,
            converged: true,
        }
    }
}

impl FieldModel for NglModel {
    fn name(&self) -> &'static str {
        "ngl"
    }

    fn symmetry(&self) -> LatticeSymmetry {
        LatticeSymmetry::Triangular
    }

    /// The Abrikosov sign pattern needs N divisible by 4.
    fn round_steps(&self, steps: usize) -> usize {
        round_up_to(steps, 4)
    }

    fn compute(&mut self, params: &VortexParams, fft: &mut Fft2D) -> FieldGrid {
        let n = fft.n();
        let cell = UnitCell::for_field(LatticeSymmetry::Triangular, params.field);

        if !params.is_mixed_state() {
            return FieldGrid::uniform(cell, n, params.field);
        }

        self.resize(n);
        let red = Reduced::new(params);
        let report = self.solve(&red, fft);

        FieldGrid {
            cell,
            steps: n,
            data: self.field.iter().map(|b| b * red.field_unit).collect(),
            convergence: Some(report),
        }
    }
}
