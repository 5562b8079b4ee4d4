// src/calculator.rs
//
// Calculator shell shared by every field model: parameters, resolution, FFT engine and the
// lazily filled output grid.

use std::path::Path;

use log::trace;
use serde::Serialize;

use crate::fft::Fft2D;
use crate::grid::{Grid2D, LatticeSymmetry, UnitCell};
use crate::params::VortexParams;

/// Outcome of an iterative solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvergenceReport {
    /// Outer passes executed.
    pub iterations: usize,
    pub converged: bool,
}

/// One evaluated field map B(x,y) in Gauss over a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    pub cell: UnitCell,
    pub steps: usize,
    /// Row-major, `data[row * steps + col]`.
    pub data: Vec<f64>,
    /// Present for iterative models.
    pub convergence: Option<ConvergenceReport>,
}

impl FieldGrid {
    /// Constant field everywhere; the fallback outside the mixed state.
    pub fn uniform(cell: UnitCell, steps: usize, value: f64) -> Self {
        Self {
            cell,
            steps,
            data: vec![value; steps * steps],
            convergence: None,
        }
    }

    pub fn grid(&self) -> Grid2D {
        Grid2D::new(self.steps)
    }

    #[inline]
    pub fn at(&self, col: usize, row: usize) -> f64 {
        self.data[self.grid().idx(col, row)]
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// A way of turning (B, lambda, xi) into a field map.
pub trait FieldModel: Send {
    fn name(&self) -> &'static str;

    fn symmetry(&self) -> LatticeSymmetry;

    /// Smallest resolution this model accepts that is >= `steps`.
    fn round_steps(&self, steps: usize) -> usize;

    /// Evaluate one grid. Must not fail: unphysical input yields a uniform grid.
    fn compute(&mut self, params: &VortexParams, fft: &mut Fft2D) -> FieldGrid;
}

/// Round `steps` up to a positive multiple of `granularity`.
pub fn round_up_to(steps: usize, granularity: usize) -> usize {
    let s = steps.max(granularity);
    s.div_ceil(granularity) * granularity
}

/// Cache state of a calculator.
#[derive(Debug, Clone, Default)]
pub enum GridState {
    #[default]
    Stale,
    Valid(FieldGrid),
}

impl GridState {
    fn get_or_compute(&mut self, f: impl FnOnce() -> FieldGrid) -> &FieldGrid {
        if let GridState::Stale = self {
            *self = GridState::Valid(f());
        }
        match self {
            GridState::Valid(grid) => grid,
            GridState::Stale => unreachable!("grid state set to Valid above"),
        }
    }
}

/// Object-safe calculator interface, so callers can hold `Box<dyn FieldCalculator>`.
pub trait FieldCalculator: Send {
    /// Replace the parameters and invalidate the cached grid. No computation happens.
    fn set_parameters(&mut self, params: VortexParams);

    fn parameters(&self) -> VortexParams;

    /// Evaluate if stale; otherwise hand back the cached grid untouched.
    fn calculate_grid(&mut self) -> &FieldGrid;

    /// True only after a completed evaluation with the current parameters.
    fn grid_exists(&self) -> bool;

    fn steps(&self) -> usize;

    fn symmetry(&self) -> LatticeSymmetry;

    fn model_name(&self) -> &'static str;

    /// Flat row-major field map in Gauss.
    fn data_b(&mut self) -> &[f64] {
        &self.calculate_grid().data
    }

    /// Field at the vortex core at the origin.
    fn b_max(&mut self) -> f64 {
        self.calculate_grid().data[0]
    }

    /// Minimum over the first quadrant (rows and columns `0..N/2`), which holds the
    /// saddle and minimum points of both lattices. Zero if any scanned value is <= 0,
    /// NaN if any is NaN.
    fn b_min(&mut self) -> f64 {
        let grid = self.calculate_grid();
        let n = grid.steps;
        let mut min = f64::INFINITY;
        for row in 0..n / 2 {
            for &v in &grid.data[row * n..row * n + n / 2] {
                if v.is_nan() {
                    return f64::NAN;
                }
                if v <= 0.0 {
                    return 0.0;
                }
                min = min.min(v);
            }
        }
        min
    }

    fn unit_cell(&mut self) -> UnitCell {
        self.calculate_grid().cell
    }
}

/// Generic calculator over a field model.
#[derive(Debug)]
pub struct VortexFieldCalc<M: FieldModel> {
    params: VortexParams,
    state: GridState,
    fft: Fft2D,
    model: M,
}

impl<M: FieldModel> VortexFieldCalc<M> {
    /// `steps` is rounded up to what the model accepts. Plans are made once here.
    pub fn new(model: M, steps: usize, wisdom: Option<&Path>) -> Self {
        let steps = model.round_steps(steps);
        Self {
            params: VortexParams::default(),
            state: GridState::Stale,
            fft: Fft2D::new(steps, wisdom),
            model,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Change model settings; the cached grid is invalidated.
    pub fn reconfigure(&mut self, f: impl FnOnce(&mut M)) {
        f(&mut self.model);
        self.state = GridState::Stale;
    }

    pub fn fft(&self) -> &Fft2D {
        &self.fft
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }
}

impl<M: FieldModel> FieldCalculator for VortexFieldCalc<M> {
    fn set_parameters(&mut self, params: VortexParams) {
        self.params = params;
        self.state = GridState::Stale;
    }

    fn parameters(&self) -> VortexParams {
        self.params
    }

    fn calculate_grid(&mut self) -> &FieldGrid {
        let Self {
            params,
            state,
            fft,
            model,
        } = self;
        state.get_or_compute(|| {
            trace!(
                "[{}] B={} G, lambda={} nm, xi={} nm, N={}",
                model.name(),
                params.field,
                params.lambda,
                params.xi,
                fft.n()
            );
            model.compute(params, fft)
        })
    }

    fn grid_exists(&self) -> bool {
        matches!(self.state, GridState::Valid(_))
    }

    fn steps(&self) -> usize {
        self.fft.n()
    }

    fn symmetry(&self) -> LatticeSymmetry {
        self.model.symmetry()
    }

    fn model_name(&self) -> &'static str {
        self.model.name()
    }
}
