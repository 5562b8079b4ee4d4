// src/lib.rs
//
// Magnetic field distribution B(x,y) inside one cell of a vortex lattice in a type-II
// superconductor, for muSR lineshape fitting.
//
//   use vortex_field::{FieldCalculator, LondonModelCalculator, LondonModel, VortexParams};
//
//   let mut calc = LondonModelCalculator::new(LondonModel::triangular(), 256, None);
//   calc.set_parameters(VortexParams::new(100.0, 150.0, 5.0));
//   let (lo, hi) = (calc.b_min(), calc.b_max());

pub mod calculator;
pub mod config;
pub mod error;
pub mod fft;
pub mod grid;
pub mod models;
pub mod output;
pub mod params;
pub mod special;
pub mod spectral;
pub mod visualisation;
pub mod wisdom;

pub use calculator::{ConvergenceReport, FieldCalculator, FieldGrid, FieldModel, VortexFieldCalc};
pub use grid::{LatticeSymmetry, UnitCell};
pub use models::{
    build_calculator, GradientScheme, LondonModel, LondonModelCalculator, LondonVariant,
    ModelKind, NglModel, NglModelCalculator, NglSettings,
};
pub use params::VortexParams;
