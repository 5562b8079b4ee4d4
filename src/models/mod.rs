// src/models/mod.rs

pub mod london;
pub mod ngl;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calculator::{FieldCalculator, VortexFieldCalc};

pub use london::{LondonModel, LondonVariant};
pub use ngl::{GradientScheme, NglModel, NglSettings};

pub type LondonModelCalculator = VortexFieldCalc<LondonModel>;
pub type NglModelCalculator = VortexFieldCalc<NglModel>;

/// Every field model the crate knows, for configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    London,
    SquareLondon,
    ModifiedLondon,
    AnalyticalGl,
    Ngl,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::London,
        ModelKind::SquareLondon,
        ModelKind::ModifiedLondon,
        ModelKind::AnalyticalGl,
        ModelKind::Ngl,
    ];
}

/// Boxed calculator for `kind`. `ngl` settings are ignored by the closed-form models.
pub fn build_calculator(
    kind: ModelKind,
    steps: usize,
    ngl: NglSettings,
    wisdom: Option<&Path>,
) -> Box<dyn FieldCalculator> {
    match kind {
        ModelKind::London => Box::new(VortexFieldCalc::new(LondonModel::triangular(), steps, wisdom)),
        ModelKind::SquareLondon => Box::new(VortexFieldCalc::new(LondonModel::square(), steps, wisdom)),
        ModelKind::ModifiedLondon => {
            Box::new(VortexFieldCalc::new(LondonModel::modified(), steps, wisdom))
        }
        ModelKind::AnalyticalGl => {
            Box::new(VortexFieldCalc::new(LondonModel::analytical_gl(), steps, wisdom))
        }
        ModelKind::Ngl => Box::new(VortexFieldCalc::new(
            NglModel::with_settings(ngl),
            steps,
            wisdom,
        )),
    }
}
