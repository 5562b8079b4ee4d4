// src/config.rs
//
// JSON run configuration. Every field has a default, so a config file only needs the
// values it changes. The resolved configuration is written next to the outputs.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{ModelKind, NglSettings};
use crate::params::VortexParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: ModelKind,
    pub params: VortexParams,
    /// Grid resolution N; rounded up to what the model accepts.
    pub steps: usize,
    /// Optional FFT wisdom file.
    pub wisdom: Option<PathBuf>,
    pub ngl: NglSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Write field.csv.
    pub csv: bool,
    /// Write field.png.
    pub plot: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::London,
            params: VortexParams::default(),
            steps: 256,
            wisdom: None,
            ngl: NglSettings::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
            csv: true,
            plot: false,
        }
    }
}

impl RunConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let f = File::open(path)?;
        let mut cfg: RunConfig = serde_json::from_reader(BufReader::new(f))?;
        let p = cfg.params;
        cfg.params = VortexParams::new(p.field, p.lambda, p.xi);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps < 4 {
            return Err(ConfigError::InvalidSteps(format!(
                "steps must be at least 4, got {}",
                self.steps
            )));
        }
        if self.ngl.max_iterations == 0 {
            return Err(ConfigError::InvalidSolver(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.ngl.abs_tolerance >= 0.0) || !(self.ngl.rel_tolerance > 0.0) {
            return Err(ConfigError::InvalidSolver(format!(
                "tolerances must be non-negative (abs) and positive (rel), got {} / {}",
                self.ngl.abs_tolerance, self.ngl.rel_tolerance
            )));
        }
        Ok(())
    }

    /// Write the resolved configuration as `config.json` into `out_dir`.
    pub fn write_to_dir(&self, out_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(out_dir)?;
        let file = File::create(out_dir.join("config.json"))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
