// src/error.rs
//
// Error types for the fallible edges of the crate (parameter vectors, wisdom files,
// configuration and output). Field calculations themselves never fail; unphysical
// input degrades to a uniform field instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("need the field, penetration depth and coherence length, got {got} value(s)")]
    TooFew { got: usize },
}

#[derive(Debug, Error)]
pub enum WisdomError {
    #[error("IO error on wisdom file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wisdom file {path:?} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("wisdom file {path:?} has version {found}, expected {expected}")]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid grid resolution: {0}")]
    InvalidSteps(String),

    #[error("Invalid solver settings: {0}")]
    InvalidSolver(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plotting error: {0}")]
    Plot(String),
}
