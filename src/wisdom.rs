// src/wisdom.rs
//
// Persistent FFT planner cache.
//
// A wisdom file records, per transform length, which rustfft kernel family won a timing
// benchmark. Loading a file switches the engine to exhaustive planning (benchmark every
// length that is not yet recorded); the updated table is written back to the same path
// when the store is dropped. Without a file the engine plans by estimate and nothing is
// written.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::WisdomError;

pub const WISDOM_VERSION: u32 = 1;

/// rustfft kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FftKernel {
    /// `FftPlanner`: picks AVX/SSE/NEON when the CPU supports them.
    Simd,
    /// `FftPlannerScalar`.
    Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub kernel: FftKernel,
    pub nanos_per_transform: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WisdomFile {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<usize, PlanRecord>,
}

impl Default for WisdomFile {
    fn default() -> Self {
        Self {
            version: WISDOM_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Wisdom table bound to the file it came from.
#[derive(Debug)]
pub struct Wisdom {
    path: PathBuf,
    table: WisdomFile,
    export_on_drop: bool,
}

impl Wisdom {
    /// Read an existing wisdom file.
    pub fn load(path: &Path) -> Result<Self, WisdomError> {
        let f = File::open(path).map_err(|source| WisdomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: WisdomFile =
            serde_json::from_reader(BufReader::new(f)).map_err(|source| WisdomError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        if table.version != WISDOM_VERSION {
            return Err(WisdomError::Version {
                path: path.to_path_buf(),
                found: table.version,
                expected: WISDOM_VERSION,
            });
        }

        debug!(
            "[wisdom] loaded {} entr(y/ies) from {}",
            table.entries.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            table,
            export_on_drop: true,
        })
    }

    /// Load `path` if it holds valid wisdom, otherwise start an empty table that will be
    /// written there. Used by the wisdom generator.
    pub fn load_or_create(path: &Path) -> Self {
        match Self::load(path) {
            Ok(w) => w,
            Err(e) => {
                debug!("[wisdom] starting fresh table ({e})");
                Self {
                    path: path.to_path_buf(),
                    table: WisdomFile::default(),
                    export_on_drop: true,
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, len: usize) -> Option<&PlanRecord> {
        self.table.entries.get(&len)
    }

    pub fn record(&mut self, len: usize, rec: PlanRecord) {
        self.table.entries.insert(len, rec);
    }

    /// Drop the record for `len` so the next plan for it is measured again.
    pub fn forget(&mut self, len: usize) -> Option<PlanRecord> {
        self.table.entries.remove(&len)
    }

    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    pub fn table(&self) -> &WisdomFile {
        &self.table
    }

    /// Keep the file on disk untouched when this store goes away.
    pub fn disarm(&mut self) {
        self.export_on_drop = false;
    }

    /// Write the table to its path, creating parent directories.
    pub fn export(&self) -> Result<(), WisdomError> {
        let io_err = |source| WisdomError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let f = File::create(&self.path).map_err(io_err)?;
        serde_json::to_writer_pretty(BufWriter::new(f), &self.table).map_err(|source| {
            WisdomError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(())
    }
}

impl Drop for Wisdom {
    fn drop(&mut self) {
        if !self.export_on_drop {
            return;
        }
        match self.export() {
            Ok(()) => debug!("[wisdom] exported to {}", self.path.display()),
            Err(e) => warn!("[wisdom] could not export: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("vortex_field_wisdom_{}_{}", std::process::id(), name));
        p
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let p = scratch_path("missing.json");
        let _ = fs::remove_file(&p);
        assert!(matches!(Wisdom::load(&p), Err(WisdomError::Io { .. })));
    }

    #[test]
    fn garbage_is_a_json_error() {
        let p = scratch_path("garbage.json");
        fs::write(&p, "not wisdom").unwrap();
        assert!(matches!(Wisdom::load(&p), Err(WisdomError::Json { .. })));
        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn wrong_version_is_rejected() {
        let p = scratch_path("version.json");
        fs::write(&p, r#"{"version": 999, "entries": {}}"#).unwrap();
        assert!(matches!(
            Wisdom::load(&p),
            Err(WisdomError::Version { found: 999, .. })
        ));
        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn records_are_exported_on_drop() {
        let p = scratch_path("roundtrip.json");
        let _ = fs::remove_file(&p);
        {
            let mut w = Wisdom::load_or_create(&p);
            assert!(w.is_empty());
            w.record(
                64,
                PlanRecord {
                    kernel: FftKernel::Scalar,
                    nanos_per_transform: 812.5,
                },
            );
        }
        let w = Wisdom::load(&p).unwrap();
        assert_eq!(w.len(), 1);
        assert_eq!(w.get(64).map(|r| r.kernel), Some(FftKernel::Scalar));
        drop(w);
        fs::remove_file(&p).unwrap();
    }
}
