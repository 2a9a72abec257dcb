//! Prediction log - append-only CSV of scored records
//!
//! One header row when the file is created, then one row per prediction.
//! Writes go through a single append-mode handle behind a mutex, so
//! concurrent requests never interleave partial rows.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::models::{MetricsRecord, RiskLevel, EXPECTED_FIELDS};

pub const LEVEL_COLUMN: &str = "predicted_productivity";

pub struct PredictionLog {
    file: Mutex<Option<File>>,
    path: PathBuf,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Mutex::new(None),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one prediction row
    pub fn append(&self, record: &MetricsRecord, level: RiskLevel) -> io::Result<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            *guard = Some(self.open()?);
        }

        let Some(file) = guard.as_mut() else {
            return Ok(());
        };

        let mut row: Vec<String> = EXPECTED_FIELDS
            .iter()
            .map(|f| record.get(f).map(|v| v.to_csv_cell()).unwrap_or_default())
            .collect();
        row.push(level.to_string());

        // Single write per row keeps appends whole
        let line = format!("{}\n", row.join(","));
        if let Err(e) = file.write_all(line.as_bytes()) {
            // Reopen on the next append, e.g. after the file was rotated away
            *guard = None;
            return Err(e);
        }

        Ok(())
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        if file.metadata()?.len() == 0 {
            let mut header: Vec<&str> = EXPECTED_FIELDS.to_vec();
            header.push(LEVEL_COLUMN);
            writeln!(file, "{}", header.join(","))?;
            tracing::info!("Created prediction log at {}", self.path.display());
        }

        Ok(file)
    }
}

impl std::fmt::Debug for PredictionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionLog").field("path", &self.path).finish()
    }
}
