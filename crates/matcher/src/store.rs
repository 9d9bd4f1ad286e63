//! On-disk layout of a standardization session.
//!
//! ```text
//! <output_dir>/
//!   checkpoint.json                        pointer to the current pair
//!   products_standardized_<ts>.json        every AnnotatedRecord so far
//!   products_not_found_<ts>.json           aggregated non-matches
//! ```
//!
//! Every file is replaced atomically (write `.tmp`, then rename) so an
//! interrupted save leaves the previous version intact.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::model::{AnnotatedRecord, Catalog, NonMatchEntry, RawRecord};

pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Paths of the output pair a session writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub standardized: PathBuf,
    pub non_matches: PathBuf,
}

/// Durable pointer to the current session's output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub output_files: OutputFiles,
    pub last_updated: String,
}

impl Checkpoint {
    pub fn now(output_files: OutputFiles) -> Self {
        Self {
            output_files,
            last_updated: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    /// Create the output directory if needed.
    pub fn ensure_dir(&self) -> Result<(), MatchError> {
        fs::create_dir_all(&self.dir).map_err(|e| MatchError::write(&self.dir, e))
    }

    /// A new timestamped output pair inside this store.
    pub fn fresh_files(&self) -> OutputFiles {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        OutputFiles {
            standardized: self.dir.join(format!("products_standardized_{stamp}.json")),
            non_matches: self.dir.join(format!("products_not_found_{stamp}.json")),
        }
    }

    pub fn load_checkpoint(&self) -> Result<Option<Checkpoint>, MatchError> {
        let path = self.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    pub fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), MatchError> {
        write_json_atomic(&self.checkpoint_path(), checkpoint)
    }

    /// Prior standardized records, or `None` when the file does not exist.
    pub fn load_standardized(&self, files: &OutputFiles) -> Result<Option<Vec<AnnotatedRecord>>, MatchError> {
        if !files.standardized.exists() {
            return Ok(None);
        }
        read_json(&files.standardized).map(Some)
    }

    pub fn load_non_matches(&self, files: &OutputFiles) -> Result<Vec<NonMatchEntry>, MatchError> {
        if !files.non_matches.exists() {
            return Ok(Vec::new());
        }
        read_json(&files.non_matches)
    }

    /// Persist records, non-match report and checkpoint, in that order.
    ///
    /// The non-match report is only present while it has rows; an empty
    /// report removes any earlier file.
    pub fn save_all(
        &self,
        files: &OutputFiles,
        records: &[AnnotatedRecord],
        non_matches: &[NonMatchEntry],
    ) -> Result<(), MatchError> {
        write_json_atomic(&files.standardized, &records)?;
        if non_matches.is_empty() {
            remove_if_exists(&files.non_matches)?;
        } else {
            write_json_atomic(&files.non_matches, &non_matches)?;
        }
        self.save_checkpoint(&Checkpoint::now(files.clone()))?;
        log::debug!("saved {} records to {}", records.len(), files.standardized.display());
        Ok(())
    }
}

pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, MatchError> {
    read_json(path)
}

pub fn load_catalog(path: &Path) -> Result<Catalog, MatchError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MatchError> {
    let text = fs::read_to_string(path).map_err(|e| MatchError::read(path, e))?;
    serde_json::from_str(&text).map_err(|e| MatchError::parse(path, e))
}

fn remove_if_exists(path: &Path) -> Result<(), MatchError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MatchError::write(path, e)),
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), MatchError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| MatchError::Encode(e.to_string()))?;
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, json).map_err(|e| MatchError::write(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| MatchError::write(path, e))
}
