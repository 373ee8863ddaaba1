//! Checkpoint and results files

use crate::catalog::CatalogItem;
use crate::config::OutputConfig;
use crate::state::Badge;
use crate::storage::{ResultSet, StorageError, StorageResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted resume point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeCheckpoint {
    /// 0-based index of the listing page being processed
    pub last_page_scraped: u32,

    /// Position index on that page to restart from
    pub last_position_scraped: u32,

    pub total_items_scraped: u64,
}

/// Reads and writes the checkpoint and results files of one category
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    checkpoint_path: PathBuf,
    results_path: PathBuf,
}

impl CheckpointStore {
    pub fn new(checkpoint_path: impl Into<PathBuf>, results_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            results_path: results_path.into(),
        }
    }

    /// Store for one category; file names are suffixed with the badge slug
    ///
    /// `./checkpoint.json` becomes `./checkpoint_new.json` for the New badge.
    pub fn for_category(output: &OutputConfig, badge: Badge) -> Self {
        Self::new(
            suffixed(Path::new(&output.checkpoint_path), badge.slug()),
            suffixed(Path::new(&output.results_path), badge.slug()),
        )
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// True if a previous run left a checkpoint behind
    pub fn exists(&self) -> bool {
        self.checkpoint_path.exists()
    }

    /// Reads the checkpoint, if there is one
    pub fn load(&self) -> StorageResult<Option<ScrapeCheckpoint>> {
        if !self.exists() {
            return Ok(None);
        }
        read_json(&self.checkpoint_path).map(Some)
    }

    /// Reads previously accumulated results; a missing file yields none
    pub fn load_results(&self) -> StorageResult<Vec<CatalogItem>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }
        read_json(&self.results_path)
    }

    /// Persists results, then the checkpoint that covers them
    ///
    /// Each file is replaced atomically. A crash between the two writes
    /// leaves an older checkpoint next to newer results, which resuming
    /// tolerates because results are de-duplicated.
    pub fn save(&self, checkpoint: &ScrapeCheckpoint, results: &ResultSet) -> StorageResult<()> {
        write_json_atomic(&self.results_path, results.items())?;
        write_json_atomic(&self.checkpoint_path, checkpoint)?;

        tracing::trace!(
            "Checkpoint saved: page {}, position {}, {} items",
            checkpoint.last_page_scraped,
            checkpoint.last_position_scraped,
            checkpoint.total_items_scraped
        );
        Ok(())
    }

    /// Deletes both files
    pub fn clear(&self) -> StorageResult<()> {
        for path in [&self.checkpoint_path, &self.results_path] {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StorageError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Inserts `_{suffix}` before the file extension
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };

    path.with_file_name(file_name)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
