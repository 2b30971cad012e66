//! Configuration module for linkcat.
//!
//! Every component is built from an explicit [`Config`] instead of
//! process-wide folder constants. It holds:
//! - The three storage areas (uploads, merged outputs, downloaded assets)
//! - The per-request HTTP timeout and fetch concurrency
//! - The upload size limit enforced by the server

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LinkCatError, Result};

/// Default timeout applied to every outbound fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of concurrent fetches.
pub const DEFAULT_FETCH_JOBS: usize = 4;

/// Default upload limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Directories backing the three storage areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Raw uploaded PDFs.
    pub uploads_dir: PathBuf,
    /// Merged output PDFs, served by id.
    pub merged_dir: PathBuf,
    /// Transient downloaded assets.
    pub downloads_dir: PathBuf,
}

impl StorageConfig {
    /// Place all three areas under a common root directory.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            uploads_dir: root.join("uploads"),
            merged_dir: root.join("merged_pdfs"),
            downloads_dir: root.join("downloads"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            merged_dir: PathBuf::from("merged_pdfs"),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

/// Complete configuration for the link-merge pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage area directories.
    pub storage: StorageConfig,

    /// Timeout for each outbound HTTP request.
    pub fetch_timeout: Duration,

    /// Maximum number of fetches in flight at once.
    pub fetch_jobs: usize,

    /// User-Agent header sent with every fetch.
    pub user_agent: String,

    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fetch_jobs: DEFAULT_FETCH_JOBS,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Default configuration with every storage area under `root`.
    pub fn with_storage_root(root: impl AsRef<Path>) -> Self {
        Self {
            storage: StorageConfig::under(root),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fetch jobs is zero
    /// - Fetch timeout is zero
    /// - Upload limit is zero
    /// - Two storage areas share a directory
    pub fn validate(&self) -> Result<()> {
        if self.fetch_jobs == 0 {
            return Err(LinkCatError::invalid_config(
                "Number of fetch jobs must be at least 1",
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(LinkCatError::invalid_config(
                "Fetch timeout must be greater than zero",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(LinkCatError::invalid_config(
                "Upload size limit must be greater than zero",
            ));
        }

        let storage = &self.storage;
        if storage.uploads_dir == storage.merged_dir
            || storage.uploads_dir == storage.downloads_dir
            || storage.merged_dir == storage.downloads_dir
        {
            return Err(LinkCatError::invalid_config(
                "Uploads, merged and downloads directories must be distinct",
            ));
        }

        Ok(())
    }
}
