//! File storage for uploads, merged outputs and downloaded assets.
//!
//! Each area is a directory. Files are keyed by opaque [`FileId`]s generated
//! from UUID v4, so concurrent writers never collide and no locking is
//! needed. Writes are atomic: bytes land in a uniquely named temporary file
//! that is then renamed into place.
//!
//! # Examples
//!
//! ```no_run
//! use linkcat::config::StorageConfig;
//! use linkcat::storage::Storage;
//!
//! # async fn example(bytes: &[u8]) -> linkcat::Result<()> {
//! let storage = Storage::init(StorageConfig::under("data")).await?;
//! let stored = storage.receive_upload(bytes).await?;
//! println!("Upload saved to {}", stored.path.display());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{LinkCatError, Result};

/// File name suffix of every stored document.
pub const PDF_SUFFIX: &str = ".pdf";

/// Prefix of merged output names.
const MERGED_PREFIX: &str = "merged_";

/// The three storage areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// Raw uploaded PDFs.
    Uploads,
    /// Merged outputs, served by id.
    Merged,
    /// Transient downloaded assets.
    Downloads,
}

/// Opaque identifier of a stored file, e.g. `merged_<uuid>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generate a fresh id for the given area.
    pub fn generate(area: StorageArea) -> Self {
        let uuid = Uuid::new_v4();
        match area {
            StorageArea::Merged => Self(format!("{MERGED_PREFIX}{uuid}{PDF_SUFFIX}")),
            StorageArea::Uploads | StorageArea::Downloads => Self(format!("{uuid}{PDF_SUFFIX}")),
        }
    }

    /// Parse an id received from a caller.
    ///
    /// Only `[A-Za-z0-9_-]` characters are accepted, optionally followed by
    /// the `.pdf` suffix, which is added when missing. Anything else, in
    /// particular path separators and `..`, is rejected so an id can never
    /// point outside its storage area.
    pub fn parse(raw: &str) -> Result<Self> {
        let stem = raw.strip_suffix(PDF_SUFFIX).unwrap_or(raw);

        let valid = !stem.is_empty()
            && stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(LinkCatError::invalid_file_id(raw));
        }

        Ok(Self(format!("{stem}{PDF_SUFFIX}")))
    }

    /// The id as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file written into a storage area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Opaque id of the file.
    pub id: FileId,
    /// Full path on disk.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

/// Directory-backed storage for the three areas.
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Wrap existing directories without touching the filesystem.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Create the three area directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub async fn init(config: StorageConfig) -> Result<Self> {
        let storage = Self::new(config);

        for area in [
            StorageArea::Uploads,
            StorageArea::Merged,
            StorageArea::Downloads,
        ] {
            let dir = storage.area_dir(area);
            tokio::fs::create_dir_all(dir).await?;
            debug!(area = ?area, dir = %dir.display(), "Storage area ready");
        }

        Ok(storage)
    }

    /// Directory backing the given area.
    pub fn area_dir(&self, area: StorageArea) -> &Path {
        match area {
            StorageArea::Uploads => &self.config.uploads_dir,
            StorageArea::Merged => &self.config.merged_dir,
            StorageArea::Downloads => &self.config.downloads_dir,
        }
    }

    /// Store raw uploaded bytes under a fresh id.
    pub async fn receive_upload(&self, bytes: &[u8]) -> Result<StoredFile> {
        let stored = self
            .store(StorageArea::Uploads, FileId::generate(StorageArea::Uploads), bytes)
            .await?;
        info!(path = %stored.path.display(), "Uploaded file saved");
        Ok(stored)
    }

    /// Store a downloaded asset under a fresh id.
    pub async fn store_download(&self, bytes: &[u8]) -> Result<StoredFile> {
        self.store(
            StorageArea::Downloads,
            FileId::generate(StorageArea::Downloads),
            bytes,
        )
        .await
    }

    /// Store a merged output under its generated id.
    pub async fn store_merged(&self, id: FileId, bytes: &[u8]) -> Result<StoredFile> {
        self.store(StorageArea::Merged, id, bytes).await
    }

    /// Read a merged output by id.
    ///
    /// # Errors
    ///
    /// Returns [`LinkCatError::InvalidFileId`] for malformed ids and
    /// [`LinkCatError::NotFound`] when nothing is stored under the id.
    pub async fn serve_file(&self, id: &str) -> Result<Vec<u8>> {
        let id = FileId::parse(id)?;
        let path = self.area_dir(StorageArea::Merged).join(id.as_str());

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LinkCatError::not_found(id.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, area: StorageArea, id: FileId, bytes: &[u8]) -> Result<StoredFile> {
        let path = self.area_dir(area).join(id.as_str());
        write_atomic(&path, bytes).await?;

        Ok(StoredFile {
            id,
            path,
            size: bytes.len() as u64,
        })
    }
}

/// Write to a unique temporary sibling, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

    if let Err(source) = tokio::fs::write(&temp_path, bytes).await {
        return Err(LinkCatError::FailedToWrite {
            path: temp_path,
            source,
        });
    }

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(LinkCatError::FailedToWrite {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
