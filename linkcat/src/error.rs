//! Error types for linkcat.
//!
//! This module defines all error types that can occur while extracting links,
//! fetching linked documents, merging them and storing the results.
//!
//! # Error Categories
//!
//! - **Document Errors**: unparseable or encrypted PDFs
//! - **Download Errors**: a single URL could not be fetched (recovered locally)
//! - **Merge Errors**: nothing to merge, broken page tree
//! - **Storage Errors**: unknown or malformed file ids, I/O failures
//!
//! "No links found" and "no fetchable PDFs" are not errors. They are
//! reported as [`crate::pipeline::PipelineOutcome`] variants.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for linkcat operations.
pub type Result<T> = std::result::Result<T, LinkCatError>;

/// Main error type for linkcat operations.
#[derive(Debug, Error)]
pub enum LinkCatError {
    /// Input cannot be parsed as a PDF.
    #[error("Malformed PDF document: {source_name}\n  Reason: {reason}")]
    MalformedDocument {
        /// Where the bytes came from: "upload" or the asset URL.
        source_name: String,
        /// Parser message.
        reason: String,
    },

    /// PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted and cannot be processed: {source_name}")]
    EncryptedDocument {
        /// Where the bytes came from.
        source_name: String,
    },

    /// The merger was called without any assets.
    #[error("No fetched PDF assets to merge")]
    NoAssetsToMerge,

    /// A single URL could not be downloaded as a PDF.
    #[error("Download failed for {url}: {reason}")]
    Download {
        /// URL that was requested.
        url: String,
        /// Why the response was not retained.
        reason: String,
    },

    /// Page tree manipulation failed while merging.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// No stored file exists under the requested id.
    #[error("File not found: {id}")]
    NotFound {
        /// Requested id.
        id: String,
    },

    /// The requested id is not a valid opaque identifier.
    #[error("Invalid file id: {id}")]
    InvalidFileId {
        /// Rejected id.
        id: String,
    },

    /// Failed to write a file into a storage area.
    #[error("Failed to write file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {source}")]
    Http {
        /// Underlying client error.
        #[from]
        source: reqwest::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {message}")]
    Task {
        /// Join error message.
        message: String,
    },
}

impl From<tokio::task::JoinError> for LinkCatError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task {
            message: err.to_string(),
        }
    }
}

impl LinkCatError {
    /// Create a MalformedDocument error.
    pub fn malformed_document(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an EncryptedDocument error.
    pub fn encrypted_document(source_name: impl Into<String>) -> Self {
        Self::EncryptedDocument {
            source_name: source_name.into(),
        }
    }

    /// Create a Download error.
    pub fn download(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an InvalidFileId error.
    pub fn invalid_file_id(id: impl Into<String>) -> Self {
        Self::InvalidFileId { id: id.into() }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single URL or asset.
    ///
    /// Recoverable errors are swallowed and logged by the stage that hit
    /// them; everything else halts the pipeline.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Download { .. })
    }

    /// HTTP status code the server should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedDocument { .. } => 422,
            Self::EncryptedDocument { .. } => 422,
            Self::NoAssetsToMerge => 400,
            Self::Download { .. } => 502,
            Self::NotFound { .. } => 404,
            Self::InvalidFileId { .. } => 400,
            Self::MergeFailed { .. } => 500,
            Self::FailedToWrite { .. } => 500,
            Self::InvalidConfig { .. } => 500,
            Self::Http { .. } => 500,
            Self::Io { .. } => 500,
            Self::Task { .. } => 500,
        }
    }
}
