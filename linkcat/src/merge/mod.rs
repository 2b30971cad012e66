//! Ordered merging of fetched PDFs.
//!
//! Appends each asset's full page sequence, in list order, into a single
//! document. The merge aborts on the first asset that does not parse; the
//! error names that asset's URL.
//!
//! # Examples
//!
//! ```no_run
//! use linkcat::fetch::FetchedAsset;
//! use linkcat::merge::merge_documents;
//!
//! # fn example(assets: Vec<FetchedAsset>) -> linkcat::Result<()> {
//! let merged = merge_documents(&assets)?;
//! println!("{} pages, id {}", merged.page_count, merged.id);
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{LinkCatError, Result};
use crate::fetch::FetchedAsset;
use crate::pdf::{LopdfDocument, LopdfWriter, PdfWriter};
use crate::storage::{FileId, StorageArea};

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of assets merged.
    pub files_merged: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Total time taken for the merge.
    pub merge_time: Duration,

    /// Total size of the input assets.
    pub input_size: u64,
}

/// The concatenation of one or more fetched PDFs.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    /// Opaque id under which the document is stored and served.
    pub id: FileId,

    /// Serialized PDF.
    pub bytes: Vec<u8>,

    /// Number of pages.
    pub page_count: usize,

    /// URLs of the merged assets, in merge order.
    pub sources: Vec<String>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// PDF merger that concatenates fetched assets.
#[derive(Debug, Clone)]
pub struct Merger {
    compress: bool,
}

impl Merger {
    /// Create a merger that compresses the output.
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// Create a merger that leaves output streams uncompressed.
    pub fn without_compression() -> Self {
        Self { compress: false }
    }

    /// Merge assets in list order.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `assets` is empty ([`LinkCatError::NoAssetsToMerge`])
    /// - an asset is not a well-formed PDF ([`LinkCatError::MalformedDocument`])
    /// - the page tree cannot be extended
    pub fn merge(&self, assets: &[FetchedAsset]) -> Result<MergedDocument> {
        if assets.is_empty() {
            return Err(LinkCatError::NoAssetsToMerge);
        }

        let start = Instant::now();
        let mut writer = if self.compress {
            LopdfWriter::new()
        } else {
            LopdfWriter::without_compression()
        };

        for (idx, asset) in assets.iter().enumerate() {
            let doc = LopdfDocument::load_mem(&asset.bytes, asset.url.as_str())?;
            let added = writer.append_pages_from(doc)?;
            debug!(
                "[{}/{}] {} → {} pages added",
                idx + 1,
                assets.len(),
                asset.url,
                added
            );
        }

        let page_count = writer.page_count();
        let bytes = writer.finish()?;

        let statistics = MergeStatistics {
            files_merged: assets.len(),
            total_pages: page_count,
            merge_time: start.elapsed(),
            input_size: assets.iter().map(|a| a.bytes.len() as u64).sum(),
        };

        info!(
            files = statistics.files_merged,
            pages = statistics.total_pages,
            input = %format_file_size(statistics.input_size),
            "Merged PDFs"
        );

        Ok(MergedDocument {
            id: FileId::generate(StorageArea::Merged),
            bytes,
            page_count,
            sources: assets.iter().map(|a| a.url.clone()).collect(),
            statistics,
        })
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge assets in list order with the default merger.
pub fn merge_documents(assets: &[FetchedAsset]) -> Result<MergedDocument> {
    Merger::new().merge(assets)
}

/// Format file size as human-readable string.
fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
