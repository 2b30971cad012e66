//! End-to-end processing of one upload.
//!
//! The three stages run strictly in sequence:
//! 1. extract links from the stored upload
//! 2. fetch the linked PDFs
//! 3. merge them and store the result
//!
//! "No links" and "no fetchable PDFs" stop the pipeline early and are
//! reported as [`PipelineOutcome`] variants, not errors.

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::extract::{ExtractedLinks, LinkExtractor};
use crate::fetch::Fetcher;
use crate::merge::Merger;
use crate::storage::{FileId, Storage};

/// Terminal state of a processed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The upload contains no links; nothing was fetched or merged.
    NoLinks,
    /// Links were found but none of them resolved to a PDF.
    NoFetchableAssets {
        /// Every link that was tried.
        links: ExtractedLinks,
    },
    /// At least one PDF was fetched and the merge was stored.
    Merged {
        /// Id of the stored merged document.
        merged_id: FileId,
        /// Pages in the merged document.
        page_count: usize,
        /// Every link found in the upload.
        links: ExtractedLinks,
    },
}

/// Owns every stage and drives uploads through them.
///
/// Immutable after construction, so one instance can be shared across
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Pipeline {
    storage: Storage,
    extractor: LinkExtractor,
    fetcher: Fetcher,
    merger: Merger,
}

impl Pipeline {
    /// Build all stages from configuration and create the storage areas.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the storage
    /// directories cannot be created or the HTTP client cannot be built.
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let storage = Storage::init(config.storage.clone()).await?;
        let fetcher = Fetcher::new(config, storage.clone())?;

        Ok(Self {
            storage,
            extractor: LinkExtractor::new(),
            fetcher,
            merger: Merger::new(),
        })
    }

    /// Storage used by this pipeline.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Store an upload and run it through every stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload cannot be stored, does not parse as a
    /// PDF, or the merge or its storage fails.
    pub async fn process_upload(&self, bytes: Vec<u8>) -> Result<PipelineOutcome> {
        let upload = self.storage.receive_upload(&bytes).await?;

        let extractor = self.extractor.clone();
        let links =
            tokio::task::spawn_blocking(move || extractor.extract(&bytes, "upload")).await??;
        info!(upload = %upload.id, links = links.len(), "Extracted links");

        if links.is_empty() {
            return Ok(PipelineOutcome::NoLinks);
        }

        let assets = self.fetcher.fetch_pdf_assets(&links).await;
        if assets.is_empty() {
            return Ok(PipelineOutcome::NoFetchableAssets { links });
        }

        let merger = self.merger.clone();
        let merged = tokio::task::spawn_blocking(move || merger.merge(&assets)).await??;

        let stored = self.storage.store_merged(merged.id, &merged.bytes).await?;
        info!(
            path = %stored.path.display(),
            pages = merged.page_count,
            "Merged PDF stored"
        );

        Ok(PipelineOutcome::Merged {
            merged_id: stored.id,
            page_count: merged.page_count,
            links,
        })
    }

    /// Read a stored merged document by id.
    pub async fn serve_file(&self, id: &str) -> Result<Vec<u8>> {
        self.storage.serve_file(id).await
    }
}
