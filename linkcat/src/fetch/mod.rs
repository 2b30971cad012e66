//! Selective fetching of linked PDFs.
//!
//! Every URL gets a single GET with a bounded timeout. A response is kept
//! only when the status is 2xx *and* the declared `Content-Type` starts with
//! `application/pdf`; anything else is logged and skipped. A failing URL never
//! affects the others and never surfaces as an error to the caller.
//!
//! # Examples
//!
//! ```no_run
//! use linkcat::config::Config;
//! use linkcat::extract::ExtractedLinks;
//! use linkcat::fetch::Fetcher;
//! use linkcat::storage::Storage;
//!
//! # async fn example(links: ExtractedLinks) -> linkcat::Result<()> {
//! let config = Config::default();
//! let storage = Storage::init(config.storage.clone()).await?;
//! let fetcher = Fetcher::new(&config, storage)?;
//!
//! let assets = fetcher.fetch_pdf_assets(&links).await;
//! println!("{} of {} links were PDFs", assets.len(), links.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{LinkCatError, Result};
use crate::extract::ExtractedLinks;
use crate::storage::Storage;

/// MIME type a response must declare to be retained.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A downloaded PDF, confirmed by status and content type.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    /// URL the asset was fetched from.
    pub url: String,
    /// Full response body.
    pub bytes: Vec<u8>,
    /// Copy of the body in the downloads area.
    pub stored_path: PathBuf,
}

/// Why a URL was not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Connection or transfer failure.
    Network(String),
    /// The request exceeded the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    Status(u16),
    /// 2xx, but the content type is not PDF.
    NotPdf {
        /// Declared content type, if any.
        content_type: Option<String>,
    },
    /// The body could not be saved to the downloads area.
    Storage(String),
}

impl SkipReason {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(reason) => write!(f, "network error: {reason}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::NotPdf {
                content_type: Some(content_type),
            } => write!(f, "not a PDF (content type '{content_type}')"),
            Self::NotPdf { content_type: None } => write!(f, "not a PDF (no content type)"),
            Self::Storage(reason) => write!(f, "could not store download: {reason}"),
        }
    }
}

/// Outcome of fetching one URL.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The response was a PDF and has been kept.
    Retained(FetchedAsset),
    /// The URL was skipped.
    Skipped {
        /// URL that was requested.
        url: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
}

impl FetchOutcome {
    /// URL this outcome belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Retained(asset) => &asset.url,
            Self::Skipped { url, .. } => url,
        }
    }

    /// Convert into a result, surfacing a skip as a download error.
    pub fn into_result(self) -> Result<FetchedAsset> {
        match self {
            Self::Retained(asset) => Ok(asset),
            Self::Skipped { url, reason } => Err(LinkCatError::download(url, reason.to_string())),
        }
    }
}

/// Aggregate of all outcomes of one fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Retained assets, in traversal order.
    pub assets: Vec<FetchedAsset>,
    /// Skipped URLs with their reasons, in traversal order.
    pub skipped: Vec<(String, SkipReason)>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl FetchReport {
    fn from_outcomes(outcomes: Vec<FetchOutcome>, elapsed: Duration) -> Self {
        let mut report = Self {
            elapsed,
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Retained(asset) => report.assets.push(asset),
                FetchOutcome::Skipped { url, reason } => report.skipped.push((url, reason)),
            }
        }

        report
    }

    /// Number of URLs that were skipped because they were not PDFs.
    pub fn not_pdf_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, reason)| matches!(reason, SkipReason::NotPdf { .. }))
            .count()
    }

    /// Number of URLs that failed on the network, timed out or returned a
    /// non-2xx status.
    pub fn failed_count(&self) -> usize {
        self.skipped.len() - self.not_pdf_count()
    }
}

/// Whether a declared content type denotes a PDF.
///
/// Matching is a case-insensitive prefix test, so parameters such as
/// `application/pdf; charset=binary` are accepted.
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..PDF_MIME_TYPE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PDF_MIME_TYPE))
}

/// Downloads URLs and keeps the ones that are PDFs.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    storage: Storage,
    jobs: usize,
}

impl Fetcher {
    /// Build a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, storage: Storage) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            storage,
            jobs: config.fetch_jobs.max(1),
        })
    }

    /// Fetch every URL and return the retained PDFs.
    ///
    /// The returned list follows the set's traversal order regardless of the
    /// order in which responses arrive. An empty list is a valid outcome.
    pub async fn fetch_pdf_assets(&self, urls: &ExtractedLinks) -> Vec<FetchedAsset> {
        self.fetch_all(urls).await.assets
    }

    /// Fetch every URL and return the full report.
    pub async fn fetch_all(&self, urls: &ExtractedLinks) -> FetchReport {
        let start = Instant::now();

        let pending: Vec<_> = urls.iter().map(|url| self.fetch_outcome(url)).collect();
        let outcomes: Vec<FetchOutcome> = stream::iter(pending)
            .buffered(self.jobs)
            .collect()
            .await;

        let report = FetchReport::from_outcomes(outcomes, start.elapsed());
        info!(
            retained = report.assets.len(),
            not_pdf = report.not_pdf_count(),
            failed = report.failed_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Fetch finished"
        );

        report
    }

    /// Fetch a single URL, surfacing a skip as [`LinkCatError::Download`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        self.fetch_outcome(url).await.into_result()
    }

    /// Fetch a single URL and classify the result.
    pub async fn fetch_outcome(&self, url: &str) -> FetchOutcome {
        info!(%url, "Downloading");

        let outcome = match self.try_fetch(url).await {
            Ok(asset) => FetchOutcome::Retained(asset),
            Err(reason) => FetchOutcome::Skipped {
                url: url.to_string(),
                reason,
            },
        };

        match &outcome {
            FetchOutcome::Retained(asset) => {
                info!(%url, bytes = asset.bytes.len(), "Downloaded");
            }
            FetchOutcome::Skipped { reason, .. } => {
                warn!(%url, %reason, "Skipped");
            }
        }

        outcome
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<FetchedAsset, SkipReason> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SkipReason::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SkipReason::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if !content_type.as_deref().is_some_and(is_pdf_content_type) {
            return Err(SkipReason::NotPdf { content_type });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SkipReason::from_reqwest(&e))?
            .to_vec();

        let stored = self
            .storage
            .store_download(&bytes)
            .await
            .map_err(|e| SkipReason::Storage(e.to_string()))?;

        Ok(FetchedAsset {
            url: url.to_string(),
            bytes,
            stored_path: stored.path,
        })
    }
}
