//! linkcat - Merge the PDFs a document links to.
//!
//! Given an uploaded PDF, this library:
//!
//! - Extracts every link annotation URI and every URL in the page text
//! - Fetches each URL, keeping only responses that are actual PDFs
//! - Concatenates the retained PDFs, in order, into one document
//! - Stores uploads, downloads and merged outputs under opaque ids
//!
//! # Examples
//!
//! ## Full Pipeline
//!
//! ```no_run
//! use linkcat::config::Config;
//! use linkcat::pipeline::{Pipeline, PipelineOutcome};
//!
//! # async fn example(upload: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::with_storage_root("data");
//! let pipeline = Pipeline::new(&config).await?;
//!
//! match pipeline.process_upload(upload).await? {
//!     PipelineOutcome::Merged { merged_id, page_count, .. } => {
//!         println!("Merged {page_count} pages into {merged_id}");
//!     }
//!     PipelineOutcome::NoLinks => println!("No links found"),
//!     PipelineOutcome::NoFetchableAssets { links } => {
//!         println!("None of {} links were PDFs", links.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use linkcat::extract::extract_links;
//! use linkcat::merge::merge_documents;
//! use linkcat::fetch::FetchedAsset;
//!
//! # fn example(upload: &[u8], assets: Vec<FetchedAsset>) -> linkcat::Result<()> {
//! let links = extract_links(upload)?;
//! println!("Found {} links", links.len());
//!
//! let merged = merge_documents(&assets)?;
//! println!("Merged document has {} pages", merged.page_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod pdf;
pub mod pipeline;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{LinkCatError, Result};
pub use pipeline::{Pipeline, PipelineOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
