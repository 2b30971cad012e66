//! CLI argument parsing for linkcat-server.
//!
//! Every flag can also be set through a `LINKCAT_*` environment variable.
//! This module is shared with `build.rs` to render the man page, so it only
//! depends on `clap` and the standard library.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Serve an HTTP endpoint that merges the PDFs a document links to.
///
/// Upload a PDF to `POST /upload`; every linked PDF is downloaded and the
/// results are merged in order into one document, available from
/// `GET /download/<id>`.
#[derive(Parser, Debug)]
#[command(name = "linkcat-server")]
#[command(version)]
#[command(about = "Merge the PDFs a document links to, over HTTP", long_about = None)]
#[command(author)]
pub struct Cli {
    /// Address to listen on
    #[arg(short, long, value_name = "ADDR", env = "LINKCAT_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Root directory for the uploads, merged and downloads areas
    ///
    /// Individual areas can be moved with --uploads-dir, --merged-dir and
    /// --downloads-dir.
    #[arg(short = 'r', long, value_name = "DIR", env = "LINKCAT_STORAGE_ROOT", default_value = ".")]
    pub storage_root: PathBuf,

    /// Directory for raw uploaded PDFs [default: <storage-root>/uploads]
    #[arg(long, value_name = "DIR", env = "LINKCAT_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Directory for merged PDFs [default: <storage-root>/merged_pdfs]
    #[arg(long, value_name = "DIR", env = "LINKCAT_MERGED_DIR")]
    pub merged_dir: Option<PathBuf>,

    /// Directory for downloaded assets [default: <storage-root>/downloads]
    #[arg(long, value_name = "DIR", env = "LINKCAT_DOWNLOADS_DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Timeout for each linked PDF download, in seconds
    #[arg(
        short = 't',
        long,
        value_name = "SECS",
        env = "LINKCAT_FETCH_TIMEOUT",
        default_value_t = 10,
    )]
    pub fetch_timeout: u64,

    /// Number of linked PDFs downloaded concurrently
    ///
    /// Use 1 for strictly sequential downloads.
    #[arg(short, long, value_name = "N", env = "LINKCAT_JOBS", default_value_t = 4)]
    pub jobs: usize,

    /// Origin allowed to call the API from a browser; repeat or separate
    /// with commas
    ///
    /// Every origin is allowed when none is given, or when one is '*'.
    #[arg(
        long = "cors-origin",
        value_name = "ORIGIN",
        env = "LINKCAT_CORS_ORIGINS",
        value_delimiter = ','
    )]
    pub cors_origins: Vec<String>,

    /// Largest accepted upload, in MiB
    #[arg(long, value_name = "MIB", env = "LINKCAT_MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,

    /// Verbose output - log every discovered link and fetch
    #[arg(short, long, env = "LINKCAT_VERBOSE")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, env = "LINKCAT_QUIET", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter directive implied by --verbose / --quiet.
    ///
    /// `RUST_LOG` takes precedence when set.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
