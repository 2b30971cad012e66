//! Shared helpers for the integration tests.
//!
//! PDFs are generated in-process; linked assets are served by a local axum
//! server bound to an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::{MethodRouter, get};
use linkcat::config::Config;
use linkcat::storage::Storage;
use tempfile::TempDir;
use tokio::net::TcpListener;

#[path = "../../../src/pdf/test_pdf.rs"]
mod test_pdf;

pub use test_pdf::TestPdf;

/// How long `/slow.pdf` waits before answering.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

/// A two page PDF whose pages read "Two page one" and "Two page two".
pub fn two_page_pdf() -> Vec<u8> {
    TestPdf::new()
        .text_page(&["Two page one"])
        .text_page(&["Two page two"])
        .build()
}

/// A one page PDF reading "One page".
pub fn one_page_pdf() -> Vec<u8> {
    TestPdf::new().text_page(&["One page"]).build()
}

/// Local HTTP server hosting linked assets.
///
/// | Path                   | Response                                       |
/// |------------------------|------------------------------------------------|
/// | `/two_pages.pdf`       | 200 `application/pdf`, two pages               |
/// | `/one_page.pdf`        | 200 `application/pdf`, one page                |
/// | `/with_params.pdf`     | 200 `application/pdf; charset=binary`          |
/// | `/html.pdf`            | 200 `text/html` with a valid PDF body          |
/// | `/octet.pdf`           | 200 `application/octet-stream`                 |
/// | `/server_error.pdf`    | 500                                            |
/// | `/slow.pdf`            | PDF after [`SLOW_RESPONSE`]                    |
/// | anything else          | 404                                            |
pub struct AssetServer {
    addr: SocketAddr,
}

impl AssetServer {
    /// Start the server on 127.0.0.1 with an ephemeral port.
    pub async fn start() -> Self {
        let two = two_page_pdf();
        let one = one_page_pdf();

        let app = Router::new()
            .route("/two_pages.pdf", asset(two.clone(), "application/pdf"))
            .route("/one_page.pdf", asset(one.clone(), "application/pdf"))
            .route(
                "/with_params.pdf",
                asset(one.clone(), "application/pdf; charset=binary"),
            )
            .route("/html.pdf", asset(two, "text/html"))
            .route("/octet.pdf", asset(one.clone(), "application/octet-stream"))
            .route(
                "/server_error.pdf",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/slow.pdf",
                get(move || {
                    let body = one.clone();
                    async move {
                        tokio::time::sleep(SLOW_RESPONSE).await;
                        ([(header::CONTENT_TYPE, "application/pdf")], body)
                    }
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr }
    }

    /// Absolute URL of `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Route answering 200 with `body` and the given content type.
fn asset(body: Vec<u8>, content_type: &'static str) -> MethodRouter {
    get(move || async move { ([(header::CONTENT_TYPE, content_type)], body) })
}

/// Configuration with every storage area under a fresh temporary root.
pub fn temp_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_storage_root(temp_dir.path());
    (temp_dir, config)
}

/// Initialized storage for `config`.
pub async fn storage_for(config: &Config) -> Storage {
    Storage::init(config.storage.clone()).await.unwrap()
}
