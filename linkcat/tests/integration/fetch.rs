//! Integration tests for content-type gated fetching.

use std::time::Duration;

use linkcat::extract::ExtractedLinks;
use linkcat::fetch::{Fetcher, SkipReason};
use linkcat::storage::StorageArea;

use crate::common::{AssetServer, storage_for, temp_config};

#[tokio::test]
async fn test_only_pdf_responses_are_retained() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();

    let links: ExtractedLinks = [
        "/two_pages.pdf",
        "/one_page.pdf",
        "/with_params.pdf",
        "/html.pdf",
        "/octet.pdf",
        "/server_error.pdf",
        "/missing.pdf",
    ]
    .iter()
    .map(|path| server.url(path))
    .collect();

    let report = fetcher.fetch_all(&links).await;

    let retained: Vec<&str> = report.assets.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(
        retained,
        vec![
            server.url("/one_page.pdf"),
            server.url("/two_pages.pdf"),
            server.url("/with_params.pdf"),
        ]
    );
    assert_eq!(report.not_pdf_count(), 2);
    assert_eq!(report.failed_count(), 2);

    let reason_for = |path: &str| {
        report
            .skipped
            .iter()
            .find(|(url, _)| *url == server.url(path))
            .map(|(_, reason)| reason.clone())
            .unwrap()
    };
    assert_eq!(reason_for("/server_error.pdf"), SkipReason::Status(500));
    assert_eq!(reason_for("/missing.pdf"), SkipReason::Status(404));
    assert_eq!(
        reason_for("/html.pdf"),
        SkipReason::NotPdf {
            content_type: Some("text/html".to_string())
        }
    );
}

#[tokio::test]
async fn test_html_with_pdf_body_is_excluded() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();

    let links: ExtractedLinks = [server.url("/html.pdf")].into_iter().collect();

    assert!(fetcher.fetch_pdf_assets(&links).await.is_empty());
}

#[tokio::test]
async fn test_retained_assets_are_stored() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let storage = storage_for(&config).await;
    let fetcher = Fetcher::new(&config, storage.clone()).unwrap();

    let asset = fetcher.fetch(&server.url("/two_pages.pdf")).await.unwrap();

    assert!(asset.bytes.starts_with(b"%PDF"));
    assert!(
        asset
            .stored_path
            .starts_with(storage.area_dir(StorageArea::Downloads))
    );
    assert_eq!(tokio::fs::read(&asset.stored_path).await.unwrap(), asset.bytes);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = AssetServer::start().await;
    let (_temp_dir, mut config) = temp_config();
    config.fetch_timeout = Duration::from_millis(500);
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();

    let links: ExtractedLinks = [server.url("/slow.pdf"), server.url("/one_page.pdf")]
        .into_iter()
        .collect();
    let report = fetcher.fetch_all(&links).await;

    assert_eq!(report.assets.len(), 1);
    assert_eq!(
        report.skipped,
        vec![(server.url("/slow.pdf"), SkipReason::Timeout)]
    );
}

#[tokio::test]
async fn test_single_fetch_reports_download_error() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();

    let err = fetcher
        .fetch(&server.url("/octet.pdf"))
        .await
        .unwrap_err();
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("application/octet-stream"));
}

#[tokio::test]
async fn test_sequential_fetching_keeps_order() {
    let server = AssetServer::start().await;
    let (_temp_dir, mut config) = temp_config();
    config.fetch_jobs = 1;
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();

    let links: ExtractedLinks = [server.url("/two_pages.pdf"), server.url("/one_page.pdf")]
        .into_iter()
        .collect();
    let assets = fetcher.fetch_pdf_assets(&links).await;

    let urls: Vec<String> = assets.into_iter().map(|a| a.url).collect();
    assert_eq!(urls, links.to_vec());
}
