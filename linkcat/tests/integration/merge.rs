//! Integration tests for merging fetched PDFs.

use linkcat::LinkCatError;
use linkcat::extract::ExtractedLinks;
use linkcat::fetch::{FetchedAsset, Fetcher};
use linkcat::merge::{Merger, merge_documents};
use linkcat::pdf::{LopdfDocument, PdfDocument};

use crate::common::{AssetServer, storage_for, temp_config};

async fn fetch(server: &AssetServer, paths: &[&str]) -> Vec<FetchedAsset> {
    let (_temp_dir, config) = temp_config();
    let fetcher = Fetcher::new(&config, storage_for(&config).await).unwrap();
    let links: ExtractedLinks = paths.iter().map(|path| server.url(path)).collect();
    fetcher.fetch_pdf_assets(&links).await
}

#[tokio::test]
async fn test_merge_follows_list_order() {
    let server = AssetServer::start().await;
    let mut assets = fetch(&server, &["/two_pages.pdf", "/one_page.pdf"]).await;

    // Fetch order is lexicographic; put the two page asset first.
    assets.reverse();
    assert_eq!(assets[0].url, server.url("/two_pages.pdf"));

    let merged = merge_documents(&assets).unwrap();
    assert_eq!(merged.page_count, 3);
    assert_eq!(
        merged.sources,
        vec![server.url("/two_pages.pdf"), server.url("/one_page.pdf")]
    );

    let doc = LopdfDocument::load_mem(&merged.bytes, "merged").unwrap();
    assert_eq!(doc.page_count(), 3);
    assert!(doc.page_text(1).unwrap().contains("Two page one"));
    assert!(doc.page_text(2).unwrap().contains("Two page two"));
    assert!(doc.page_text(3).unwrap().contains("One page"));
}

#[tokio::test]
async fn test_merged_output_is_reparseable_without_compression() {
    let server = AssetServer::start().await;
    let assets = fetch(&server, &["/one_page.pdf", "/with_params.pdf"]).await;

    let merged = Merger::without_compression().merge(&assets).unwrap();
    assert_eq!(merged.statistics.files_merged, 2);
    assert_eq!(merged.statistics.total_pages, 2);

    let doc = LopdfDocument::load_mem(&merged.bytes, "merged").unwrap();
    assert_eq!(doc.page_count(), 2);
}

#[test]
fn test_merge_of_nothing_fails() {
    assert!(matches!(
        merge_documents(&[]),
        Err(LinkCatError::NoAssetsToMerge)
    ));
}
