//! End-to-end pipeline tests.

use linkcat::pdf::{LopdfDocument, PdfDocument};
use linkcat::pipeline::{Pipeline, PipelineOutcome};
use linkcat::storage::StorageArea;

use crate::common::{AssetServer, TestPdf, temp_config};

#[tokio::test]
async fn test_upload_with_one_pdf_and_one_dead_link() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let pipeline = Pipeline::new(&config).await.unwrap();

    let good = server.url("/two_pages.pdf");
    let dead = server.url("/missing.pdf");
    let upload = TestPdf::new()
        .linked_page(&["Reading list"], &[good.as_str()])
        .text_page(&[format!("Appendix at {dead}").as_str()])
        .build();

    let outcome = pipeline.process_upload(upload).await.unwrap();

    let (merged_id, page_count, links) = match outcome {
        PipelineOutcome::Merged {
            merged_id,
            page_count,
            links,
        } => (merged_id, page_count, links),
        other => panic!("Expected a merged outcome, got {other:?}"),
    };

    assert_eq!(page_count, 2);
    assert_eq!(links.len(), 2);
    assert!(links.contains(&good));
    assert!(links.contains(&dead));

    let bytes = pipeline.serve_file(merged_id.as_str()).await.unwrap();
    let doc = LopdfDocument::load_mem(&bytes, "merged").unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(
        pipeline
            .storage()
            .area_dir(StorageArea::Merged)
            .join(merged_id.as_str())
            .is_file()
    );
}

#[tokio::test]
async fn test_upload_without_links_never_fetches() {
    let (_temp_dir, config) = temp_config();
    let pipeline = Pipeline::new(&config).await.unwrap();

    let upload = TestPdf::new()
        .text_page(&["Plain prose only"])
        .blank_pages(2)
        .build();

    let outcome = pipeline.process_upload(upload).await.unwrap();
    assert_eq!(outcome, PipelineOutcome::NoLinks);

    let mut downloads = tokio::fs::read_dir(pipeline.storage().area_dir(StorageArea::Downloads))
        .await
        .unwrap();
    assert!(downloads.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_linking_only_non_pdfs() {
    let server = AssetServer::start().await;
    let (_temp_dir, config) = temp_config();
    let pipeline = Pipeline::new(&config).await.unwrap();

    let html = server.url("/html.pdf");
    let upload = TestPdf::new()
        .linked_page(&["Not really a PDF"], &[html.as_str()])
        .build();

    match pipeline.process_upload(upload).await.unwrap() {
        PipelineOutcome::NoFetchableAssets { links } => {
            assert_eq!(links.to_vec(), vec![html]);
        }
        other => panic!("Expected NoFetchableAssets, got {other:?}"),
    }
}
