//! HTTP routes.
//!
//! - `POST /upload` runs an uploaded PDF through the pipeline
//! - `GET /download/:id` serves a merged PDF
//! - `GET /health` reports liveness and version
//!
//! Every route answers cross-origin requests from the configured origins.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Extension, Multipart, Path};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use linkcat::error::LinkCatError;
use linkcat::pipeline::{Pipeline, PipelineOutcome};
use linkcat::storage::FileId;

/// Multipart field carrying the uploaded PDF.
const UPLOAD_FIELD: &str = "file";

/// JSON body of every non-binary response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merged_pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_links: Option<Vec<String>>,
}

impl ApiResponse {
    fn status(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            merged_pdf_url: None,
            extracted_links: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::status("error", message)
    }
}

/// Build the application router around a shared pipeline.
pub fn router(pipeline: Arc<Pipeline>, max_upload_bytes: usize, cors: CorsLayer) -> Router {
    Router::new()
        .route("/upload", post(handle_upload))
        .route("/download/:id", get(handle_download))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(Extension(pipeline))
        .layer(cors)
}

/// CORS policy for the given allowed origins.
///
/// No origins, or a `*` among them, allows every origin.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| anyhow::anyhow!("invalid CORS origin '{origin}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn handle_upload(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    multipart: Multipart,
) -> (StatusCode, Json<ApiResponse>) {
    let bytes = match read_upload_field(multipart).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::warn!("Upload request without a '{}' field", UPLOAD_FIELD);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("No file part")),
            );
        }
        Err((status, message)) => {
            tracing::warn!("Failed to read upload: {}", message);
            return (status, Json(ApiResponse::error(message)));
        }
    };

    match pipeline.process_upload(bytes).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => error_response(&e),
    }
}

/// Read the upload field, skipping any other parts.
async fn read_upload_field(
    mut multipart: Multipart,
) -> Result<Option<Vec<u8>>, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (e.status(), e.body_text()))?;
            return Ok(Some(bytes.to_vec()));
        }
    }

    Ok(None)
}

fn outcome_response(outcome: PipelineOutcome) -> (StatusCode, Json<ApiResponse>) {
    match outcome {
        PipelineOutcome::Merged {
            merged_id, links, ..
        } => (
            StatusCode::OK,
            Json(ApiResponse {
                status: "success",
                message: None,
                merged_pdf_url: Some(format!("/download/{merged_id}")),
                extracted_links: Some(links.to_vec()),
            }),
        ),
        PipelineOutcome::NoLinks => (
            StatusCode::OK,
            Json(ApiResponse::status("no_links", "No links found")),
        ),
        PipelineOutcome::NoFetchableAssets { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::status("download_failed", "No valid PDFs")),
        ),
    }
}

fn error_response(err: &LinkCatError) -> (StatusCode, Json<ApiResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::warn!("Request rejected: {}", err);
    }

    let label = match err {
        LinkCatError::MalformedDocument { .. } | LinkCatError::EncryptedDocument { .. } => {
            "malformed_document"
        }
        _ => "error",
    };

    (status, Json(ApiResponse::status(label, err.to_string())))
}

async fn handle_download(
    Extension(pipeline): Extension<Arc<Pipeline>>,
    Path(raw_id): Path<String>,
) -> Response {
    let id = match FileId::parse(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e).into_response(),
    };

    match pipeline.serve_file(id.as_str()).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{id}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: linkcat::VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcat::config::Config;
    use linkcat::pdf::test_pdf::TestPdf;
    use linkcat::pdf::{LopdfDocument, PdfDocument};
    use reqwest::multipart::{Form, Part};
    use rstest::rstest;
    use serde_json::Value;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn spawn(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// Serves `/two_pages.pdf` as a PDF; everything else is a 404.
    async fn spawn_asset_server() -> SocketAddr {
        let pdf = TestPdf::new()
            .text_page(&["Asset page one"])
            .text_page(&["Asset page two"])
            .build();

        let app = Router::new().route(
            "/two_pages.pdf",
            get(move || {
                let pdf = pdf.clone();
                async move { ([(header::CONTENT_TYPE, "application/pdf")], pdf) }
            }),
        );
        spawn(app).await
    }

    async fn spawn_app() -> (TempDir, SocketAddr) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_storage_root(temp_dir.path());
        let pipeline = Pipeline::new(&config).await.unwrap();
        let cors = cors_layer(&[]).unwrap();
        let addr = spawn(router(Arc::new(pipeline), config.max_upload_bytes, cors)).await;
        (temp_dir, addr)
    }

    async fn upload(addr: SocketAddr, bytes: Vec<u8>) -> (StatusCode, Value) {
        let form = Form::new().part(
            UPLOAD_FIELD,
            Part::bytes(bytes)
                .file_name("upload.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        );

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_upload_merges_linked_pdfs() {
        let assets = spawn_asset_server().await;
        let (_temp_dir, addr) = spawn_app().await;

        let good = format!("http://{assets}/two_pages.pdf");
        let missing = format!("http://{assets}/missing.pdf");
        let document = TestPdf::new()
            .linked_page(&["References"], &[good.as_str()])
            .text_page(&[format!("Also see {missing}").as_str()])
            .build();

        let (status, body) = upload(addr, document).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let mut links: Vec<String> = body["extractedLinks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        links.sort();
        assert_eq!(links, vec![missing, good]);

        let url = body["mergedPdfUrl"].as_str().unwrap();
        assert!(url.starts_with("/download/merged_"));

        let response = reqwest::get(format!("http://{addr}{url}")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/pdf"
        );
        assert!(
            response.headers()["content-disposition"]
                .to_str()
                .unwrap()
                .starts_with("attachment;")
        );

        let merged = response.bytes().await.unwrap();
        let doc = LopdfDocument::load_mem(&merged, "merged").unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[tokio::test]
    async fn test_upload_without_links() {
        let (_temp_dir, addr) = spawn_app().await;
        let document = TestPdf::new().text_page(&["Nothing here"]).build();

        let (status, body) = upload(addr, document).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_links");
        assert_eq!(body["message"], "No links found");
    }

    #[tokio::test]
    async fn test_upload_with_only_unfetchable_links() {
        let assets = spawn_asset_server().await;
        let (_temp_dir, addr) = spawn_app().await;

        let missing = format!("http://{assets}/missing.pdf");
        let document = TestPdf::new()
            .linked_page(&["Dead link"], &[missing.as_str()])
            .build();

        let (status, body) = upload(addr, document).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "download_failed");
        assert_eq!(body["message"], "No valid PDFs");
    }

    #[tokio::test]
    async fn test_upload_malformed_document() {
        let (_temp_dir, addr) = spawn_app().await;

        let (status, body) = upload(addr, b"definitely not a pdf".to_vec()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "malformed_document");
    }

    #[tokio::test]
    async fn test_upload_missing_file_field() {
        let (_temp_dir, addr) = spawn_app().await;
        let form = Form::new().text("other", "value");

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
    }

    #[rstest]
    #[case("merged_does-not-exist.pdf", 404)]
    #[case("merged_does-not-exist", 404)]
    #[case("bad%20id.pdf", 400)]
    #[case("a.b.pdf", 400)]
    #[tokio::test]
    async fn test_download_errors(#[case] id: &str, #[case] expected: u16) {
        let (_temp_dir, addr) = spawn_app().await;

        let response = reqwest::get(format!("http://{addr}/download/{id}"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }

    #[tokio::test]
    async fn test_health() {
        let (_temp_dir, addr) = spawn_app().await;

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], linkcat::VERSION);
    }

    #[tokio::test]
    async fn test_any_origin_allowed_by_default() {
        let (_temp_dir, addr) = spawn_app().await;

        let response = reqwest::Client::new()
            .get(format!("http://{addr}/health"))
            .header("origin", "http://frontend.test")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.headers()["access-control-allow-origin"]
                .to_str()
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_upload_preflight() {
        let (_temp_dir, addr) = spawn_app().await;

        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{addr}/upload"))
            .header("origin", "http://frontend.test")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-methods")
        );
    }

    #[rstest]
    #[case("http://allowed.test", Some("http://allowed.test"))]
    #[case("http://other.test", None)]
    #[tokio::test]
    async fn test_configured_origins(#[case] origin: &str, #[case] expected: Option<&str>) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_storage_root(temp_dir.path());
        let pipeline = Pipeline::new(&config).await.unwrap();
        let cors = cors_layer(&["http://allowed.test".to_string()]).unwrap();
        let addr = spawn(router(Arc::new(pipeline), config.max_upload_bytes, cors)).await;

        let response = reqwest::Client::new()
            .get(format!("http://{addr}/health"))
            .header("origin", origin)
            .send()
            .await
            .unwrap();

        let allowed = response
            .headers()
            .get("access-control-allow-origin")
            .map(|value| value.to_str().unwrap().to_string());
        assert_eq!(allowed.as_deref(), expected);
    }

    #[test]
    fn test_invalid_cors_origin_is_rejected() {
        assert!(cors_layer(&["http://bad\norigin".to_string()]).is_err());
    }
}
