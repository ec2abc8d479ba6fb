//! Integration tests for mineru-upload against a mock parse service.
//!
//! Each test starts its own `wiremock` server, so they run in parallel and
//! never need a real backend.
//!
//! Run with:
//!   cargo test --test upload -- --nocapture

use mineru_upload::{
    Backend, ClientConfig, FormState, ParseMethod, Phase, SelectedFile, Tab, TabContent,
    UploadClient, UploadError, UploadOptions, UploadView,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> UploadClient {
    client_with(server, |b| b)
}

fn client_with(
    server: &MockServer,
    f: impl FnOnce(mineru_upload::ClientConfigBuilder) -> mineru_upload::ClientConfigBuilder,
) -> UploadClient {
    let config = f(ClientConfig::builder().base_url(server.uri()))
        .build()
        .expect("valid config");
    UploadClient::new(config).expect("client")
}

fn sample_pdf() -> SelectedFile {
    SelectedFile::from_bytes("sample.pdf", b"%PDF-1.4 sample".to_vec())
}

async fn single_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

fn body_text(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

/// `name="field"` followed by its value, as reqwest writes text parts.
fn has_field(body: &str, name: &str, value: &str) -> bool {
    body.contains(&format!("name=\"{name}\"\r\n\r\n{value}\r\n"))
}

// ── End-to-end scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn sample_pdf_round_trip_through_the_view() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outputs": [{
                "filename": "sample.pdf",
                "markdown": "# Title",
                "content_list_json": {"a": 1},
                "storage_expiry": "2025-01-01"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut view = UploadView::default();
    view.form_mut().set_backend(Backend::Pipeline);
    view.form_mut().set_parse_method(ParseMethod::Auto);
    view.select_files([sample_pdf()]);

    let phase = view.submit(&client).await;
    assert_eq!(phase, Some(Phase::Success));
    assert!(view.error().is_none());

    // One card, titled and dated.
    assert_eq!(view.cards().len(), 1);
    let card = &view.cards()[0];
    assert_eq!(card.title(), "sample.pdf");
    assert_eq!(card.expiry_label(), "Expires: 2025-01-01");
    assert_eq!(card.tab(), Tab::Render);

    // Rendered tab shows the heading.
    match view.render_card(0).unwrap() {
        TabContent::Html(html) => assert!(html.contains("<h1>Title</h1>"), "got: {html}"),
        other => panic!("expected HTML, got {other:?}"),
    }

    // JSON tab shows the payload pretty-printed.
    view.set_tab(0, Tab::Json);
    assert_eq!(
        view.render_card(0).unwrap(),
        TabContent::Json("{\n  \"a\": 1\n}".into())
    );

    // Both downloads are offered.
    let downloads = view.downloads(0).unwrap();
    assert_eq!(downloads.markdown.as_ref().unwrap().file_name, "sample.pdf.md");
    assert_eq!(downloads.json.file_name, "sample.pdf.json");

    // The request carried the file and the chosen options.
    let request = single_request(&server).await;
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.starts_with("multipart/form-data"), "got: {content_type}");
    let body = body_text(&request);
    assert!(body.contains("name=\"files\"; filename=\"sample.pdf\""), "body: {body}");
    assert!(body.contains("%PDF-1.4 sample"));
    assert!(has_field(&body, "backend", "pipeline"), "body: {body}");
    assert!(has_field(&body, "parse_method", "auto"), "body: {body}");
    assert!(!body.contains("name=\"server_url\""));
}

#[tokio::test]
async fn http_client_backend_without_server_url_still_submits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"outputs": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut form = FormState::default();
    form.set_backend(Backend::VlmHttpClient);
    let mut view = UploadView::new(form);
    view.select_files([sample_pdf()]);

    assert_eq!(view.submit(&client).await, Some(Phase::Success));

    let body = body_text(&single_request(&server).await);
    assert!(has_field(&body, "backend", "vlm-http-client"), "body: {body}");
    assert!(!body.contains("name=\"server_url\""), "body: {body}");
}

#[tokio::test]
async fn multi_file_batch_is_one_request_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outputs": [
                {"filename": "a.pdf", "markdown": "# A"},
                {"filename": "b.png", "middle_json": {"pdf_info": []}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let files = [
        SelectedFile::from_bytes("a.pdf", b"%PDF-a".to_vec()),
        SelectedFile::from_bytes("b.png", b"\x89PNG".to_vec()),
    ];
    let response = client
        .submit(&files, &UploadOptions::default())
        .await
        .unwrap();
    assert_eq!(response.outputs.len(), 2);

    let body = body_text(&single_request(&server).await);
    let a = body.find("filename=\"a.pdf\"").expect("a.pdf part");
    let b = body.find("filename=\"b.png\"").expect("b.png part");
    assert!(a < b, "files must keep selection order");
    assert!(body.contains("Content-Type: image/png"), "body: {body}");
}

#[tokio::test]
async fn optional_fields_are_stringified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let options = UploadOptions::builder()
        .lang("en")
        .start_page(2)
        .end_page(5)
        .formula_enable(false)
        .table_enable(true)
        .build();
    client_for(&server)
        .submit(&[sample_pdf()], &options)
        .await
        .unwrap();

    let body = body_text(&single_request(&server).await);
    assert!(has_field(&body, "lang", "en"));
    assert!(has_field(&body, "start_page", "2"));
    assert!(has_field(&body, "end_page", "5"));
    assert!(has_field(&body, "formula_enable", "false"));
    assert!(has_field(&body, "table_enable", "true"));
    assert!(!body.contains("name=\"backend\""));
}

// ── Response handling ────────────────────────────────────────────────────────

#[tokio::test]
async fn absent_outputs_means_empty_results_and_no_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"request_id": "r"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut view = UploadView::default();
    view.select_files([sample_pdf()]);
    assert_eq!(view.submit(&client).await, Some(Phase::Success));
    assert!(view.cards().is_empty());
    assert!(view.error().is_none());
}

#[tokio::test]
async fn non_2xx_body_is_the_error_verbatim() {
    let server = MockServer::start().await;
    let body = r#"{"detail":"Too many files","request_id":"req-1"}"#;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(413).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut view = UploadView::default();
    view.select_files([sample_pdf()]);
    assert_eq!(view.submit(&client).await, Some(Phase::Failed));
    assert_eq!(view.error(), Some(body));
    assert!(view.cards().is_empty());

    let detail = view.failure_detail().unwrap();
    assert_eq!(detail.status, 413);
    assert_eq!(detail.detail.as_deref(), Some("Too many files"));
    assert_eq!(detail.request_id.as_deref(), Some("req-1"));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(500).insert_header("x-request-id", "hdr-9"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&[sample_pdf()], &UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Upload failed");
    match err {
        UploadError::Backend { request_id, .. } => {
            assert_eq!(request_id.as_deref(), Some("hdr-9"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&[sample_pdf()], &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::InvalidResponse(_)), "got {err:?}");
}

// ── Transport ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_backend_times_out_with_bound_in_seconds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"outputs": [{"filename": "sample.pdf"}]}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = client_with(&server, |b| b.timeout_ms(1_000));
    let mut view = UploadView::default();
    view.select_files([sample_pdf()]);

    assert_eq!(view.submit(&client).await, Some(Phase::Failed));
    assert_eq!(view.error(), Some("Request timed out after 1s"));
    assert!(view.cards().is_empty(), "no partial result may be stored");
    assert!(view.can_submit(), "form is re-enabled after a timeout");
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    // Nothing listens on port 1.
    let config = ClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .timeout_ms(5_000)
        .build()
        .unwrap();
    let err = UploadClient::new(config)
        .unwrap()
        .submit(&[sample_pdf()], &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Network(_)), "got {err:?}");
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn api_key_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/parse"))
        .and(header("X-API-Key", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"outputs": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, |b| b.api_key("s3cret"));
    client
        .submit(&[sample_pdf()], &UploadOptions::default())
        .await
        .expect("authorised request");
}

#[tokio::test]
async fn health_probe_reads_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "mineru_ready": true,
            "timestamp": "2025-01-01T00:00:00+00:00",
            "limits": {"max_file_bytes": 52428800, "max_pages": 200, "max_files": 5},
            "metrics": {}
        })))
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.unwrap();
    assert!(health.is_ok());
    assert!(health.mineru_ready);
    assert_eq!(health.limits.max_files, Some(5));
    assert_eq!(health.limits.max_file_bytes, Some(52_428_800));
}

#[tokio::test]
async fn empty_selection_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut view = UploadView::default();
    assert_eq!(view.submit(&client).await, None);
    assert_eq!(view.phase(), Phase::Idle);
    assert!(view.error().is_none());
}
