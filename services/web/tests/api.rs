use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use tower::ServiceExt;

use common::{ManualClock, RegistryLimits, ShareRegistry};
use web::{
    AppState,
    config::ServerConfig,
    create_router,
    mailer::{KeyEmail, KeyMailer, MailError},
    templates::Templates,
};

const BOUNDARY: &str = "sanchar-test-boundary";

// -- Mock mailer ----------------------------------------------------------

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<KeyEmail>>,
    fail: bool,
}

#[async_trait]
impl KeyMailer for RecordingMailer {
    async fn send_key(&self, email: &KeyEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// -- Helpers --------------------------------------------------------------

struct TestApp {
    router: axum::Router,
    clock: ManualClock,
    registry: ShareRegistry,
    mailer: Arc<RecordingMailer>,
}

fn server_config(max_upload_bytes: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: "static".to_string(),
        public_base_url: Some("https://share.example.com/".to_string()),
        max_upload_bytes,
    }
}

fn build_app_with(mailer: RecordingMailer, max_upload_bytes: usize) -> TestApp {
    let clock = ManualClock::default();
    let registry = ShareRegistry::with_clock(RegistryLimits::default(), Arc::new(clock.clone()));
    let mailer = Arc::new(mailer);

    let state = AppState {
        registry: registry.clone(),
        templates: Arc::new(Templates::new().expect("templates should compile")),
        mailer: mailer.clone(),
        public_base_url: Some("https://share.example.com/".to_string()),
    };

    TestApp {
        router: create_router(state, &server_config(max_upload_bytes)),
        clock,
        registry,
        mailer,
    }
}

fn build_app() -> TestApp {
    build_app_with(RecordingMailer::default(), 1024 * 1024)
}

fn multipart_body(files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files, fields)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_key_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send-key")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn upload(app: &TestApp, files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> String {
    let (status, json) = send_json(app, upload_request(files, fields)).await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {json}");
    json["share_id"].as_str().unwrap().to_string()
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_active_shares() {
    let app = build_app();
    upload(&app, &[("a.txt", b"a")], &[]).await;

    let (status, json) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_shares"], 1);
}

#[tokio::test]
async fn test_index_renders_upload_form() {
    let app = build_app();
    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("multipart/form-data"));
    assert!(html.contains(r#"name="expiry""#));
}

#[tokio::test]
async fn test_two_file_upload_round_trips_then_expires() {
    let app = build_app();
    let share_id = upload(
        &app,
        &[("report.pdf.enc", b"first file"), ("notes.txt", b"second file")],
        &[("expiry", "1h"), ("has_password", "true")],
    )
    .await;
    assert_eq!(share_id.len(), 32);

    let (status, json) = send_json(&app, get(&format!("/data/{share_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"],
        serde_json::json!(["Zmlyc3QgZmlsZQ==", "c2Vjb25kIGZpbGU="])
    );
    assert_eq!(
        json["filenames"],
        serde_json::json!(["report.pdf.enc", "notes.txt"])
    );
    assert_eq!(json["has_password"], true);

    let (status, body) = send(&app, get(&format!("/download/{share_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains(&share_id));

    app.clock.advance(Duration::seconds(3601));

    let (status, json) = send_json(&app, get(&format!("/data/{share_id}"))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(json["error"], "Share has expired");
    assert!(json.get("data").is_none());

    let (status, body) = send(&app, get(&format!("/download/{share_id}"))).await;
    assert_eq!(status, StatusCode::GONE);
    assert!(String::from_utf8(body).unwrap().contains("Share expired"));

    assert_eq!(app.registry.sweep().await, 1);
    let (status, _) = send_json(&app, get(&format!("/data/{share_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = build_app();

    for id in ["0123456789abcdef0123456789abcdef", "not-a-share"] {
        let (status, json) = send_json(&app, get(&format!("/data/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Share not found");

        let (status, body) = send(&app, get(&format!("/download/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(String::from_utf8(body).unwrap().contains("Share not found"));
    }
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let app = build_app();
    let (status, json) = send_json(&app, upload_request(&[], &[("expiry", "1h")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No files uploaded");
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_unknown_expiry_code_falls_back_to_one_day() {
    let app = build_app();
    let (status, json) = send_json(
        &app,
        upload_request(&[("a.txt", b"a")], &[("expiry", "bogus")]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["expiry"], "24h");
    let share_id = json["share_id"].as_str().unwrap().to_string();

    app.clock.advance(Duration::hours(23));
    let (status, json) = send_json(&app, get(&format!("/data/{share_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["has_password"], false);

    app.clock.advance(Duration::hours(1));
    let (status, _) = send_json(&app, get(&format!("/data/{share_id}"))).await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = build_app_with(RecordingMailer::default(), 256);
    let big = vec![b'x'; 4096];

    let (status, _) = send(&app, upload_request(&[("big.bin", &big)], &[])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.registry.is_empty().await);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = build_app();
    for asset in [
        "/static/css/style.css",
        "/static/js/crypto.js",
        "/static/js/upload.js",
        "/static/js/download.js",
    ] {
        let (status, _) = send(&app, get(asset)).await;
        assert_eq!(status, StatusCode::OK, "{asset}");
    }

    let (status, body) = send(&app, get("/static/i18n/translations.json")).await;
    assert_eq!(status, StatusCode::OK);
    let translations: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(translations["it"]["drop_here"].is_string());
    assert!(translations["ne"]["drop_here"].is_string());
}

#[tokio::test]
async fn test_send_key_delivers_key_with_link() {
    let app = build_app();
    let share_id = upload(&app, &[("a.txt", b"a")], &[]).await;

    let (status, json) = send_json(
        &app,
        send_key_request(&format!(
            r#"{{"email": " friend@example.com ", "key": "c2VjcmV0", "share_id": "{share_id}"}}"#
        )),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "sent"}));

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "friend@example.com");
    assert_eq!(sent[0].key, "c2VjcmV0");
    assert_eq!(
        sent[0].share_url.as_deref(),
        Some(format!("https://share.example.com/download/{share_id}").as_str())
    );
}

#[tokio::test]
async fn test_send_key_reports_failures_in_body() {
    let app = build_app_with(
        RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        },
        1024,
    );

    let (status, json) = send_json(
        &app,
        send_key_request(r#"{"email": "friend@example.com", "key": "k"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert_eq!(json["msg"], "SMTP delivery failed: connection refused");

    let (status, json) = send_json(&app, send_key_request(r#"{"email": 42"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "error");
    assert!(json["msg"].is_string());

    let (status, json) = send_json(
        &app,
        send_key_request(r#"{"email": "friend@example.com", "key": "  "}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["msg"], "A key is required");
}
