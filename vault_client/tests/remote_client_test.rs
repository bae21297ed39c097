use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use vault_client::{
    BearerCredentialHelper, FileLibraryClient, NoopCredentialHelper, RemoteClient, UploadError, UploadTransport,
    VaultClientError,
};
use vault_config::VaultConfig;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(block_size: usize) -> VaultConfig {
    let mut config = VaultConfig::default();
    config.client.retry_max_attempts = 0;
    config.client.retry_base_delay = Duration::from_millis(1);
    config.client.retry_max_delay = Duration::from_millis(1);
    config.upload.stream_block_size = block_size;
    config
}

fn api_endpoint(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

fn client_with_token(server: &MockServer, token: &str, block_size: usize) -> RemoteClient {
    RemoteClient::new(
        &api_endpoint(server),
        BearerCredentialHelper::new(token.to_owned(), "test"),
        &test_config(block_size),
    )
    .unwrap()
}

fn descriptor() -> serde_json::Value {
    json!({
        "id": "f1",
        "name": "a.png",
        "size": 10,
        "type": "image/png",
        "upload_date": "2024-01-01T00:00:00Z",
        "drive_url": "https://x/a.png",
        "drive_id": "d1"
    })
}

fn recorder() -> (progress_tracking::ProgressCallback, Arc<Mutex<Vec<(u64, u64)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = seen.clone();
    let cb: progress_tracking::ProgressCallback = Arc::new(move |loaded, total| seen_cb.lock().unwrap().push((loaded, total)));
    (cb, seen)
}

#[tokio::test]
async fn test_upload_success_returns_record_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_string_contains("filename=\"a.png\""))
        .and(body_string_contains("image/png"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok", "file": descriptor()})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "t0k", 4);
    let (cb, seen) = recorder();

    let record = client
        .upload_file("a.png", "image/png", Bytes::from_static(b"0123456789"), cb)
        .await
        .unwrap();

    assert_eq!(record.id, "f1");
    assert_eq!(record.name, "a.png");
    assert_eq!(record.url, "https://x/a.png");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&(10, 10)));
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[tokio::test]
async fn test_upload_unauthorized_uses_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token is missing!"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "bad", 1024);
    let (cb, _) = recorder();
    let err = client
        .upload_file("a.png", "image/png", Bytes::from_static(b"abc"), cb)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Rejected { status, .. } if status.as_u16() == 401));
    assert_eq!(err.error_detail(), "Token is missing!");
}

#[tokio::test]
async fn test_upload_error_without_body_uses_reason_phrase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "t0k", 1024);
    let (cb, _) = recorder();
    let err = client
        .upload_file("a.png", "image/png", Bytes::from_static(b"abc"), cb)
        .await
        .unwrap_err();

    assert_eq!(err.error_detail(), "Internal Server Error");
}

#[tokio::test]
async fn test_upload_malformed_success_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "f1", "name": "a.png"})))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "t0k", 1024);
    let (cb, _) = recorder();
    let err = client
        .upload_file("a.png", "image/png", Bytes::from_static(b"abc"), cb)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::MalformedResponse(_)));
    assert!(err.error_detail().starts_with("Malformed upload response"));
}

#[tokio::test]
async fn test_upload_network_error() {
    let server = MockServer::start().await;
    let endpoint = api_endpoint(&server);
    drop(server);

    let client = RemoteClient::new(&endpoint, NoopCredentialHelper::new(), &test_config(1024)).unwrap();
    let (cb, _) = recorder();
    let err = client
        .upload_file("a.png", "image/png", Bytes::from_static(b"abc"), cb)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Network(_)));
    assert_eq!(err.error_detail(), "Network error");
}

#[tokio::test]
async fn test_upload_invalid_mime_type_is_a_setup_error() {
    let server = MockServer::start().await;
    let client = client_with_token(&server, "t0k", 1024);
    let (cb, _) = recorder();
    let err = client
        .upload_file("a.png", "not a mime type", Bytes::from_static(b"abc"), cb)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Setup(_)));
}

#[tokio::test]
async fn test_login_and_register() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"email": "a@b.c", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t0k", "user_id": "u1", "email": "a@b.c"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"message": "User created successfully!", "user_id": "u2"})),
        )
        .mount(&server)
        .await;

    let client = RemoteClient::new(&api_endpoint(&server), NoopCredentialHelper::new(), &test_config(1024)).unwrap();

    let session = client.login("a@b.c", "pw").await.unwrap();
    assert_eq!(session.token, "t0k");
    assert_eq!(session.user_id, "u1");

    assert_eq!(client.register("new@b.c", "pw").await.unwrap(), "u2");
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials!"})))
        .mount(&server)
        .await;

    let client = RemoteClient::new(&api_endpoint(&server), NoopCredentialHelper::new(), &test_config(1024)).unwrap();
    let err = client.login("a@b.c", "nope").await.unwrap_err();

    assert!(matches!(err, VaultClientError::StatusError { ref message, .. } if message == "Invalid credentials!"));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
}

#[tokio::test]
async fn test_list_files_skips_malformed_entries() {
    let server = MockServer::start().await;
    let mut second = descriptor();
    let id = second.as_object_mut().unwrap().remove("id").unwrap();
    second["_id"] = id;
    second["name"] = json!("b.png");

    Mock::given(method("GET"))
        .and(path("/api/files"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [descriptor(), second, {"_id": "broken"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "t0k", 1024);
    let files = client.list_files().await.unwrap();

    assert_eq!(files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["a.png", "b.png"]);
}

#[tokio::test]
async fn test_delete_file() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/files/f1"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "File deleted successfully!"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "File not found!"})))
        .mount(&server)
        .await;

    let client = client_with_token(&server, "t0k", 1024);
    client.delete_file("f1").await.unwrap();

    let err = client.delete_file("missing").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "healthy", "timestamp": "2024-01-01T00:00:00"})),
        )
        .mount(&server)
        .await;

    let client = RemoteClient::new(&api_endpoint(&server), NoopCredentialHelper::new(), &test_config(1024)).unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");
}
