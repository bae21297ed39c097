use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use upload_session::{
    SessionOutcome, SessionProgress, UploadFile, UploadObserver, UploadSessionManager, UploadState, VaultConfig,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<SessionProgress>>,
    terminal: Mutex<Vec<SessionOutcome>>,
}

#[async_trait]
impl UploadObserver for Recorder {
    async fn on_progress(&self, progress: SessionProgress) {
        self.progress.lock().unwrap().push(progress);
    }

    async fn on_terminal(&self, outcome: SessionOutcome) {
        self.terminal.lock().unwrap().push(outcome);
    }
}

fn test_config() -> VaultConfig {
    let mut config = VaultConfig::default();
    config.client.retry_max_attempts = 0;
    config.client.retry_base_delay = Duration::from_millis(1);
    config.client.retry_max_delay = Duration::from_millis(1);
    config.upload.stream_block_size = 4;
    config
}

fn connect(server: &MockServer, observer: Arc<Recorder>) -> UploadSessionManager {
    UploadSessionManager::connect(&format!("{}/api", server.uri()), "t0k".to_owned(), observer, &test_config())
        .unwrap()
}

fn descriptor(name: &str) -> serde_json::Value {
    json!({
        "id": format!("id-{name}"),
        "name": name,
        "size": 10,
        "type": "image/png",
        "upload_date": "2024-01-01T00:00:00Z",
        "drive_url": format!("https://x/{name}"),
        "drive_id": "d1"
    })
}

#[tokio::test]
async fn test_unauthorized_upload_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token is missing!"})))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(Recorder::default());
    let manager = connect(&server, observer.clone());

    let id = manager.submit(vec![UploadFile::from_bytes("a.png", vec![7u8; 10])])[0];
    manager.wait_idle().await;

    let snap = manager.session(id).unwrap();
    assert_eq!(snap.state, UploadState::Failed);
    assert_eq!(snap.error_detail.as_deref(), Some("Token is missing!"));
    assert!(snap.result_record.is_none());

    let terminal = observer.terminal.lock().unwrap();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(&terminal[0], SessionOutcome::Failed { error_detail, .. } if !error_detail.is_empty()));
}

#[tokio::test]
async fn test_successful_upload_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(descriptor("a.png")))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(Recorder::default());
    let manager = connect(&server, observer.clone());

    let id = manager.submit(vec![UploadFile::from_bytes("a.png", vec![7u8; 10])])[0];
    manager.wait_idle().await;

    let snap = manager.session(id).unwrap();
    assert_eq!(snap.state, UploadState::Completed);
    assert_eq!(snap.result_record.as_ref().unwrap().name, "a.png");
    assert_eq!(snap.progress_percent, 100);
    assert_eq!(snap.bytes_sent, 10);
    assert!(snap.error_detail.is_none());

    let progress = observer.progress.lock().unwrap();
    assert!(progress.iter().all(|p| p.session_id == id));
    assert!(progress.windows(2).all(|w| w[0].bytes_sent <= w[1].bytes_sent));
    assert!(matches!(&observer.terminal.lock().unwrap()[..], [SessionOutcome::Completed { record, .. }] if record.id == "id-a.png"));
}

#[tokio::test]
async fn test_one_failure_does_not_affect_the_rest_of_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"bad.png\""))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"good.png\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"file": descriptor("good.png")})))
        .mount(&server)
        .await;

    let observer = Arc::new(Recorder::default());
    let manager = connect(&server, observer.clone());

    let ids = manager.submit(vec![
        UploadFile::from_bytes("bad.png", vec![1u8; 10]),
        UploadFile::from_bytes("good.png", vec![2u8; 10]),
    ]);
    manager.wait_idle().await;

    let bad = manager.session(ids[0]).unwrap();
    let good = manager.session(ids[1]).unwrap();
    assert_eq!(bad.state, UploadState::Failed);
    assert_eq!(bad.error_detail.as_deref(), Some("Internal Server Error"));
    assert_eq!(good.state, UploadState::Completed);
    assert_eq!(good.result_record.unwrap().name, "good.png");
    assert_eq!(observer.terminal.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_connect_rejects_bad_endpoint() {
    let result = UploadSessionManager::connect("not a url", "t0k".to_owned(), Arc::new(Recorder::default()), &test_config());
    assert!(result.is_err());
}
