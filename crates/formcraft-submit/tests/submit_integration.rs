//! End-to-end submissions against a live HTTP endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use formcraft_core::{FormcraftError, FormcraftResult, PersistenceMode, Settings};
use formcraft_forms::{Field, FieldGroup, FieldType, Form, FormDraft, HttpMethod, SubmitConfig, ValidationRule};
use formcraft_persistence::{PersistenceManager, StorageSession};
use formcraft_submit::{
    HttpTransport, SubmissionAssembler, SubmissionRequest, SubmissionState, Transport,
    TransportResponse,
};

#[derive(Clone, Default)]
struct Received {
    requests: Arc<Mutex<Vec<(HeaderMap, serde_json::Value)>>>,
}

struct LiveEndpoint {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl LiveEndpoint {
    async fn start(app: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });
        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for LiveEndpoint {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn accept(
    State(received): State<Received>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    received.requests.lock().unwrap().push((headers, body));
    StatusCode::CREATED
}

async fn reject() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"message": "Email already registered"})),
    )
}

async fn endpoint() -> (LiveEndpoint, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/submit", post(accept).put(accept))
        .route("/reject", post(reject))
        .with_state(received.clone());
    (LiveEndpoint::start(app).await, received)
}

fn signup(config: SubmitConfig) -> Form {
    Form::from_draft(
        FormDraft {
            name: "Signup".to_string(),
            groups: vec![FieldGroup::new(
                "g1",
                "account",
                vec![
                    Field::new("f-email", "email", FieldType::Email)
                        .validation(ValidationRule::new().required(true)),
                    Field::new("f-name", "name", FieldType::Text),
                ],
            )],
            submit_config: Some(config),
            ..FormDraft::default()
        },
        PersistenceMode::Session,
    )
}

fn config(url: String) -> SubmitConfig {
    SubmitConfig {
        api_endpoint: Some(url),
        ..SubmitConfig::default()
    }
}

fn transport() -> Arc<HttpTransport> {
    let settings = Settings {
        request_timeout_secs: Some(5),
        ..Settings::default()
    };
    Arc::new(HttpTransport::from_settings(&settings).unwrap())
}

#[tokio::test]
async fn test_successful_submission_clears_values() {
    let (server, received) = endpoint().await;
    let mut cfg = config(server.url("/submit"));
    cfg.http_method = HttpMethod::Put;
    cfg.headers.insert("X-Api-Key".to_string(), "secret".to_string());
    cfg.headers.insert("Content-Type".to_string(), "text/plain".to_string());
    let form = signup(cfg);

    let mut values = PersistenceManager::new(form.clone(), StorageSession::in_memory());
    values.save([("f-email", "ada@example.com"), ("f-name", "Ada")].into_iter().collect());

    let assembler = SubmissionAssembler::new(transport());
    let outcome = assembler.submit(&mut values).await.unwrap();
    assert_eq!(outcome.reset_after, Duration::from_secs(2));
    assert_eq!(assembler.state(), SubmissionState::Submitted);
    assert!(!values.exists());

    let requests = received.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["x-api-key"], "secret");
    assert_eq!(body["formId"], form.id.as_str());
    assert_eq!(body["version"], 1);
    assert_eq!(
        body["data"],
        serde_json::json!({"account": {"email": "ada@example.com", "name": "Ada"}})
    );
}

#[tokio::test]
async fn test_rejected_submission_surfaces_message_and_keeps_values() {
    let (server, _) = endpoint().await;
    let form = signup(config(server.url("/reject")));
    let mut values = PersistenceManager::new(form, StorageSession::in_memory());
    values.save([("f-email", "ada@example.com")].into_iter().collect());

    let assembler = SubmissionAssembler::new(transport());
    let err = assembler.submit(&mut values).await.unwrap_err();
    assert_eq!(err.kind(), "transport-failure");
    assert_eq!(err.to_string(), "Email already registered");
    assert!(err.is_retryable());
    assert!(values.exists());
    assert_eq!(values.load().get("f-email").and_then(|v| v.as_text()).as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn test_unreachable_endpoint_fails() {
    let form = signup(config("http://127.0.0.1:9/submit".to_string()));
    let mut values = PersistenceManager::new(form, StorageSession::in_memory());
    values.save([("f-email", "ada@example.com")].into_iter().collect());

    let assembler = SubmissionAssembler::new(transport());
    let err = assembler.submit(&mut values).await.unwrap_err();
    assert_eq!(err.kind(), "transport-failure");
    assert!(matches!(assembler.state(), SubmissionState::Failed(_)));
    assert!(values.exists());
}

#[tokio::test]
async fn test_invalid_values_never_reach_the_endpoint() {
    let (server, received) = endpoint().await;
    let form = signup(config(server.url("/submit")));
    let mut values = PersistenceManager::new(form, StorageSession::in_memory());
    values.save([("f-email", "not-an-email")].into_iter().collect());

    let assembler = SubmissionAssembler::new(transport());
    match assembler.submit(&mut values).await {
        Err(FormcraftError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors.get("f-email").is_some());
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(received.requests.lock().unwrap().is_empty());
}

struct Slow {
    calls: Mutex<u32>,
}

#[async_trait::async_trait]
impl Transport for Slow {
    async fn send(&self, _request: &SubmissionRequest) -> FormcraftResult<TransportResponse> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(TransportResponse::new(200, ""))
    }
}

#[tokio::test]
async fn test_concurrent_submission_is_rejected() {
    let form = signup(config("https://example.com/submit".to_string()));
    let stores = StorageSession::in_memory();
    let mut first = PersistenceManager::new(form.clone(), stores.clone());
    first.save([("f-email", "ada@example.com")].into_iter().collect());
    let mut second = PersistenceManager::new(form, stores);

    let slow = Arc::new(Slow {
        calls: Mutex::new(0),
    });
    let assembler = SubmissionAssembler::new(slow.clone());

    let (a, b) = tokio::join!(assembler.submit(&mut first), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assembler.submit(&mut second).await
    });

    assert!(a.is_ok());
    assert_eq!(b.unwrap_err().kind(), "submission-in-progress");
    assert_eq!(*slow.calls.lock().unwrap(), 1);
}
