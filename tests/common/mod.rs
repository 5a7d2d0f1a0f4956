//! 测试用的假后端
//!
//! 在 127.0.0.1:0 上启动一个 axum 服务，记录每次调用，行为可按测试调整

#![allow(dead_code)]

use axum::extract::{Multipart, Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use contract_relay::Config;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// 一次 multipart 上传收到的字段（文件字段记录文件名）
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: String,
    pub fields: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    hits: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    /// 会话 → (有参考文档, 有待审文档)
    documents: Arc<Mutex<HashMap<String, (bool, bool)>>>,
    sessions_minted: Arc<AtomicUsize>,
    /// 接下来多少次签发会话返回 503
    pub create_failures: Arc<AtomicUsize>,
    /// 接下来多少次评估返回 500
    pub evaluate_failures: Arc<AtomicUsize>,
    /// 接下来多少次比较返回"会话文件丢失"
    pub files_missing: Arc<AtomicUsize>,
    /// 评估响应前的延迟（毫秒）
    pub evaluate_delay_ms: Arc<AtomicU64>,
}

impl FakeBackend {
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().len()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, path: &str) {
        self.hits.lock().unwrap().push(path.to_string());
    }
}

/// 启动假后端，返回其地址
pub async fn spawn_backend(backend: FakeBackend) -> String {
    let app = Router::new()
        .route("/api/session/create", post(create_session))
        .route("/api/session/:id/status", get(session_status))
        .route("/api/templates", get(templates))
        .route("/api/contracts/upload-reference", post(upload_reference))
        .route("/api/contracts/upload-for-review", post(upload_for_review))
        .route("/api/contracts/generate", post(generate))
        .route("/api/contracts/evaluate", post(evaluate))
        .route("/api/contracts/compare", post(compare))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("fake backend addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve fake backend") });
    format!("http://{}", addr)
}

/// 指向假后端、重试间隔 1ms 的配置
pub fn config_for(base_url: &str) -> Config {
    Config {
        api_base_url: Some(base_url.to_string()),
        ldap_username: Some("relay-user".to_string()),
        ldap_password: Some("relay-pass".to_string()),
        evaluate_base_delay_ms: 1,
        request_timeout_secs: 5,
        ..Config::default()
    }
}

async fn create_session(State(backend): State<FakeBackend>) -> Response {
    backend.record("/api/session/create");
    let failing = backend
        .create_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "backend down" })),
        )
            .into_response();
    }
    let n = backend.sessions_minted.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "session_id": format!("s-{}", n) })).into_response()
}

async fn session_status(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    backend.record("/api/session/status");
    let (has_reference, has_review) = backend
        .documents
        .lock()
        .unwrap()
        .get(&id)
        .copied()
        .unwrap_or_default();
    Json(json!({
        "session_id": id,
        "has_reference_doc": has_reference,
        "has_review_doc": has_review,
    }))
}

async fn templates(State(backend): State<FakeBackend>) -> Json<serde_json::Value> {
    backend.record("/api/templates");
    Json(json!({
        "templates": [
            { "name": "MSA", "description": "Master Service Agreement" },
            { "name": "NDA" }
        ]
    }))
}

async fn upload_reference(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Json<serde_json::Value> {
    record_upload(&backend, "/api/contracts/upload-reference", headers, multipart, true).await
}

async fn upload_for_review(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Json<serde_json::Value> {
    record_upload(&backend, "/api/contracts/upload-for-review", headers, multipart, false).await
}

async fn record_upload(
    backend: &FakeBackend,
    path: &str,
    headers: HeaderMap,
    mut multipart: Multipart,
    reference: bool,
) -> Json<serde_json::Value> {
    backend.record(path);
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(str::to_string) {
            let _ = field.bytes().await.unwrap();
            fields.insert(name, filename);
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }

    if let Some(session_id) = fields.get("session_id") {
        let mut documents = backend.documents.lock().unwrap();
        let entry = documents.entry(session_id.clone()).or_default();
        if reference {
            entry.0 = true;
        } else {
            entry.1 = true;
        }
    }

    backend.uploads.lock().unwrap().push(RecordedUpload {
        path: path.to_string(),
        fields,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    Json(json!({ "status": "stored" }))
}

async fn generate(
    State(backend): State<FakeBackend>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    backend.record("/api/contracts/generate");
    let body = format!("DOCX for {}", fields.get("client_name").cloned().unwrap_or_default());
    (
        [
            (CONTENT_TYPE, DOCX_MIME),
            (CONTENT_DISPOSITION, "attachment; filename=\"contract.docx\""),
        ],
        body.into_bytes(),
    )
        .into_response()
}

async fn evaluate(State(backend): State<FakeBackend>) -> Response {
    backend.record("/api/contracts/evaluate");
    let delay = backend.evaluate_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let failing = backend
        .evaluate_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "model overloaded" })),
        )
            .into_response();
    }
    Json(json!({
        "questions": ["Is there a termination clause?", "Is liability capped?"],
        "answers": ["NA - Not Applicable", "The cap could be higher"],
    }))
    .into_response()
}

async fn compare(State(backend): State<FakeBackend>) -> Response {
    backend.record("/api/contracts/compare");
    let missing = backend
        .files_missing
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if missing {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Files not found for this session" })),
        )
            .into_response();
    }
    Json(json!({
        "differences": [
            {
                "index": 0,
                "reference_text": "Old clause",
                "review_text": "New clause",
                "ai_opinion": "- Summary: text\n- Legal Opinion: text"
            },
            {
                "index": 1,
                "reference_text": null,
                "review_text": "Added indemnity",
                "ai_opinion": "- Summary: new indemnity"
            }
        ]
    }))
    .into_response()
}
