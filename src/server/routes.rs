//! 本地中继路由
//!
//! 每个处理函数只做参数提取，然后交给对应的中继能力

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{RelayError, RelayResult};
use crate::models::{
    CompareResult, DocumentRole, EvaluationResult, GenerateRequest, SessionId, SessionStatus,
    UploadFile, UploadReceipt, UploadRequest, UploadedDocumentRecord,
};
use crate::server::AppState;

/// 只带会话 ID 的表单
#[derive(Debug, Default, Deserialize)]
pub struct SessionForm {
    #[serde(default)]
    pub session_id: String,
}

pub async fn healthz() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_session(State(state): State<AppState>) -> RelayResult<Json<JsonValue>> {
    let session_id = state.services.sessions.create().await?;
    Ok(Json(json!({ "session_id": session_id })))
}

pub async fn templates(State(state): State<AppState>) -> RelayResult<Json<JsonValue>> {
    Ok(Json(state.services.sessions.templates().await?))
}

pub async fn upload_reference(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RelayResult<Json<UploadReceipt>> {
    upload(state, DocumentRole::Reference, multipart).await
}

pub async fn upload_for_review(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> RelayResult<Json<UploadReceipt>> {
    upload(state, DocumentRole::Review, multipart).await
}

async fn upload(
    state: AppState,
    role: DocumentRole,
    multipart: Result<Multipart, MultipartRejection>,
) -> RelayResult<Json<UploadReceipt>> {
    let multipart = multipart.map_err(|e| RelayError::validation(e.body_text()))?;
    let request = read_upload(role, multipart).await?;
    let receipt = state.services.uploads.upload(request).await?;
    Ok(Json(receipt))
}

/// 读取 multipart 中的 `file` / `session_id` / `template_type`
async fn read_upload(role: DocumentRole, mut multipart: Multipart) -> RelayResult<UploadRequest> {
    let mut request = UploadRequest {
        role,
        file: None,
        session_id: None,
        template_type: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| RelayError::validation(e.body_text()))?;
                request.file = Some(UploadFile {
                    filename,
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            "session_id" | "template_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| RelayError::validation(e.body_text()))?;
                if name == "session_id" {
                    request.session_id = Some(value);
                } else {
                    request.template_type = Some(value);
                }
            }
            other => debug!("忽略未知上传字段: {}", other),
        }
    }

    Ok(request)
}

pub async fn generate(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> RelayResult<impl IntoResponse> {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(e) => {
            debug!("生成表单无法解析: {}", e.body_text());
            HashMap::new()
        }
    };
    let request = GenerateRequest::from_fields(&fields);
    let document = state.services.actions.generate(&request).await?;
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (CONTENT_TYPE, document.content_type),
            (CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    ))
}

pub async fn evaluate(
    State(state): State<AppState>,
    form: Result<Form<SessionForm>, FormRejection>,
) -> RelayResult<Json<EvaluationResult>> {
    let session_id = session_from_form(form);
    Ok(Json(state.services.actions.evaluate(&session_id).await?))
}

pub async fn compare(
    State(state): State<AppState>,
    form: Result<Form<SessionForm>, FormRejection>,
) -> RelayResult<Json<CompareResult>> {
    let session_id = session_from_form(form);
    Ok(Json(state.services.actions.compare(&session_id).await?))
}

pub async fn session_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> RelayResult<Json<SessionStatus>> {
    let session_id = session_from_path(raw)?;
    Ok(Json(state.services.sessions.status(&session_id).await?))
}

pub async fn session_documents(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> RelayResult<Json<UploadedDocumentRecord>> {
    let session_id = session_from_path(raw)?;
    let record = state
        .services
        .uploads
        .record(&session_id)
        .await
        .unwrap_or_default();
    Ok(Json(record))
}

pub async fn clear_session_documents(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> RelayResult<Json<JsonValue>> {
    let session_id = session_from_path(raw)?;
    let cleared = state.services.uploads.clear(&session_id).await;
    Ok(Json(json!({ "session_id": session_id, "cleared": cleared })))
}

/// 表单缺失或无法解析时按"缺少会话 ID"处理
fn session_from_form(form: Result<Form<SessionForm>, FormRejection>) -> String {
    match form {
        Ok(Form(form)) => form.session_id,
        Err(e) => {
            debug!("会话表单无法解析: {}", e.body_text());
            String::new()
        }
    }
}

fn session_from_path(raw: String) -> RelayResult<SessionId> {
    SessionId::parse(raw).ok_or_else(|| RelayError::validation("Session ID is required"))
}
