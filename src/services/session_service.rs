//! 会话服务 - 业务能力层
//!
//! 只负责"签发会话 / 查询会话状态 / 列出模板"能力，不关心流程

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::error::{RelayError, RelayResult};
use crate::infrastructure::{BackendClient, BackendRequest};
use crate::models::session::SessionCreated;
use crate::models::{SessionId, SessionStatus};

/// 会话服务
#[derive(Clone)]
pub struct SessionService {
    backend: BackendClient,
}

impl SessionService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// 在后端签发新会话
    ///
    /// 后端成功但未返回 `session_id` 时视为会话错误。
    pub async fn create(&self) -> RelayResult<SessionId> {
        let response = self
            .backend
            .send(
                BackendRequest::post("/api/session/create")
                    .fallback_error("Failed to create session"),
            )
            .await?;
        let created: SessionCreated = response.json()?;
        let session_id = created
            .session_id
            .and_then(SessionId::parse)
            .ok_or_else(|| {
                warn!("⚠️ 后端未返回 session_id");
                RelayError::session("Invalid session response: No session_id")
            })?;
        info!("✓ 会话已创建: {}", session_id);
        Ok(session_id)
    }

    /// 查询会话状态
    pub async fn status(&self, session_id: &SessionId) -> RelayResult<SessionStatus> {
        let request = BackendRequest::get("/api/session")
            .append_segments([session_id.as_str(), "status"])
            .fallback_error("Failed to check session status");
        let response = self.backend.send(request).await?;
        response.json()
    }

    /// 获取模板列表（原样返回后端 JSON）
    pub async fn templates(&self) -> RelayResult<JsonValue> {
        let response = self
            .backend
            .send(
                BackendRequest::get("/api/templates").fallback_error("Failed to fetch templates"),
            )
            .await?;
        let templates = response.json()?;
        info!("✓ 模板列表获取成功");
        Ok(templates)
    }
}
