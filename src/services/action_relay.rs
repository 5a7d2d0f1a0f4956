//! 动作中继 - 业务能力层
//!
//! 负责"生成 / 评估 / 比较"三个后端动作，结果原样交还调用方
//!
//! - `generate` 返回二进制 .docx，不修改任何会话状态
//! - `evaluate` 失败时按线性退避重试（1×, 2×, ... 基础间隔）
//! - `compare` 先查询会话状态，两个文档都在才发起比较

use regex::Regex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{RelayError, RelayResult, FILES_NOT_FOUND_MESSAGE};
use crate::infrastructure::{BackendClient, BackendRequest, MIME_DOCX};
use crate::models::{CompareResult, EvaluationResult, GenerateRequest, GeneratedDocument, SessionId};
use crate::services::SessionService;

const DEFAULT_CONTRACT_FILENAME: &str = "contract.docx";

/// 线性退避重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.evaluate_max_attempts, config.evaluate_base_delay())
    }

    /// 第 `attempt` 次失败（从 1 开始）后的等待时间
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay * attempt as u32
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// 动作中继
///
/// 职责：
/// - 校验表单字段，失败时不发起网络请求
/// - 以表单编码转发到后端
/// - 统一错误结构，识别"会话文件丢失"这一可恢复错误
pub struct ActionRelay {
    backend: BackendClient,
    sessions: SessionService,
    retry: RetryPolicy,
}

impl ActionRelay {
    pub fn new(backend: BackendClient, sessions: SessionService, retry: RetryPolicy) -> Self {
        Self {
            backend,
            sessions,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// 按模板生成合同
    pub async fn generate(&self, request: &GenerateRequest) -> RelayResult<GeneratedDocument> {
        request.validate()?;

        info!(
            "📝 生成合同: 模板 {}, 客户 {}, 会话 {}",
            request.template_type, request.client_name, request.session_id
        );

        let response = self
            .backend
            .send(
                BackendRequest::post("/api/contracts/generate")
                    .form(request.to_form())
                    .accept(MIME_DOCX)
                    .fallback_error("Failed to generate contract"),
            )
            .await?;

        let filename = response
            .content_disposition
            .as_deref()
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_CONTRACT_FILENAME.to_string());
        let content_type = response
            .content_type
            .clone()
            .unwrap_or_else(|| MIME_DOCX.to_string());

        info!(
            "✓ 合同已生成: {} ({} 字节), 会话 {}",
            filename,
            response.body.len(),
            request.session_id
        );

        Ok(GeneratedDocument {
            bytes: response.body,
            content_type,
            filename,
        })
    }

    /// 评估已上传的合同
    ///
    /// 后端失败或响应无法解析时重试，最后一次失败的错误原样返回。
    pub async fn evaluate(&self, session_id: &str) -> RelayResult<EvaluationResult> {
        let session_id = require_session(session_id)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "评估合同 (尝试 {}/{}), 会话 {}",
                attempt, self.retry.max_attempts, session_id
            );

            match self.evaluate_once(&session_id).await {
                Ok(result) => {
                    info!(
                        "✓ 合同评估完成: {} 个问题, {} 个回答",
                        result.questions.len(),
                        result.answers.len()
                    );
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        "⚠️ 合同评估失败 (尝试 {}/{}): {}, {}ms 后重试...",
                        attempt,
                        self.retry.max_attempts,
                        e,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!("❌ 合同评估失败，已尝试 {} 次: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn evaluate_once(&self, session_id: &SessionId) -> RelayResult<EvaluationResult> {
        let response = self
            .backend
            .send(
                BackendRequest::post("/api/contracts/evaluate")
                    .form(session_form(session_id))
                    .fallback_error("Failed to evaluate contract via external endpoint")
                    .empty_json_error("External API returned an error with no details"),
            )
            .await?;
        response.json()
    }

    /// 比较参考文档与待审文档
    pub async fn compare(&self, session_id: &str) -> RelayResult<CompareResult> {
        let session_id = require_session(session_id)?;

        debug!("检查会话状态: {}", session_id);
        let status = self.sessions.status(&session_id).await?;
        if !status.ready_for_comparison() {
            warn!(
                "⚠️ 会话 {} 未就绪: reference={}, review={}",
                session_id, status.has_reference_doc, status.has_review_doc
            );
            return Err(RelayError::precondition(
                "Session is not ready for comparison - missing reference or review document",
            ));
        }

        info!("🔍 比较文档, 会话 {}", session_id);
        let response = self
            .backend
            .send(
                BackendRequest::post("/api/contracts/compare")
                    .form(session_form(&session_id))
                    .fallback_error("Failed to compare documents via external endpoint"),
            )
            .await
            .map_err(into_recoverable)?;

        let result: CompareResult = response.json()?;
        info!("✓ 比较完成: {} 处差异", result.differences.len());
        Ok(result)
    }
}

/// 后端报告会话文件丢失时转换为可恢复错误
fn into_recoverable(err: RelayError) -> RelayError {
    match err {
        RelayError::Remote {
            status,
            message,
            details,
        } if message == FILES_NOT_FOUND_MESSAGE => {
            RelayError::RecoverableSession { status, details }
        }
        other => other,
    }
}

fn require_session(raw: &str) -> RelayResult<SessionId> {
    SessionId::parse(raw).ok_or_else(|| RelayError::validation("Session ID is required"))
}

fn session_form(session_id: &SessionId) -> Vec<(String, String)> {
    vec![("session_id".to_string(), session_id.to_string())]
}

/// 从 `Content-Disposition` 中取出文件名
fn filename_from_disposition(disposition: &str) -> Option<String> {
    let re = Regex::new(r#"filename\s*=\s*"?([^";]+)"?"#).ok()?;
    re.captures(disposition)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
