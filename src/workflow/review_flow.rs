//! 合同评估流程
//!
//! 获取会话 → 上传待审文档 → 确认上传回执 → 评估 → 整理问答

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{RelayError, RelayResult};
use crate::models::{DocumentRole, EvaluationRecord, SessionId, UploadFile, UploadRequest};
use crate::services::{ActionRelay, UploadRelay};
use crate::workflow::in_flight::InFlightGuard;
use crate::workflow::SessionManager;

/// 认为上传成功的回执消息
const ACCEPTED_UPLOAD_MESSAGES: &[&str] = &[
    "File uploaded successfully",
    "Upload successful",
    "Document uploaded",
];

const REVIEW_IN_PROGRESS: &str = "An evaluation is already in progress";

/// 评估结果
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub session_id: SessionId,
    pub filename: String,
    pub records: Vec<EvaluationRecord>,
}

/// 评估流程，同一实例同一时间只允许一次评估
pub struct ReviewFlow {
    sessions: Arc<SessionManager>,
    uploads: Arc<UploadRelay>,
    actions: Arc<ActionRelay>,
    in_flight: AtomicBool,
}

impl ReviewFlow {
    pub fn new(
        sessions: Arc<SessionManager>,
        uploads: Arc<UploadRelay>,
        actions: Arc<ActionRelay>,
    ) -> Self {
        Self {
            sessions,
            uploads,
            actions,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn run(&self, file: UploadFile, template_type: &str) -> RelayResult<ReviewOutcome> {
        let _guard = InFlightGuard::enter(&self.in_flight, REVIEW_IN_PROGRESS)?;

        let session_id = self.sessions.acquire().await?;

        let receipt = self
            .uploads
            .upload(UploadRequest {
                role: DocumentRole::Review,
                file: Some(file),
                session_id: Some(session_id.to_string()),
                template_type: Some(template_type.to_string()),
            })
            .await?;

        if !is_accepted_upload(&receipt.message) {
            warn!("⚠️ 意外的上传回执: {}", receipt.message);
            return Err(RelayError::Remote {
                status: 500,
                message: format!("Unexpected upload response: {}", receipt.message),
                details: serde_json::json!({}),
            });
        }

        let result = self.actions.evaluate(session_id.as_str()).await?;
        let records = EvaluationRecord::from_result(&result);

        info!(
            "✅ 评估完成: {} ({} 个问答)",
            receipt.filename,
            records.len()
        );

        Ok(ReviewOutcome {
            session_id,
            filename: receipt.filename,
            records,
        })
    }
}

fn is_accepted_upload(message: &str) -> bool {
    ACCEPTED_UPLOAD_MESSAGES.contains(&message)
}
