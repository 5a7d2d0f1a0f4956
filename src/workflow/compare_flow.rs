//! 合同比较流程 - 流程层
//!
//! 流程顺序：
//! 1. 获取会话
//! 2. 上传参考文档 → 上传待审文档（必须按此顺序）
//! 3. 比较
//! 4. 后端报告会话文件丢失时，换一个新会话把 2-3 整体重做一次

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{RelayError, RelayResult};
use crate::models::{ChangeRecord, DocumentRole, SessionId, UploadFile, UploadRequest};
use crate::services::{ActionRelay, UploadRelay};
use crate::workflow::in_flight::InFlightGuard;
use crate::workflow::report::ChangeSet;
use crate::workflow::SessionManager;

const COMPARE_IN_PROGRESS: &str = "A comparison is already in progress";

/// 比较结果
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub session_id: SessionId,
    pub changes: ChangeSet,
    /// 是否因会话文件丢失而换过会话
    pub session_replaced: bool,
}

/// 比较流程
///
/// - 同一实例同一时间只允许一次比较
/// - 只在"会话文件丢失"时重试，且只重试一次
pub struct CompareFlow {
    sessions: Arc<SessionManager>,
    uploads: Arc<UploadRelay>,
    actions: Arc<ActionRelay>,
    in_flight: AtomicBool,
}

impl CompareFlow {
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

    pub async fn run(
        &self,
        reference: UploadFile,
        review: UploadFile,
        template_type: &str,
    ) -> RelayResult<CompareOutcome> {
        let _guard = InFlightGuard::enter(&self.in_flight, COMPARE_IN_PROGRESS)?;

        let session_id = self.sessions.acquire().await?;
        match self
            .attempt(&session_id, reference.clone(), review.clone(), template_type)
            .await
        {
            Ok(changes) => Ok(CompareOutcome {
                session_id,
                changes,
                session_replaced: false,
            }),
            Err(RelayError::RecoverableSession { .. }) => {
                warn!("⚠️ 会话 {} 的文件已丢失，换新会话重试一次", session_id);
                let replacement = self.sessions.reset().await?;
                let changes = self
                    .attempt(&replacement, reference, review, template_type)
                    .await?;
                Ok(CompareOutcome {
                    session_id: replacement,
                    changes,
                    session_replaced: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn attempt(
        &self,
        session_id: &SessionId,
        reference: UploadFile,
        review: UploadFile,
        template_type: &str,
    ) -> RelayResult<ChangeSet> {
        info!("[会话 {}] 📤 上传参考文档...", session_id);
        self.uploads
            .upload(UploadRequest {
                role: DocumentRole::Reference,
                file: Some(reference),
                session_id: Some(session_id.to_string()),
                template_type: None,
            })
            .await?;

        info!("[会话 {}] 📤 上传待审文档...", session_id);
        self.uploads
            .upload(UploadRequest {
                role: DocumentRole::Review,
                file: Some(review),
                session_id: Some(session_id.to_string()),
                template_type: Some(template_type.to_string()),
            })
            .await?;

        let result = self.actions.compare(session_id.as_str()).await?;
        let changes: Vec<ChangeRecord> =
            result.differences.iter().map(ChangeRecord::from).collect();
        info!("[会话 {}] ✅ 比较完成: {} 处差异", session_id, changes.len());
        Ok(ChangeSet::new(changes))
    }
}
