//! 上传记录存储
//!
//! 以会话 ID 为键，后写覆盖，没有淘汰策略。记录只用于展示，
//! 会话是否有效由后端决定。

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{SessionId, UploadedDocumentRecord};

/// 上传记录存储接口
///
/// 以依赖注入的方式交给各个中继组件，便于替换为外部缓存或测试替身。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取某个会话的记录
    async fn get(&self, session_id: &SessionId) -> Option<UploadedDocumentRecord>;

    /// 合并更新某个会话的记录，返回合并后的结果
    async fn set(
        &self,
        session_id: &SessionId,
        update: UploadedDocumentRecord,
    ) -> UploadedDocumentRecord;

    /// 删除某个会话的记录，返回是否存在
    async fn delete(&self, session_id: &SessionId) -> bool;
}

/// 进程内存储
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: RwLock<HashMap<SessionId, UploadedDocumentRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &SessionId) -> Option<UploadedDocumentRecord> {
        let record = self.records.read().await.get(session_id).cloned();
        debug!("读取上传记录: {} -> {:?}", session_id, record);
        record
    }

    async fn set(
        &self,
        session_id: &SessionId,
        update: UploadedDocumentRecord,
    ) -> UploadedDocumentRecord {
        let mut records = self.records.write().await;
        let record = records.entry(session_id.clone()).or_default();
        record.merge(update);
        debug!("更新上传记录: {} -> {:?}", session_id, record);
        record.clone()
    }

    async fn delete(&self, session_id: &SessionId) -> bool {
        let existed = self.records.write().await.remove(session_id).is_some();
        debug!("清除上传记录: {} (存在: {})", session_id, existed);
        existed
    }
}
