//! 会话标识管理
//!
//! 一个流程实例同一时间只有一个当前会话 ID。ID 写入持久化存储，
//! 程序重启后沿用；用户确认"新会话"后，下一次获取会签发新会话。

use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::{RelayError, RelayResult};
use crate::models::SessionId;
use crate::services::SessionService;
use crate::store::durable::{RELOAD_CONFIRMED_KEY, SESSION_ID_KEY};
use crate::store::DurableStore;

/// 会话标识管理器
pub struct SessionManager {
    sessions: SessionService,
    durable: Arc<dyn DurableStore>,
    current: Mutex<Option<SessionId>>,
}

impl SessionManager {
    pub fn new(sessions: SessionService, durable: Arc<dyn DurableStore>) -> Self {
        Self {
            sessions,
            durable,
            current: Mutex::new(None),
        }
    }

    /// 获取当前会话
    ///
    /// 已确认重载或没有保存的 ID 时签发新会话，否则沿用保存的 ID。
    pub async fn acquire(&self) -> RelayResult<SessionId> {
        let reload_confirmed = self
            .read_key(RELOAD_CONFIRMED_KEY)
            .map(|v| v == "true")
            .unwrap_or(false);
        let stored = self.read_key(SESSION_ID_KEY).and_then(SessionId::parse);

        match stored {
            Some(session_id) if !reload_confirmed => {
                debug!("沿用已保存的会话: {}", session_id);
                self.set_current(Some(session_id.clone()))?;
                Ok(session_id)
            }
            _ => {
                if reload_confirmed {
                    info!("🔄 用户已确认重载，签发新会话");
                }
                self.remove_key(SESSION_ID_KEY);
                self.remove_key(RELOAD_CONFIRMED_KEY);
                self.mint().await
            }
        }
    }

    /// 覆盖当前会话（后端报告会话不匹配或过期时使用）
    pub fn replace(&self, session_id: SessionId) -> RelayResult<()> {
        info!("🔁 切换会话: {}", session_id);
        self.write_key(SESSION_ID_KEY, session_id.as_str())?;
        self.set_current(Some(session_id))
    }

    /// 标记"新会话"，下一次 `acquire` 会签发新会话
    pub fn confirm_reload(&self) -> RelayResult<()> {
        self.write_key(RELOAD_CONFIRMED_KEY, "true")?;
        self.set_current(None)
    }

    /// 丢弃当前会话并立即签发新会话
    pub async fn reset(&self) -> RelayResult<SessionId> {
        warn!("⚠️ 丢弃当前会话，重新签发");
        self.remove_key(SESSION_ID_KEY);
        self.remove_key(RELOAD_CONFIRMED_KEY);
        self.mint().await
    }

    /// 持久化存储中保存的会话（不会签发新会话）
    pub fn stored(&self) -> Option<SessionId> {
        self.read_key(SESSION_ID_KEY).and_then(SessionId::parse)
    }

    /// 当前会话（尚未获取时为 None）
    pub fn current(&self) -> Option<SessionId> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    /// 签发新会话
    ///
    /// 配置错误原样返回，其余失败一律视为会话错误。
    async fn mint(&self) -> RelayResult<SessionId> {
        let session_id = self.sessions.create().await.map_err(into_session_error)?;
        self.replace(session_id.clone())?;
        Ok(session_id)
    }

    fn set_current(&self, session_id: Option<SessionId>) -> RelayResult<()> {
        let mut guard = self
            .current
            .lock()
            .map_err(|_| RelayError::session("Session state lock poisoned"))?;
        *guard = session_id;
        Ok(())
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.durable.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️ 读取持久化键 {} 失败: {:#}", key, e);
                None
            }
        }
    }

    fn write_key(&self, key: &str, value: &str) -> RelayResult<()> {
        self.durable
            .set(key, value)
            .map_err(|e| RelayError::session(format!("Failed to persist session state: {:#}", e)))
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.durable.remove(key) {
            warn!("⚠️ 删除持久化键 {} 失败: {:#}", key, e);
        }
    }
}

fn into_session_error(err: RelayError) -> RelayError {
    match err {
        RelayError::Config(_) | RelayError::Session(_) => err,
        RelayError::Remote { message, .. } => {
            warn!("⚠️ 会话签发失败: {}", message);
            RelayError::Session(message)
        }
        other => {
            warn!("⚠️ 会话签发失败: {}", other);
            RelayError::session("Failed to create session")
        }
    }
}
