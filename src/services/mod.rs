//! 业务能力层（Services）
//!
//! 每个服务只描述"我能对后端做什么"，不关心调用顺序

pub mod action_relay;
pub mod session_service;
pub mod upload_relay;

pub use action_relay::{ActionRelay, RetryPolicy};
pub use session_service::SessionService;
pub use upload_relay::UploadRelay;

use std::sync::Arc;

use crate::config::Config;
use crate::error::RelayResult;
use crate::infrastructure::BackendClient;
use crate::store::SessionStore;

/// 共享同一个后端客户端的全部中继能力
pub struct RelayServices {
    pub sessions: SessionService,
    pub uploads: Arc<UploadRelay>,
    pub actions: Arc<ActionRelay>,
}

impl RelayServices {
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> RelayResult<Self> {
        let backend = BackendClient::new(config)?;
        let sessions = SessionService::new(backend.clone());
        Ok(Self {
            uploads: Arc::new(UploadRelay::new(backend.clone(), store)),
            actions: Arc::new(ActionRelay::new(
                backend,
                sessions.clone(),
                RetryPolicy::from_config(config),
            )),
            sessions,
        })
    }
}
