//! 中继错误类型
//!
//! 所有中继失败最终都会被转换为 `{error, details?}` 结构返回给调用方，
//! 不允许任何错误未经处理地穿透到展示层。

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

/// 后端在会话文件丢失时返回的固定消息
pub const FILES_NOT_FOUND_MESSAGE: &str = "Files not found for this session";

/// 中继错误
#[derive(Debug, Error)]
pub enum RelayError {
    /// 缺少凭据或后端地址（致命，HTTP 500）
    #[error("Server configuration error: {0}")]
    Config(String),

    /// 缺少必填字段或字段格式错误（HTTP 400，不发起网络请求）
    #[error("{0}")]
    Validation(String),

    /// 后端返回非 2xx 状态
    #[error("{message}")]
    Remote {
        status: u16,
        message: String,
        details: JsonValue,
    },

    /// 后端报告会话文件丢失，可通过更换会话重试一次
    #[error("Files not found for this session")]
    RecoverableSession { status: u16, details: JsonValue },

    /// 网络故障或响应解析失败
    #[error("Internal server error: {0}")]
    Transport(String),

    /// 会话缺少比较所需的文档
    #[error("{0}")]
    Precondition(String),

    /// 会话创建失败或未返回会话 ID
    #[error("{0}")]
    Session(String),
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        RelayError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        RelayError::Precondition(message.into())
    }

    pub fn session(message: impl Into<String>) -> Self {
        RelayError::Session(message.into())
    }

    /// 对应的本地 HTTP 状态码
    ///
    /// 后端错误沿用后端的状态码；后端状态码不合法时退回 500。
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Config(_) | RelayError::Transport(_) | RelayError::Session(_) => 500,
            RelayError::Validation(_) | RelayError::Precondition(_) => 400,
            RelayError::Remote { status, .. } | RelayError::RecoverableSession { status, .. } => {
                if (400..=599).contains(status) {
                    *status
                } else {
                    500
                }
            }
        }
    }

    /// 是否值得在后端调用层重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Remote { .. } | RelayError::Transport(_))
    }

    /// 转换为对外的 `{error, details?}` 结构
    pub fn to_body(&self) -> JsonValue {
        match self {
            RelayError::Config(detail) => json!({
                "error": "Server configuration error",
                "details": detail,
            }),
            RelayError::Validation(message)
            | RelayError::Precondition(message)
            | RelayError::Session(message) => json!({ "error": message }),
            RelayError::Remote {
                message, details, ..
            } => json!({ "error": message, "details": details }),
            RelayError::RecoverableSession { details, .. } => json!({
                "error": FILES_NOT_FOUND_MESSAGE,
                "details": details,
            }),
            RelayError::Transport(detail) => json!({
                "error": "Internal server error",
                "details": detail,
            }),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Transport(format!("invalid response from external API: {}", err))
    }
}

/// 中继结果类型
pub type RelayResult<T> = Result<T, RelayError>;
