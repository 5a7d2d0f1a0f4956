use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{RelayError, RelayResult};

/// 程序配置
///
/// 凭据和后端地址允许缺失：缺失时服务仍能启动，但每个中继请求都会返回配置错误。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 后端 API 配置 ---
    pub api_base_url: Option<String>,
    pub ldap_username: Option<String>,
    pub ldap_password: Option<String>,
    /// 单次后端请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 本地中继服务 ---
    pub listen_addr: String,
    // --- 合同评估重试 ---
    pub evaluate_max_attempts: usize,
    pub evaluate_base_delay_ms: u64,
    /// 会话 ID 持久化文件
    pub session_state_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            ldap_username: None,
            ldap_password: None,
            request_timeout_secs: 60,
            listen_addr: "127.0.0.1:3000".to_string(),
            evaluate_max_attempts: 3,
            evaluate_base_delay_ms: 1000,
            session_state_file: ".contract_relay_state.toml".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件，再用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: env_string("API_BASE_URL").or(self.api_base_url),
            ldap_username: env_string("LDAP_USERNAME").or(self.ldap_username),
            ldap_password: env_string("LDAP_PASSWORD").or(self.ldap_password),
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(self.request_timeout_secs),
            listen_addr: env_string("LISTEN_ADDR").unwrap_or(self.listen_addr),
            evaluate_max_attempts: env_parsed("EVALUATE_MAX_ATTEMPTS")
                .unwrap_or(self.evaluate_max_attempts),
            evaluate_base_delay_ms: env_parsed("EVALUATE_BASE_DELAY_MS")
                .unwrap_or(self.evaluate_base_delay_ms),
            session_state_file: env_string("SESSION_STATE_FILE").unwrap_or(self.session_state_file),
            verbose_logging: env_parsed("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 取出调用后端所需的凭据，任一缺失即为配置错误
    pub fn backend_credentials(&self) -> RelayResult<BackendCredentials> {
        let base_url = required(&self.api_base_url, "API_BASE_URL")?;
        let username = required(&self.ldap_username, "LDAP_USERNAME")?;
        let password = required(&self.ldap_password, "LDAP_PASSWORD")?;
        Ok(BackendCredentials {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn evaluate_base_delay(&self) -> Duration {
        Duration::from_millis(self.evaluate_base_delay_ms)
    }
}

/// 后端凭据
///
/// `Debug` 不输出密码。
#[derive(Clone)]
pub struct BackendCredentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn required(value: &Option<String>, var_name: &str) -> RelayResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(RelayError::Config(format!("{} is not set", var_name))),
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(var_name: &str) -> Option<T> {
    std::env::var(var_name).ok().and_then(|v| v.parse().ok())
}
