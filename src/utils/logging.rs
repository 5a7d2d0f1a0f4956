/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use std::borrow::Cow;

use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose_logging` 选择 debug / info。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// 不输出凭据，只输出是否已配置。
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 合同中继服务启动");
    info!(
        "🌐 后端地址: {}",
        config.api_base_url.as_deref().unwrap_or("<未配置>")
    );
    info!(
        "🔐 后端凭据: {}",
        if config.ldap_username.is_some() && config.ldap_password.is_some() {
            "已配置"
        } else {
            "未配置"
        }
    );
    info!(
        "🔁 评估重试: 最多 {} 次, 基础间隔 {}ms",
        config.evaluate_max_attempts, config.evaluate_base_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 取文本前 `max_chars` 个字符作为摘录，被截断时追加 `...`
///
/// 后端错误正文和评估答复可能很长，写进日志或错误详情前先截短。
pub fn excerpt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}
