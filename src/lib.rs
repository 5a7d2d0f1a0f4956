//! # Contract Relay
//!
//! 合同工作流中继：按模板生成合同、上传合同做 AI 评估、比较两个合同版本
//!
//! ## 架构设计
//!
//! 所有实质性工作都由远端后端完成，本 crate 只负责转发、会话簿记和结果展示。
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有唯一的 HTTP 连接池
//! - `BackendClient` - 附加 Basic Auth，转发请求并统一错误结构
//!
//! ### ② 存储（Store）
//! - `SessionStore` - 按会话记录上传文件名（注入，可替换）
//! - `DurableStore` - 持久化当前会话 ID 与重载标志
//!
//! ### ③ 业务能力层（Services）
//! - `SessionService` - 签发会话 / 查询状态 / 模板列表
//! - `UploadRelay` - 上传参考文档与待审文档
//! - `ActionRelay` - 生成 / 评估（带重试）/ 比较（带前置检查）
//!
//! ### ④ 流程层（Workflow）
//! - `SessionManager` - 当前会话的获取与替换
//! - `GenerateFlow` / `ReviewFlow` / `CompareFlow` - 一次完整操作
//! - `ChangeSet` - 差异的批准 / 转交与文本报告
//!
//! ### ⑤ 编排层（Orchestration）
//! - `server` - axum 本地中继服务
//! - `orchestrator` - 命令行应用
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{RelayError, RelayResult};
pub use infrastructure::BackendClient;
pub use orchestrator::{App, Cli, Command};
pub use services::{ActionRelay, RelayServices, SessionService, UploadRelay};
pub use store::{InMemorySessionStore, SessionStore};
pub use workflow::{CompareFlow, GenerateFlow, ReviewFlow, SessionManager};
