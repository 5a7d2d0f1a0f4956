//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 持有全部资源（后端客户端、存储、会话管理器），按命令调度流程，
//! 不做具体业务判断。
//!
//! ## 模块划分
//!
//! ### `cli` - 命令行参数
//!
//! ### `app` - 应用生命周期
//! - 初始化存储与中继能力
//! - 把子命令分派给本地中继服务或各个流程
//! - 输出结果并保存文件
//!
//! ## 层次关系
//!
//! ```text
//! app (命令 / 本地中继)
//!     ↓
//! workflow (Generate / Review / Compare)
//!     ↓
//! services (能力层：session / upload / action)
//!     ↓
//! infrastructure (基础设施：BackendClient)
//! ```

pub mod app;
pub mod cli;

pub use app::App;
pub use cli::{Cli, Command, SessionAction};
