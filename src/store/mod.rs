//! 存储层
//!
//! - `session_store` - 服务端按会话 ID 记录上传文件名（仅用于展示）
//! - `durable` - 客户端持久化键值（保存当前会话 ID 与重载标志）

pub mod durable;
pub mod session_store;

pub use durable::{DurableStore, FileDurableStore, MemoryDurableStore};
pub use session_store::{InMemorySessionStore, SessionStore};
