//! 客户端持久化键值
//!
//! 相当于浏览器的 localStorage：保存当前会话 ID 和"已确认重载"标志，
//! 让程序重启后沿用同一个会话。

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// 当前会话 ID 的键
pub const SESSION_ID_KEY: &str = "arc_session_id";
/// 已确认重载标志的键，值为 `"true"` 时下次获取会话会签发新会话
pub const RELOAD_CONFIRMED_KEY: &str = "arc_reload_confirmed";

/// 持久化键值接口
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// 基于 TOML 文件的持久化存储
#[derive(Debug)]
pub struct FileDurableStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDurableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("无法读取状态文件: {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("无法解析状态文件: {}", self.path.display()))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = toml::to_string(entries).context("无法序列化状态")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("无法写入状态文件: {}", self.path.display()))
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("状态文件锁已损坏"))?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl DurableStore for FileDurableStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("写入持久化键: {}", key);
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("删除持久化键: {}", key);
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// 内存持久化存储（测试和一次性命令使用）
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryDurableStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("内存存储锁已损坏"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("内存存储锁已损坏"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("内存存储锁已损坏"))?
            .remove(key);
        Ok(())
    }
}
