//! 流程并发保护：同一流程实例同一时间只允许一次运行

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{RelayError, RelayResult};

/// 离开作用域时清除运行标志
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// 占用运行标志；已被占用时返回 `Precondition`，重叠的调用不排队
    pub(crate) fn enter(flag: &'a AtomicBool, busy_message: &str) -> RelayResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| RelayError::precondition(busy_message))?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
