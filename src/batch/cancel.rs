//! # 取消令牌
//!
//! 批次在两项之间检查取消标志，不会打断正在进行的单项操作。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用
//! - 在 `main.rs` 中由 Ctrl-C 处理器触发

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 可在线程间共享的取消标志
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
