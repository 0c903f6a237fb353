//! # 操作日志
//!
//! 同时输出 `tracing` 事件并把日志条目写入台账。
//!
//! ## 依赖关系
//! - 被 `codegen/`、`search/`、`audit/`、`compress/` 使用

use super::Ledger;
use crate::error::Result;
use crate::models::{LogEntry, LogLevel};

use tracing::{debug, error, info, warn};

/// 记录一次操作日志
///
/// 写入失败时返回 `StorageUnavailable`，由调用方决定是否中止。
pub fn log_operation(
    ledger: &Ledger,
    module: &str,
    action: &str,
    level: LogLevel,
    message: impl Into<String>,
    extra: Option<serde_json::Value>,
) -> Result<i64> {
    let message = message.into();
    match level {
        LogLevel::Debug => debug!(module, action, "{}", message),
        LogLevel::Info => info!(module, action, "{}", message),
        LogLevel::Warning => warn!(module, action, "{}", message),
        LogLevel::Error | LogLevel::Critical => error!(module, action, "{}", message),
    }

    let entry = LogEntry::new(module, action, level, message);
    let entry = match extra {
        Some(extra) => entry.with_extra(extra),
        None => entry,
    };
    ledger.record(&entry)
}
