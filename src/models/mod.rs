//! # 数据模型模块
//!
//! 定义台账中持久化的全部实体。
//!
//! ## 依赖关系
//! - 被 `ledger/`、各引擎模块和 `commands/` 使用
//! - 子模块: code, operation, results, log

pub mod code;
pub mod log;
pub mod operation;
pub mod results;

pub use code::{ArticleMetadata, GeneratedCode};
pub use log::{LogEntry, LogLevel};
pub use operation::{OperationPayload, OperationRecord, OperationStatus, OperationType};
pub use results::{bytes_to_mb, AuditResult, CompressionResult, SearchResult};
