//! # 操作台账模块
//!
//! 所有批次结果、已签发编码和系统日志的唯一持久化入口。
//!
//! ## 功能
//! - 追加写入，记录不可变（编码导出标记除外）
//! - 日志条目超过上限时在插入事务内淘汰最旧记录
//! - 编码唯一性由表级 UNIQUE 约束兜底
//!
//! ## 依赖关系
//! - 被各引擎模块和 `commands/` 使用
//! - 使用 `rusqlite` 进行存储
//! - 子模块: schema, record, store, journal

pub mod journal;
pub mod record;
pub mod schema;
pub mod store;

pub use journal::log_operation;
pub use record::{EntityKind, Record, Stored};
pub use store::{Ledger, Reservation, DEFAULT_LOG_RETENTION};
