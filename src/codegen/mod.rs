//! # 唯一编码生成模块
//!
//! 生成在整个历史集合中唯一的物品编码。
//!
//! ## 功能
//! - 多种编码格式与校验
//! - 基于台账唯一约束的预留，冲突有限次重试
//! - 批量生成、导出与查询
//!
//! ## 依赖关系
//! - 被 `commands/codes.rs` 调用
//! - 使用 `ledger/`、`batch/`

pub mod export;
pub mod format;
pub mod generator;

pub use export::{export_codes, lookup, ExportFormat, Lookup};
pub use format::CodeFormat;
pub use generator::{CodeGenerator, DEFAULT_MAX_RETRIES};
