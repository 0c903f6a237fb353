//! # 批量搜索复制模块
//!
//! 按名称列表在（可能很慢的网络）目录树中查找文件并复制到目标目录。
//!
//! ## 功能
//! - 精确、前缀、通配三种匹配方式，大小写策略显式给出
//! - `first` / `all` 多匹配策略，`flatten` / `preserve` 目标布局
//! - 单项失败计数后继续，结果写入台账
//!
//! ## 依赖关系
//! - 被 `commands/search.rs` 调用
//! - 使用 `batch/`、`ledger/`

pub mod engine;
pub mod matcher;
pub mod plan;
pub mod report;

pub use engine::{SearchConfig, SearchEngine};
pub use matcher::{CaseSensitivity, MatchMode};
pub use plan::{Layout, MatchPolicy};
