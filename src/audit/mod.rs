//! # 目录审计模块
//!
//! 对照期望清单检查目录，报告缺失与多余的文件。
//!
//! ## 功能
//! - 显式的比较键策略（文件名、主干名、正则编号，大小写）
//! - 文本与 CSV 清单
//! - 文本报告
//!
//! ## 依赖关系
//! - 被 `commands/audit.rs` 调用
//! - 使用 `batch/enumerator.rs`、`ledger/`

pub mod auditor;
pub mod key;
pub mod manifest;
pub mod report;

pub use auditor::Auditor;
pub use key::{KeySource, NameKey};
pub use manifest::{read_csv, read_text};
