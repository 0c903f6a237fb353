//! # PDF 批量压缩模块
//!
//! ## 功能
//! - 可替换的压缩例程（默认 lopdf）
//! - 跳过策略、原子替换、dry run
//! - 精确的体积统计
//!
//! ## 依赖关系
//! - 被 `commands/compress.rs` 调用
//! - 使用 `batch/`、`ledger/`

pub mod compressor;
pub mod pdf;

pub use compressor::{CompressConfig, FolderCompressor, SkipPolicy, DEFAULT_QUALITY};
pub use pdf::LopdfCompressor;
