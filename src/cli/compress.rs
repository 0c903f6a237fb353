//! # compress 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/compress.rs`

use clap::Args;
use std::path::PathBuf;

/// compress 子命令参数
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Folder containing PDF files
    pub folder: PathBuf,

    /// Quality level recorded with the result (1-100)
    #[arg(long, default_value_t = crate::compress::DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Skip files smaller than this many KiB
    #[arg(long, default_value_t = 10)]
    pub min_size_kb: u64,

    /// Keep the original when the saving is below this fraction
    #[arg(long, default_value_t = 0.01)]
    pub min_saving: f64,

    /// Compute statistics without replacing any file
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Do not descend into subfolders
    #[arg(long, default_value_t = false)]
    pub no_recursive: bool,
}
