//! # 台账查询子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/history.rs`

use clap::{Args, ValueEnum};

/// 记录种类
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum HistoryKind {
    Operations,
    Codes,
    Searches,
    Audits,
    Compressions,
}

/// history 参数
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Which records to show
    #[arg(long, value_enum, default_value = "operations")]
    pub kind: HistoryKind,

    /// Number of records
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

/// logs 参数
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of entries (at most 100)
    #[arg(short = 'n', long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..=100))]
    pub limit: u64,

    /// Only show entries at or above this level
    #[arg(long)]
    pub level: Option<String>,
}
