//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `codes`: 唯一编码（嵌套子命令）
//!   - `generate`: 批量生成
//!   - `export`: 导出未导出的编码
//!   - `lookup`: 按编码或表号查询
//!   - `check`: 校验编码并检查是否已发放
//! - `search`: 批量搜索复制
//! - `audit`: 目录审计
//! - `compress`: PDF 批量压缩
//! - `stats` / `logs` / `history`: 台账查询
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `config.rs` 使用
//! - 子模块: audit, codes, compress, history, search

pub mod audit;
pub mod codes;
pub mod compress;
pub mod history;
pub mod search;

use crate::config::{DEFAULT_DATABASE, DEFAULT_ITEM_TIMEOUT_SECS};
use crate::ledger::DEFAULT_LOG_RETENTION;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// SGDI - 对账与批量操作引擎
#[derive(Parser, Debug)]
#[command(name = "sgdi")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Reconciliation and batch-operation engine for document workflows", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// 所有子命令共用的参数
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the SQLite ledger
    #[arg(long, global = true, env = "SGDI_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Maximum number of log entries kept in the ledger
    #[arg(long, global = true, env = "SGDI_LOG_RETENTION", default_value_t = DEFAULT_LOG_RETENTION)]
    pub log_retention: usize,

    /// Number of parallel workers (0 = number of CPUs)
    #[arg(short, long, global = true, env = "SGDI_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Per-item timeout in seconds, also bounds waits between directory entries
    #[arg(
        long,
        global = true,
        env = "SGDI_ITEM_TIMEOUT",
        default_value_t = DEFAULT_ITEM_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Seconds to wait for a root folder (e.g. a network share) to respond
    #[arg(long, global = true, default_value_t = 30)]
    pub probe_timeout: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
}

/// 大小写策略（搜索与审计必填）
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CaseArg {
    /// Names must match exactly, including case
    Sensitive,
    /// Letter case is ignored
    Insensitive,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, export and look up unique codes
    Codes(codes::CodesArgs),

    /// Search a directory tree for requested file names and copy the matches
    Search(search::SearchArgs),

    /// Compare a folder against an expected manifest
    Audit(audit::AuditArgs),

    /// Compress every PDF in a folder
    Compress(compress::CompressArgs),

    /// Show dashboard statistics
    Stats,

    /// Show recent ledger log entries
    Logs(history::LogsArgs),

    /// Show recent batch records
    History(history::HistoryArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_requires_case() {
        let missing = Cli::try_parse_from(["sgdi", "search", "/src", "/dst", "--name", "a"]);
        assert!(missing.is_err());

        let ok = Cli::try_parse_from([
            "sgdi", "search", "/src", "/dst", "--name", "a", "--case", "insensitive",
        ]);
        assert!(ok.is_ok());
    }
}
