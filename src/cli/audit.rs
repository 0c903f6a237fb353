//! # audit 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/audit.rs`

use super::CaseArg;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 清单格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ManifestKind {
    /// One name per line, optional tab-separated columns
    Text,
    /// CSV with a header row
    Csv,
}

/// 比较键来源
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum KeyArg {
    /// Full file name
    Name,
    /// File name without extension
    Stem,
    /// First capture group of --regex
    Regex,
}

/// audit 子命令参数
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Folder to audit
    pub folder: PathBuf,

    /// Expected-file manifest
    pub manifest: PathBuf,

    /// Manifest format (defaults to csv for .csv files, text otherwise)
    #[arg(long, value_enum)]
    pub manifest_format: Option<ManifestKind>,

    /// Zero-based column used for multi-column text rows
    #[arg(long, default_value_t = 0)]
    pub column: usize,

    /// Header of the CSV column holding the names
    #[arg(long, default_value = "name")]
    pub csv_column: String,

    /// Letter case handling
    #[arg(long, value_enum)]
    pub case: CaseArg,

    /// How file names and manifest entries are turned into comparison keys
    #[arg(long, value_enum, default_value = "stem")]
    pub key: KeyArg,

    /// Regular expression for --key regex
    #[arg(long, default_value = r"(\d+)")]
    pub regex: String,

    /// Drop non-digit characters from the regex capture
    #[arg(long, default_value_t = false)]
    pub digits_only: bool,

    /// Only consider files matching these patterns (e.g. '*.pdf')
    #[arg(long)]
    pub pattern: Option<String>,

    /// Do not descend into subfolders
    #[arg(long, default_value_t = false)]
    pub no_recursive: bool,

    /// Label stored with the audit result
    #[arg(long, default_value = "general")]
    pub audit_type: String,

    /// Write a plain-text report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}
