//! # search 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/search.rs`

use super::CaseArg;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 名称匹配方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    /// File name equals the requested name
    Exact,
    /// File name starts with the requested name
    Prefix,
    /// Requested name is a wildcard pattern
    Glob,
}

/// 多匹配策略
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PolicyArg {
    /// Copy only the match with the smallest path
    First,
    /// Copy every match
    All,
}

/// 目标布局
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LayoutArg {
    /// Put every copy directly in the destination
    Flatten,
    /// Keep the path relative to the source root
    Preserve,
}

/// search 子命令参数
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Root of the tree to search (local or network path)
    pub source: PathBuf,

    /// Destination folder (created if missing)
    pub destination: PathBuf,

    /// File with one requested name per line
    #[arg(long, required_unless_present = "name")]
    pub names_file: Option<PathBuf>,

    /// Requested name (repeatable)
    #[arg(long)]
    pub name: Vec<String>,

    /// Letter case handling
    #[arg(long, value_enum)]
    pub case: CaseArg,

    /// How requested names are matched
    #[arg(long, value_enum, default_value = "prefix")]
    pub mode: ModeArg,

    /// What to do when a name matches several files
    #[arg(long, value_enum, default_value = "all")]
    pub policy: PolicyArg,

    /// Destination layout
    #[arg(long, value_enum, default_value = "flatten")]
    pub layout: LayoutArg,

    /// Replace files that already exist in the destination
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Write a CSV of names not found and failed copies
    #[arg(long)]
    pub report: Option<PathBuf>,
}
