//! # codes 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/codes.rs`

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

/// codes 子命令参数
#[derive(Args, Debug)]
pub struct CodesArgs {
    #[command(subcommand)]
    pub command: CodesCommand,
}

#[derive(Subcommand, Debug)]
pub enum CodesCommand {
    /// Generate a batch of unique codes
    Generate(GenerateArgs),

    /// Export codes that have not been exported yet
    Export(ExportArgs),

    /// Look up a code or a meter serial
    Lookup(LookupArgs),

    /// Validate a code and report whether it was already issued
    Check(CheckArgs),
}

/// 编码格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum FormatKind {
    /// 4 uppercase letters followed by 6 digits
    #[default]
    Inacal,
    /// Fixed letter prefix padded with digits to 10 characters
    Prefixed,
    /// Custom alphabet and length
    Alphabet,
}

/// 导出文件格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportKind {
    Txt,
    Csv,
}

/// 查询方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum LookupBy {
    /// Exact code
    #[default]
    Code,
    /// Substring of the meter serial
    Serial,
}

/// generate 参数
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of codes to generate
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub count: u32,

    /// Article name prefix; codes are labelled "<prefix> <n>"
    #[arg(long, default_value = "Article")]
    pub article: String,

    /// Meter serial recorded with every code
    #[arg(long)]
    pub meter_serial: Option<String>,

    /// Service type recorded with every code
    #[arg(long)]
    pub service_type: Option<String>,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Code format
    #[arg(long, value_enum, default_value = "inacal")]
    pub format: FormatKind,

    /// Letter prefix for the 'prefixed' format (1-4 letters)
    #[arg(long, required_if_eq("format", "prefixed"))]
    pub prefix: Option<String>,

    /// Alphabet for the 'alphabet' format
    #[arg(long, required_if_eq("format", "alphabet"))]
    pub alphabet: Option<String>,

    /// Code length for the 'alphabet' format
    #[arg(long, default_value_t = 10)]
    pub length: usize,

    /// Redraws allowed after a collision
    #[arg(long, default_value_t = crate::codegen::DEFAULT_MAX_RETRIES)]
    pub retries: usize,

    /// Export the generated codes to this file (.txt or .csv)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// export 参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file
    pub output: PathBuf,

    /// File format (defaults to the output extension)
    #[arg(long, value_enum)]
    pub format: Option<ExportKind>,

    /// Maximum number of codes to export
    #[arg(long, default_value_t = 1000)]
    pub limit: usize,
}

/// lookup 参数
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Code or serial fragment
    pub query: String,

    /// What the query refers to
    #[arg(long, value_enum, default_value = "code")]
    pub by: LookupBy,
}

/// check 参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Code to check
    pub code: String,

    /// Validate against the 'prefixed' format with this prefix instead of the default
    #[arg(long)]
    pub prefix: Option<String>,
}
