//! # 统一错误处理模块
//!
//! 定义 SGDI 引擎的所有错误类型，使用 `thiserror` 派生。
//!
//! 错误分为四类：
//! - 单项错误：不在此处定义，以 `ProcessResult::Failed` 的形式计数并继续
//! - 批次连通性错误：根目录不可达，批次开始前中止
//! - 编码空间耗尽：单次生成请求失败，不影响其他请求
//! - 存储不可用：唯一允许越过批次边界向上传播的错误
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// SGDI 统一错误类型
#[derive(Error, Debug)]
pub enum SgdiError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 批次级错误
    // ─────────────────────────────────────────────────────────────
    #[error("Cannot reach '{path}': {reason}")]
    BatchConnectivity { path: String, reason: String },

    #[error("No free code found after {attempts} attempts")]
    ExhaustedKeyspace { attempts: usize },

    // ─────────────────────────────────────────────────────────────
    // 存储错误
    // ─────────────────────────────────────────────────────────────
    #[error("Ledger storage unavailable: {0}")]
    StorageUnavailable(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid code '{code}': {reason}")]
    InvalidCode { code: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // PDF 错误
    // ─────────────────────────────────────────────────────────────
    #[error("PDF error in {path}: {reason}")]
    PdfError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for SgdiError {
    fn from(e: rusqlite::Error) -> Self {
        SgdiError::StorageUnavailable(e.to_string())
    }
}

impl SgdiError {
    /// 是否为存储层错误（需要越过批次边界传播）
    pub fn is_storage(&self) -> bool {
        matches!(self, SgdiError::StorageUnavailable(_))
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, SgdiError>;
