//! # 批次结果模型
//!
//! 审计、压缩、搜索三类批次的汇总结果。
//!
//! ## 依赖关系
//! - 被 `ledger/`、`audit/`、`compress/`、`search/` 使用
//! - 被 `commands/` 用于打印汇总

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 字节数转换为 MB
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// 目录审计结果
///
/// `missing_count = |expected − found|`，`extra_count = |found − expected|`。
/// `total_found` 与 `total_expected` 之间不存在其他约束。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub folder_path: String,
    pub total_expected: u64,
    pub total_found: u64,
    pub missing_count: u64,
    pub extra_count: u64,
    pub report_path: Option<String>,
    pub audit_type: String,
}

impl AuditResult {
    pub fn is_clean(&self) -> bool {
        self.missing_count == 0 && self.extra_count == 0
    }
}

/// PDF 批量压缩结果
///
/// 大小统计只覆盖成功处理的文件，跳过和失败的文件不计入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub folder_path: String,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_error: u64,
    pub original_size_mb: f64,
    pub compressed_size_mb: f64,
    pub space_saved_mb: f64,
    /// compressed / original，原始大小为 0 时为 None
    pub compression_ratio: Option<f64>,
    pub quality_level: u8,
    pub duration_seconds: f64,
}

impl CompressionResult {
    /// 由精确字节和构造结果
    pub fn from_bytes(
        folder_path: impl Into<String>,
        quality_level: u8,
        original_bytes: u64,
        compressed_bytes: u64,
    ) -> Self {
        let original_size_mb = bytes_to_mb(original_bytes);
        let compressed_size_mb = bytes_to_mb(compressed_bytes);
        let compression_ratio = if original_bytes == 0 {
            None
        } else {
            Some(compressed_bytes as f64 / original_bytes as f64)
        };

        CompressionResult {
            folder_path: folder_path.into(),
            files_processed: 0,
            files_skipped: 0,
            files_error: 0,
            original_size_mb,
            compressed_size_mb,
            space_saved_mb: original_size_mb - compressed_size_mb,
            compression_ratio,
            quality_level,
            duration_seconds: 0.0,
        }
    }
}

/// 搜索复制结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub source_path: String,
    pub destination_path: String,
    pub files_searched: u64,
    pub files_found: u64,
    pub files_copied: u64,
    pub files_error: u64,
    /// 请求的名称列表（JSON 数组）
    pub search_pattern: String,
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_ratio_from_bytes() {
        let result = CompressionResult::from_bytes("/pdfs", 70, 4 * 1024 * 1024, 1024 * 1024);
        assert!((result.original_size_mb - 4.0).abs() < 1e-9);
        assert!((result.compressed_size_mb - 1.0).abs() < 1e-9);
        assert!((result.space_saved_mb - 3.0).abs() < 1e-9);
        assert_eq!(result.compression_ratio, Some(0.25));
    }

    #[test]
    fn test_compression_ratio_empty() {
        let result = CompressionResult::from_bytes("/pdfs", 70, 0, 0);
        assert_eq!(result.compression_ratio, None);
        assert_eq!(result.space_saved_mb, 0.0);
    }
}
