//! # PDF 压缩例程
//!
//! 压缩例程对引擎是不透明的：给定路径和质量等级，返回压缩后的字节或失败原因。
//!
//! ## 依赖关系
//! - 被 `compress/compressor.rs` 使用
//! - 默认实现使用 `lopdf`

use crate::error::{Result, SgdiError};

use lopdf::Document;
use std::path::Path;

/// 外部压缩例程
pub trait PdfCompressor: Send + Sync + 'static {
    /// 压缩单个文件，返回新内容（不写回磁盘）
    fn compress(&self, path: &Path, quality: u8) -> Result<Vec<u8>>;
}

/// 基于 lopdf 的无损压缩：压缩流、清理无引用对象后重新序列化
///
/// 不重新编码图像，`quality` 只随结果一起记录。
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCompressor;

impl PdfCompressor for LopdfCompressor {
    fn compress(&self, path: &Path, _quality: u8) -> Result<Vec<u8>> {
        let pdf_err = |reason: String| SgdiError::PdfError {
            path: path.display().to_string(),
            reason,
        };

        let mut doc = Document::load(path).map_err(|e| pdf_err(format!("load: {}", e)))?;
        doc.prune_objects();
        doc.delete_zero_length_streams();
        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| pdf_err(format!("serialize: {}", e)))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_corrupt_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        match LopdfCompressor.compress(&path, 70) {
            Err(SgdiError::PdfError { reason, .. }) => assert!(reason.starts_with("load")),
            other => panic!("expected pdf error, got {:?}", other.map(|b| b.len())),
        }
    }
}
