//! # PDF 批量压缩
//!
//! 遍历目录中的 PDF，逐个调用压缩例程，汇总体积统计。
//!
//! ## 功能
//! - 过小的文件在调用例程前跳过，节省不足的结果丢弃并保留原文件
//! - 成功的输出经临时文件 + 重命名原子替换原文件（`dry_run` 时不写回）
//! - 统计只计入成功文件，按整数字节累加后再换算 MB
//!
//! ## 依赖关系
//! - 被 `commands/compress.rs` 调用
//! - 使用 `batch/`、`ledger/`、`compress/pdf.rs`

use super::pdf::PdfCompressor;
use crate::batch::{probe_root, BatchRunner, FileEntry, FileEnumerator, ProcessResult};
use crate::error::Result;
use crate::ledger::{log_operation, Ledger};
use crate::models::{
    CompressionResult, LogLevel, OperationPayload, OperationRecord, OperationStatus,
    OperationType,
};

use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 默认质量等级
pub const DEFAULT_QUALITY: u8 = 70;

/// 跳过策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipPolicy {
    /// 小于此字节数的文件不压缩
    pub min_size_bytes: u64,
    /// 节省比例低于此值时保留原文件
    pub min_saving_ratio: f64,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        SkipPolicy {
            min_size_bytes: 10 * 1024,
            min_saving_ratio: 0.01,
        }
    }
}

/// 压缩配置
#[derive(Debug, Clone)]
pub struct CompressConfig {
    pub quality: u8,
    pub skip: SkipPolicy,
    pub dry_run: bool,
    pub recursive: bool,
    pub probe_timeout: Option<Duration>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        CompressConfig {
            quality: DEFAULT_QUALITY,
            skip: SkipPolicy::default(),
            dry_run: false,
            recursive: true,
            probe_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// 一次压缩的完整结果
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub result: CompressionResult,
    pub status: OperationStatus,
    pub failures: Vec<(String, String)>,
    pub skips: Vec<String>,
    pub not_attempted: usize,
}

/// 单个文件的体积变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shrunk {
    original: u64,
    compressed: u64,
}

/// 批量压缩器
pub struct FolderCompressor<C: PdfCompressor> {
    ledger: Arc<Ledger>,
    routine: Arc<C>,
    config: CompressConfig,
}

impl<C: PdfCompressor> FolderCompressor<C> {
    pub fn new(ledger: Arc<Ledger>, routine: C, config: CompressConfig) -> Self {
        Self {
            ledger,
            routine: Arc::new(routine),
            config,
        }
    }

    /// 压缩目录中的全部 PDF
    pub fn compress_folder(&self, folder: &Path, runner: &BatchRunner) -> Result<CompressOutcome> {
        let start = Instant::now();
        let folder_str = folder.display().to_string();

        if let Err(e) = probe_root(folder, self.config.probe_timeout) {
            let record = OperationRecord::new(OperationType::Compress, OperationStatus::Error)
                .duration(start.elapsed().as_secs_f64())
                .error(e.to_string())
                .payload(OperationPayload::FolderPath(folder_str));
            self.ledger.record(&record)?;
            return Err(e);
        }

        let enumerator = FileEnumerator::new(folder)
            .with_pattern("*.pdf")?
            .case_sensitive(false)
            .recursive(self.config.recursive)
            .with_timeout(runner.item_timeout());
        let mut walk = enumerator.enumerate();
        let mut files: Vec<FileEntry> = walk.files().collect();
        let unreadable = walk.unreadable_count();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        info!(folder = %folder.display(), files = files.len(), "compressing pdfs");

        let routine = Arc::clone(&self.routine);
        let config = self.config.clone();
        let batch = runner.run(files, move |entry: &FileEntry| {
            process_file(routine.as_ref(), entry, &config)
        });

        let original_bytes: u64 = batch.outputs.iter().map(|s| s.original).sum();
        let compressed_bytes: u64 = batch.outputs.iter().map(|s| s.compressed).sum();

        let mut result = CompressionResult::from_bytes(
            folder_str.clone(),
            self.config.quality,
            original_bytes,
            compressed_bytes,
        );
        result.files_processed = batch.success as u64;
        result.files_skipped = batch.skipped as u64;
        result.files_error = batch.failed as u64;
        result.duration_seconds = start.elapsed().as_secs_f64();

        let status = if batch.was_cancelled() {
            OperationStatus::Warning
        } else if batch.failed > 0 && batch.success == 0 && batch.skipped == 0 {
            OperationStatus::Error
        } else if batch.failed > 0 {
            OperationStatus::Warning
        } else {
            OperationStatus::Success
        };

        self.ledger.record(&result)?;
        let mut record = OperationRecord::new(OperationType::Compress, status)
            .items(batch.attempted() as u64)
            .duration(result.duration_seconds)
            .payload(OperationPayload::FolderPath(folder_str));
        if let Some((item, reason)) = batch.failures.first() {
            record = record.error(format!("{}: {}", item, reason));
        } else if batch.was_cancelled() {
            record = record.error(format!("cancelled, {} not attempted", batch.not_attempted));
        }
        self.ledger.record(&record)?;

        log_operation(
            &self.ledger,
            "pdf_compressor",
            "compress_folder",
            match status {
                OperationStatus::Success => LogLevel::Info,
                OperationStatus::Warning => LogLevel::Warning,
                OperationStatus::Error => LogLevel::Error,
            },
            format!(
                "compressed {} of {} pdfs, saved {:.2} MB",
                batch.success,
                batch.total(),
                result.space_saved_mb
            ),
            Some(json!({
                "processed": batch.success,
                "skipped": batch.skipped,
                "errors": batch.failed,
                "unreadable": unreadable,
                "saved_bytes": original_bytes - compressed_bytes,
                "dry_run": self.config.dry_run,
            })),
        )?;

        Ok(CompressOutcome {
            result,
            status,
            failures: batch.failures,
            skips: batch.skips,
            not_attempted: batch.not_attempted,
        })
    }
}

fn process_file<C: PdfCompressor>(
    routine: &C,
    entry: &FileEntry,
    config: &CompressConfig,
) -> ProcessResult<Shrunk> {
    let label = entry.path.display().to_string();
    let original = match fs::metadata(&entry.path) {
        Ok(meta) => meta.len(),
        Err(e) => return ProcessResult::Failed(label, e.to_string()),
    };

    if original < config.skip.min_size_bytes {
        return ProcessResult::Skipped(format!("{}: below {} bytes", label, config.skip.min_size_bytes));
    }

    let bytes = match routine.compress(&entry.path, config.quality) {
        Ok(bytes) => bytes,
        Err(e) => return ProcessResult::Failed(label, e.to_string()),
    };

    let compressed = bytes.len() as u64;
    let saving = original.saturating_sub(compressed) as f64 / original as f64;
    if compressed >= original || saving < config.skip.min_saving_ratio {
        debug!(file = %label, original, compressed, "insufficient saving, original kept");
        return ProcessResult::Skipped(format!("{}: insufficient saving", label));
    }

    if !config.dry_run {
        if let Err(e) = replace_atomically(&entry.path, &bytes) {
            return ProcessResult::Failed(label, e.to_string());
        }
    }

    ProcessResult::Success(Shrunk {
        original,
        compressed,
    })
}

/// 写入同目录临时文件后重命名覆盖原文件
fn replace_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp = temp_path(path);
    let written = fs::File::create(&temp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    match written.and_then(|_| fs::rename(&temp, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&temp);
            Err(e)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.sgdi-tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CancelToken;
    use crate::error::SgdiError;
    use crate::ledger::EntityKind;
    use crate::models::bytes_to_mb;
    use tempfile::TempDir;

    /// 把文件内容减半；以 "BAD" 开头的文件视为损坏
    struct HalvingCompressor;

    impl PdfCompressor for HalvingCompressor {
        fn compress(&self, path: &Path, _quality: u8) -> Result<Vec<u8>> {
            let data = fs::read(path).map_err(|e| SgdiError::FileReadError {
                path: path.display().to_string(),
                source: e,
            })?;
            if data.starts_with(b"BAD") {
                return Err(SgdiError::PdfError {
                    path: path.display().to_string(),
                    reason: "corrupt".to_string(),
                });
            }
            Ok(data[..data.len() / 2].to_vec())
        }
    }

    fn config(dry_run: bool) -> CompressConfig {
        CompressConfig {
            skip: SkipPolicy {
                min_size_bytes: 100,
                min_saving_ratio: 0.01,
            },
            dry_run,
            ..CompressConfig::default()
        }
    }

    fn runner() -> BatchRunner {
        BatchRunner::new(2).quiet(true)
    }

    #[test]
    fn test_one_corrupt_of_three() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.pdf"), vec![b'A'; 4000]).unwrap();
        fs::write(temp.path().join("b.PDF"), vec![b'B'; 2000]).unwrap();
        let mut bad = b"BAD".to_vec();
        bad.extend(vec![0u8; 5000]);
        fs::write(temp.path().join("c.pdf"), bad).unwrap();
        fs::write(temp.path().join("notes.txt"), vec![b'N'; 5000]).unwrap();

        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let compressor = FolderCompressor::new(Arc::clone(&ledger), HalvingCompressor, config(false));
        let outcome = compressor.compress_folder(temp.path(), &runner()).unwrap();

        assert_eq!(outcome.result.files_processed, 2);
        assert_eq!(outcome.result.files_error, 1);
        assert_eq!(outcome.result.files_skipped, 0);
        assert!((outcome.result.original_size_mb - bytes_to_mb(6000)).abs() < 1e-12);
        assert!((outcome.result.compressed_size_mb - bytes_to_mb(3000)).abs() < 1e-12);
        assert!((outcome.result.space_saved_mb - bytes_to_mb(3000)).abs() < 1e-12);
        assert_eq!(outcome.result.compression_ratio, Some(0.5));
        assert_eq!(outcome.status, OperationStatus::Warning);

        assert_eq!(fs::metadata(temp.path().join("a.pdf")).unwrap().len(), 2000);
        assert_eq!(fs::metadata(temp.path().join("c.pdf")).unwrap().len(), 5003);
        assert_eq!(ledger.count(EntityKind::Compression).unwrap(), 1);
        assert_eq!(ledger.count(EntityKind::Operation).unwrap(), 1);
    }

    #[test]
    fn test_small_files_skipped_and_dry_run() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("tiny.pdf"), vec![b'T'; 10]).unwrap();
        fs::write(temp.path().join("big.pdf"), vec![b'G'; 1000]).unwrap();

        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let outcome = FolderCompressor::new(ledger, HalvingCompressor, config(true))
            .compress_folder(temp.path(), &runner())
            .unwrap();

        assert_eq!(outcome.result.files_skipped, 1);
        assert_eq!(outcome.result.files_processed, 1);
        assert_eq!(outcome.status, OperationStatus::Success);
        // dry run 不写回
        assert_eq!(fs::metadata(temp.path().join("big.pdf")).unwrap().len(), 1000);
    }

    #[test]
    fn test_empty_folder_has_no_ratio() {
        let temp = TempDir::new().unwrap();
        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let outcome = FolderCompressor::new(ledger, HalvingCompressor, config(false))
            .compress_folder(temp.path(), &runner())
            .unwrap();
        assert_eq!(outcome.result.compression_ratio, None);
        assert_eq!(outcome.status, OperationStatus::Success);
    }

    /// 第一次调用即取消整个批次并失败
    struct CancellingCompressor(CancelToken);

    impl PdfCompressor for CancellingCompressor {
        fn compress(&self, path: &Path, _quality: u8) -> Result<Vec<u8>> {
            self.0.cancel();
            Err(SgdiError::PdfError {
                path: path.display().to_string(),
                reason: "interrupted".to_string(),
            })
        }
    }

    #[test]
    fn test_cancelled_batch_is_warning() {
        let temp = TempDir::new().unwrap();
        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            fs::write(temp.path().join(name), vec![b'P'; 500]).unwrap();
        }

        let cancel = CancelToken::new();
        let runner = BatchRunner::new(1).quiet(true).with_cancel(cancel.clone());
        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let outcome = FolderCompressor::new(
            Arc::clone(&ledger),
            CancellingCompressor(cancel),
            config(false),
        )
        .compress_folder(temp.path(), &runner)
        .unwrap();

        assert_eq!(outcome.result.files_error, 1);
        assert_eq!(outcome.not_attempted, 2);
        assert_eq!(outcome.status, OperationStatus::Warning);

        let ops = ledger.query_recent::<OperationRecord>(1).unwrap();
        assert_eq!(ops[0].record.status, OperationStatus::Warning);
        assert_eq!(ops[0].record.items_processed, 1);
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path(Path::new("/data/report.pdf"));
        assert_eq!(temp, PathBuf::from("/data/.report.pdf.sgdi-tmp"));
    }
}
