//! # 编码生成器
//!
//! 抽取候选编码并在台账中预留，冲突时有限次重抽。
//!
//! ## 功能
//! - `generate`: 单个编码，仅返回已持久化的编码
//! - `generate_batch`: 通过批量执行器并行生成，写入一条操作记录和一条日志
//!
//! ## 依赖关系
//! - 使用 `ledger/` 的 `reserve_code`
//! - 使用 `batch/runner.rs` 并行执行

use super::format::CodeFormat;
use crate::batch::{BatchRunner, ProcessResult};
use crate::error::{Result, SgdiError};
use crate::ledger::{log_operation, Ledger, Reservation};
use crate::models::{
    ArticleMetadata, GeneratedCode, LogLevel, OperationRecord, OperationStatus, OperationType,
};

use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info};

/// 首次抽取之后的默认重试次数
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// 批量生成汇总
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    /// 已签发的编码，按请求顺序
    pub codes: Vec<GeneratedCode>,
    pub requested: usize,
    pub failed: usize,
    pub not_attempted: usize,
    pub failures: Vec<(String, String)>,
    pub status: OperationStatus,
    pub duration_seconds: f64,
}

/// 编码生成器
#[derive(Clone)]
pub struct CodeGenerator {
    ledger: Arc<Ledger>,
    format: CodeFormat,
    max_retries: usize,
}

impl CodeGenerator {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            format: CodeFormat::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_format(mut self, format: CodeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn format(&self) -> &CodeFormat {
        &self.format
    }

    /// 生成并预留一个编码
    pub fn generate(&self, metadata: &ArticleMetadata) -> Result<GeneratedCode> {
        let attempts = self.max_retries + 1;
        let mut rng = rand::thread_rng();

        for attempt in 1..=attempts {
            let candidate = self.format.draw(&mut rng);
            self.format.validate(&candidate)?;

            let code = GeneratedCode::new(candidate, metadata);
            match self.ledger.reserve_code(&code)? {
                Reservation::Reserved(id) => {
                    debug!(code = %code.code, id, attempt, "code reserved");
                    return Ok(code);
                }
                Reservation::Collision => continue,
            }
        }

        Err(SgdiError::ExhaustedKeyspace { attempts })
    }

    /// 批量生成 `count` 个编码，物品名为 `"{prefix} {n}"`
    pub fn generate_batch(
        &self,
        count: usize,
        article_prefix: &str,
        template: &ArticleMetadata,
        runner: &BatchRunner,
    ) -> Result<GenerationSummary> {
        let start = Instant::now();

        let generator = self.clone();
        let prefix = article_prefix.trim().to_string();
        let template = template.clone();
        let storage_error = Arc::new(OnceLock::new());
        let storage_seen = Arc::clone(&storage_error);
        let result = runner.run((1..=count).collect(), move |n: &usize| {
            let mut metadata = template.clone();
            metadata.article_name = format!("{} {}", prefix, n);
            match generator.generate(&metadata) {
                Ok(code) => ProcessResult::Success(code),
                Err(e) => {
                    if e.is_storage() {
                        let _ = storage_seen.set(e.to_string());
                    }
                    ProcessResult::Failed(metadata.article_name, e.to_string())
                }
            }
        });

        // 存储不可用不是单项错误，越过批次边界向上传播
        if let Some(reason) = storage_error.get() {
            return Err(SgdiError::StorageUnavailable(reason.clone()));
        }

        let issued = result.success;
        let status = if result.was_cancelled() {
            OperationStatus::Warning
        } else if issued == count {
            OperationStatus::Success
        } else if issued > 0 {
            OperationStatus::Warning
        } else {
            OperationStatus::Error
        };
        let duration_seconds = start.elapsed().as_secs_f64();

        let mut record = OperationRecord::new(OperationType::Generate, status)
            .items(issued as u64)
            .duration(duration_seconds);
        if let Some((_, reason)) = result.failures.first() {
            record = record.error(format!("{} of {} failed: {}", result.failed, count, reason));
        } else if result.was_cancelled() {
            record = record.error(format!("cancelled, {} not attempted", result.not_attempted));
        }
        self.ledger.record(&record)?;

        let level = match status {
            OperationStatus::Success => LogLevel::Info,
            OperationStatus::Warning => LogLevel::Warning,
            OperationStatus::Error => LogLevel::Error,
        };
        log_operation(
            &self.ledger,
            "code_generator",
            "generate_batch",
            level,
            format!("{} of {} codes generated", issued, count),
            Some(json!({
                "requested": count,
                "generated": issued,
                "failed": result.failed,
                "not_attempted": result.not_attempted,
                "article_prefix": article_prefix,
            })),
        )?;

        info!(issued, requested = count, %status, "batch generation finished");

        Ok(GenerationSummary {
            codes: result.outputs,
            requested: count,
            failed: result.failed,
            not_attempted: result.not_attempted,
            failures: result.failures,
            status,
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntityKind;
    use std::collections::HashSet;

    fn make_generator() -> CodeGenerator {
        CodeGenerator::new(Arc::new(Ledger::open_in_memory().unwrap()))
    }

    #[test]
    fn test_generate_is_persisted() {
        let generator = make_generator();
        let code = generator
            .generate(&ArticleMetadata::new("Medidor 1"))
            .unwrap();
        assert!(generator.ledger.code_exists(&code.code).unwrap());
        assert_eq!(
            generator.ledger.find_code(&code.code).unwrap().unwrap().record.article_name,
            "Medidor 1"
        );
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let generator = make_generator();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| {
                            generator
                                .generate(&ArticleMetadata::new(format!("T{} {}", t, i)))
                                .unwrap()
                                .code
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code), "duplicate code issued");
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[test]
    fn test_batch_extends_history() {
        let generator = make_generator();
        generator.generate(&ArticleMetadata::new("seed")).unwrap();
        let before = generator.ledger.count(EntityKind::GeneratedCode).unwrap();

        let runner = BatchRunner::new(4).quiet(true);
        let summary = generator
            .generate_batch(25, "Medidor", &ArticleMetadata::default(), &runner)
            .unwrap();

        assert_eq!(summary.status, OperationStatus::Success);
        assert_eq!(summary.codes.len(), 25);
        assert_eq!(summary.codes[0].article_name, "Medidor 1");
        assert_eq!(summary.codes[24].article_name, "Medidor 25");

        let after = generator.ledger.count(EntityKind::GeneratedCode).unwrap();
        assert_eq!(after, before + 25);
        for code in &summary.codes {
            assert!(generator.ledger.code_exists(&code.code).unwrap());
        }

        let ops = generator.ledger.query_recent::<OperationRecord>(10).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].record.operation_type, OperationType::Generate);
        assert_eq!(ops[0].record.items_processed, 25);
        assert_eq!(generator.ledger.count(EntityKind::Log).unwrap(), 1);
    }

    #[test]
    fn test_exhausted_keyspace() {
        let generator = make_generator()
            .with_format(CodeFormat::alphabet("A", 1).unwrap())
            .with_max_retries(3);

        assert_eq!(generator.generate(&ArticleMetadata::new("first")).unwrap().code, "A");
        match generator.generate(&ArticleMetadata::new("second")) {
            Err(SgdiError::ExhaustedKeyspace { attempts }) => assert_eq!(attempts, 4),
            other => panic!("expected exhausted keyspace, got {:?}", other),
        }
        assert_eq!(generator.ledger.count(EntityKind::GeneratedCode).unwrap(), 1);
    }

    #[test]
    fn test_batch_partial_exhaustion_is_warning() {
        let generator = make_generator().with_format(CodeFormat::alphabet("AB", 1).unwrap());
        let runner = BatchRunner::new(1).quiet(true);
        let summary = generator
            .generate_batch(3, "Item", &ArticleMetadata::default(), &runner)
            .unwrap();

        // 编码空间只有 2 个，第三个必然失败；前两个也可能因随机抽取耗尽重试
        assert!(summary.codes.len() <= 2);
        assert!(summary.failed >= 1);
        assert_ne!(summary.status, OperationStatus::Success);
        let ops = generator.ledger.query_recent::<OperationRecord>(1).unwrap();
        assert_eq!(ops[0].record.status, summary.status);
    }

    #[test]
    fn test_cancelled_batch_is_warning() {
        let generator = make_generator();
        let cancel = crate::batch::CancelToken::new();
        cancel.cancel();
        let runner = BatchRunner::new(2).quiet(true).with_cancel(cancel);

        let summary = generator
            .generate_batch(3, "Medidor", &ArticleMetadata::new(""), &runner)
            .unwrap();
        assert!(summary.codes.is_empty());
        assert_eq!(summary.not_attempted, 3);
        assert_eq!(summary.status, OperationStatus::Warning);

        let ops = generator.ledger.query_recent::<OperationRecord>(1).unwrap();
        assert_eq!(ops[0].record.status, OperationStatus::Warning);
        assert_eq!(ops[0].record.items_processed, 0);
        assert_eq!(generator.ledger.count(EntityKind::GeneratedCode).unwrap(), 0);
    }
}
