//! # 目录审计
//!
//! 比较期望清单与目录中实际存在的文件，计算缺失与多余集合。
//!
//! ## 功能
//! - 按 `NameKey` 归一化两侧名称
//! - 空清单时全部文件为多余，空目录时全部条目为缺失，二者都不是错误
//! - 写入 AuditResult 和一条操作记录，可选写出文本报告（写出失败只降级为警告）
//!
//! ## 依赖关系
//! - 被 `commands/audit.rs` 调用
//! - 使用 `batch/enumerator.rs`、`ledger/`

use super::key::NameKey;
use super::manifest::ManifestEntry;
use super::report;
use crate::batch::{probe_root, FileEnumerator};
use crate::error::Result;
use crate::ledger::{log_operation, Ledger};
use crate::models::{
    AuditResult, LogLevel, OperationPayload, OperationRecord, OperationStatus, OperationType,
};

use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 缺失项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingItem {
    pub key: String,
    /// 清单中的原始行
    pub line: String,
}

/// 多余项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraItem {
    pub key: String,
    /// 实际文件名（同键多个文件时取路径最小者）
    pub file_name: String,
}

/// 审计的完整结果
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub result: AuditResult,
    pub status: OperationStatus,
    pub missing: Vec<MissingItem>,
    pub extra: Vec<ExtraItem>,
    /// 无法提取键而被忽略的文件数
    pub unkeyed: usize,
    pub unreadable: usize,
    /// 报告写出失败的原因
    pub report_error: Option<String>,
}

/// 目录审计器
pub struct Auditor {
    ledger: Arc<Ledger>,
    key: NameKey,
    /// 文件过滤模式，例如 `*.pdf`
    pattern: Option<String>,
    recursive: bool,
    probe_timeout: Option<Duration>,
    walk_timeout: Option<Duration>,
}

impl Auditor {
    pub fn new(ledger: Arc<Ledger>, key: NameKey) -> Self {
        Self {
            ledger,
            key,
            pattern: None,
            recursive: true,
            probe_timeout: Some(Duration::from_secs(30)),
            walk_timeout: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Option<String>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// 遍历中两个条目之间允许的最长等待
    pub fn with_walk_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.walk_timeout = timeout;
        self
    }

    /// 执行审计
    pub fn audit(
        &self,
        folder: &Path,
        manifest: &[ManifestEntry],
        audit_type: &str,
        report_path: Option<&Path>,
    ) -> Result<AuditOutcome> {
        let start = Instant::now();
        let folder_str = folder.display().to_string();

        if let Err(e) = probe_root(folder, self.probe_timeout) {
            let record = OperationRecord::new(OperationType::Audit, OperationStatus::Error)
                .duration(start.elapsed().as_secs_f64())
                .error(e.to_string())
                .payload(OperationPayload::FolderPath(folder_str));
            self.ledger.record(&record)?;
            return Err(e);
        }

        // 期望集合：键 -> 第一条原始行
        let mut expected: BTreeMap<String, String> = BTreeMap::new();
        for entry in manifest {
            let key = self.key.for_manifest(&entry.name);
            if key.is_empty() {
                continue;
            }
            expected.entry(key).or_insert_with(|| entry.line.clone());
        }

        // 实际集合：键 -> 路径最小的文件
        let mut enumerator = FileEnumerator::new(folder)
            .recursive(self.recursive)
            .with_timeout(self.walk_timeout);
        if let Some(pattern) = &self.pattern {
            enumerator = enumerator.with_pattern(pattern)?.case_sensitive(false);
        }
        let mut walk = enumerator.enumerate();
        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut unkeyed = 0;
        for file in walk.files() {
            let name = file.file_name();
            match self.key.for_file(&name) {
                Some(key) => {
                    let slot = found.entry(key).or_insert_with(|| file.path.clone());
                    if file.path < *slot {
                        *slot = file.path;
                    }
                }
                None => {
                    debug!(file = %name, "no key extracted, ignored");
                    unkeyed += 1;
                }
            }
        }
        let unreadable = walk.unreadable_count();

        let expected_keys: BTreeSet<&String> = expected.keys().collect();
        let found_keys: BTreeSet<&String> = found.keys().collect();

        let missing: Vec<MissingItem> = expected_keys
            .difference(&found_keys)
            .map(|k| MissingItem {
                key: (*k).clone(),
                line: expected[*k].clone(),
            })
            .collect();
        let extra: Vec<ExtraItem> = found_keys
            .difference(&expected_keys)
            .map(|k| ExtraItem {
                key: (*k).clone(),
                file_name: found[*k]
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            })
            .collect();

        let mut report_error = None;
        let report_path = match report_path {
            Some(path) => match report::write_audit_report(
                path,
                &folder_str,
                expected.len(),
                found.len(),
                &missing,
                &extra,
            ) {
                Ok(()) => Some(path.display().to_string()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "audit report not written");
                    report_error = Some(e.to_string());
                    None
                }
            },
            None => None,
        };

        let result = AuditResult {
            folder_path: folder_str.clone(),
            total_expected: expected.len() as u64,
            total_found: found.len() as u64,
            missing_count: missing.len() as u64,
            extra_count: extra.len() as u64,
            report_path,
            audit_type: audit_type.to_string(),
        };
        let status = if result.is_clean() && report_error.is_none() {
            OperationStatus::Success
        } else {
            OperationStatus::Warning
        };

        self.ledger.record(&result)?;
        let mut record = OperationRecord::new(OperationType::Audit, status)
            .items(result.total_found)
            .duration(start.elapsed().as_secs_f64())
            .payload(OperationPayload::FolderPath(folder_str));
        if let Some(reason) = &report_error {
            record = record.error(format!("report not written: {}", reason));
        }
        self.ledger.record(&record)?;
        log_operation(
            &self.ledger,
            "file_auditor",
            "audit",
            match status {
                OperationStatus::Success => LogLevel::Info,
                _ => LogLevel::Warning,
            },
            format!(
                "audit finished: {} missing, {} extra",
                result.missing_count, result.extra_count
            ),
            Some(json!({
                "expected": result.total_expected,
                "found": result.total_found,
                "missing": result.missing_count,
                "extra": result.extra_count,
                "unkeyed": unkeyed,
                "unreadable": unreadable,
                "report_error": report_error,
            })),
        )?;
        info!(
            missing = result.missing_count,
            extra = result.extra_count,
            "audit finished"
        );

        Ok(AuditOutcome {
            result,
            status,
            missing,
            extra,
            unkeyed,
            unreadable,
            report_error,
        })
    }
}
