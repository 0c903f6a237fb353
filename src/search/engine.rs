//! # 批量搜索复制引擎
//!
//! 在源目录树中查找请求的文件名，把匹配的文件复制到目标目录。
//!
//! ## 功能
//! - 开始前探测源目录可达、创建目标目录
//! - 单次遍历源目录，按名称生成复制计划
//! - 在批量执行器中并行复制，单项失败不影响其余项
//! - 写入一条 SearchResult 和一条操作记录，报告写出失败只降级为警告
//!
//! ## 依赖关系
//! - 被 `commands/search.rs` 调用
//! - 使用 `batch/`、`ledger/`、`search/plan.rs`

use super::matcher::{CaseSensitivity, MatchMode, NameMatcher};
use super::plan::{build_plan, CopyTask, Layout, MatchPolicy};
use super::report;
use crate::batch::{probe_root, BatchResult, BatchRunner, FileEnumerator, ProcessResult};
use crate::error::{Result, SgdiError};
use crate::ledger::{log_operation, Ledger};
use crate::models::{
    LogLevel, OperationPayload, OperationRecord, OperationStatus, OperationType, SearchResult,
};

use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 搜索复制配置
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub match_mode: MatchMode,
    pub case: CaseSensitivity,
    pub policy: MatchPolicy,
    pub layout: Layout,
    /// 目标已存在时是否覆盖
    pub overwrite: bool,
    /// 根目录探测超时
    pub probe_timeout: Option<Duration>,
    /// CSV 报告路径
    pub report_path: Option<PathBuf>,
}

impl SearchConfig {
    pub fn new(case: CaseSensitivity) -> Self {
        SearchConfig {
            match_mode: MatchMode::default(),
            case,
            policy: MatchPolicy::default(),
            layout: Layout::default(),
            overwrite: false,
            probe_timeout: Some(Duration::from_secs(30)),
            report_path: None,
        }
    }
}

/// 一次搜索复制的完整结果
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub status: OperationStatus,
    pub not_found: Vec<String>,
    pub duplicates: Vec<(String, usize)>,
    pub failures: Vec<(String, String)>,
    pub not_attempted: usize,
    pub unreadable: usize,
    pub report_path: Option<PathBuf>,
    /// 报告写出失败的原因
    pub report_error: Option<String>,
}

/// 搜索复制引擎
pub struct SearchEngine {
    ledger: Arc<Ledger>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(ledger: Arc<Ledger>, config: SearchConfig) -> Self {
        Self { ledger, config }
    }

    /// 搜索并复制
    pub fn search_and_copy(
        &self,
        source_root: &Path,
        dest_root: &Path,
        requested: &[String],
        runner: &BatchRunner,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();

        let names = dedup_names(requested, self.config.case);
        if names.is_empty() {
            return Err(SgdiError::InvalidArgument(
                "no file names to search for".to_string(),
            ));
        }
        let pattern = serde_json::to_string(&names)?;

        let matchers = names
            .iter()
            .map(|n| NameMatcher::new(n, self.config.match_mode, self.config.case))
            .collect::<Result<Vec<_>>>()?;

        if let Err(e) = self.prepare_roots(source_root, dest_root) {
            let record = OperationRecord::new(OperationType::Search, OperationStatus::Error)
                .duration(start.elapsed().as_secs_f64())
                .error(e.to_string())
                .payload(OperationPayload::Pattern(pattern));
            self.ledger.record(&record)?;
            return Err(e);
        }

        info!(source = %source_root.display(), names = names.len(), "enumerating source");
        let enumerator = FileEnumerator::new(source_root).with_timeout(runner.item_timeout());
        let mut walk = enumerator.enumerate();
        let files: Vec<_> = walk
            .files()
            .filter(|f| !f.path.starts_with(dest_root))
            .collect();
        let unreadable = walk.unreadable_count();

        let plan = build_plan(
            &matchers,
            &files,
            source_root,
            dest_root,
            self.config.policy,
            self.config.layout,
        );
        for (name, count) in &plan.duplicates {
            warn!(name = %name, count, "name matched more than one file");
        }

        let overwrite = self.config.overwrite;
        let copied = runner.run(plan.tasks.clone(), move |task: &CopyTask| {
            match copy_file(task, overwrite) {
                Ok(bytes) => ProcessResult::Success(bytes),
                Err(reason) => ProcessResult::Failed(task.source.display().to_string(), reason),
            }
        });

        // 计划阶段的重名冲突同样计为单项错误
        let mut conflicts = BatchResult::default();
        for task in &plan.conflicts {
            conflicts.merge(ProcessResult::Failed(
                task.source.display().to_string(),
                format!(
                    "name collision at {} (requested '{}')",
                    task.target.display(),
                    task.requested
                ),
            ));
        }
        let batch = copied.combine(conflicts);

        let mut status = if batch.was_cancelled() {
            OperationStatus::Warning
        } else if batch.attempted() > 0 && batch.success == 0 {
            OperationStatus::Error
        } else if plan.names_found == names.len() && batch.failed == 0 {
            OperationStatus::Success
        } else {
            OperationStatus::Warning
        };

        let result = SearchResult {
            source_path: source_root.display().to_string(),
            destination_path: dest_root.display().to_string(),
            files_searched: names.len() as u64,
            files_found: plan.names_found as u64,
            files_copied: batch.success as u64,
            files_error: batch.failed as u64,
            search_pattern: pattern.clone(),
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        // 报告失败不影响台账记录，只降级状态
        let mut report_path = None;
        let mut report_error = None;
        if let Some(path) = &self.config.report_path {
            match report::write_search_report(path, &plan.not_found, &batch.failures) {
                Ok(()) => report_path = Some(path.clone()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "search report not written");
                    report_error = Some(e.to_string());
                    if status == OperationStatus::Success {
                        status = OperationStatus::Warning;
                    }
                }
            }
        }

        self.ledger.record(&result)?;
        let mut record = OperationRecord::new(OperationType::Search, status)
            .items(batch.attempted() as u64)
            .duration(result.duration_seconds)
            .payload(OperationPayload::Pattern(pattern));
        if let Some((item, reason)) = batch.failures.first() {
            record = record.error(format!("{}: {}", item, reason));
        } else if batch.was_cancelled() {
            record = record.error(format!("cancelled, {} not attempted", batch.not_attempted));
        } else if let Some(reason) = &report_error {
            record = record.error(format!("report not written: {}", reason));
        }
        self.ledger.record(&record)?;

        log_operation(
            &self.ledger,
            "file_searcher",
            "search_and_copy",
            match status {
                OperationStatus::Success => LogLevel::Info,
                OperationStatus::Warning => LogLevel::Warning,
                OperationStatus::Error => LogLevel::Error,
            },
            format!(
                "copied {} of {} requested files",
                result.files_copied, result.files_searched
            ),
            Some(json!({
                "found": result.files_found,
                "copied": result.files_copied,
                "errors": result.files_error,
                "not_found": plan.not_found.len(),
                "unreadable": unreadable,
                "bytes_copied": batch.outputs.iter().sum::<u64>(),
                "report_error": report_error,
            })),
        )?;

        Ok(SearchOutcome {
            result,
            status,
            not_found: plan.not_found,
            duplicates: plan.duplicates,
            failures: batch.failures,
            not_attempted: batch.not_attempted,
            unreadable,
            report_path,
            report_error,
        })
    }

    fn prepare_roots(&self, source_root: &Path, dest_root: &Path) -> Result<()> {
        probe_root(source_root, self.config.probe_timeout)?;
        fs::create_dir_all(dest_root).map_err(|e| SgdiError::BatchConnectivity {
            path: dest_root.display().to_string(),
            reason: e.to_string(),
        })?;
        probe_root(dest_root, self.config.probe_timeout)
    }
}

/// 按大小写策略去重并排序，同一折叠键保留最先出现的写法
fn dedup_names(requested: &[String], case: CaseSensitivity) -> Vec<String> {
    let mut unique: BTreeMap<String, String> = BTreeMap::new();
    for name in requested.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        unique
            .entry(case.fold(name))
            .or_insert_with(|| name.to_string());
    }
    unique.into_values().collect()
}

/// 复制单个文件并保留修改时间，返回复制的字节数
fn copy_file(task: &CopyTask, overwrite: bool) -> std::result::Result<u64, String> {
    if let Some(parent) = task.target.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let bytes = if overwrite {
        fs::copy(&task.source, &task.target).map_err(|e| e.to_string())?
    } else {
        copy_new(task)?
    };

    if let Err(e) = preserve_modified(&task.source, &task.target) {
        warn!(file = %task.target.display(), error = %e, "modification time not preserved");
    }
    Ok(bytes)
}

fn preserve_modified(source: &Path, target: &Path) -> io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    fs::OpenOptions::new()
        .write(true)
        .open(target)?
        .set_modified(modified)
}

/// 只在目标不存在时写入
fn copy_new(task: &CopyTask) -> std::result::Result<u64, String> {
    let mut reader = fs::File::open(&task.source).map_err(|e| e.to_string())?;
    let mut writer = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&task.target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(format!("name collision at {}", task.target.display()));
        }
        Err(e) => return Err(e.to_string()),
    };

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            // 不留下半截文件
            let _ = fs::remove_file(&task.target);
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CancelToken;
    use crate::ledger::EntityKind;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf, Arc<Ledger>) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        fs::create_dir_all(source.join("nested")).unwrap();
        (temp, source, dest, Arc::new(Ledger::open_in_memory().unwrap()))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn runner() -> BatchRunner {
        BatchRunner::new(2).quiet(true)
    }

    #[test]
    fn test_partial_match_is_warning() {
        let (_temp, source, dest, ledger) = setup();
        fs::write(source.join("nested/x.pdf"), b"x").unwrap();

        let mut config = SearchConfig::new(CaseSensitivity::Sensitive);
        config.match_mode = MatchMode::Exact;
        let engine = SearchEngine::new(Arc::clone(&ledger), config);
        let outcome = engine
            .search_and_copy(&source, &dest, &names(&["x.pdf", "y.pdf"]), &runner())
            .unwrap();

        assert_eq!(outcome.result.files_searched, 2);
        assert_eq!(outcome.result.files_found, 1);
        assert_eq!(outcome.result.files_copied, 1);
        assert_eq!(outcome.result.files_error, 0);
        assert_eq!(outcome.status, OperationStatus::Warning);
        assert_eq!(outcome.not_found, vec!["y.pdf".to_string()]);
        assert_eq!(outcome.result.search_pattern, r#"["x.pdf","y.pdf"]"#);
        assert_eq!(fs::read(dest.join("x.pdf")).unwrap(), b"x");

        let ops = ledger.query_recent::<OperationRecord>(10).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].record.status, OperationStatus::Warning);
        assert_eq!(ledger.count(EntityKind::Search).unwrap(), 1);
    }

    #[test]
    fn test_all_matched_is_success() {
        let (_temp, source, dest, ledger) = setup();
        fs::write(source.join("A-001.pdf"), b"1").unwrap();
        fs::write(source.join("nested/a-002.pdf"), b"2").unwrap();

        let engine = SearchEngine::new(ledger, SearchConfig::new(CaseSensitivity::Insensitive));
        let outcome = engine
            .search_and_copy(&source, &dest, &names(&["a-001", "A-002", "a-001"]), &runner())
            .unwrap();

        assert_eq!(outcome.result.files_searched, 2);
        assert_eq!(outcome.result.files_copied, 2);
        assert_eq!(outcome.status, OperationStatus::Success);
        assert!(dest.join("a-002.pdf").exists());
    }

    #[test]
    fn test_existing_target_is_collision() {
        let (_temp, source, dest, ledger) = setup();
        fs::write(source.join("x.pdf"), b"new").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("x.pdf"), b"old").unwrap();

        let engine = SearchEngine::new(
            Arc::clone(&ledger),
            SearchConfig::new(CaseSensitivity::Sensitive),
        );
        let outcome = engine
            .search_and_copy(&source, &dest, &names(&["x"]), &runner())
            .unwrap();

        assert_eq!(outcome.result.files_copied, 0);
        assert_eq!(outcome.result.files_error, 1);
        assert_eq!(outcome.status, OperationStatus::Error);
        assert!(outcome.failures[0].1.contains("collision"));
        assert_eq!(fs::read(dest.join("x.pdf")).unwrap(), b"old");
        assert_eq!(ledger.count(EntityKind::Search).unwrap(), 1);
    }

    #[test]
    fn test_overwrite_replaces_target() {
        let (_temp, source, dest, ledger) = setup();
        fs::write(source.join("x.pdf"), b"new").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("x.pdf"), b"old").unwrap();

        let mut config = SearchConfig::new(CaseSensitivity::Sensitive);
        config.overwrite = true;
        let outcome = SearchEngine::new(ledger, config)
            .search_and_copy(&source, &dest, &names(&["x"]), &runner())
            .unwrap();

        assert_eq!(outcome.status, OperationStatus::Success);
        assert_eq!(fs::read(dest.join("x.pdf")).unwrap(), b"new");
    }

    #[test]
    fn test_unreachable_source_records_error() {
        let (temp, _source, dest, ledger) = setup();
        let engine = SearchEngine::new(
            Arc::clone(&ledger),
            SearchConfig::new(CaseSensitivity::Sensitive),
        );
        let err = engine
            .search_and_copy(&temp.path().join("missing"), &dest, &names(&["x"]), &runner())
            .unwrap_err();

        assert!(matches!(err, SgdiError::BatchConnectivity { .. }));
        let ops = ledger.query_recent::<OperationRecord>(1).unwrap();
        assert_eq!(ops[0].record.status, OperationStatus::Error);
        assert_eq!(ledger.count(EntityKind::Search).unwrap(), 0);
    }

    #[test]
    fn test_report_written() {
        let (temp, source, dest, ledger) = setup();
        fs::write(source.join("x.pdf"), b"x").unwrap();

        let mut config = SearchConfig::new(CaseSensitivity::Sensitive);
        config.report_path = Some(temp.path().join("report.csv"));
        let outcome = SearchEngine::new(ledger, config)
            .search_and_copy(&source, &dest, &names(&["x", "missing"]), &runner())
            .unwrap();

        let report = fs::read_to_string(outcome.report_path.unwrap()).unwrap();
        assert!(report.starts_with("kind,item,detail"));
        assert!(report.contains("not_found,missing,"));
    }

    #[test]
    fn test_unwritable_report_still_records() {
        let (temp, source, dest, ledger) = setup();
        fs::write(source.join("x.pdf"), b"x").unwrap();

        // 报告路径是已存在的目录，无法写成文件
        let mut config = SearchConfig::new(CaseSensitivity::Sensitive);
        config.report_path = Some(temp.path().to_path_buf());
        let outcome = SearchEngine::new(Arc::clone(&ledger), config)
            .search_and_copy(&source, &dest, &names(&["x"]), &runner())
            .unwrap();

        assert!(dest.join("x.pdf").exists());
        assert_eq!(outcome.result.files_copied, 1);
        assert_eq!(outcome.status, OperationStatus::Warning);
        assert!(outcome.report_path.is_none());
        assert!(outcome.report_error.is_some());

        assert_eq!(ledger.count(EntityKind::Search).unwrap(), 1);
        let ops = ledger.query_recent::<OperationRecord>(10).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].record.status, OperationStatus::Warning);
        assert!(ops[0]
            .record
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("report not written"));
    }

    #[test]
    fn test_cancelled_run_is_warning() {
        let (_temp, source, dest, ledger) = setup();
        // "ab" 与 "abc" 选中同一文件，第二个任务在计划阶段即失败
        fs::write(source.join("abc.pdf"), b"x").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let runner = BatchRunner::new(1).quiet(true).with_cancel(cancel);
        let outcome = SearchEngine::new(
            Arc::clone(&ledger),
            SearchConfig::new(CaseSensitivity::Sensitive),
        )
        .search_and_copy(&source, &dest, &names(&["ab", "abc"]), &runner)
        .unwrap();

        assert_eq!(outcome.not_attempted, 1);
        assert_eq!(outcome.result.files_copied, 0);
        assert_eq!(outcome.result.files_error, 1);
        assert_eq!(outcome.status, OperationStatus::Warning);
        assert!(!dest.join("abc.pdf").exists());

        let ops = ledger.query_recent::<OperationRecord>(1).unwrap();
        assert_eq!(ops[0].record.status, OperationStatus::Warning);
        assert_eq!(ops[0].record.items_processed, 1);
    }

    #[test]
    fn test_names_dedup_follows_case_policy() {
        let (_temp, source, dest, ledger) = setup();
        fs::write(source.join("x.pdf"), b"x").unwrap();

        let mut config = SearchConfig::new(CaseSensitivity::Insensitive);
        config.match_mode = MatchMode::Exact;
        let outcome = SearchEngine::new(ledger, config)
            .search_and_copy(&source, &dest, &names(&["x.pdf", "X.PDF"]), &runner())
            .unwrap();

        assert_eq!(outcome.result.files_searched, 1);
        assert_eq!(outcome.result.files_found, 1);
        assert_eq!(outcome.result.files_copied, 1);
        assert_eq!(outcome.result.files_error, 0);
        assert_eq!(outcome.status, OperationStatus::Success);
        assert_eq!(outcome.result.search_pattern, r#"["x.pdf"]"#);

        assert_eq!(
            dedup_names(&names(&["x.pdf", "X.PDF", " "]), CaseSensitivity::Sensitive),
            names(&["X.PDF", "x.pdf"])
        );
    }

    #[test]
    fn test_copy_keeps_modification_time() {
        let (_temp, source, dest, ledger) = setup();
        let original = source.join("nested/old.pdf");
        fs::write(&original, b"old").unwrap();
        let stamp = UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&original)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        SearchEngine::new(ledger, SearchConfig::new(CaseSensitivity::Sensitive))
            .search_and_copy(&source, &dest, &names(&["old"]), &runner())
            .unwrap();

        let copied: SystemTime = fs::metadata(dest.join("old.pdf")).unwrap().modified().unwrap();
        assert_eq!(copied, stamp);
    }
}
