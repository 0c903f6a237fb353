//! # 批量执行器
//!
//! 在有界线程池中并行执行单项工作，并把每项的显式结果折叠为批次汇总。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代，线程数有上限
//! - 两项之间检查取消令牌，未开始的项记为未尝试
//! - 可选的单项超时，超时项记为失败后继续
//! - 结果按输入顺序收集，在全部工作结束后统一合并
//!
//! ## 依赖关系
//! - 被 `codegen/`、`search/`、`compress/` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use super::cancel::CancelToken;
use super::enumerator::FileEntry;
use super::timeout::run_with_timeout;
use crate::utils::progress;

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 单项处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult<T = ()> {
    /// 处理成功
    Success(T),
    /// 按策略跳过
    Skipped(String),
    /// 处理失败
    Failed(String, String), // (项目, 错误信息)
}

/// 可在批次中处理的项目
pub trait BatchItem: Clone + Send + Sync + 'static {
    /// 用于日志和失败明细的描述
    fn label(&self) -> String;
}

impl BatchItem for PathBuf {
    fn label(&self) -> String {
        self.display().to_string()
    }
}

impl BatchItem for usize {
    fn label(&self) -> String {
        format!("#{}", self)
    }
}

impl BatchItem for FileEntry {
    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

/// 批量处理结果统计
///
/// `combine` 满足结合律，计数部分满足交换律。
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<T> {
    /// 成功数量
    pub success: usize,
    /// 跳过数量
    pub skipped: usize,
    /// 失败数量
    pub failed: usize,
    /// 因取消而未尝试的数量
    pub not_attempted: usize,
    /// 失败详情
    pub failures: Vec<(String, String)>,
    /// 跳过原因
    pub skips: Vec<String>,
    /// 成功项的产出
    pub outputs: Vec<T>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        BatchResult {
            success: 0,
            skipped: 0,
            failed: 0,
            not_attempted: 0,
            failures: Vec::new(),
            skips: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// 合并单项结果
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(output) => {
                self.success += 1;
                self.outputs.push(output);
            }
            ProcessResult::Skipped(reason) => {
                self.skipped += 1;
                self.skips.push(reason);
            }
            ProcessResult::Failed(item, err) => {
                self.failed += 1;
                self.failures.push((item, err));
            }
        }
    }

    /// 合并两个部分结果
    pub fn combine(mut self, other: BatchResult<T>) -> BatchResult<T> {
        self.success += other.success;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.not_attempted += other.not_attempted;
        self.failures.extend(other.failures);
        self.skips.extend(other.skips);
        self.outputs.extend(other.outputs);
        self
    }

    /// 已尝试的数量
    pub fn attempted(&self) -> usize {
        self.success + self.skipped + self.failed
    }

    /// 总数量（含未尝试）
    pub fn total(&self) -> usize {
        self.attempted() + self.not_attempted
    }

    /// 是否因取消而提前结束
    pub fn was_cancelled(&self) -> bool {
        self.not_attempted > 0
    }
}

/// 批量执行器
#[derive(Debug, Clone)]
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    /// 单项超时
    timeout: Option<Duration>,
    /// 取消令牌
    cancel: CancelToken,
    /// 进度条标签
    label: String,
    /// 是否显示进度条
    show_progress: bool,
}

impl BatchRunner {
    /// 创建新的批量执行器（jobs = 0 时使用 CPU 核数）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            timeout: None,
            cancel: CancelToken::new(),
            label: "Processing".to_string(),
            show_progress: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_progress = !quiet;
        self
    }

    /// 单项超时，同样用于限制目录遍历
    pub fn item_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[cfg(test)]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// 并行处理项目列表
    pub fn run<I, T, F>(&self, items: Vec<I>, processor: F) -> BatchResult<T>
    where
        I: BatchItem,
        T: Send + 'static,
        F: Fn(&I) -> ProcessResult<T> + Send + Sync + 'static,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(items.len() as u64, &self.label)
        } else {
            ProgressBar::hidden()
        };

        let processor = Arc::new(processor);
        let work = |item: &I| -> Option<ProcessResult<T>> {
            if self.cancel.is_cancelled() {
                return None;
            }
            let result = self.process_one(item, &processor);
            if let ProcessResult::Failed(ref what, ref err) = result {
                pb.suspend(|| warn!(item = %what, error = %err, "item failed"));
            }
            pb.inc(1);
            Some(result)
        };

        // 结果按输入顺序收集，保证汇总与线程交错无关
        let results: Vec<Option<ProcessResult<T>>> =
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| items.par_iter().map(work).collect()),
                Err(e) => {
                    warn!(error = %e, "thread pool unavailable, running sequentially");
                    items.iter().map(work).collect()
                }
            };

        pb.finish_and_clear();

        // 汇总结果
        let mut batch_result = BatchResult::default();
        for result in results {
            match result {
                Some(r) => batch_result.merge(r),
                None => batch_result.not_attempted += 1,
            }
        }

        batch_result
    }

    fn process_one<I, T, F>(&self, item: &I, processor: &Arc<F>) -> ProcessResult<T>
    where
        I: BatchItem,
        T: Send + 'static,
        F: Fn(&I) -> ProcessResult<T> + Send + Sync + 'static,
    {
        match self.timeout {
            None => processor(item),
            Some(limit) => {
                let owned = item.clone();
                let processor = Arc::clone(processor);
                match run_with_timeout(limit, move || processor(&owned)) {
                    Ok(result) => result,
                    Err(timed_out) => ProcessResult::Failed(item.label(), timed_out.to_string()),
                }
            }
        }
    }
}
