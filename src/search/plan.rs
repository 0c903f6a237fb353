//! # 复制计划
//!
//! 把每个请求名称的匹配结果展开为复制任务，并决定目标文件名。
//!
//! ## 依赖关系
//! - 被 `search/engine.rs` 使用

use super::matcher::NameMatcher;
use crate::batch::{BatchItem, FileEntry};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 多个匹配时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// 只取路径字典序最小的一个
    First,
    /// 全部复制
    #[default]
    All,
}

/// 目标目录布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// 全部放在目标根目录
    #[default]
    Flatten,
    /// 保留相对源根目录的路径
    Preserve,
}

/// 单个复制任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    /// 触发此任务的请求名称
    pub requested: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl BatchItem for CopyTask {
    fn label(&self) -> String {
        self.source.display().to_string()
    }
}

/// 复制计划
#[derive(Debug, Clone, Default)]
pub struct CopyPlan {
    pub tasks: Vec<CopyTask>,
    /// 计划阶段即发现目标重名的任务
    pub conflicts: Vec<CopyTask>,
    /// 没有任何匹配的名称
    pub not_found: Vec<String>,
    /// 匹配多于一个文件的名称及匹配数
    pub duplicates: Vec<(String, usize)>,
    /// 至少有一个匹配的名称数
    pub names_found: usize,
}

/// 生成复制计划
///
/// `matchers` 按名称排序传入，`files` 的顺序无关紧要。
pub fn build_plan(
    matchers: &[NameMatcher],
    files: &[FileEntry],
    source_root: &Path,
    dest_root: &Path,
    policy: MatchPolicy,
    layout: Layout,
) -> CopyPlan {
    let mut plan = CopyPlan::default();
    let mut planned: HashSet<PathBuf> = HashSet::new();

    for matcher in matchers {
        let mut matches: Vec<&FileEntry> = files
            .iter()
            .filter(|f| matcher.matches(&f.file_name()))
            .collect();
        // 遍历顺序不稳定，按路径排序后 `first` 才有确定含义
        matches.sort_by(|a, b| a.path.cmp(&b.path));

        if matches.is_empty() {
            plan.not_found.push(matcher.name().to_string());
            continue;
        }
        plan.names_found += 1;
        if matches.len() > 1 {
            plan.duplicates.push((matcher.name().to_string(), matches.len()));
        }
        if policy == MatchPolicy::First {
            matches.truncate(1);
        }

        for (n, entry) in matches.iter().enumerate() {
            let target = target_path(entry, n, source_root, dest_root, layout);
            let task = CopyTask {
                requested: matcher.name().to_string(),
                source: entry.path.clone(),
                target: target.clone(),
            };
            if planned.insert(target) {
                plan.tasks.push(task);
            } else {
                plan.conflicts.push(task);
            }
        }
    }

    plan
}

fn target_path(
    entry: &FileEntry,
    n: usize,
    source_root: &Path,
    dest_root: &Path,
    layout: Layout,
) -> PathBuf {
    match layout {
        Layout::Preserve => match entry.path.strip_prefix(source_root) {
            Ok(relative) => dest_root.join(relative),
            Err(_) => dest_root.join(entry.file_name()),
        },
        Layout::Flatten if n == 0 => dest_root.join(entry.file_name()),
        Layout::Flatten => {
            let stem = entry
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let ext = entry
                .path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            dest_root.join(format!("{}_copy{}{}", stem, n, ext))
        }
    }
}
