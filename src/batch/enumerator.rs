//! # 文件枚举器
//!
//! 惰性遍历目录树（本地或网络共享），逐个产出文件条目。
//!
//! ## 功能
//! - 递归或单层遍历
//! - glob 模式过滤（`glob` crate，大小写可配置）
//! - 无法读取的节点以 `WalkItem::Unreadable` 穿插产出，不中断遍历
//! - 遍历在辅助线程中进行；设置超时后，超过时限没有进展的子树记为无法读取并结束遍历
//! - 单次遍历，不可重启；顺序由文件系统决定，不保证稳定
//!
//! ## 依赖关系
//! - 被 `search/`、`audit/`、`compress/` 调用
//! - 使用 `walkdir` 遍历目录

use super::timeout::{run_with_timeout, TimedOut};
use crate::error::{Result, SgdiError};

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// 遍历线程领先消费端的最大条目数
const WALK_BUFFER: usize = 256;

/// 文件条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// 文件名（非 UTF-8 名称做有损转换）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 遍历产出项
#[derive(Debug, Clone)]
pub enum WalkItem {
    /// 可读文件
    File(FileEntry),
    /// 无法读取的节点（权限不足、断开的链接、超时的子树等）
    Unreadable { path: PathBuf, reason: String },
}

/// 遍历线程发给消费端的消息
enum Walked {
    Item(WalkItem),
    /// 被过滤掉的条目，只表示遍历仍在推进
    Progress,
}

/// 文件枚举器
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    /// 根路径
    root: PathBuf,
    /// 匹配模式列表，为空时匹配全部文件
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
    /// 模式匹配是否区分大小写
    case_sensitive: bool,
    /// 两个条目之间允许的最长等待
    timeout: Option<Duration>,
}

impl FileEnumerator {
    /// 创建新的文件枚举器（默认递归、匹配全部文件、不限时）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: Vec::new(),
            recursive: true,
            case_sensitive: true,
            timeout: None,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|p| {
                Pattern::new(p).map_err(|e| SgdiError::InvalidPattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 设置模式匹配是否区分大小写
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// 设置遍历超时（`None` 时一直等待）
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 开始一次遍历
    pub fn enumerate(&self) -> Enumeration {
        let (tx, rx) = mpsc::sync_channel(WALK_BUFFER);
        let position = Arc::new(Mutex::new(self.root.clone()));

        let walker = self.clone();
        let shared = Arc::clone(&position);
        let spawned = thread::Builder::new()
            .name("sgdi-walk".to_string())
            .spawn(move || walker.walk(&tx, &shared));

        let mut enumeration = Enumeration::from_channel(rx, position, self.timeout);
        if let Err(e) = spawned {
            enumeration.pending = Some(WalkItem::Unreadable {
                path: self.root.clone(),
                reason: format!("cannot start walker: {}", e),
            });
        }
        enumeration
    }

    /// 在遍历线程中运行，消费端放弃后自行退出
    fn walk(&self, tx: &SyncSender<Walked>, position: &Mutex<PathBuf>) {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(&self.root).max_depth(max_depth) {
            let message = match entry {
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Walked::Item(WalkItem::Unreadable {
                        path,
                        reason: e.to_string(),
                    })
                }
                Ok(entry) if entry.file_type().is_dir() => {
                    let mut slot = position.lock().unwrap_or_else(|e| e.into_inner());
                    *slot = entry.path().to_path_buf();
                    Walked::Progress
                }
                Ok(entry) if entry.file_type().is_file() && self.matches_patterns(&entry) => {
                    Walked::Item(file_item(entry))
                }
                Ok(_) => Walked::Progress,
            };
            if tx.send(message).is_err() {
                return;
            }
        }
    }

    /// 检查文件名是否匹配任一模式
    fn matches_patterns(&self, entry: &DirEntry) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if let Cow::Owned(_) = name {
            debug!(path = %entry.path().display(), "non UTF-8 file name, matched lossily");
        }
        let options = MatchOptions {
            case_sensitive: self.case_sensitive,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&name, options))
    }
}

fn file_item(entry: DirEntry) -> WalkItem {
    match entry.metadata() {
        Ok(meta) => WalkItem::File(FileEntry {
            path: entry.into_path(),
            size_bytes: meta.len(),
            modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        }),
        Err(e) => WalkItem::Unreadable {
            path: entry.into_path(),
            reason: e.to_string(),
        },
    }
}

/// 一次进行中的遍历
pub struct Enumeration {
    rx: Receiver<Walked>,
    /// 遍历线程最近进入的目录
    position: Arc<Mutex<PathBuf>>,
    timeout: Option<Duration>,
    /// 在通道消息之前产出的项
    pending: Option<WalkItem>,
    unreadable: usize,
    stalled: bool,
}

impl Enumeration {
    fn from_channel(
        rx: Receiver<Walked>,
        position: Arc<Mutex<PathBuf>>,
        timeout: Option<Duration>,
    ) -> Self {
        Enumeration {
            rx,
            position,
            timeout,
            pending: None,
            unreadable: 0,
            stalled: false,
        }
    }

    /// 只产出可读文件，无法读取的节点记录警告后跳过
    pub fn files(&mut self) -> impl Iterator<Item = FileEntry> + '_ {
        self.by_ref().filter_map(|item| match item {
            WalkItem::File(entry) => Some(entry),
            WalkItem::Unreadable { path, reason } => {
                warn!(path = %path.display(), %reason, "skipping unreadable entry");
                None
            }
        })
    }

    /// 目前为止遇到的无法读取节点数
    pub fn unreadable_count(&self) -> usize {
        self.unreadable
    }

    fn receive(&self) -> std::result::Result<Walked, RecvTimeoutError> {
        match self.timeout {
            Some(limit) => self.rx.recv_timeout(limit),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        }
    }
}

impl Iterator for Enumeration {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        if let Some(item) = self.pending.take() {
            self.unreadable += 1;
            return Some(item);
        }
        if self.stalled {
            return None;
        }

        loop {
            match self.receive() {
                Ok(Walked::Progress) => continue,
                Ok(Walked::Item(item)) => {
                    if let WalkItem::Unreadable { .. } = item {
                        self.unreadable += 1;
                    }
                    return Some(item);
                }
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => {
                    // 遍历线程卡在网络调用中，无法恢复，剩余部分放弃
                    self.stalled = true;
                    self.unreadable += 1;
                    let path = self
                        .position
                        .lock()
                        .map(|p| p.clone())
                        .unwrap_or_else(|e| e.into_inner().clone());
                    let waited = self.timeout.unwrap_or_default();
                    return Some(WalkItem::Unreadable {
                        path,
                        reason: format!(
                            "no response within {:.1}s, rest of the walk abandoned",
                            waited.as_secs_f64()
                        ),
                    });
                }
            }
        }
    }
}

/// 检查根目录可达：存在、是目录、可列出内容
///
/// 网络共享可能挂起，因此在超时内完成，否则视为连通性错误。
pub fn probe_root(path: &Path, timeout: Option<Duration>) -> Result<()> {
    let owned = path.to_path_buf();
    let probe = move || -> std::result::Result<(), String> {
        let meta = fs::metadata(&owned).map_err(|e| e.to_string())?;
        if !meta.is_dir() {
            return Err("not a directory".to_string());
        }
        fs::read_dir(&owned).map(|_| ()).map_err(|e| e.to_string())
    };

    let outcome = match timeout {
        Some(limit) => run_with_timeout(limit, probe),
        None => Ok(probe()),
    };

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => Err(SgdiError::BatchConnectivity {
            path: path.display().to_string(),
            reason,
        }),
        Err(TimedOut(limit)) => Err(SgdiError::BatchConnectivity {
            path: path.display().to_string(),
            reason: format!("no response within {:?}", limit),
        }),
    }
}
