//! # 批量处理模块
//!
//! 提供统一的文件枚举与批量执行能力。
//!
//! ## 功能
//! - 惰性枚举目录树，容忍单个节点读取失败和挂起的网络目录
//! - 有界并行处理
//! - 取消与单项超时
//! - 进度反馈与确定性统计
//!
//! ## 依赖关系
//! - 被各引擎模块使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod cancel;
pub mod enumerator;
pub mod runner;
pub mod timeout;

pub use cancel::CancelToken;
pub use enumerator::{probe_root, FileEntry, FileEnumerator};
pub use runner::{BatchItem, BatchResult, BatchRunner, ProcessResult};
