//! # 运行配置
//!
//! 汇总命令行与环境变量解析后的全局设置。`.env` 在解析参数前由 `dotenvy` 加载，
//! 因此 `SGDI_*` 变量既可来自环境也可来自 `.env` 文件。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `commands/` 使用
//! - 使用 `cli/mod.rs` 的全局参数

use crate::batch::{BatchRunner, CancelToken};
use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::ledger::Ledger;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 默认数据库路径
pub const DEFAULT_DATABASE: &str = "data/sgdi.db";

/// 默认单项超时（秒），网络共享上的复制与压缩都受它限制
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 300;

/// 加载当前目录（或上级目录）中的 `.env`，文件不存在时忽略
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// 全局设置
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub log_retention: usize,
    pub jobs: usize,
    pub item_timeout: Duration,
    pub probe_timeout: Option<Duration>,
    pub verbosity: u8,
    pub quiet: bool,
    pub cancel: CancelToken,
}

impl Settings {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Settings {
            database: args.database.clone(),
            log_retention: args.log_retention,
            jobs: args.jobs,
            item_timeout: Duration::from_secs(args.timeout),
            probe_timeout: Some(Duration::from_secs(args.probe_timeout.max(1))),
            verbosity: args.verbose,
            quiet: args.quiet,
            cancel: CancelToken::new(),
        }
    }

    /// 打开台账
    pub fn open_ledger(&self) -> Result<Arc<Ledger>> {
        debug!(database = %self.database.display(), "opening ledger");
        let ledger = Ledger::open(&self.database)?.with_log_retention(self.log_retention);
        Ok(Arc::new(ledger))
    }

    /// 按设置构造批量执行器，共享同一个取消令牌
    pub fn runner(&self, label: &str) -> BatchRunner {
        BatchRunner::new(self.jobs)
            .with_timeout(Some(self.item_timeout))
            .with_cancel(self.cancel.clone())
            .with_label(label)
            .quiet(self.quiet)
    }
}
