//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config.rs`, 各引擎模块, `utils/`
//! - 子模块: audit, codes, compress, history, search

pub mod audit;
pub mod codes;
pub mod compress;
pub mod history;
pub mod search;

use crate::cli::{CaseArg, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::models::OperationStatus;
use crate::search::CaseSensitivity;
use crate::utils::output;

/// 执行命令
pub fn run(cmd: Commands, settings: &Settings) -> Result<()> {
    match cmd {
        Commands::Codes(args) => codes::execute(args, settings),
        Commands::Search(args) => search::execute(args, settings),
        Commands::Audit(args) => audit::execute(args, settings),
        Commands::Compress(args) => compress::execute(args, settings),
        Commands::Stats => history::stats(settings),
        Commands::Logs(args) => history::logs(args, settings),
        Commands::History(args) => history::execute(args, settings),
    }
}

impl From<CaseArg> for CaseSensitivity {
    fn from(arg: CaseArg) -> Self {
        match arg {
            CaseArg::Sensitive => CaseSensitivity::Sensitive,
            CaseArg::Insensitive => CaseSensitivity::Insensitive,
        }
    }
}

/// 按批次状态打印结束语
fn print_status(status: OperationStatus, msg: &str) {
    match status {
        OperationStatus::Success => output::print_done(msg),
        OperationStatus::Warning => output::print_warning(msg),
        OperationStatus::Error => output::print_error(msg),
    }
}
