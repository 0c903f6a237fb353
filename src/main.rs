//! # SGDI - 对账与批量文件操作引擎
//!
//! 把现场作业中零散的文件整理脚本统一成单一可执行文件，所有批次结果写入 SQLite 台账。
//!
//! ## 子命令
//! - `codes`    - 唯一编码
//!   - `generate` - 批量生成
//!   - `export`   - 导出未导出的编码
//!   - `lookup`   - 按编码或表号查询
//!   - `check`    - 校验编码并检查是否已发放
//! - `search`   - 按名称列表搜索并复制文件
//! - `audit`    - 对照清单审计目录
//! - `compress` - 批量压缩 PDF
//! - `stats` / `logs` / `history` - 台账查询
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── codegen/  (编码生成)
//!   │     ├── search/   (搜索复制)
//!   │     ├── audit/    (目录审计)
//!   │     └── compress/ (PDF 压缩)
//!   ├── batch/      (枚举、并行执行、取消与超时)
//!   ├── ledger/     (操作台账)
//!   ├── models/     (数据模型)
//!   ├── config.rs   (运行配置)
//!   ├── utils/      (输出、进度条、日志)
//!   └── error.rs    (错误处理)
//! ```

mod audit;
mod batch;
mod cli;
mod codegen;
mod commands;
mod compress;
mod config;
mod error;
mod ledger;
mod models;
mod search;
mod utils;

use clap::Parser;
use cli::Cli;
use config::Settings;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // .env 必须先于参数解析加载，clap 才能读到其中的 SGDI_* 变量
    let dotenv = config::load_dotenv();

    let cli = Cli::parse();
    let settings = Settings::from_args(&cli.global);

    if let Err(e) = utils::logging::init(settings.verbosity) {
        utils::output::print_warning(&format!("Logging disabled: {}", e));
    }
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let cancel = settings.cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        cancel.cancel();
        utils::output::print_warning("Interrupt received, finishing in-flight items...");
    }) {
        utils::output::print_warning(&format!("Cannot install Ctrl-C handler: {}", e));
    }

    if let Err(e) = commands::run(cli.command, &settings) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
