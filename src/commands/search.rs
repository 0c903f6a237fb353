//! # search 命令实现
//!
//! ## 功能
//! - 从文件和 `--name` 收集请求名称
//! - 调用搜索复制引擎并打印汇总
//!
//! ## 依赖关系
//! - 使用 `cli/search.rs` 定义的参数
//! - 使用 `search/`、`audit/manifest.rs`（读取名称列表）

use super::print_status;
use crate::audit::read_text;
use crate::cli::search::{LayoutArg, ModeArg, PolicyArg, SearchArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::search::{Layout, MatchMode, MatchPolicy, SearchConfig, SearchEngine};
use crate::utils::output;

/// 执行 search 命令
pub fn execute(args: SearchArgs, settings: &Settings) -> Result<()> {
    output::print_header("Batch Search and Copy");

    let mut names = args.name.clone();
    if let Some(path) = &args.names_file {
        names.extend(read_text(path, 0)?.into_iter().map(|e| e.name));
    }

    let mut config = SearchConfig::new(args.case.into());
    config.match_mode = match args.mode {
        ModeArg::Exact => MatchMode::Exact,
        ModeArg::Prefix => MatchMode::Prefix,
        ModeArg::Glob => MatchMode::Glob,
    };
    config.policy = match args.policy {
        PolicyArg::First => MatchPolicy::First,
        PolicyArg::All => MatchPolicy::All,
    };
    config.layout = match args.layout {
        LayoutArg::Flatten => Layout::Flatten,
        LayoutArg::Preserve => Layout::Preserve,
    };
    config.overwrite = args.overwrite;
    config.probe_timeout = settings.probe_timeout;
    config.report_path = args.report.clone();

    output::print_info(&format!(
        "Searching '{}' for {} name(s)...",
        args.source.display(),
        names.len()
    ));

    let ledger = settings.open_ledger()?;
    let engine = SearchEngine::new(ledger, config);
    let runner = settings.runner("Copying files");
    let outcome = engine.search_and_copy(&args.source, &args.destination, &names, &runner)?;

    for (name, count) in &outcome.duplicates {
        output::print_info(&format!("'{}' matched {} files", name, count));
    }
    for (item, reason) in &outcome.failures {
        output::print_error(&format!("{}: {}", item, reason));
    }
    if !outcome.not_found.is_empty() {
        output::print_warning(&format!("Not found ({}):", outcome.not_found.len()));
        for name in &outcome.not_found {
            output::print_skip(name);
        }
    }
    if outcome.unreadable > 0 {
        output::print_warning(&format!("{} entries could not be read", outcome.unreadable));
    }
    if outcome.not_attempted > 0 {
        output::print_warning(&format!("{} copies not attempted (cancelled)", outcome.not_attempted));
    }
    if let Some(path) = &outcome.report_path {
        output::print_success(&format!("Report saved to '{}'", path.display()));
    }
    if let Some(reason) = &outcome.report_error {
        output::print_warning(&format!("Report not written: {}", reason));
    }

    let r = &outcome.result;
    print_status(
        outcome.status,
        &format!(
            "Searched {}, found {}, copied {}, errors {} in {:.2}s",
            r.files_searched, r.files_found, r.files_copied, r.files_error, r.duration_seconds
        ),
    );
    Ok(())
}
