//! # 台账查询命令实现
//!
//! ## 功能
//! - `stats`: 仪表盘汇总
//! - `logs`: 最近日志
//! - `history`: 各类批次记录
//!
//! ## 依赖关系
//! - 使用 `cli/history.rs` 定义的参数
//! - 使用 `ledger/`

use crate::cli::history::{HistoryArgs, HistoryKind, LogsArgs};
use crate::config::Settings;
use crate::error::{Result, SgdiError};
use crate::ledger::{EntityKind, Ledger, Record, Stored};
use crate::models::{
    AuditResult, CompressionResult, GeneratedCode, LogLevel, OperationRecord, SearchResult,
};
use crate::utils::output;

use tabled::{Table, Tabled};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: u64,
    #[tabled(rename = "Duration (s)")]
    duration: String,
    #[tabled(rename = "Target")]
    target: String,
}

#[derive(Tabled)]
struct SearchRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Searched")]
    searched: u64,
    #[tabled(rename = "Found")]
    found: u64,
    #[tabled(rename = "Copied")]
    copied: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
}

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Folder")]
    folder: String,
    #[tabled(rename = "Type")]
    audit_type: String,
    #[tabled(rename = "Expected")]
    expected: u64,
    #[tabled(rename = "Found")]
    found: u64,
    #[tabled(rename = "Missing")]
    missing: u64,
    #[tabled(rename = "Extra")]
    extra: u64,
}

#[derive(Tabled)]
struct CompressionRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Folder")]
    folder: String,
    #[tabled(rename = "Done")]
    processed: u64,
    #[tabled(rename = "Skipped")]
    skipped: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "Saved (MB)")]
    saved: String,
}

#[derive(Tabled)]
struct CodeRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Article")]
    article: String,
    #[tabled(rename = "Exported")]
    exported: bool,
}

/// 执行 stats 命令
pub fn stats(settings: &Settings) -> Result<()> {
    output::print_header("Dashboard");
    let ledger = settings.open_ledger()?;
    let stats = ledger.dashboard_stats()?;

    let mut rows = vec![
        StatRow {
            metric: "Codes generated (total)".to_string(),
            value: stats.total_codes.to_string(),
        },
        StatRow {
            metric: "Operations today".to_string(),
            value: stats.operations_today.to_string(),
        },
        StatRow {
            metric: "Audits today".to_string(),
            value: stats.audits_today.to_string(),
        },
        StatRow {
            metric: "Searches today".to_string(),
            value: stats.searches_today.to_string(),
        },
        StatRow {
            metric: "Compressions today".to_string(),
            value: stats.compressions_today.to_string(),
        },
        StatRow {
            metric: "Space saved (MB, total)".to_string(),
            value: format!("{:.2}", stats.total_space_saved_mb),
        },
        StatRow {
            metric: "Log entries (retained)".to_string(),
            value: ledger.count(EntityKind::Log)?.to_string(),
        },
    ];
    for (kind, count) in &stats.operations_today_by_type {
        rows.push(StatRow {
            metric: format!("  today: {}", kind),
            value: count.to_string(),
        });
    }

    println!("{}", Table::new(&rows));
    Ok(())
}

/// 执行 logs 命令
pub fn logs(args: LogsArgs, settings: &Settings) -> Result<()> {
    let min_level = match &args.level {
        Some(level) => Some(level.parse::<LogLevel>().map_err(SgdiError::InvalidArgument)?),
        None => None,
    };

    let ledger = settings.open_ledger()?;
    let rows: Vec<LogRow> = ledger
        .recent_logs(args.limit as usize)?
        .into_iter()
        .filter(|s| min_level.map_or(true, |min| s.record.level >= min))
        .map(|s| LogRow {
            time: s.created_at.format(TIME_FORMAT).to_string(),
            level: s.record.level.to_string(),
            module: s.record.module,
            action: s.record.action,
            message: s.record.message,
        })
        .collect();

    if rows.is_empty() {
        output::print_info("No log entries.");
    } else {
        println!("{}", Table::new(&rows));
    }
    Ok(())
}

/// 执行 history 命令
pub fn execute(args: HistoryArgs, settings: &Settings) -> Result<()> {
    let ledger = settings.open_ledger()?;
    let shown = match args.kind {
        HistoryKind::Operations => show::<OperationRecord, _, _>(&ledger, args.limit, |s| {
            OperationRow {
                id: s.id,
                time: s.created_at.format(TIME_FORMAT).to_string(),
                kind: s.record.operation_type.to_string(),
                status: s.record.status.to_string(),
                items: s.record.items_processed,
                duration: format!("{:.2}", s.record.duration_seconds),
                target: s
                    .record
                    .payload
                    .as_ref()
                    .map(|p| p.to_columns().1.to_string())
                    .unwrap_or_default(),
            }
        })?,
        HistoryKind::Codes => show::<GeneratedCode, _, _>(&ledger, args.limit, |s| CodeRow {
            time: s.created_at.format(TIME_FORMAT).to_string(),
            code: s.record.code,
            article: s.record.article_name,
            exported: s.record.exported,
        })?,
        HistoryKind::Searches => show::<SearchResult, _, _>(&ledger, args.limit, |s| SearchRow {
            time: s.created_at.format(TIME_FORMAT).to_string(),
            source: s.record.source_path,
            searched: s.record.files_searched,
            found: s.record.files_found,
            copied: s.record.files_copied,
            errors: s.record.files_error,
        })?,
        HistoryKind::Audits => show::<AuditResult, _, _>(&ledger, args.limit, |s| AuditRow {
            time: s.created_at.format(TIME_FORMAT).to_string(),
            folder: s.record.folder_path,
            audit_type: s.record.audit_type,
            expected: s.record.total_expected,
            found: s.record.total_found,
            missing: s.record.missing_count,
            extra: s.record.extra_count,
        })?,
        HistoryKind::Compressions => {
            show::<CompressionResult, _, _>(&ledger, args.limit, |s| CompressionRow {
                time: s.created_at.format(TIME_FORMAT).to_string(),
                folder: s.record.folder_path,
                processed: s.record.files_processed,
                skipped: s.record.files_skipped,
                errors: s.record.files_error,
                saved: format!("{:.2}", s.record.space_saved_mb),
            })?
        }
    };

    if shown == 0 {
        output::print_info("No records yet.");
    }
    Ok(())
}

/// 查询最近记录并以表格打印，返回行数
fn show<T, R, F>(ledger: &Ledger, limit: usize, to_row: F) -> Result<usize>
where
    T: Record,
    R: Tabled,
    F: Fn(Stored<T>) -> R,
{
    let rows: Vec<R> = ledger
        .query_recent::<T>(limit)?
        .into_iter()
        .map(to_row)
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
    Ok(rows.len())
}
