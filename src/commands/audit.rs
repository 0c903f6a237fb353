//! # audit 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/audit.rs` 定义的参数
//! - 使用 `audit/`

use super::print_status;
use crate::audit::{read_csv, read_text, Auditor, KeySource, NameKey};
use crate::cli::audit::{AuditArgs, KeyArg, ManifestKind};
use crate::config::Settings;
use crate::error::Result;
use crate::search::CaseSensitivity;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct DiffRow {
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// 执行 audit 命令
pub fn execute(args: AuditArgs, settings: &Settings) -> Result<()> {
    output::print_header("Directory Audit");

    let kind = args.manifest_format.unwrap_or_else(|| {
        match args.manifest.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ManifestKind::Csv,
            _ => ManifestKind::Text,
        }
    });
    let manifest = match kind {
        ManifestKind::Text => read_text(&args.manifest, args.column)?,
        ManifestKind::Csv => read_csv(&args.manifest, &args.csv_column)?,
    };
    output::print_info(&format!("Manifest lists {} entries", manifest.len()));

    let case: CaseSensitivity = args.case.into();
    let key = match args.key {
        KeyArg::Name => NameKey::new(KeySource::Name, case),
        KeyArg::Stem => NameKey::new(KeySource::Stem, case),
        KeyArg::Regex => NameKey::regex(&args.regex, args.digits_only, case)?,
    };

    let ledger = settings.open_ledger()?;
    let auditor = Auditor::new(ledger, key)
        .with_pattern(args.pattern.clone())
        .recursive(!args.no_recursive)
        .with_probe_timeout(settings.probe_timeout)
        .with_walk_timeout(Some(settings.item_timeout));
    let outcome = auditor.audit(
        &args.folder,
        &manifest,
        &args.audit_type,
        args.report.as_deref(),
    )?;

    let rows: Vec<DiffRow> = outcome
        .missing
        .iter()
        .map(|m| DiffRow {
            status: "missing",
            key: m.key.clone(),
            detail: m.line.clone(),
        })
        .chain(outcome.extra.iter().map(|e| DiffRow {
            status: "extra",
            key: e.key.clone(),
            detail: e.file_name.clone(),
        }))
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
    if outcome.unkeyed > 0 {
        output::print_skip(&format!("{} files ignored (no key)", outcome.unkeyed));
    }
    if outcome.unreadable > 0 {
        output::print_warning(&format!("{} entries could not be read", outcome.unreadable));
    }
    if let Some(path) = &outcome.result.report_path {
        output::print_success(&format!("Report saved to '{}'", path));
    }
    if let Some(reason) = &outcome.report_error {
        output::print_warning(&format!("Report not written: {}", reason));
    }

    let r = &outcome.result;
    print_status(
        outcome.status,
        &format!(
            "Expected {}, found {}, missing {}, extra {}",
            r.total_expected, r.total_found, r.missing_count, r.extra_count
        ),
    );
    Ok(())
}
