//! # 审计报告
//!
//! 纯文本报告：缺失项一节、多余项一节、末尾汇总。

use super::auditor::{ExtraItem, MissingItem};
use crate::error::{Result, SgdiError};

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const RULE_WIDTH: usize = 80;

/// 生成报告文本
pub fn render_audit_report(
    folder: &str,
    expected: usize,
    found: usize,
    missing: &[MissingItem],
    extra: &[ExtraItem],
) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "FILE AUDIT REPORT");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "Folder:   {}", folder);
    let _ = writeln!(out, "Expected: {}", expected);
    let _ = writeln!(out, "Found:    {}", found);
    let _ = writeln!(out, "{}", light);
    let _ = writeln!(out);

    if missing.is_empty() {
        let _ = writeln!(out, "Every expected file is present.");
    } else {
        let _ = writeln!(out, "MISSING ({})", missing.len());
        let _ = writeln!(out, "{:<25} | {}", "KEY", "MANIFEST ROW");
        let _ = writeln!(out, "{}", light);
        for item in missing {
            let _ = writeln!(out, "{:<25} | {}", item.key, item.line);
        }
    }
    let _ = writeln!(out);

    if extra.is_empty() {
        let _ = writeln!(out, "No unlisted files.");
    } else {
        let _ = writeln!(out, "EXTRA ({})", extra.len());
        let _ = writeln!(out, "{:<25} | {}", "KEY", "FILE NAME");
        let _ = writeln!(out, "{}", light);
        for item in extra {
            let _ = writeln!(out, "{:<25} | {}", item.key, item.file_name);
        }
    }

    if missing.is_empty() && extra.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(out, "AUDIT CLEAN");
        let _ = writeln!(out, "{}", heavy);
    }

    out
}

/// 写出报告文件
pub fn write_audit_report(
    path: &Path,
    folder: &str,
    expected: usize,
    found: usize,
    missing: &[MissingItem],
    extra: &[ExtraItem],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SgdiError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    let text = render_audit_report(folder, expected, found, missing, extra);
    fs::write(path, text).map_err(|e| SgdiError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let text = render_audit_report("/data", 2, 2, &[], &[]);
        assert!(text.contains("AUDIT CLEAN"));
        assert!(!text.contains("MISSING"));
    }
}
