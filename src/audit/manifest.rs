//! # 清单读取
//!
//! 期望文件清单的两种来源：纯文本和 CSV 列。
//!
//! ## 功能
//! - 文本：一行一个名称，跳过空行、`#` 注释和表头行
//! - 文本中以制表符或多个空格分隔的行取指定列
//! - CSV：按表头名称取列
//!
//! ## 依赖关系
//! - 被 `audit/auditor.rs` 和 `commands/audit.rs` 使用
//! - 使用 `csv` 读取 CSV

use crate::error::{Result, SgdiError};

use std::fs;
use std::path::Path;
use tracing::warn;

const HEADER_NAMES: [&str; 3] = ["name", "file", "archivo"];

/// 清单条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// 用于比较的名称
    pub name: String,
    /// 原始行，写入报告
    pub line: String,
}

/// 按制表符或连续两个以上空白切分字段
fn split_fields(line: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut fields = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next_ws = chars.get(i + 1).map_or(false, |(_, n)| n.is_whitespace());
        if c == '\t' || (c.is_whitespace() && next_ws) {
            fields.push(&line[start..pos]);
            while i < chars.len() && chars[i].1.is_whitespace() {
                i += 1;
            }
            start = chars.get(i).map_or(line.len(), |(p, _)| *p);
            continue;
        }
        i += 1;
    }
    fields.push(&line[start..]);
    fields
}

/// 解析文本清单，`column` 从 0 开始
pub fn parse_text(text: &str, column: usize) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();
    let mut first_data_line = true;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = split_fields(line)
            .into_iter()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();

        if first_data_line {
            first_data_line = false;
            let head = fields.first().map(|f| f.to_lowercase()).unwrap_or_default();
            if HEADER_NAMES.contains(&head.as_str()) {
                continue;
            }
        }

        let name = if fields.len() > 1 {
            match fields.get(column) {
                Some(field) => *field,
                None => {
                    warn!(line = lineno + 1, column, "manifest row has no such column");
                    continue;
                }
            }
        } else {
            line
        };

        entries.push(ManifestEntry {
            name: name.to_string(),
            line: line.to_string(),
        });
    }

    entries
}

/// 读取文本清单文件
pub fn read_text(path: &Path, column: usize) -> Result<Vec<ManifestEntry>> {
    let text = fs::read_to_string(path).map_err(|e| SgdiError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_text(&text, column))
}

/// 读取 CSV 清单中名为 `column` 的列
pub fn read_csv(path: &Path, column: &str) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let index = reader
        .headers()?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| {
            SgdiError::InvalidArgument(format!(
                "column '{}' not found in {}",
                column,
                path.display()
            ))
        })?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        match record.get(index) {
            Some(name) if !name.is_empty() => entries.push(ManifestEntry {
                name: name.to_string(),
                line: record.iter().collect::<Vec<_>>().join(", "),
            }),
            _ => {}
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_skips_noise() {
        let text = "name\n\n# comment\nA.pdf\n  B.pdf  \n";
        let names: Vec<String> = parse_text(text, 0).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A.pdf", "B.pdf"]);
    }

    #[test]
    fn test_text_columns() {
        let text = "OC-1\t12345\tCalle 1\nOC-2    67890    Calle 2\nsolo\n";
        let entries = parse_text(text, 1);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "12345");
        assert_eq!(entries[1].name, "67890");
        assert_eq!(entries[1].line, "OC-2    67890    Calle 2");
        // 单列行原样使用
        assert_eq!(entries[2].name, "solo");
    }

    #[test]
    fn test_csv_column() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.csv");
        fs::write(&path, "oc,Archivo\n1,a.pdf\n2,\n3,c.pdf\n").unwrap();

        let entries = read_csv(&path, "archivo").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "c.pdf"]);
        assert!(read_csv(&path, "missing").is_err());
    }
}
