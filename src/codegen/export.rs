//! # 编码导出与查询
//!
//! 把已签发的编码写成 txt 或 csv，写入成功后在台账中标记为已导出。
//!
//! ## 依赖关系
//! - 使用 `csv` 写出带表头的文件
//! - 使用 `ledger/` 的 `mark_exported`、`find_code`、`find_by_meter_serial`

use crate::error::{Result, SgdiError};
use crate::ledger::{Ledger, Stored};
use crate::models::GeneratedCode;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// 每行一个编码
    Txt,
    /// `code,article` 表头的 CSV
    Csv,
}

impl ExportFormat {
    /// 按文件扩展名推断，未知扩展名返回 None
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unsupported export format '{}'", other)),
        }
    }
}

/// 导出编码并标记，返回标记的行数
pub fn export_codes(
    ledger: &Ledger,
    codes: &[GeneratedCode],
    path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SgdiError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }

    match format {
        ExportFormat::Txt => {
            let write_err = |e| SgdiError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            };
            let mut file = fs::File::create(path).map_err(write_err)?;
            for code in codes {
                writeln!(file, "{}", code.code).map_err(write_err)?;
            }
            file.flush().map_err(write_err)?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(["code", "article"])?;
            for code in codes {
                writer.write_record([code.code.as_str(), code.article_name.as_str()])?;
            }
            writer.flush().map_err(|e| SgdiError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            })?;
        }
    }

    let names: Vec<String> = codes.iter().map(|c| c.code.clone()).collect();
    let marked = ledger.mark_exported(&names, &path.display().to_string())?;
    info!(path = %path.display(), marked, "codes exported");
    Ok(marked)
}

/// 查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// 精确编码
    Code(String),
    /// 表号子串
    MeterSerial(String),
}

/// 按编码或表号查询
pub fn lookup(ledger: &Ledger, query: &Lookup) -> Result<Vec<Stored<GeneratedCode>>> {
    match query {
        Lookup::Code(code) => Ok(ledger
            .find_code(&code.trim().to_uppercase())?
            .into_iter()
            .collect()),
        Lookup::MeterSerial(fragment) => ledger.find_by_meter_serial(fragment.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CodeGenerator;
    use crate::models::ArticleMetadata;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn issue(n: usize) -> (Arc<Ledger>, Vec<GeneratedCode>) {
        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let generator = CodeGenerator::new(Arc::clone(&ledger));
        let codes = (0..n)
            .map(|i| {
                let mut meta = ArticleMetadata::new(format!("Medidor {}", i + 1));
                meta.meter_serial = Some(format!("SN-{:04}", i));
                generator.generate(&meta).unwrap()
            })
            .collect();
        (ledger, codes)
    }

    #[test]
    fn test_export_txt_marks_codes() {
        let (ledger, codes) = issue(3);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/codes.txt");

        let marked = export_codes(&ledger, &codes, &path, ExportFormat::Txt).unwrap();
        assert_eq!(marked, 3);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, codes.iter().map(|c| c.code.as_str()).collect::<Vec<_>>());

        let stored = ledger.find_code(&codes[0].code).unwrap().unwrap();
        assert!(stored.record.exported);
        assert_eq!(stored.record.export_path, Some(path.display().to_string()));
        assert!(ledger.unexported_codes(10).unwrap().is_empty());
    }

    #[test]
    fn test_export_csv_has_header() {
        let (ledger, codes) = issue(2);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("codes.csv");
        assert_eq!(ExportFormat::from_path(&path), Some(ExportFormat::Csv));

        export_codes(&ledger, &codes, &path, ExportFormat::Csv).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["code", "article"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "Medidor 2");
    }

    #[test]
    fn test_lookup() {
        let (ledger, codes) = issue(3);
        let found = lookup(&ledger, &Lookup::Code(codes[1].code.to_lowercase())).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.code, codes[1].code);

        let by_serial = lookup(&ledger, &Lookup::MeterSerial("SN-000".to_string())).unwrap();
        assert_eq!(by_serial.len(), 3);
        assert!(lookup(&ledger, &Lookup::Code("ZZZZ000000".to_string()))
            .unwrap()
            .is_empty());
    }
}
