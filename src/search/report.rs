//! # 搜索报告
//!
//! 未找到的名称和复制失败写成一份 CSV，台账中只记录路径。

use crate::error::{Result, SgdiError};

use std::fs;
use std::path::Path;

/// 写出 `kind,item,detail` 格式的报告
pub fn write_search_report(
    path: &Path,
    not_found: &[String],
    failures: &[(String, String)],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SgdiError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["kind", "item", "detail"])?;
    for name in not_found {
        writer.write_record(["not_found", name.as_str(), ""])?;
    }
    for (item, reason) in failures {
        writer.write_record(["failed", item.as_str(), reason.as_str()])?;
    }
    writer.flush().map_err(|e| SgdiError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
