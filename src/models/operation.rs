//! # 批次操作记录模型
//!
//! 每次批处理运行结束后写入台账的唯一一条汇总记录。
//!
//! ## 依赖关系
//! - 被 `ledger/`、`codegen/`、`search/`、`audit/`、`compress/` 使用

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Generate,
    Read,
    Rename,
    ProcessExcel,
    Search,
    Audit,
    Compress,
}

impl OperationType {
    pub const ALL: [OperationType; 7] = [
        OperationType::Generate,
        OperationType::Read,
        OperationType::Rename,
        OperationType::ProcessExcel,
        OperationType::Search,
        OperationType::Audit,
        OperationType::Compress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Generate => "generate",
            OperationType::Read => "read",
            OperationType::Rename => "rename",
            OperationType::ProcessExcel => "process_excel",
            OperationType::Search => "search",
            OperationType::Audit => "audit",
            OperationType::Compress => "compress",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown operation type '{}'", s))
    }
}

/// 操作状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Warning,
    Error,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Warning => "warning",
            OperationStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(OperationStatus::Success),
            "warning" => Ok(OperationStatus::Warning),
            "error" => Ok(OperationStatus::Error),
            other => Err(format!("unknown operation status '{}'", other)),
        }
    }
}

/// 按操作类型区分的附加信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OperationPayload {
    FilePath(String),
    Pattern(String),
    FolderPath(String),
}

impl OperationPayload {
    /// 存储列 (payload_kind, payload_value)
    pub fn to_columns(&self) -> (&'static str, &str) {
        match self {
            OperationPayload::FilePath(v) => ("file_path", v),
            OperationPayload::Pattern(v) => ("pattern", v),
            OperationPayload::FolderPath(v) => ("folder_path", v),
        }
    }

    pub fn from_columns(kind: &str, value: String) -> Option<Self> {
        match kind {
            "file_path" => Some(OperationPayload::FilePath(value)),
            "pattern" => Some(OperationPayload::Pattern(value)),
            "folder_path" => Some(OperationPayload::FolderPath(value)),
            _ => None,
        }
    }
}

/// 批次操作记录，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_type: OperationType,
    pub status: OperationStatus,
    pub items_processed: u64,
    pub duration_seconds: f64,
    pub error_message: Option<String>,
    pub payload: Option<OperationPayload>,
}

impl OperationRecord {
    pub fn new(operation_type: OperationType, status: OperationStatus) -> Self {
        OperationRecord {
            operation_type,
            status,
            items_processed: 0,
            duration_seconds: 0.0,
            error_message: None,
            payload: None,
        }
    }

    pub fn items(mut self, items_processed: u64) -> Self {
        self.items_processed = items_processed;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn payload(mut self, payload: OperationPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_parse() {
        for t in OperationType::ALL {
            assert_eq!(t.as_str().parse::<OperationType>().unwrap(), t);
        }
        assert!("unknown".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_payload_columns() {
        let payload = OperationPayload::FolderPath("/data/pdfs".to_string());
        let (kind, value) = payload.to_columns();
        assert_eq!(kind, "folder_path");
        assert_eq!(
            OperationPayload::from_columns(kind, value.to_string()),
            Some(payload.clone())
        );
        assert_eq!(OperationPayload::from_columns("nope", String::new()), None);
    }
}
