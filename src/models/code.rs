//! # 唯一编码模型
//!
//! 已签发的编码在历史集合中全局唯一，永不删除。
//! 唯一允许的修改是导出后设置 `exported` / `export_path`。
//!
//! ## 依赖关系
//! - 被 `ledger/` 和 `codegen/` 使用

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 生成编码时附带的物品信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub article_name: String,
    pub meter_serial: Option<String>,
    pub service_type: Option<String>,
    pub notes: Option<String>,
}

impl ArticleMetadata {
    pub fn new(article_name: impl Into<String>) -> Self {
        ArticleMetadata {
            article_name: article_name.into(),
            ..Default::default()
        }
    }
}

/// 已签发的编码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub code: String,
    pub article_name: String,
    pub meter_serial: Option<String>,
    pub service_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub exported: bool,
    pub export_path: Option<String>,
    pub notes: Option<String>,
}

impl GeneratedCode {
    pub fn new(code: impl Into<String>, metadata: &ArticleMetadata) -> Self {
        GeneratedCode {
            code: code.into(),
            article_name: metadata.article_name.clone(),
            meter_serial: metadata.meter_serial.clone(),
            service_type: metadata.service_type.clone(),
            created_at: Utc::now(),
            exported: false,
            export_path: None,
            notes: metadata.notes.clone(),
        }
    }
}
