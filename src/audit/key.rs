//! # 比较键
//!
//! 清单条目与文件名按同一规则归一化后再比较。
//!
//! ## 依赖关系
//! - 被 `audit/auditor.rs` 使用
//! - 使用 `regex` 提取编号

use crate::error::{Result, SgdiError};
use crate::search::CaseSensitivity;

use regex::Regex;
use std::path::Path;

/// 键的来源
#[derive(Debug, Clone)]
pub enum KeySource {
    /// 完整文件名
    Name,
    /// 去掉扩展名
    Stem,
    /// 正则第 1 个捕获组（无捕获组时取整个匹配）
    Regex { regex: Regex, digits_only: bool },
}

/// 比较策略
#[derive(Debug, Clone)]
pub struct NameKey {
    source: KeySource,
    case: CaseSensitivity,
}

impl NameKey {
    pub fn new(source: KeySource, case: CaseSensitivity) -> Self {
        NameKey { source, case }
    }

    /// 以正则构造，`digits_only` 时去掉捕获内容中的非数字字符
    pub fn regex(pattern: &str, digits_only: bool, case: CaseSensitivity) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| SgdiError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(NameKey::new(KeySource::Regex { regex, digits_only }, case))
    }

    /// 文件名对应的键；正则不匹配时返回 None
    pub fn for_file(&self, file_name: &str) -> Option<String> {
        let raw = match &self.source {
            KeySource::Name => file_name.trim().to_string(),
            KeySource::Stem => stem(file_name.trim()),
            KeySource::Regex { .. } => self.extract(file_name)?,
        };
        if raw.is_empty() {
            return None;
        }
        Some(self.case.fold(&raw))
    }

    /// 清单条目对应的键
    ///
    /// 与文件名走同一套规则；正则不匹配的条目原样保留。
    pub fn for_manifest(&self, entry: &str) -> String {
        let entry = entry.trim();
        let raw = match &self.source {
            KeySource::Name => entry.to_string(),
            KeySource::Stem => stem(entry),
            KeySource::Regex { .. } => self.extract(entry).unwrap_or_else(|| entry.to_string()),
        };
        self.case.fold(&raw)
    }

    fn extract(&self, text: &str) -> Option<String> {
        let KeySource::Regex { regex, digits_only } = &self.source else {
            return None;
        };
        let caps = regex.captures(text)?;
        let matched = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let key: String = if *digits_only {
            matched.chars().filter(|c| c.is_ascii_digit()).collect()
        } else {
            matched.to_string()
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_insensitive() {
        let key = NameKey::new(KeySource::Stem, CaseSensitivity::Insensitive);
        assert_eq!(key.for_file("Factura-01.PDF"), Some("factura-01".to_string()));
        assert_eq!(key.for_manifest("  FACTURA-01 "), "factura-01");
    }

    #[test]
    fn test_regex_digits_only() {
        let key = NameKey::regex(r"(\d[\d-]*)", true, CaseSensitivity::Sensitive).unwrap();
        assert_eq!(key.for_file("suministro 12-345.pdf"), Some("12345".to_string()));
        assert_eq!(key.for_file("readme.pdf"), None);
        assert_eq!(key.for_manifest("12-345"), "12345");
        // 不匹配的清单条目原样保留
        assert_eq!(key.for_manifest("sin numero"), "sin numero");
    }

    #[test]
    fn test_invalid_regex() {
        assert!(NameKey::regex("(", false, CaseSensitivity::Sensitive).is_err());
    }
}
