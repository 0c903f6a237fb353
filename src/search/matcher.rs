//! # 文件名匹配
//!
//! 把请求的名称编译为匹配器。匹配方式与大小写策略都必须显式给出。
//!
//! ## 依赖关系
//! - 被 `search/engine.rs` 使用
//! - 使用 `glob` 编译通配模式

use crate::error::{Result, SgdiError};

use glob::{MatchOptions, Pattern};

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// 文件名完全相同
    Exact,
    /// 文件名以请求名称开头
    #[default]
    Prefix,
    /// 请求名称作为通配模式（`*`、`?`、`[...]`）
    Glob,
}

/// 大小写策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    pub fn is_sensitive(self) -> bool {
        self == CaseSensitivity::Sensitive
    }

    /// 按策略折叠字符串
    pub fn fold(self, s: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => s.to_string(),
            CaseSensitivity::Insensitive => s.to_lowercase(),
        }
    }
}

/// 已编译的单个名称匹配器
#[derive(Debug, Clone)]
pub struct NameMatcher {
    /// 请求的原始名称
    name: String,
    kind: MatcherKind,
    case: CaseSensitivity,
}

#[derive(Debug, Clone)]
enum MatcherKind {
    Exact(String),
    Prefix(String),
    Glob(Pattern),
}

impl NameMatcher {
    pub fn new(name: &str, mode: MatchMode, case: CaseSensitivity) -> Result<Self> {
        let kind = match mode {
            MatchMode::Exact => MatcherKind::Exact(case.fold(name)),
            MatchMode::Prefix => MatcherKind::Prefix(case.fold(name)),
            MatchMode::Glob => {
                MatcherKind::Glob(Pattern::new(name).map_err(|e| SgdiError::InvalidPattern {
                    pattern: name.to_string(),
                    reason: e.to_string(),
                })?)
            }
        };
        Ok(NameMatcher {
            name: name.to_string(),
            kind,
            case,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 文件名是否匹配
    pub fn matches(&self, file_name: &str) -> bool {
        match &self.kind {
            MatcherKind::Exact(want) => self.case.fold(file_name) == *want,
            MatcherKind::Prefix(want) => self.case.fold(file_name).starts_with(want.as_str()),
            MatcherKind::Glob(pattern) => pattern.matches_with(
                file_name,
                MatchOptions {
                    case_sensitive: self.case.is_sensitive(),
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_legacy_default() {
        let m = NameMatcher::new("12345", MatchMode::default(), CaseSensitivity::Sensitive).unwrap();
        assert!(m.matches("12345.pdf"));
        assert!(m.matches("12345_v2.pdf"));
        assert!(!m.matches("012345.pdf"));
    }

    #[test]
    fn test_exact_and_case() {
        let m = NameMatcher::new("Report.PDF", MatchMode::Exact, CaseSensitivity::Insensitive)
            .unwrap();
        assert!(m.matches("report.pdf"));
        assert!(!m.matches("report.pdf.bak"));

        let m = NameMatcher::new("Report.PDF", MatchMode::Exact, CaseSensitivity::Sensitive)
            .unwrap();
        assert!(!m.matches("report.pdf"));
    }

    #[test]
    fn test_glob() {
        let m = NameMatcher::new("INV-*.pdf", MatchMode::Glob, CaseSensitivity::Insensitive)
            .unwrap();
        assert!(m.matches("inv-001.PDF"));
        assert!(!m.matches("inv-001.txt"));
        assert!(NameMatcher::new("[", MatchMode::Glob, CaseSensitivity::Sensitive).is_err());
    }
}
