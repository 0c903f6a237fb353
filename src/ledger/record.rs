//! # 实体持久化映射
//!
//! `Record` trait 把每种实体映射到对应的表：插入语句、查询列和行解码。
//!
//! ## 依赖关系
//! - 被 `ledger/store.rs` 使用
//! - 使用 `models/`

use crate::models::{
    AuditResult, CompressionResult, GeneratedCode, LogEntry, OperationPayload, OperationRecord,
    SearchResult,
};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row, Transaction};

/// 实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    GeneratedCode,
    Operation,
    Audit,
    Compression,
    Search,
    Log,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::GeneratedCode => "generated_codes",
            EntityKind::Operation => "operations",
            EntityKind::Audit => "file_audits",
            EntityKind::Compression => "pdf_compressions",
            EntityKind::Search => "file_searches",
            EntityKind::Log => "system_logs",
        }
    }
}

/// 带存储元数据的实体
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub record: T,
}

/// 保留策略参数（插入后在同一事务内执行）
#[derive(Debug, Clone, Copy)]
pub struct Retention {
    pub max_log_entries: usize,
}

/// 可写入台账的实体
pub trait Record: Sized {
    const KIND: EntityKind;

    /// 查询列：第 0 列为 id，第 1 列为 created_at，其余由 `from_row` 解码
    const COLUMNS: &'static str;

    /// 在事务内插入，返回行 id
    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64>;

    /// 从查询行解码（列顺序同 `COLUMNS`）
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// 插入后钩子，默认无操作
    fn after_insert(_tx: &Transaction<'_>, _retention: Retention) -> rusqlite::Result<()> {
        Ok(())
    }

    /// 记录自带的创建时间（若有）
    fn own_timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// 统一的时间戳格式：UTC，毫秒精度
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析存储的时间戳列
pub fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_enum<T: std::str::FromStr<Err = String>>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

fn get_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(idx)?.max(0) as u64)
}

// ─────────────────────────────────────────────────────────────
// GeneratedCode
// ─────────────────────────────────────────────────────────────

impl Record for GeneratedCode {
    const KIND: EntityKind = EntityKind::GeneratedCode;
    const COLUMNS: &'static str = "id, created_at, code, article_name, meter_serial, \
         service_type, exported, export_path, notes";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO generated_codes
                (code, article_name, meter_serial, service_type, created_at, exported, export_path, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.code,
                self.article_name,
                self.meter_serial,
                self.service_type,
                created_at,
                self.exported,
                self.export_path,
                self.notes
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(GeneratedCode {
            created_at: parse_timestamp(row, 1)?,
            code: row.get(2)?,
            article_name: row.get(3)?,
            meter_serial: row.get(4)?,
            service_type: row.get(5)?,
            exported: row.get(6)?,
            export_path: row.get(7)?,
            notes: row.get(8)?,
        })
    }

    fn own_timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

// ─────────────────────────────────────────────────────────────
// OperationRecord
// ─────────────────────────────────────────────────────────────

impl Record for OperationRecord {
    const KIND: EntityKind = EntityKind::Operation;
    const COLUMNS: &'static str = "id, created_at, operation_type, status, items_processed, \
         duration_seconds, error_message, payload_kind, payload_value";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        let (kind, value) = match &self.payload {
            Some(p) => {
                let (k, v) = p.to_columns();
                (Some(k), Some(v))
            }
            None => (None, None),
        };
        tx.execute(
            "INSERT INTO operations
                (operation_type, status, items_processed, duration_seconds, error_message,
                 payload_kind, payload_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.operation_type.as_str(),
                self.status.as_str(),
                self.items_processed as i64,
                self.duration_seconds,
                self.error_message,
                kind,
                value,
                created_at
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: Option<String> = row.get(7)?;
        let value: Option<String> = row.get(8)?;
        let payload = match (kind, value) {
            (Some(k), Some(v)) => OperationPayload::from_columns(&k, v),
            _ => None,
        };
        Ok(OperationRecord {
            operation_type: parse_enum(row, 2)?,
            status: parse_enum(row, 3)?,
            items_processed: get_u64(row, 4)?,
            duration_seconds: row.get(5)?,
            error_message: row.get(6)?,
            payload,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// AuditResult
// ─────────────────────────────────────────────────────────────

impl Record for AuditResult {
    const KIND: EntityKind = EntityKind::Audit;
    const COLUMNS: &'static str = "id, created_at, folder_path, total_expected, total_found, \
         missing_count, extra_count, report_path, audit_type";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO file_audits
                (folder_path, total_expected, total_found, missing_count, extra_count,
                 report_path, audit_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.folder_path,
                self.total_expected as i64,
                self.total_found as i64,
                self.missing_count as i64,
                self.extra_count as i64,
                self.report_path,
                self.audit_type,
                created_at
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AuditResult {
            folder_path: row.get(2)?,
            total_expected: get_u64(row, 3)?,
            total_found: get_u64(row, 4)?,
            missing_count: get_u64(row, 5)?,
            extra_count: get_u64(row, 6)?,
            report_path: row.get(7)?,
            audit_type: row.get(8)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// CompressionResult
// ─────────────────────────────────────────────────────────────

impl Record for CompressionResult {
    const KIND: EntityKind = EntityKind::Compression;
    const COLUMNS: &'static str = "id, created_at, folder_path, files_processed, files_skipped, \
         files_error, original_size_mb, compressed_size_mb, space_saved_mb, compression_ratio, \
         quality_level, duration_seconds";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO pdf_compressions
                (folder_path, files_processed, files_skipped, files_error, original_size_mb,
                 compressed_size_mb, space_saved_mb, compression_ratio, quality_level,
                 duration_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.folder_path,
                self.files_processed as i64,
                self.files_skipped as i64,
                self.files_error as i64,
                self.original_size_mb,
                self.compressed_size_mb,
                self.space_saved_mb,
                self.compression_ratio,
                self.quality_level as i64,
                self.duration_seconds,
                created_at
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CompressionResult {
            folder_path: row.get(2)?,
            files_processed: get_u64(row, 3)?,
            files_skipped: get_u64(row, 4)?,
            files_error: get_u64(row, 5)?,
            original_size_mb: row.get(6)?,
            compressed_size_mb: row.get(7)?,
            space_saved_mb: row.get(8)?,
            compression_ratio: row.get(9)?,
            quality_level: row.get::<_, i64>(10)?.clamp(0, 100) as u8,
            duration_seconds: row.get(11)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// SearchResult
// ─────────────────────────────────────────────────────────────

impl Record for SearchResult {
    const KIND: EntityKind = EntityKind::Search;
    const COLUMNS: &'static str = "id, created_at, source_path, destination_path, \
         files_searched, files_found, files_copied, files_error, search_pattern, duration_seconds";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO file_searches
                (source_path, destination_path, files_searched, files_found, files_copied,
                 files_error, search_pattern, duration_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.source_path,
                self.destination_path,
                self.files_searched as i64,
                self.files_found as i64,
                self.files_copied as i64,
                self.files_error as i64,
                self.search_pattern,
                self.duration_seconds,
                created_at
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SearchResult {
            source_path: row.get(2)?,
            destination_path: row.get(3)?,
            files_searched: get_u64(row, 4)?,
            files_found: get_u64(row, 5)?,
            files_copied: get_u64(row, 6)?,
            files_error: get_u64(row, 7)?,
            search_pattern: row.get(8)?,
            duration_seconds: row.get(9)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// LogEntry
// ─────────────────────────────────────────────────────────────

impl Record for LogEntry {
    const KIND: EntityKind = EntityKind::Log;
    const COLUMNS: &'static str =
        "id, created_at, module_name, action, level, message, traceback, extra_data";

    fn insert(&self, tx: &Transaction<'_>, created_at: &str) -> rusqlite::Result<i64> {
        let extra = self.extra.as_ref().map(|v| v.to_string());
        tx.execute(
            "INSERT INTO system_logs
                (module_name, action, level, message, traceback, extra_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.module,
                self.action,
                self.level.as_str(),
                self.message,
                self.traceback,
                extra,
                created_at
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let extra: Option<String> = row.get(7)?;
        let extra = match extra {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e))
            })?),
            None => None,
        };
        Ok(LogEntry {
            module: row.get(2)?,
            action: row.get(3)?,
            level: parse_enum(row, 4)?,
            message: row.get(5)?,
            traceback: row.get(6)?,
            extra,
        })
    }

    /// 超出上限时按 id 从旧到新淘汰，恰好淘汰 `count − max` 条
    fn after_insert(tx: &Transaction<'_>, retention: Retention) -> rusqlite::Result<()> {
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM system_logs", [], |r| r.get(0))?;
        let excess = count - retention.max_log_entries as i64;
        if excess > 0 {
            tx.execute(
                "DELETE FROM system_logs WHERE id IN
                    (SELECT id FROM system_logs ORDER BY id ASC LIMIT ?1)",
                params![excess],
            )?;
        }
        Ok(())
    }
}
