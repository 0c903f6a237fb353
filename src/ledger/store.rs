//! # 台账存储
//!
//! 基于 SQLite 的追加写入台账。每次写入都是一个独立的短事务，
//! 在连接锁内完成后立即释放，批次运行期间不长期占用存储。
//!
//! ## 功能
//! - `record`: 持久化任一实体并返回单调递增的 id
//! - `query_recent`: 按创建时间倒序取最近 N 条
//! - `reserve_code`: 基于唯一约束的"插入并检测冲突"预留编码
//! - 仪表盘汇总与最近日志视图
//!
//! ## 依赖关系
//! - 被 `codegen/`、`search/`、`audit/`、`compress/`、`commands/` 使用
//! - 使用 `rusqlite` 与 `ledger/schema.rs`

use super::record::{format_timestamp, EntityKind, Record, Retention, Stored};
use super::schema::SCHEMA;
use crate::error::{Result, SgdiError};
use crate::models::{GeneratedCode, LogEntry, OperationType};

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

/// 日志条目默认保留上限
pub const DEFAULT_LOG_RETENTION: usize = 10_000;

/// 编码预留结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// 已写入，附带行 id
    Reserved(i64),
    /// 编码已存在于历史集合
    Collision,
}

/// 仪表盘汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_codes: u64,
    pub operations_today: u64,
    pub audits_today: u64,
    pub searches_today: u64,
    pub compressions_today: u64,
    pub total_space_saved_mb: f64,
    /// 今日各类型操作数
    pub operations_today_by_type: BTreeMap<OperationType, u64>,
}

/// 操作台账
pub struct Ledger {
    conn: Mutex<Connection>,
    retention: Retention,
}

impl Ledger {
    /// 打开（或创建）数据库文件
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SgdiError::FileWriteError {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// 打开内存数据库（用于测试）
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!("ledger opened");
        Ok(Ledger {
            conn: Mutex::new(conn),
            retention: Retention {
                max_log_entries: DEFAULT_LOG_RETENTION,
            },
        })
    }

    /// 设置日志保留上限
    pub fn with_log_retention(mut self, max_log_entries: usize) -> Self {
        self.retention.max_log_entries = max_log_entries.max(1);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SgdiError::StorageUnavailable("ledger lock poisoned".to_string()))
    }

    // ─────────────────────────────────────────────────────────────
    // 通用写入与查询
    // ─────────────────────────────────────────────────────────────

    /// 持久化一条实体，返回行 id
    pub fn record<T: Record>(&self, entry: &T) -> Result<i64> {
        let created_at = format_timestamp(&entry.own_timestamp().unwrap_or_else(Utc::now));
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = entry.insert(&tx, &created_at)?;
        T::after_insert(&tx, self.retention)?;
        tx.commit()?;
        debug!(table = T::KIND.table(), id, "record persisted");
        Ok(id)
    }

    /// 最近 `limit` 条记录，按创建时间倒序
    pub fn query_recent<T: Record>(&self, limit: usize) -> Result<Vec<Stored<T>>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id DESC LIMIT ?1",
            T::COLUMNS,
            T::KIND.table()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Stored {
                id: row.get(0)?,
                created_at: super::record::parse_timestamp(row, 1)?,
                record: T::from_row(row)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 某类实体的总数
    pub fn count(&self, kind: EntityKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let conn = self.lock()?;
        let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as u64)
    }

    // ─────────────────────────────────────────────────────────────
    // 编码相关
    // ─────────────────────────────────────────────────────────────

    /// 预留编码：直接插入，唯一约束冲突即视为碰撞
    ///
    /// 检查与写入在同一把锁、同一条语句内完成，不存在先查后插的竞态。
    pub fn reserve_code(&self, code: &GeneratedCode) -> Result<Reservation> {
        let created_at = format_timestamp(&code.created_at);
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        match code.insert(&tx, &created_at) {
            Ok(id) => {
                tx.commit()?;
                Ok(Reservation::Reserved(id))
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(code = %code.code, "code collision");
                Ok(Reservation::Collision)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 编码是否已存在（走唯一索引）
    pub fn code_exists(&self, code: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM generated_codes WHERE code = ?1",
                params![code],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 按编码精确查找
    pub fn find_code(&self, code: &str) -> Result<Option<Stored<GeneratedCode>>> {
        let sql = format!(
            "SELECT {} FROM generated_codes WHERE code = ?1",
            GeneratedCode::COLUMNS
        );
        let conn = self.lock()?;
        let found = conn
            .query_row(&sql, params![code], |row| {
                Ok(Stored {
                    id: row.get(0)?,
                    created_at: super::record::parse_timestamp(row, 1)?,
                    record: GeneratedCode::from_row(row)?,
                })
            })
            .optional()?;
        Ok(found)
    }

    /// 按表号子串查找，最新在前
    pub fn find_by_meter_serial(&self, fragment: &str) -> Result<Vec<Stored<GeneratedCode>>> {
        let sql = format!(
            "SELECT {} FROM generated_codes
             WHERE meter_serial LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
            GeneratedCode::COLUMNS
        );
        let escaped = fragment
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![format!("%{}%", escaped)], |row| {
            Ok(Stored {
                id: row.get(0)?,
                created_at: super::record::parse_timestamp(row, 1)?,
                record: GeneratedCode::from_row(row)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 标记编码已导出，返回更新的行数
    pub fn mark_exported(&self, codes: &[String], export_path: &str) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE generated_codes SET exported = 1, export_path = ?1 WHERE code = ?2",
            )?;
            for code in codes {
                updated += stmt.execute(params![export_path, code])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// 尚未导出的编码，最旧在前
    pub fn unexported_codes(&self, limit: usize) -> Result<Vec<Stored<GeneratedCode>>> {
        let sql = format!(
            "SELECT {} FROM generated_codes WHERE exported = 0 ORDER BY id ASC LIMIT ?1",
            GeneratedCode::COLUMNS
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Stored {
                id: row.get(0)?,
                created_at: super::record::parse_timestamp(row, 1)?,
                record: GeneratedCode::from_row(row)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ─────────────────────────────────────────────────────────────
    // 视图
    // ─────────────────────────────────────────────────────────────

    /// 仪表盘统计，直接读取已提交数据
    pub fn dashboard_stats(&self) -> Result<DashboardStats> {
        let conn = self.lock()?;
        let mut stats = conn.query_row(
            "SELECT total_codes_generated, operations_today, audits_today, searches_today,
                    compressions_today, total_space_saved_mb
             FROM v_dashboard_stats",
            [],
            |r| {
                Ok(DashboardStats {
                    total_codes: r.get::<_, i64>(0)? as u64,
                    operations_today: r.get::<_, i64>(1)? as u64,
                    audits_today: r.get::<_, i64>(2)? as u64,
                    searches_today: r.get::<_, i64>(3)? as u64,
                    compressions_today: r.get::<_, i64>(4)? as u64,
                    total_space_saved_mb: r.get(5)?,
                    operations_today_by_type: BTreeMap::new(),
                })
            },
        )?;

        let mut stmt = conn.prepare(
            "SELECT operation_type, COUNT(*) FROM operations
             WHERE date(created_at) = date('now')
             GROUP BY operation_type",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (kind, n) = row?;
            if let Ok(kind) = kind.parse::<OperationType>() {
                stats.operations_today_by_type.insert(kind, n as u64);
            }
        }
        Ok(stats)
    }

    /// 最近日志（视图最多 100 条）
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<Stored<LogEntry>>> {
        let sql = format!(
            "SELECT {} FROM v_recent_logs LIMIT ?1",
            LogEntry::COLUMNS
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Stored {
                id: row.get(0)?,
                created_at: super::record::parse_timestamp(row, 1)?,
                record: LogEntry::from_row(row)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

/// 是否为唯一约束冲突
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ArticleMetadata, AuditResult, CompressionResult, LogLevel, OperationPayload,
        OperationRecord, OperationStatus, SearchResult,
    };

    fn make_ledger() -> Ledger {
        Ledger::open_in_memory().expect("open in-memory ledger")
    }

    fn log(i: usize) -> LogEntry {
        LogEntry::new("test", "insert", LogLevel::Info, format!("entry {}", i))
    }

    #[test]
    fn test_record_ids_increase() {
        let ledger = make_ledger();
        let a = ledger
            .record(&OperationRecord::new(OperationType::Search, OperationStatus::Success))
            .unwrap();
        let b = ledger
            .record(&OperationRecord::new(OperationType::Audit, OperationStatus::Warning))
            .unwrap();
        assert!(b > a);
        assert_eq!(ledger.count(EntityKind::Operation).unwrap(), 2);
    }

    #[test]
    fn test_query_recent_newest_first() {
        let ledger = make_ledger();
        for i in 0..5 {
            let op = OperationRecord::new(OperationType::Compress, OperationStatus::Success)
                .items(i)
                .payload(OperationPayload::FolderPath(format!("/pdf/{}", i)));
            ledger.record(&op).unwrap();
        }

        let recent = ledger.query_recent::<OperationRecord>(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
        assert_eq!(recent[0].record.items_processed, 4);
        assert_eq!(
            recent[0].record.payload,
            Some(OperationPayload::FolderPath("/pdf/4".to_string()))
        );
    }

    #[test]
    fn test_round_trip_results() {
        let ledger = make_ledger();
        let audit = AuditResult {
            folder_path: "/audit".to_string(),
            total_expected: 3,
            total_found: 3,
            missing_count: 1,
            extra_count: 1,
            report_path: Some("/tmp/report.txt".to_string()),
            audit_type: "general".to_string(),
        };
        ledger.record(&audit).unwrap();
        assert_eq!(ledger.query_recent::<AuditResult>(1).unwrap()[0].record, audit);

        let search = SearchResult {
            source_path: "/src".to_string(),
            destination_path: "/dst".to_string(),
            files_searched: 2,
            files_found: 1,
            files_copied: 1,
            files_error: 0,
            search_pattern: "[\"x.pdf\",\"y.pdf\"]".to_string(),
            duration_seconds: 0.5,
        };
        ledger.record(&search).unwrap();
        assert_eq!(ledger.query_recent::<SearchResult>(1).unwrap()[0].record, search);

        let mut compression = CompressionResult::from_bytes("/pdf", 70, 2048, 1024);
        compression.files_processed = 1;
        ledger.record(&compression).unwrap();
        assert_eq!(
            ledger.query_recent::<CompressionResult>(1).unwrap()[0].record,
            compression
        );
    }

    #[test]
    fn test_log_extra_round_trip() {
        let ledger = make_ledger();
        let entry = log(0).with_extra(serde_json::json!({"copied": 3, "errors": 0}));
        ledger.record(&entry).unwrap();
        let stored = ledger.query_recent::<LogEntry>(1).unwrap();
        assert_eq!(stored[0].record, entry);
    }

    #[test]
    fn test_log_retention_small_cap() {
        let ledger = make_ledger().with_log_retention(5);
        for i in 0..8 {
            ledger.record(&log(i)).unwrap();
        }
        assert_eq!(ledger.count(EntityKind::Log).unwrap(), 5);

        let remaining = ledger.query_recent::<LogEntry>(10).unwrap();
        let messages: Vec<_> = remaining.iter().map(|s| s.record.message.clone()).collect();
        assert_eq!(
            messages,
            vec!["entry 7", "entry 6", "entry 5", "entry 4", "entry 3"]
        );
    }

    #[test]
    fn test_log_retention_default_cap() {
        let ledger = make_ledger();
        for i in 0..DEFAULT_LOG_RETENTION {
            ledger.record(&log(i)).unwrap();
        }
        assert_eq!(ledger.count(EntityKind::Log).unwrap(), 10_000);

        ledger.record(&log(DEFAULT_LOG_RETENTION)).unwrap();
        assert_eq!(ledger.count(EntityKind::Log).unwrap(), 10_000);

        let oldest = ledger.query_recent::<LogEntry>(10_000).unwrap();
        assert_eq!(oldest.last().unwrap().record.message, "entry 1");
        assert_eq!(oldest.first().unwrap().record.message, "entry 10000");
    }

    #[test]
    fn test_reserve_code_detects_collision() {
        let ledger = make_ledger();
        let meta = ArticleMetadata::new("Medidor 1");
        let code = GeneratedCode::new("ABCD123456", &meta);

        assert!(matches!(
            ledger.reserve_code(&code).unwrap(),
            Reservation::Reserved(_)
        ));
        assert_eq!(ledger.reserve_code(&code).unwrap(), Reservation::Collision);
        assert!(ledger.code_exists("ABCD123456").unwrap());
        assert_eq!(ledger.count(EntityKind::GeneratedCode).unwrap(), 1);
    }

    #[test]
    fn test_find_by_meter_serial_and_export() {
        let ledger = make_ledger();
        let mut meta = ArticleMetadata::new("Medidor");
        meta.meter_serial = Some("SN-12345".to_string());
        ledger.record(&GeneratedCode::new("AAAA000001", &meta)).unwrap();
        meta.meter_serial = Some("SN-99999".to_string());
        ledger.record(&GeneratedCode::new("AAAA000002", &meta)).unwrap();

        let found = ledger.find_by_meter_serial("123").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record.code, "AAAA000001");

        let updated = ledger
            .mark_exported(&["AAAA000001".to_string()], "/exports/codes.txt")
            .unwrap();
        assert_eq!(updated, 1);
        let code = ledger.find_code("AAAA000001").unwrap().unwrap();
        assert!(code.record.exported);
        assert_eq!(code.record.export_path.as_deref(), Some("/exports/codes.txt"));

        let pending = ledger.unexported_codes(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].record.code, "AAAA000002");
    }

    #[test]
    fn test_dashboard_stats_reflect_commits() {
        let ledger = make_ledger();
        ledger
            .record(&OperationRecord::new(OperationType::Search, OperationStatus::Success))
            .unwrap();
        ledger
            .record(&OperationRecord::new(OperationType::Search, OperationStatus::Warning))
            .unwrap();
        let mut compression = CompressionResult::from_bytes("/pdf", 70, 3 * 1024 * 1024, 1024 * 1024);
        compression.files_processed = 1;
        ledger.record(&compression).unwrap();

        let stats = ledger.dashboard_stats().unwrap();
        assert_eq!(stats.operations_today, 2);
        assert_eq!(stats.compressions_today, 1);
        assert_eq!(
            stats.operations_today_by_type.get(&OperationType::Search),
            Some(&2)
        );
        assert!((stats.total_space_saved_mb - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_logs_view_caps_at_100() {
        let ledger = make_ledger();
        for i in 0..120 {
            ledger.record(&log(i)).unwrap();
        }
        let logs = ledger.recent_logs(500).unwrap();
        assert_eq!(logs.len(), 100);
        assert_eq!(logs[0].record.message, "entry 119");
    }
}
