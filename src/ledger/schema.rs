//! # 台账数据库结构
//!
//! 六张实体表与两个只读视图。`generated_codes.code` 上的 UNIQUE 约束
//! 是编码唯一性的最后防线。
//!
//! ## 依赖关系
//! - 被 `ledger/store.rs` 在打开数据库时执行

/// 建表与建视图语句（幂等）
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS generated_codes (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT    NOT NULL UNIQUE,
    article_name  TEXT    NOT NULL,
    meter_serial  TEXT,
    service_type  TEXT,
    created_at    TEXT    NOT NULL,
    exported      INTEGER NOT NULL DEFAULT 0,
    export_path   TEXT,
    notes         TEXT
);
CREATE INDEX IF NOT EXISTS idx_codes_created ON generated_codes(created_at);
CREATE INDEX IF NOT EXISTS idx_codes_serial  ON generated_codes(meter_serial);

CREATE TABLE IF NOT EXISTS operations (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    operation_type   TEXT    NOT NULL CHECK (operation_type IN
                        ('generate', 'read', 'rename', 'process_excel', 'search', 'audit', 'compress')),
    status           TEXT    NOT NULL CHECK (status IN ('success', 'warning', 'error')),
    items_processed  INTEGER NOT NULL DEFAULT 0,
    duration_seconds REAL    NOT NULL DEFAULT 0,
    error_message    TEXT,
    payload_kind     TEXT,
    payload_value    TEXT,
    created_at       TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_operations_type    ON operations(operation_type);
CREATE INDEX IF NOT EXISTS idx_operations_created ON operations(created_at);

CREATE TABLE IF NOT EXISTS file_audits (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_path     TEXT    NOT NULL,
    total_expected  INTEGER NOT NULL,
    total_found     INTEGER NOT NULL,
    missing_count   INTEGER NOT NULL,
    extra_count     INTEGER NOT NULL,
    report_path     TEXT,
    audit_type      TEXT    NOT NULL,
    created_at      TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audits_created ON file_audits(created_at);

CREATE TABLE IF NOT EXISTS pdf_compressions (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_path         TEXT    NOT NULL,
    files_processed     INTEGER NOT NULL,
    files_skipped       INTEGER NOT NULL DEFAULT 0,
    files_error         INTEGER NOT NULL DEFAULT 0,
    original_size_mb    REAL    NOT NULL,
    compressed_size_mb  REAL    NOT NULL,
    space_saved_mb      REAL    NOT NULL,
    compression_ratio   REAL,
    quality_level       INTEGER NOT NULL,
    duration_seconds    REAL    NOT NULL DEFAULT 0,
    created_at          TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_compressions_created ON pdf_compressions(created_at);

CREATE TABLE IF NOT EXISTS file_searches (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    source_path       TEXT    NOT NULL,
    destination_path  TEXT    NOT NULL,
    files_searched    INTEGER NOT NULL,
    files_found       INTEGER NOT NULL,
    files_copied      INTEGER NOT NULL,
    files_error       INTEGER NOT NULL DEFAULT 0,
    search_pattern    TEXT    NOT NULL,
    duration_seconds  REAL    NOT NULL DEFAULT 0,
    created_at        TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_searches_created ON file_searches(created_at);

CREATE TABLE IF NOT EXISTS system_logs (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    module_name  TEXT    NOT NULL,
    action       TEXT    NOT NULL,
    level        TEXT    NOT NULL CHECK (level IN ('DEBUG', 'INFO', 'WARNING', 'ERROR', 'CRITICAL')),
    message      TEXT    NOT NULL,
    traceback    TEXT,
    extra_data   TEXT,
    created_at   TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_created ON system_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_level   ON system_logs(level);

CREATE VIEW IF NOT EXISTS v_dashboard_stats AS
SELECT
    (SELECT COUNT(*) FROM generated_codes) AS total_codes_generated,
    (SELECT COUNT(*) FROM operations       WHERE date(created_at) = date('now')) AS operations_today,
    (SELECT COUNT(*) FROM file_audits      WHERE date(created_at) = date('now')) AS audits_today,
    (SELECT COUNT(*) FROM file_searches    WHERE date(created_at) = date('now')) AS searches_today,
    (SELECT COUNT(*) FROM pdf_compressions WHERE date(created_at) = date('now')) AS compressions_today,
    (SELECT COALESCE(SUM(space_saved_mb), 0.0) FROM pdf_compressions) AS total_space_saved_mb;

CREATE VIEW IF NOT EXISTS v_recent_logs AS
SELECT id, created_at, module_name, action, level, message, traceback, extra_data
FROM system_logs
ORDER BY created_at DESC, id DESC
LIMIT 100;
"#;
