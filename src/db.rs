// ==========================================
// 列车编组计算系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 提供幂等的建库入口 (schema_version 记账)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明: 版本号用于提示/告警, `init_schema` 仅做幂等建表,
/// 不在旧库上做破坏性自动迁移。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等初始化 schema (train / wagon / schema_version)
///
/// 约束:
/// - wagon.train_id 仅声明外键引用, 不挂 ON DELETE CASCADE;
///   列车删除时由仓储层在事务内显式删除其全部车厢
/// - wagon(train_id, position) 建索引支撑按位次排序的高频查询
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS train (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_train_name ON train(name);

        CREATE TABLE IF NOT EXISTS wagon (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            train_id        INTEGER NOT NULL REFERENCES train(id),
            position        INTEGER NOT NULL,
            identifier      TEXT,
            length_m        REAL NOT NULL,
            tare_weight_t   REAL NOT NULL,
            load_weight_t   REAL NOT NULL,
            braked_weight_t REAL NOT NULL,
            brake_type      TEXT,
            axle_count      INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_wagon_train ON wagon(train_id);
        CREATE INDEX IF NOT EXISTS idx_wagon_train_position ON wagon(train_id, position);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("打开内存库失败");
        configure_sqlite_connection(&conn).expect("PRAGMA 配置失败");

        init_schema(&conn).expect("首次建库应该成功");
        init_schema(&conn).expect("重复建库应该成功");

        assert_eq!(
            read_schema_version(&conn).expect("读取版本失败"),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_read_schema_version_on_empty_db() {
        let conn = Connection::open_in_memory().expect("打开内存库失败");
        assert_eq!(read_schema_version(&conn).expect("读取版本失败"), None);
    }
}
