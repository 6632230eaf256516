// ==========================================
// 列车编组计算系统 - 列车仓储
// ==========================================
// 职责: 管理 train 表的 CRUD 操作
// 红线: 不含业务逻辑, 只负责数据访问
// 约束: 删除列车时在同一事务内显式删除其全部车厢
//       (组合关系由存储契约保证, 不依赖隐式级联)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::train::{Train, TrainDraft, TrainPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// TrainRepository - 列车仓储
// ==========================================
pub struct TrainRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TrainRepository {
    /// 创建新的 TrainRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建列车, 时间戳由存储分配 (UTC)
    pub fn create(&self, draft: &TrainDraft) -> RepositoryResult<Train> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();

        conn.execute(
            r#"
            INSERT INTO train (name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![draft.name, draft.description, now, now],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Train {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Train>> {
        let conn = self.get_conn()?;
        let train = conn
            .query_row(
                r#"
                SELECT id, name, description, created_at, updated_at
                FROM train
                WHERE id = ?1
                "#,
                params![id],
                map_train_row,
            )
            .optional()?;
        Ok(train)
    }

    /// 判断列车是否存在
    pub fn exists(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: bool = conn
            .query_row("SELECT 1 FROM train WHERE id = ?1", params![id], |_row| {
                Ok(true)
            })
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 查询全部列车, 最新创建的在前
    pub fn list_all(&self) -> RepositoryResult<Vec<Train>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM train
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let trains = stmt
            .query_map([], map_train_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(trains)
    }

    /// 部分更新列车
    ///
    /// 补丁语义: `None` 保持原值, `Some(None)` 清空描述。
    /// 任何有效写入都会推进 updated_at。
    pub fn update(&self, id: i64, patch: &TrainPatch) -> RepositoryResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let conn = self.get_conn()?;
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = &patch.name {
            sets.push("name = ?");
            values.push(Box::new(name.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }

        sets.push("updated_at = ?");
        values.push(Box::new(Utc::now().naive_utc()));
        values.push(Box::new(id));

        let sql = format!("UPDATE train SET {} WHERE id = ?", sets.join(", "));
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    /// 删除列车及其全部车厢 (单事务显式级联)
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM wagon WHERE train_id = ?1", params![id])?;
        tx.execute("DELETE FROM train WHERE id = ?1", params![id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// train 表行映射
fn map_train_row(row: &Row<'_>) -> SqliteResult<Train> {
    Ok(Train {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
