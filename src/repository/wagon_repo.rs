// ==========================================
// 列车编组计算系统 - 车厢仓储
// ==========================================
// 职责: 管理 wagon 表的 CRUD 与批量位置写入
// 红线: 不含业务逻辑 (位置方案由引擎层计算)
// 约束: "结构变更 + 位置归一化"必须落在同一事务内,
//       调用方通过 in_transaction 获得事务作用域
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::wagon::{PositionAssignment, Wagon, WagonDraft, WagonPatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// WagonRepository - 车厢仓储
// ==========================================
pub struct WagonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WagonRepository {
    /// 创建新的 WagonRepository 实例
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

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Wagon>> {
        let conn = self.get_conn()?;
        find_wagon(&conn, id)
    }

    /// 查询列车的全部车厢, 按 (position, id) 升序
    pub fn list_by_train(&self, train_id: i64) -> RepositoryResult<Vec<Wagon>> {
        let conn = self.get_conn()?;
        list_wagons_by_train(&conn, train_id)
    }

    /// 在单个事务内执行一组车厢写操作
    ///
    /// 闭包内通过 [`WagonTxn`] 访问行级操作; 闭包返回 Ok 时提交,
    /// 返回 Err 时回滚。互斥锁在整个事务期间持有, 从而保证
    /// "变更 + 归一化"对并发请求原子可见。
    pub fn in_transaction<T>(
        &self,
        f: impl FnOnce(&WagonTxn<'_>) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let scope = WagonTxn { conn: &tx };

        let out = f(&scope)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(out)
    }
}

// ==========================================
// WagonTxn - 事务作用域内的行级操作
// ==========================================
/// `in_transaction` 闭包收到的操作句柄, 生命周期不超出事务
pub struct WagonTxn<'t> {
    conn: &'t Connection,
}

impl WagonTxn<'_> {
    /// 判断列车是否存在
    ///
    /// 供创建车厢前在同一事务内检查, 避免并发删除列车时
    /// 把未找到劣化成外键错误
    pub fn train_exists(&self, train_id: i64) -> RepositoryResult<bool> {
        let found: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM train WHERE id = ?1",
                params![train_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 插入车厢, 返回落库后的实体 (id 由存储分配)
    pub fn insert(&self, train_id: i64, draft: &WagonDraft) -> RepositoryResult<Wagon> {
        self.conn.execute(
            r#"
            INSERT INTO wagon (
                train_id, position, identifier,
                length_m, tare_weight_t, load_weight_t, braked_weight_t,
                brake_type, axle_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                train_id,
                draft.position,
                draft.identifier,
                draft.length_m,
                draft.tare_weight_t,
                draft.load_weight_t,
                draft.braked_weight_t,
                draft.brake_type,
                draft.axle_count,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        Ok(Wagon {
            id,
            train_id,
            position: draft.position,
            identifier: draft.identifier.clone(),
            length_m: draft.length_m,
            tare_weight_t: draft.tare_weight_t,
            load_weight_t: draft.load_weight_t,
            braked_weight_t: draft.braked_weight_t,
            brake_type: draft.brake_type.clone(),
            axle_count: draft.axle_count,
        })
    }

    /// 按主键查询
    pub fn find(&self, id: i64) -> RepositoryResult<Option<Wagon>> {
        find_wagon(self.conn, id)
    }

    /// 查询列车的全部车厢, 按 (position, id) 升序
    pub fn list_by_train(&self, train_id: i64) -> RepositoryResult<Vec<Wagon>> {
        list_wagons_by_train(self.conn, train_id)
    }

    /// 部分更新车厢
    ///
    /// 补丁语义: `None` 保持原值, 双层 Option 的 `Some(None)` 清空。
    pub fn update(&self, id: i64, patch: &WagonPatch) -> RepositoryResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(position) = patch.position {
            sets.push("position = ?");
            values.push(Box::new(position));
        }
        if let Some(identifier) = &patch.identifier {
            sets.push("identifier = ?");
            values.push(Box::new(identifier.clone()));
        }
        if let Some(length_m) = patch.length_m {
            sets.push("length_m = ?");
            values.push(Box::new(length_m));
        }
        if let Some(tare_weight_t) = patch.tare_weight_t {
            sets.push("tare_weight_t = ?");
            values.push(Box::new(tare_weight_t));
        }
        if let Some(load_weight_t) = patch.load_weight_t {
            sets.push("load_weight_t = ?");
            values.push(Box::new(load_weight_t));
        }
        if let Some(braked_weight_t) = patch.braked_weight_t {
            sets.push("braked_weight_t = ?");
            values.push(Box::new(braked_weight_t));
        }
        if let Some(brake_type) = &patch.brake_type {
            sets.push("brake_type = ?");
            values.push(Box::new(brake_type.clone()));
        }
        if let Some(axle_count) = &patch.axle_count {
            sets.push("axle_count = ?");
            values.push(Box::new(*axle_count));
        }

        values.push(Box::new(id));
        let sql = format!("UPDATE wagon SET {} WHERE id = ?", sets.join(", "));
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        self.conn.execute(&sql, params.as_slice())?;
        Ok(())
    }

    /// 删除车厢
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        self.conn
            .execute("DELETE FROM wagon WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// 批量提交位置写入指令 (位置归一化/重排序的落库口)
    ///
    /// # 返回
    /// - Ok(usize): 实际写入条数
    pub fn apply_positions(
        &self,
        assignments: &[PositionAssignment],
    ) -> RepositoryResult<usize> {
        let mut stmt = self
            .conn
            .prepare("UPDATE wagon SET position = ?1 WHERE id = ?2")?;

        let mut count = 0;
        for assignment in assignments {
            stmt.execute(params![assignment.position, assignment.wagon_id])?;
            count += 1;
        }
        Ok(count)
    }

    /// 按 id 集合查询, 结果按 (position, id) 升序
    pub fn find_by_ids_ordered(&self, ids: &[i64]) -> RepositoryResult<Vec<Wagon>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, train_id, position, identifier,
                   length_m, tare_weight_t, load_weight_t, braked_weight_t,
                   brake_type, axle_count
            FROM wagon
            WHERE id IN ({placeholders})
            ORDER BY position ASC, id ASC
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let wagons = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), map_wagon_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(wagons)
    }
}

// ==========================================
// 行级查询 (仓储与事务作用域共用)
// ==========================================

fn find_wagon(conn: &Connection, id: i64) -> RepositoryResult<Option<Wagon>> {
    let wagon = conn
        .query_row(
            r#"
            SELECT id, train_id, position, identifier,
                   length_m, tare_weight_t, load_weight_t, braked_weight_t,
                   brake_type, axle_count
            FROM wagon
            WHERE id = ?1
            "#,
            params![id],
            map_wagon_row,
        )
        .optional()?;
    Ok(wagon)
}

fn list_wagons_by_train(conn: &Connection, train_id: i64) -> RepositoryResult<Vec<Wagon>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, train_id, position, identifier,
               length_m, tare_weight_t, load_weight_t, braked_weight_t,
               brake_type, axle_count
        FROM wagon
        WHERE train_id = ?1
        ORDER BY position ASC, id ASC
        "#,
    )?;

    let wagons = stmt
        .query_map(params![train_id], map_wagon_row)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(wagons)
}

/// wagon 表行映射
fn map_wagon_row(row: &Row<'_>) -> SqliteResult<Wagon> {
    Ok(Wagon {
        id: row.get(0)?,
        train_id: row.get(1)?,
        position: row.get(2)?,
        identifier: row.get(3)?,
        length_m: row.get(4)?,
        tare_weight_t: row.get(5)?,
        load_weight_t: row.get(6)?,
        braked_weight_t: row.get(7)?,
        brake_type: row.get(8)?,
        axle_count: row.get(9)?,
    })
}
