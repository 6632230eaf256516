// ==========================================
// 列车编组计算系统 - 应用状态
// ==========================================
// 职责: 按"单连接 + 互斥锁"装配全部仓储与 API
// 说明: 共享同一个连接使"变更 + 归一化"事务对并发请求串行化,
//       这是编组位置不变量所要求的事务作用域
// ==========================================

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

use crate::api::{TrainApi, WagonApi};
use crate::config::AppConfig;
use crate::db;
use crate::repository::{TrainRepository, WagonRepository};

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    pub config: AppConfig,
    pub train_api: Arc<TrainApi>,
    pub wagon_api: Arc<WagonApi>,
}

impl AppState {
    /// 按配置装配应用状态: 打开数据库、初始化 schema、构建 API
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("创建数据目录失败: {}", parent.display()))?;
            }
        }

        let conn = db::open_sqlite_connection(&config.db_path)
            .with_context(|| format!("打开数据库失败: {}", config.db_path))?;
        db::init_schema(&conn).context("初始化 schema 失败")?;

        Ok(Self::from_connection(config, Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接装配 (测试/嵌入场景)
    pub fn from_connection(config: AppConfig, conn: Arc<Mutex<Connection>>) -> Self {
        let train_repo = Arc::new(TrainRepository::from_connection(conn.clone()));
        let wagon_repo = Arc::new(WagonRepository::from_connection(conn));

        let train_api = Arc::new(TrainApi::new(train_repo, wagon_repo.clone()));
        let wagon_api = Arc::new(WagonApi::new(wagon_repo));

        Self {
            config,
            train_api,
            wagon_api,
        }
    }
}
