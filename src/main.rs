// ==========================================
// 列车编组计算系统 - 维护入口
// ==========================================
// 职责: 初始化日志/配置/数据库并报告就绪状态
// 说明: 请求层 (HTTP/RPC) 以库方式集成 AppState,
//       本入口用于建库与健康自检
// ==========================================

use train_composer::{config::AppConfig, db, logging, AppState};

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", train_composer::APP_NAME);
    tracing::info!("系统版本: {}", train_composer::VERSION);
    tracing::info!("==================================================");

    // 加载配置
    let config = AppConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);
    tracing::info!("API 前缀: {}", config.api_prefix);
    tracing::info!("CORS 来源: {:?}", config.cors_origins);

    // 装配应用状态 (建库 + 初始化 schema)
    let state = AppState::new(config.clone())?;

    // 健康自检: 报告 schema 版本与当前列车数
    let conn = db::open_sqlite_connection(&config.db_path)?;
    match db::read_schema_version(&conn)? {
        Some(version) => tracing::info!("schema 版本: {}", version),
        None => tracing::warn!("未找到 schema_version 表"),
    }

    let trains = state.train_api.list_trains()?;
    tracing::info!("当前列车数: {}", trains.len());
    tracing::info!("初始化完成, 请求层可通过 AppState 集成本核心");

    Ok(())
}
