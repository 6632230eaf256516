// ==========================================
// 列车编组计算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 列车编组维护与制动计算核心,
//           供外部请求层 (HTTP/RPC) 以库方式集成
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组合根
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    PositionAssignment, Train, TrainDraft, TrainPatch, Wagon, WagonDraft, WagonMetrics, WagonPatch,
};

// 引擎
pub use engine::{
    CalculationEngine, CloneOperator, PositionNormalizer, ReorderOperator, TrainCalculation,
};

// API
pub use api::{ApiError, ApiResult, TrainApi, WagonApi};

// 仓储
pub use repository::{RepositoryError, RepositoryResult, TrainRepository, WagonRepository};

// 配置与应用
pub use app::AppState;
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "列车编组计算系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
