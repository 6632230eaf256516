// ==========================================
// 列车编组计算系统 - 应用层
// ==========================================
// 职责: 组合根; 把配置、连接、仓储、API 装配为一个应用状态
// ==========================================

pub mod state;

pub use state::AppState;
