// ==========================================
// 列车编组计算系统 - API 层
// ==========================================
// 职责: 提供业务用例接口, 供外部请求层 (HTTP/RPC) 调用
// 红线: 校验输入、编排仓储与引擎、翻译错误; 不拼 SQL
// ==========================================

pub mod error;
pub mod train_api;
pub mod validator;
pub mod wagon_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use train_api::TrainApi;
pub use wagon_api::WagonApi;
