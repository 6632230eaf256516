// ==========================================
// 列车编组计算系统 - 引擎层
// ==========================================
// 职责: 实现编组排序与聚合计算的业务规则
// 红线: Engine 不拼 SQL, 纯函数式输出写入方案/计算结果
// ==========================================

pub mod calculation;
pub mod cloning;
pub mod ordering;

// 重导出核心引擎
pub use calculation::{CalculationEngine, TrainCalculation};
pub use cloning::{CloneError, CloneOperator, MAX_CLONE_QUANTITY, MIN_CLONE_QUANTITY};
pub use ordering::{OrderingError, PositionNormalizer, ReorderOperator};
