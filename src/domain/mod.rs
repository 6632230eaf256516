// ==========================================
// 列车编组计算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、草稿/补丁结构、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod train;
pub mod wagon;

// 重导出核心类型
pub use train::{Train, TrainDraft, TrainPatch, MAX_TRAIN_DESCRIPTION_LEN, MAX_TRAIN_NAME_LEN};
pub use wagon::{
    PositionAssignment, Wagon, WagonDraft, WagonMetrics, WagonPatch, MAX_BRAKE_TYPE_LEN,
    MAX_IDENTIFIER_LEN,
};
