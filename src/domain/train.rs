// ==========================================
// 列车编组计算系统 - 列车领域模型
// ==========================================
// 职责: 列车实体与创建/更新载体
// 约束: 列车删除时其全部车厢由仓储层显式级联删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 列车名称最大长度
pub const MAX_TRAIN_NAME_LEN: usize = 200;

/// 列车描述最大长度
pub const MAX_TRAIN_DESCRIPTION_LEN: usize = 1000;

// ==========================================
// Train - 列车实体
// ==========================================
// 对齐: schema train 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub id: i64,                     // 主键 (由存储分配)
    pub name: String,                // 列车名称
    pub description: Option<String>, // 描述 (可选)
    pub created_at: NaiveDateTime,   // 创建时间 (UTC)
    pub updated_at: NaiveDateTime,   // 最近更新时间 (UTC)
}

// ==========================================
// TrainDraft - 列车创建载体
// ==========================================
/// 创建列车所需的字段, id 与时间戳由存储分配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainDraft {
    pub name: String,
    pub description: Option<String>,
}

// ==========================================
// TrainPatch - 列车部分更新载体
// ==========================================
/// 部分更新语义:
/// - `None`: 保持原值不变
/// - `Some(..)`: 覆盖原值
/// - `description` 为双层 Option, `Some(None)` 表示显式清空
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl TrainPatch {
    /// 判断补丁是否为空 (无任何待写字段)
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
