// ==========================================
// 列车编组计算系统 - 车厢领域模型
// ==========================================
// 职责: 车厢实体、创建/更新载体、物理量接口
// 约束: position 为 1 起的编组位次, 同列车内紧凑无空洞
// 约束: total_weight_t 为派生量 (自重+载重), 永不落库
// ==========================================

use serde::{Deserialize, Serialize};

/// 车厢号最大长度
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// 制动类型最大长度 (例: G/P/R)
pub const MAX_BRAKE_TYPE_LEN: usize = 50;

// ==========================================
// Wagon - 车厢实体
// ==========================================
// 对齐: schema wagon 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wagon {
    pub id: i64,       // 主键 (由存储分配)
    pub train_id: i64, // 所属列车

    // ===== 编组位次 =====
    pub position: i64, // 编组位置 (≥1, 同列车内紧凑)

    // ===== 物理属性 =====
    pub identifier: Option<String>, // 车厢号 (可选)
    pub length_m: f64,              // 车长 (米, >0)
    pub tare_weight_t: f64,         // 自重 (吨, ≥0)
    pub load_weight_t: f64,         // 载重 (吨, ≥0)
    pub braked_weight_t: f64,       // 制动重量 (吨, ≥0)
    pub brake_type: Option<String>, // 制动类型 (可选)
    pub axle_count: Option<i64>,    // 轴数 (可选, ≥0)
}

// ==========================================
// WagonDraft - 车厢创建载体
// ==========================================
/// 创建车厢所需的字段, id 由存储分配, train_id 由调用方提供
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagonDraft {
    pub position: i64,
    pub identifier: Option<String>,
    pub length_m: f64,
    pub tare_weight_t: f64,
    pub load_weight_t: f64,
    pub braked_weight_t: f64,
    pub brake_type: Option<String>,
    pub axle_count: Option<i64>,
}

impl WagonDraft {
    /// 以源车厢的物理属性构造副本草稿 (克隆操作使用)
    ///
    /// # 参数
    /// - `source`: 源车厢
    /// - `position`: 副本的落位位置
    pub fn copy_of(source: &Wagon, position: i64) -> Self {
        Self {
            position,
            identifier: source.identifier.clone(),
            length_m: source.length_m,
            tare_weight_t: source.tare_weight_t,
            load_weight_t: source.load_weight_t,
            braked_weight_t: source.braked_weight_t,
            brake_type: source.brake_type.clone(),
            axle_count: source.axle_count,
        }
    }
}

// ==========================================
// WagonPatch - 车厢部分更新载体
// ==========================================
/// 部分更新语义:
/// - `None`: 保持原值不变
/// - `Some(..)`: 覆盖原值
/// - 可清空字段 (identifier/brake_type/axle_count) 为双层 Option,
///   `Some(None)` 表示显式清空
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WagonPatch {
    pub position: Option<i64>,
    pub identifier: Option<Option<String>>,
    pub length_m: Option<f64>,
    pub tare_weight_t: Option<f64>,
    pub load_weight_t: Option<f64>,
    pub braked_weight_t: Option<f64>,
    pub brake_type: Option<Option<String>>,
    pub axle_count: Option<Option<i64>>,
}

impl WagonPatch {
    /// 判断补丁是否为空 (无任何待写字段)
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.identifier.is_none()
            && self.length_m.is_none()
            && self.tare_weight_t.is_none()
            && self.load_weight_t.is_none()
            && self.braked_weight_t.is_none()
            && self.brake_type.is_none()
            && self.axle_count.is_none()
    }
}

// ==========================================
// PositionAssignment - 位置写入指令
// ==========================================
/// 位置归一化/重排序引擎输出的单条写入指令,
/// 由仓储层在一个事务内批量提交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionAssignment {
    pub wagon_id: i64,
    pub position: i64,
}

// ==========================================
// Trait: WagonMetrics
// ==========================================
// 用途: 聚合计算引擎的物理量输入接口
pub trait WagonMetrics {
    /// 车长 (米)
    fn length_m(&self) -> f64;

    /// 制动重量 (吨)
    fn braked_weight_t(&self) -> f64;

    /// 总重 (吨) = 自重 + 载重
    fn total_weight_t(&self) -> f64;
}

impl WagonMetrics for Wagon {
    fn length_m(&self) -> f64 {
        self.length_m
    }

    fn braked_weight_t(&self) -> f64 {
        self.braked_weight_t
    }

    fn total_weight_t(&self) -> f64 {
        self.tare_weight_t + self.load_weight_t
    }
}

impl WagonMetrics for WagonDraft {
    fn length_m(&self) -> f64 {
        self.length_m
    }

    fn braked_weight_t(&self) -> f64 {
        self.braked_weight_t
    }

    fn total_weight_t(&self) -> f64 {
        self.tare_weight_t + self.load_weight_t
    }
}
