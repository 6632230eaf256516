// ==========================================
// 列车编组计算系统 - 编组位次引擎
// ==========================================
// 职责: 位置归一化 (紧凑 1..N) 与整列重排序的方案计算
// 不变量: 任一结构变更落库后, N 节车厢的位置集合恰为 {1..N},
//         无空洞无重复; 操作中途允许短暂违反
// 红线: 只计算写入方案, 不接触数据库
// ==========================================

use crate::domain::wagon::{PositionAssignment, Wagon};
use std::collections::HashSet;
use thiserror::Error;

/// 编组排序引擎错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrderingError {
    #[error("未提供车厢ID")]
    EmptyRequest,

    #[error("该列车没有车厢")]
    NoWagons,

    #[error("车厢ID集合与列车当前编组不一致")]
    IdSetMismatch,
}

// ==========================================
// PositionNormalizer - 位置归一化引擎
// ==========================================
/// 位置归一化引擎
///
/// 职责: 将一列车的车厢按 (position, id) 升序映射到 1..N。
/// id 作为并列时的决胜键, 保证插入/克隆造成位置短暂重合时
/// 仍有确定的全序。
pub struct PositionNormalizer;

impl PositionNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 计算最小写入方案
    ///
    /// 只输出位置实际变化的车厢 (写入量优化, 非正确性要求)。
    /// 空集合为无操作; 本引擎无错误分支。
    ///
    /// # 返回
    /// - Vec<PositionAssignment>: 待提交的位置写入指令
    pub fn plan(&self, wagons: &[Wagon]) -> Vec<PositionAssignment> {
        let mut ordered: Vec<&Wagon> = wagons.iter().collect();
        ordered.sort_by_key(|w| (w.position, w.id));

        ordered
            .iter()
            .enumerate()
            .filter(|(idx, wagon)| wagon.position != (idx + 1) as i64)
            .map(|(idx, wagon)| PositionAssignment {
                wagon_id: wagon.id,
                position: (idx + 1) as i64,
            })
            .collect()
    }
}

impl Default for PositionNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// ReorderOperator - 整列重排序引擎
// ==========================================
/// 整列重排序引擎
///
/// 职责: 校验调用方给出的完整新顺序并生成位置写入方案。
/// 属于全量替换: 缺少现有车厢或混入外部车厢均被拒绝。
pub struct ReorderOperator;

impl ReorderOperator {
    pub fn new() -> Self {
        Self
    }

    /// 计算重排序写入方案
    ///
    /// # 参数
    /// - `wagons`: 列车当前的全部车厢
    /// - `requested`: 期望的新顺序 (车厢 id 序列)
    ///
    /// # 返回
    /// - Ok(Vec<PositionAssignment>): 按输入顺序 index+1 的全量位置指令
    /// - Err(OrderingError::EmptyRequest): 输入序列为空
    /// - Err(OrderingError::NoWagons): 列车没有车厢
    /// - Err(OrderingError::IdSetMismatch): id 集合与当前编组不一致
    pub fn plan(
        &self,
        wagons: &[Wagon],
        requested: &[i64],
    ) -> Result<Vec<PositionAssignment>, OrderingError> {
        if requested.is_empty() {
            return Err(OrderingError::EmptyRequest);
        }
        if wagons.is_empty() {
            return Err(OrderingError::NoWagons);
        }

        // 防御性去重, 保留首次出现的顺序
        let incoming = dedup_preserving_order(requested);

        let existing: HashSet<i64> = wagons.iter().map(|w| w.id).collect();
        let incoming_set: HashSet<i64> = incoming.iter().copied().collect();
        if existing != incoming_set {
            return Err(OrderingError::IdSetMismatch);
        }

        Ok(incoming
            .iter()
            .enumerate()
            .map(|(idx, wagon_id)| PositionAssignment {
                wagon_id: *wagon_id,
                position: (idx + 1) as i64,
            })
            .collect())
    }
}

impl Default for ReorderOperator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 去重并保留首次出现顺序
fn dedup_preserving_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .copied()
        .collect()
}
