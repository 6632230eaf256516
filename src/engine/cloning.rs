// ==========================================
// 列车编组计算系统 - 车厢克隆引擎
// ==========================================
// 职责: 校验克隆数量并生成副本草稿 (位置紧跟源车厢)
// 说明: 草稿位置为最终位置; 调用方须在同一事务内先把
//       源之后的车厢整体后移 Q 位, 为 P+1..P+Q 腾出空档
// ==========================================

use crate::domain::wagon::{Wagon, WagonDraft};
use thiserror::Error;

/// 单次克隆的最小数量
pub const MIN_CLONE_QUANTITY: i64 = 1;

/// 单次克隆的最大数量
pub const MAX_CLONE_QUANTITY: i64 = 20;

/// 克隆引擎错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CloneError {
    #[error("克隆数量超出范围 (允许 {MIN_CLONE_QUANTITY}-{MAX_CLONE_QUANTITY}): quantity={quantity}")]
    QuantityOutOfRange { quantity: i64 },
}

// ==========================================
// CloneOperator - 车厢克隆引擎
// ==========================================
pub struct CloneOperator;

impl CloneOperator {
    pub fn new() -> Self {
        Self
    }

    /// 校验克隆数量
    pub fn validate_quantity(&self, quantity: i64) -> Result<(), CloneError> {
        if !(MIN_CLONE_QUANTITY..=MAX_CLONE_QUANTITY).contains(&quantity) {
            return Err(CloneError::QuantityOutOfRange { quantity });
        }
        Ok(())
    }

    /// 生成 Q 份副本草稿
    ///
    /// 每份副本逐字段复制源车厢的物理属性, 位置为
    /// `source.position + offset` (offset ∈ 1..=Q), 即按偏移顺序
    /// 紧跟在源车厢之后。调用方负责先为这些位置腾位。
    ///
    /// # 返回
    /// - Ok(Vec<WagonDraft>): 恰好 quantity 份草稿
    /// - Err(CloneError::QuantityOutOfRange): 数量越界
    pub fn drafts(
        &self,
        source: &Wagon,
        quantity: i64,
    ) -> Result<Vec<WagonDraft>, CloneError> {
        self.validate_quantity(quantity)?;

        Ok((1..=quantity)
            .map(|offset| WagonDraft::copy_of(source, source.position + offset))
            .collect())
    }
}

impl Default for CloneOperator {
    fn default() -> Self {
        Self::new()
    }
}
