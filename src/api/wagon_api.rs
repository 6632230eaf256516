// ==========================================
// 列车编组计算系统 - 车厢管理 API
// ==========================================
// 职责: 车厢 CRUD、克隆、重排序、位置归一化
// 不变量: 每个结构变更与其后的位置归一化落在同一事务内,
//         事务提交前位置紧凑不变量必须恢复
// 说明: 本层不做内部重试; 失败后修复条件再调用总是安全的
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::wagon::{PositionAssignment, Wagon, WagonDraft, WagonPatch};
use crate::engine::cloning::CloneOperator;
use crate::engine::ordering::{OrderingError, PositionNormalizer, ReorderOperator};
use crate::repository::wagon_repo::{WagonRepository, WagonTxn};
use crate::repository::{RepositoryError, RepositoryResult};

// ==========================================
// WagonApi - 车厢管理 API
// ==========================================

/// 车厢管理API
///
/// 职责：
/// 1. 车厢 CRUD (创建/查询/部分更新/删除)
/// 2. 克隆: 按源车厢复制 Q 节并插在其后
/// 3. 重排序: 全量替换编组顺序
/// 4. 位置归一化: 收敛到紧凑 1..N 序列
pub struct WagonApi {
    wagon_repo: Arc<WagonRepository>,
    normalizer: PositionNormalizer,
    reorder: ReorderOperator,
    cloner: CloneOperator,
}

impl WagonApi {
    /// 创建新的WagonApi实例
    pub fn new(wagon_repo: Arc<WagonRepository>) -> Self {
        Self {
            wagon_repo,
            normalizer: PositionNormalizer::new(),
            reorder: ReorderOperator::new(),
            cloner: CloneOperator::new(),
        }
    }

    /// 查询列车的全部车厢, 按 (position, id) 升序
    ///
    /// 说明: 列表查询不做列车存在性检查, 未知列车返回空列表。
    pub fn list_wagons(&self, train_id: i64) -> ApiResult<Vec<Wagon>> {
        Ok(self.wagon_repo.list_by_train(train_id)?)
    }

    /// 创建车厢并归一化位置
    ///
    /// 列车存在性在事务内检查, 与插入原子; 并发删除列车
    /// 不会把未找到劣化成外键错误。
    ///
    /// # 返回
    /// - Ok(Wagon): 归一化后重读的车厢 (位置可能已被收敛)
    /// - Err(ApiError::NotFound): 列车不存在
    /// - Err(ApiError::InvalidInput): 字段校验失败
    pub fn create_wagon(&self, train_id: i64, draft: &WagonDraft) -> ApiResult<Wagon> {
        validator::validate_wagon_draft(draft)?;

        let wagon = self.wagon_repo.in_transaction(|txn| {
            if !txn.train_exists(train_id)? {
                return Err(train_missing(train_id));
            }

            let inserted = txn.insert(train_id, draft)?;
            self.normalize_in_txn(txn, train_id)?;
            txn.find(inserted.id)?.ok_or_else(|| {
                RepositoryError::InternalError(format!(
                    "新建车厢(id={})归一化后丢失",
                    inserted.id
                ))
            })
        });

        let wagon = wagon.map_err(|e| train_not_found_or(e, train_id))?;
        tracing::info!(train_id, wagon_id = wagon.id, position = wagon.position, "车厢已创建");
        Ok(wagon)
    }

    /// 部分更新车厢并归一化位置
    ///
    /// # 返回
    /// - Ok(Wagon): 归一化后重读的车厢
    /// - Err(ApiError::NotFound): 车厢不存在或不属于该列车
    pub fn update_wagon(
        &self,
        train_id: i64,
        wagon_id: i64,
        patch: &WagonPatch,
    ) -> ApiResult<Wagon> {
        validator::validate_wagon_patch(patch)?;

        let wagon = self.wagon_repo.in_transaction(|txn| {
            let existing = txn.find(wagon_id)?;
            match existing {
                Some(w) if w.train_id == train_id => {}
                _ => return Err(wagon_missing(wagon_id)),
            }

            txn.update(wagon_id, patch)?;
            self.normalize_in_txn(txn, train_id)?;
            txn.find(wagon_id)?.ok_or_else(|| wagon_missing(wagon_id))
        });

        let wagon = wagon.map_err(|e| wagon_not_found_or(e, wagon_id))?;
        tracing::info!(train_id, wagon_id, "车厢已更新");
        Ok(wagon)
    }

    /// 删除车厢并归一化位置
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 车厢不存在或不属于该列车
    pub fn delete_wagon(&self, train_id: i64, wagon_id: i64) -> ApiResult<()> {
        let result = self.wagon_repo.in_transaction(|txn| {
            let existing = txn.find(wagon_id)?;
            match existing {
                Some(w) if w.train_id == train_id => {}
                _ => return Err(wagon_missing(wagon_id)),
            }

            txn.delete(wagon_id)?;
            self.normalize_in_txn(txn, train_id)?;
            Ok(())
        });

        result.map_err(|e| wagon_not_found_or(e, wagon_id))?;
        tracing::info!(train_id, wagon_id, "车厢已删除");
        Ok(())
    }

    /// 克隆车厢: 复制 Q 节并插在源车厢之后
    ///
    /// 事务内先把源之后的车厢整体后移 Q 位腾出空档,
    /// 再把副本插入 P+1..P+Q; 源之前的车厢不动,
    /// 其后车厢统一后移 Q 位, 副本恰好紧跟源车厢。
    ///
    /// # 返回
    /// - Ok(Vec<Wagon>): 恰好 quantity 节新车厢, 按最终位置排序
    /// - Err(ApiError::NotFound): 源车厢不存在或不属于该列车
    /// - Err(ApiError::InvalidInput): 数量越界 (允许 1-20)
    pub fn clone_wagons(
        &self,
        train_id: i64,
        wagon_id: i64,
        quantity: i64,
    ) -> ApiResult<Vec<Wagon>> {
        self.cloner.validate_quantity(quantity)?;

        let clones = self.wagon_repo.in_transaction(|txn| {
            let source = match txn.find(wagon_id)? {
                Some(w) if w.train_id == train_id => w,
                _ => return Err(wagon_missing(wagon_id)),
            };

            // 腾位: 源之后的车厢全部后移 Q, 空出 P+1..P+Q
            let current = txn.list_by_train(train_id)?;
            let shift: Vec<PositionAssignment> = current
                .iter()
                .filter(|w| w.position > source.position)
                .map(|w| PositionAssignment {
                    wagon_id: w.id,
                    position: w.position + quantity,
                })
                .collect();
            txn.apply_positions(&shift)?;

            // 数量已在事务外校验过, 此处不会失败
            let drafts = self
                .cloner
                .drafts(&source, quantity)
                .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

            let mut clone_ids = Vec::with_capacity(drafts.len());
            for draft in &drafts {
                let clone = txn.insert(train_id, draft)?;
                clone_ids.push(clone.id);
            }

            // 腾位后序列已紧凑, 此处归一化为幂等保障
            self.normalize_in_txn(txn, train_id)?;
            txn.find_by_ids_ordered(&clone_ids)
        });

        let clones = clones.map_err(|e| wagon_not_found_or(e, wagon_id))?;
        tracing::info!(train_id, wagon_id, quantity, "车厢克隆完成");
        Ok(clones)
    }

    /// 重排序: 以调用方给出的 id 序列全量替换编组顺序
    ///
    /// 引擎校验失败时错误从闭包直接上抛, 事务回滚, 无任何写入。
    ///
    /// # 返回
    /// - Ok(Vec<Wagon>): 重读后的全部车厢, 顺序与输入一致
    /// - Err(ApiError::ValidationError): 空序列或 id 集合不一致
    /// - Err(ApiError::NotFound): 列车没有车厢
    pub fn reorder_wagons(&self, train_id: i64, wagon_ids: &[i64]) -> ApiResult<Vec<Wagon>> {
        let wagons = self.wagon_repo.in_transaction(|txn| {
            let current = txn.list_by_train(train_id)?;
            let plan = self
                .reorder
                .plan(&current, wagon_ids)
                .map_err(|e| RepositoryError::Other(anyhow::Error::new(e)))?;

            txn.apply_positions(&plan)?;
            txn.list_by_train(train_id)
        });

        let wagons = wagons.map_err(ordering_failure_or)?;
        tracing::info!(train_id, wagon_count = wagons.len(), "编组顺序已替换");
        Ok(wagons)
    }

    /// 位置归一化 (幂等清理口)
    ///
    /// # 返回
    /// - Ok(usize): 实际写入条数; 已紧凑的编组返回 0
    pub fn normalize(&self, train_id: i64) -> ApiResult<usize> {
        let rewrites = self
            .wagon_repo
            .in_transaction(|txn| self.normalize_in_txn(txn, train_id))?;

        tracing::debug!(train_id, rewrites, "位置归一化完成");
        Ok(rewrites)
    }

    /// 事务作用域内的归一化: 读当前编组 → 算方案 → 批量写入
    fn normalize_in_txn(
        &self,
        txn: &WagonTxn<'_>,
        train_id: i64,
    ) -> RepositoryResult<usize> {
        let wagons = txn.list_by_train(train_id)?;
        let plan = self.normalizer.plan(&wagons);
        txn.apply_positions(&plan)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 事务闭包内的"列车未找到"哨兵错误
fn train_missing(train_id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Train".to_string(),
        id: train_id.to_string(),
    }
}

/// 事务闭包内的"车厢未找到"哨兵错误
fn wagon_missing(wagon_id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Wagon".to_string(),
        id: wagon_id.to_string(),
    }
}

/// 将事务内的列车未找到哨兵译为 API 层的 NotFound, 其余错误正常转换
fn train_not_found_or(err: RepositoryError, train_id: i64) -> ApiError {
    match err {
        RepositoryError::NotFound { entity, .. } if entity == "Train" => {
            ApiError::NotFound(format!("列车(id={})不存在", train_id))
        }
        other => other.into(),
    }
}

/// 将事务内的车厢未找到哨兵译为 API 层的 NotFound, 其余错误正常转换
fn wagon_not_found_or(err: RepositoryError, wagon_id: i64) -> ApiError {
    match err {
        RepositoryError::NotFound { entity, .. } if entity == "Wagon" => {
            ApiError::NotFound(format!("车厢(id={})不存在或不属于该列车", wagon_id))
        }
        other => other.into(),
    }
}

/// 还原从事务内包裹上抛的排序引擎错误, 其余错误正常转换
fn ordering_failure_or(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Other(inner) => match inner.downcast::<OrderingError>() {
            Ok(ordering) => ordering.into(),
            Err(inner) => ApiError::Other(inner),
        },
        other => other.into(),
    }
}
