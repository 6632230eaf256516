// ==========================================
// 列车编组计算系统 - 列车管理 API
// ==========================================
// 职责: 列车 CRUD 与聚合计算查询
// 说明: 删除列车为显式级联 (同事务删除其全部车厢)
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::train::{Train, TrainDraft, TrainPatch};
use crate::engine::calculation::{CalculationEngine, TrainCalculation};
use crate::repository::train_repo::TrainRepository;
use crate::repository::wagon_repo::WagonRepository;

// ==========================================
// TrainApi - 列车管理 API
// ==========================================

/// 列车管理API
///
/// 职责：
/// 1. 列车 CRUD (创建/查询/部分更新/删除)
/// 2. 列车级聚合计算 (总长/总重/制动率)
pub struct TrainApi {
    train_repo: Arc<TrainRepository>,
    wagon_repo: Arc<WagonRepository>,
    calculation: CalculationEngine,
}

impl TrainApi {
    /// 创建新的TrainApi实例
    pub fn new(train_repo: Arc<TrainRepository>, wagon_repo: Arc<WagonRepository>) -> Self {
        Self {
            train_repo,
            wagon_repo,
            calculation: CalculationEngine::new(),
        }
    }

    /// 查询全部列车, 最新创建的在前
    pub fn list_trains(&self) -> ApiResult<Vec<Train>> {
        Ok(self.train_repo.list_all()?)
    }

    /// 创建列车
    ///
    /// # 返回
    /// - Ok(Train): 落库后的列车 (含 id 与时间戳)
    /// - Err(ApiError::InvalidInput): 字段校验失败
    pub fn create_train(&self, draft: &TrainDraft) -> ApiResult<Train> {
        validator::validate_train_draft(draft)?;

        let train = self.train_repo.create(draft)?;
        tracing::info!(train_id = train.id, name = %train.name, "列车已创建");
        Ok(train)
    }

    /// 按 id 查询列车
    ///
    /// # 返回
    /// - Ok(Train): 列车
    /// - Err(ApiError::NotFound): 列车不存在
    pub fn get_train(&self, train_id: i64) -> ApiResult<Train> {
        self.train_repo
            .find_by_id(train_id)?
            .ok_or_else(|| train_not_found(train_id))
    }

    /// 部分更新列车
    ///
    /// 补丁语义: `None` 保持原值, `description: Some(None)` 显式清空。
    pub fn update_train(&self, train_id: i64, patch: &TrainPatch) -> ApiResult<Train> {
        validator::validate_train_patch(patch)?;

        if !self.train_repo.exists(train_id)? {
            return Err(train_not_found(train_id));
        }

        self.train_repo.update(train_id, patch)?;
        tracing::info!(train_id, "列车已更新");

        self.train_repo
            .find_by_id(train_id)?
            .ok_or_else(|| train_not_found(train_id))
    }

    /// 删除列车及其全部车厢
    pub fn delete_train(&self, train_id: i64) -> ApiResult<()> {
        if !self.train_repo.exists(train_id)? {
            return Err(train_not_found(train_id));
        }

        self.train_repo.delete(train_id)?;
        tracing::info!(train_id, "列车及其车厢已删除");
        Ok(())
    }

    /// 计算列车聚合物理量
    ///
    /// # 返回
    /// - Ok(TrainCalculation): 总长/总重/制动率 (两位小数)
    /// - Err(ApiError::NotFound): 列车不存在
    pub fn get_calculation(&self, train_id: i64) -> ApiResult<TrainCalculation> {
        if !self.train_repo.exists(train_id)? {
            return Err(train_not_found(train_id));
        }

        let wagons = self.wagon_repo.list_by_train(train_id)?;
        Ok(self.calculation.calculate(&wagons))
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn train_not_found(train_id: i64) -> ApiError {
    ApiError::NotFound(format!("列车(id={})不存在", train_id))
}
