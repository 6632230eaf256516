// ==========================================
// 列车编组计算系统 - 输入校验器
// ==========================================
// 职责: 字段级约束校验 (长度上限/数值范围), 在落库前拦截坏数据
// 说明: 数值约束用取反写法 (!(v > 0.0)) 同时拦截 NaN
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::train::{TrainDraft, TrainPatch, MAX_TRAIN_DESCRIPTION_LEN, MAX_TRAIN_NAME_LEN};
use crate::domain::wagon::{WagonDraft, WagonPatch, MAX_BRAKE_TYPE_LEN, MAX_IDENTIFIER_LEN};

// ==========================================
// 列车字段校验
// ==========================================

/// 校验列车创建载体
pub fn validate_train_draft(draft: &TrainDraft) -> ApiResult<()> {
    validate_train_name(&draft.name)?;
    if let Some(description) = &draft.description {
        validate_train_description(description)?;
    }
    Ok(())
}

/// 校验列车更新补丁
pub fn validate_train_patch(patch: &TrainPatch) -> ApiResult<()> {
    if let Some(name) = &patch.name {
        validate_train_name(name)?;
    }
    if let Some(Some(description)) = &patch.description {
        validate_train_description(description)?;
    }
    Ok(())
}

fn validate_train_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("列车名称不能为空".to_string()));
    }
    if name.chars().count() > MAX_TRAIN_NAME_LEN {
        return Err(ApiError::InvalidInput(format!(
            "列车名称超长 (最多{}字符)",
            MAX_TRAIN_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_train_description(description: &str) -> ApiResult<()> {
    if description.chars().count() > MAX_TRAIN_DESCRIPTION_LEN {
        return Err(ApiError::InvalidInput(format!(
            "列车描述超长 (最多{}字符)",
            MAX_TRAIN_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

// ==========================================
// 车厢字段校验
// ==========================================

/// 校验车厢创建载体
pub fn validate_wagon_draft(draft: &WagonDraft) -> ApiResult<()> {
    validate_position(draft.position)?;
    validate_length_m(draft.length_m)?;
    validate_weight(draft.tare_weight_t, "自重")?;
    validate_weight(draft.load_weight_t, "载重")?;
    validate_weight(draft.braked_weight_t, "制动重量")?;
    if let Some(identifier) = &draft.identifier {
        validate_identifier(identifier)?;
    }
    if let Some(brake_type) = &draft.brake_type {
        validate_brake_type(brake_type)?;
    }
    if let Some(axle_count) = draft.axle_count {
        validate_axle_count(axle_count)?;
    }
    Ok(())
}

/// 校验车厢更新补丁
pub fn validate_wagon_patch(patch: &WagonPatch) -> ApiResult<()> {
    if let Some(position) = patch.position {
        validate_position(position)?;
    }
    if let Some(length_m) = patch.length_m {
        validate_length_m(length_m)?;
    }
    if let Some(tare_weight_t) = patch.tare_weight_t {
        validate_weight(tare_weight_t, "自重")?;
    }
    if let Some(load_weight_t) = patch.load_weight_t {
        validate_weight(load_weight_t, "载重")?;
    }
    if let Some(braked_weight_t) = patch.braked_weight_t {
        validate_weight(braked_weight_t, "制动重量")?;
    }
    if let Some(Some(identifier)) = &patch.identifier {
        validate_identifier(identifier)?;
    }
    if let Some(Some(brake_type)) = &patch.brake_type {
        validate_brake_type(brake_type)?;
    }
    if let Some(Some(axle_count)) = patch.axle_count {
        validate_axle_count(axle_count)?;
    }
    Ok(())
}

fn validate_position(position: i64) -> ApiResult<()> {
    if position < 1 {
        return Err(ApiError::InvalidInput(format!(
            "编组位置必须≥1: position={}",
            position
        )));
    }
    Ok(())
}

fn validate_length_m(length_m: f64) -> ApiResult<()> {
    if !(length_m > 0.0) || !length_m.is_finite() {
        return Err(ApiError::InvalidInput(format!(
            "车长必须为正数: length_m={}",
            length_m
        )));
    }
    Ok(())
}

fn validate_weight(weight_t: f64, field: &str) -> ApiResult<()> {
    if !(weight_t >= 0.0) || !weight_t.is_finite() {
        return Err(ApiError::InvalidInput(format!(
            "{}不能为负: value={}",
            field, weight_t
        )));
    }
    Ok(())
}

fn validate_identifier(identifier: &str) -> ApiResult<()> {
    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ApiError::InvalidInput(format!(
            "车厢号超长 (最多{}字符)",
            MAX_IDENTIFIER_LEN
        )));
    }
    Ok(())
}

fn validate_brake_type(brake_type: &str) -> ApiResult<()> {
    if brake_type.chars().count() > MAX_BRAKE_TYPE_LEN {
        return Err(ApiError::InvalidInput(format!(
            "制动类型超长 (最多{}字符)",
            MAX_BRAKE_TYPE_LEN
        )));
    }
    Ok(())
}

fn validate_axle_count(axle_count: i64) -> ApiResult<()> {
    if axle_count < 0 {
        return Err(ApiError::InvalidInput(format!(
            "轴数不能为负: axle_count={}",
            axle_count
        )));
    }
    Ok(())
}
