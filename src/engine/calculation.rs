// ==========================================
// 列车编组计算系统 - 聚合计算引擎
// ==========================================
// 职责: 由车厢集合派生列车级物理量 (总长/总重/制动率)
// 红线: 纯函数, 无副作用, 不接触数据库
// 舍入策略: 仅在最终输出处保留两位小数,
//           采用 f64::round 的"四舍五入远离零"语义;
//           中间累加保持全精度, 避免逐节车厢累积舍入误差
// ==========================================

use crate::domain::wagon::WagonMetrics;
use serde::{Deserialize, Serialize};

// ==========================================
// TrainCalculation - 列车聚合结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainCalculation {
    pub train_length_m: f64,     // 列车总长 (米)
    pub train_weight_t: f64,     // 列车总重 (吨)
    pub braking_percentage: f64, // 制动率 (%)
}

// ==========================================
// CalculationEngine - 聚合计算引擎
// ==========================================
pub struct CalculationEngine;

impl CalculationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算列车聚合物理量
    ///
    /// 求和与顺序无关; 空编组返回 (0.0, 0.0, 0.0)。
    /// 总重为 0 时制动率定义为 0.0, 不产生除零错误。
    pub fn calculate<W: WagonMetrics>(&self, wagons: &[W]) -> TrainCalculation {
        let mut length = 0.0;
        let mut weight = 0.0;
        let mut braked_weight = 0.0;

        for wagon in wagons {
            length += wagon.length_m();
            weight += wagon.total_weight_t();
            braked_weight += wagon.braked_weight_t();
        }

        let braking_percentage = if weight > 0.0 {
            (braked_weight / weight) * 100.0
        } else {
            0.0
        };

        TrainCalculation {
            train_length_m: round2(length),
            train_weight_t: round2(weight),
            braking_percentage: round2(braking_percentage),
        }
    }
}

impl Default for CalculationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 保留两位小数 (四舍五入, 远离零)
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
