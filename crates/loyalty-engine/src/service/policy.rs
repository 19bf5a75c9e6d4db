//! 奖励判定策略
//!
//! 纯函数实现的阈值穿越判定：不读钟、不写状态，相同输入必然产生相同
//! 输出，可单独做单元测试。穿越判定比较 before/after 两个积分快照与
//! 阈值阶梯（10、20、30 ...），因此一次性跳过阈值的批量记账
//! （如 8 -> 15）同样会触发。

use serde::Serialize;

use loyalty_shared::config::RewardRuleConfig;

use crate::models::RewardType;

/// 一次奖励发放决定
///
/// 一次记账可能穿越多个阈值倍数（如 5 -> 25 穿越 10 和 20），
/// 每个被穿越的倍数产生一条独立的发放决定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardDecision {
    /// 被穿越的阈值倍数
    pub threshold_multiple: i64,
    /// 应发放的奖励类型
    pub reward_type: RewardType,
}

/// 返回 `(before, after]` 区间内所有 `step` 的整数倍
///
/// 穿越定义：积分从严格低于某倍数变为大于等于该倍数。
pub fn crossed_multiples(before: i64, after: i64, step: i64) -> Vec<i64> {
    if step <= 0 || after <= before {
        return Vec::new();
    }

    // 第一个严格大于 before 的倍数
    let first = (before.max(0) / step + 1) * step;

    (0..)
        .map(|k| first + k * step)
        .take_while(|&m| m <= after)
        .collect()
}

/// 奖励判定策略
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    rule: RewardRuleConfig,
}

impl RewardPolicy {
    pub fn new(rule: RewardRuleConfig) -> Self {
        Self { rule }
    }

    /// 规则配置
    pub fn rule(&self) -> &RewardRuleConfig {
        &self.rule
    }

    /// 判定一次记账穿越了哪些奖励阈值
    ///
    /// 引用透明：不消耗状态，重复调用产生相同结果。
    /// "该倍数是否已发放过"不在此处判定，由发放器的去重键保证。
    pub fn evaluate(&self, points_before: i64, points_after: i64) -> Vec<RewardDecision> {
        crossed_multiples(points_before, points_after, self.rule.points_for_free_drink)
            .into_iter()
            .map(|threshold_multiple| RewardDecision {
                threshold_multiple,
                reward_type: RewardType::FreeDrink,
            })
            .collect()
    }

    /// 判定一次记账达成了哪些消费次数里程碑
    pub fn milestones_reached(&self, purchases_before: i64, purchases_after: i64) -> Vec<i64> {
        self.rule
            .purchase_milestones
            .iter()
            .copied()
            .filter(|&m| purchases_before < m && m <= purchases_after)
            .collect()
    }
}
