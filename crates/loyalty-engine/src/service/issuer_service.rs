//! 奖励发放服务
//!
//! 处理奖励生命周期的核心业务逻辑：
//! - 按阈值判定结果发放奖励，`(customer_id, threshold_multiple)` 幂等
//! - 兑换：区分"已使用"与"已过期"两种冲突
//! - 过期清扫：把到期的 Unused 奖励批量转移为 Expired
//!
//! ## 幂等性
//!
//! 重复发放通过仓储层的持久化去重键识别，而不是重新评估积分——
//! 同一阈值倍数的再次发放是无操作，返回已存在的奖励记录。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use loyalty_shared::config::RewardRuleConfig;

use crate::error::{EngineError, Result};
use crate::models::{Reward, RewardStatus};
use crate::repository::RewardRepositoryTrait;
use crate::service::policy::RewardDecision;

/// 一次发放操作的结果
#[derive(Debug, Clone)]
pub struct IssueOutcome {
    /// 发放（或已存在）的奖励
    pub reward: Reward,
    /// 是否为本次新发放
    pub newly_issued: bool,
}

/// 奖励发放服务
pub struct IssuerService {
    rewards: Arc<dyn RewardRepositoryTrait>,
    rule: RewardRuleConfig,
}

impl IssuerService {
    pub fn new(rewards: Arc<dyn RewardRepositoryTrait>, rule: RewardRuleConfig) -> Self {
        Self { rewards, rule }
    }

    /// 发放奖励
    ///
    /// 过期时间按发放时刻的配置计算（`earned_at + reward_expiry_days`），
    /// 配置后续变更不回溯已发放的奖励。
    #[instrument(skip(self, decision), fields(customer_id = %customer_id, threshold = decision.threshold_multiple))]
    pub async fn issue(
        &self,
        customer_id: &str,
        decision: &RewardDecision,
        now: DateTime<Utc>,
    ) -> Result<IssueOutcome> {
        let reward = Reward::free_drink(
            customer_id,
            decision.threshold_multiple,
            now,
            self.rule.reward_expiry_days,
        );

        let (reward, newly_issued) = self.rewards.insert_if_absent(&reward).await?;

        if newly_issued {
            info!(
                customer_id = %customer_id,
                reward_id = %reward.id,
                threshold = decision.threshold_multiple,
                expires_at = ?reward.expires_at,
                "奖励发放成功"
            );
        } else {
            info!(
                customer_id = %customer_id,
                reward_id = %reward.id,
                threshold = decision.threshold_multiple,
                "幂等请求，返回已存在的奖励"
            );
        }

        Ok(IssueOutcome {
            reward,
            newly_issued,
        })
    }

    /// 兑换奖励
    ///
    /// 仅 Unused 且未过期的奖励可兑换。条件更新未命中时查询当前状态，
    /// 给出精确的冲突原因（已使用 / 已过期 / 不存在），前端依赖这些
    /// 错误码向顾客解释兑换失败的原因。
    #[instrument(skip(self))]
    pub async fn redeem(&self, reward_id: Uuid, now: DateTime<Utc>) -> Result<Reward> {
        if let Some(reward) = self.rewards.try_mark_used(reward_id, now).await? {
            info!(
                reward_id = %reward_id,
                customer_id = %reward.customer_id,
                used_at = ?reward.used_at,
                "奖励兑换成功"
            );
            return Ok(reward);
        }

        match self.rewards.get_reward(reward_id).await? {
            None => Err(EngineError::RewardNotFound(reward_id)),
            Some(reward) if reward.status == RewardStatus::Used => {
                Err(EngineError::RewardAlreadyUsed(reward_id))
            }
            // Expired 状态，或清扫尚未执行但有效期已过
            Some(reward) if reward.is_expired(now) => Err(EngineError::RewardExpired(reward_id)),
            // 条件更新与状态读取之间被并发兑换抢先
            Some(_) => Err(EngineError::ConcurrencyConflict),
        }
    }

    /// 过期清扫
    ///
    /// 由调度任务周期性调用，把所有到期的 Unused 奖励转移为 Expired
    /// 并返回用于报表。重复调用是安全的：已过期的奖励会被跳过。
    #[instrument(skip(self))]
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Reward>> {
        let expired = self.rewards.expire_due(now).await?;

        if expired.is_empty() {
            return Ok(expired);
        }

        info!(count = expired.len(), "过期清扫完成");
        for reward in &expired {
            warn!(
                reward_id = %reward.id,
                customer_id = %reward.customer_id,
                expires_at = ?reward.expires_at,
                "奖励已过期未使用"
            );
        }

        Ok(expired)
    }

    /// 查询奖励
    pub async fn get_reward(&self, reward_id: Uuid) -> Result<Reward> {
        self.rewards
            .get_reward(reward_id)
            .await?
            .ok_or(EngineError::RewardNotFound(reward_id))
    }
}
