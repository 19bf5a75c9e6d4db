//! 奖励实体定义
//!
//! 奖励由阈值判定触发、奖励发放器创建，`(customer_id, threshold_multiple)`
//! 是发放幂等的去重键。状态机：
//! `Unused -[redeem]-> Used（终态）`；`Unused -[expire sweep]-> Expired（终态）`。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{RewardStatus, RewardType};

/// 奖励
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    /// 会员 ID（反向引用，不代表所有权）
    pub customer_id: String,
    /// 奖励类型
    pub reward_type: RewardType,
    /// 展示用描述
    pub description: String,
    /// 奖励状态
    pub status: RewardStatus,
    /// 触发此奖励的阈值倍数（10、20、30 ...），发放去重键的组成部分
    pub threshold_multiple: i64,
    /// 发放时间
    pub earned_at: DateTime<Utc>,
    /// 使用时间（兑换后填写）
    #[sqlx(default)]
    pub used_at: Option<DateTime<Utc>>,
    /// 过期时间（null 表示永久有效）
    #[sqlx(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// 构建一条阈值达成的免费饮品奖励
    ///
    /// 过期时间按 `earned_at + expiry_days` 计算，之后不随配置变更回溯调整。
    pub fn free_drink(
        customer_id: impl Into<String>,
        threshold_multiple: i64,
        earned_at: DateTime<Utc>,
        expiry_days: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: customer_id.into(),
            reward_type: RewardType::FreeDrink,
            description: format!("累计 {} 积分赠饮一杯", threshold_multiple),
            status: RewardStatus::Unused,
            threshold_multiple,
            earned_at,
            used_at: None,
            expires_at: Some(earned_at + Duration::days(expiry_days)),
            created_at: earned_at,
            updated_at: earned_at,
        }
    }

    /// 是否已被使用
    pub fn is_used(&self) -> bool {
        self.status == RewardStatus::Used
    }

    /// 是否已过期
    ///
    /// 清扫任务尚未执行时，Unused 状态下 `expires_at` 已过也视为过期，
    /// 保证过期奖励在任何时刻都不可兑换。
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == RewardStatus::Expired
            || (self.status == RewardStatus::Unused
                && self.expires_at.is_some_and(|t| t <= now))
    }

    /// 是否可兑换
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == RewardStatus::Unused && !self.is_expired(now)
    }
}
