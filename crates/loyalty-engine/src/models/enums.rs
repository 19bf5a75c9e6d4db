//! 积分引擎枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 奖励类型
///
/// 区分阈值达成后发放的奖励形态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    /// 免费饮品 - 积分阈值达成的默认奖励
    #[default]
    FreeDrink,
    /// 折扣 - 下一单按比例减免
    Discount,
    /// 赠送积分 - 直接追加积分
    BonusPoints,
}

/// 奖励状态
///
/// 追踪奖励的生命周期。Used 与 Expired 为终态，没有任何转移能离开它们。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RewardStatus {
    /// 未使用 - 可兑换
    #[default]
    Unused,
    /// 已使用 - 兑换完成（终态）
    Used,
    /// 已过期 - 超过有效期由清扫任务转移（终态）
    Expired,
}

impl RewardStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Expired)
    }
}

/// 通知类型
///
/// 不同通知类型对应不同的消息模板，同时参与通知去重键的构成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// 获得奖励
    RewardEarned,
    /// 积分到账
    PointsAdded,
    /// 达成消费里程碑
    MilestoneReached,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_status_terminal() {
        assert!(!RewardStatus::Unused.is_terminal());
        assert!(RewardStatus::Used.is_terminal());
        assert!(RewardStatus::Expired.is_terminal());
    }

    #[test]
    fn test_enum_serde_format() {
        let json = serde_json::to_string(&RewardType::FreeDrink).unwrap();
        assert_eq!(json, "\"FREE_DRINK\"");

        let json = serde_json::to_string(&NotificationType::RewardEarned).unwrap();
        assert_eq!(json, "\"REWARD_EARNED\"");

        let parsed: NotificationType = serde_json::from_str("\"POINTS_ADDED\"").unwrap();
        assert_eq!(parsed, NotificationType::PointsAdded);
    }

    #[test]
    fn test_reward_type_default() {
        assert_eq!(RewardType::default(), RewardType::FreeDrink);
        assert_eq!(RewardStatus::default(), RewardStatus::Unused);
    }
}
