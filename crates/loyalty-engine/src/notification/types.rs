//! 通知管道类型定义

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NotificationType;

/// 积分管道产生的通知事件
///
/// 通知分发器按事件构造去重键 `(customer_id, 通知类型, 因果标识)`：
/// 积分到账以订单 ID 为因果标识，获得奖励以奖励 ID，里程碑以里程碑值。
#[derive(Debug, Clone)]
pub enum LoyaltyEvent {
    /// 积分到账
    PointsAdded {
        customer_id: String,
        order_id: String,
        points_delta: i64,
        balance_after: i64,
    },
    /// 获得奖励
    RewardEarned {
        customer_id: String,
        reward_id: Uuid,
        threshold_multiple: i64,
        points_after: i64,
    },
    /// 达成消费里程碑
    MilestoneReached {
        customer_id: String,
        milestone: i64,
    },
}

impl LoyaltyEvent {
    /// 事件对应的通知类型
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::PointsAdded { .. } => NotificationType::PointsAdded,
            Self::RewardEarned { .. } => NotificationType::RewardEarned,
            Self::MilestoneReached { .. } => NotificationType::MilestoneReached,
        }
    }

    /// 事件归属的会员
    pub fn customer_id(&self) -> &str {
        match self {
            Self::PointsAdded { customer_id, .. }
            | Self::RewardEarned { customer_id, .. }
            | Self::MilestoneReached { customer_id, .. } => customer_id,
        }
    }

    /// 去重键中的因果标识
    pub fn causing_id(&self) -> String {
        match self {
            Self::PointsAdded { order_id, .. } => order_id.clone(),
            Self::RewardEarned { reward_id, .. } => reward_id.to_string(),
            Self::MilestoneReached { milestone, .. } => format!("milestone-{}", milestone),
        }
    }
}

/// 出站邮件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    /// 收件人地址
    pub to: String,
    /// 主题
    pub subject: String,
    /// HTML 正文
    pub html_body: String,
}

/// 投递回执
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    /// 邮件服务商返回的消息 ID
    pub message_id: String,
}
