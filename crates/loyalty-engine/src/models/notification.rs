//! 通知实体定义
//!
//! 通知由通知分发器创建，`(customer_id, notification_type, causing_id)`
//! 为去重键：同一因果事件最多产生一条通知。通知只会被"已读"确认修改，
//! 不会被删除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::NotificationType;

/// 站内通知
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    /// 会员 ID
    pub customer_id: String,
    /// 通知类型
    pub notification_type: NotificationType,
    /// 展示内容
    pub message: String,
    /// 因果标识：触发此通知的订单 ID、奖励 ID 或里程碑标识
    pub causing_id: String,
    /// 是否已读
    pub is_read: bool,
    /// 已读时间
    #[sqlx(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 构建新通知（未读）
    pub fn new(
        customer_id: impl Into<String>,
        notification_type: NotificationType,
        message: impl Into<String>,
        causing_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: customer_id.into(),
            notification_type,
            message: message.into(),
            causing_id: causing_id.into(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// 去重键的字符串形式（用于日志）
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{:?}:{}",
            self.customer_id, self.notification_type, self.causing_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_is_unread() {
        let notification = Notification::new(
            "cust-123",
            NotificationType::PointsAdded,
            "积分 +1",
            "order-1001",
        );

        assert!(!notification.is_read);
        assert!(notification.read_at.is_none());
        assert_eq!(notification.causing_id, "order-1001");
    }

    #[test]
    fn test_dedup_key_contains_all_parts() {
        let notification = Notification::new(
            "cust-123",
            NotificationType::RewardEarned,
            "获得赠饮",
            "rw-42",
        );

        let key = notification.dedup_key();
        assert!(key.contains("cust-123"));
        assert!(key.contains("RewardEarned"));
        assert!(key.contains("rw-42"));
    }

    #[test]
    fn test_notification_serde_camel_case() {
        let notification = Notification::new(
            "cust-123",
            NotificationType::MilestoneReached,
            "达成 50 次消费",
            "milestone-50",
        );
        let json = serde_json::to_string(&notification).unwrap();

        assert!(json.contains("customerId"));
        assert!(json.contains("notificationType"));
        assert!(json.contains("causingId"));
        assert!(json.contains("isRead"));
        assert!(json.contains("MILESTONE_REACHED"));
    }
}
