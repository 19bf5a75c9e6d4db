//! 查询服务
//!
//! 面向展示层的只读查询入口。响应必须严格反映终态不变量：
//! 已兑换或已过期的奖励绝不会再以可兑换形态出现。

use std::sync::Arc;

use tracing::instrument;

use crate::error::{EngineError, Result};
use crate::models::{Customer, Notification, Reward};
use crate::repository::{
    CustomerRepositoryTrait, NotificationRepositoryTrait, RewardRepositoryTrait,
};

/// 查询服务
pub struct QueryService {
    customers: Arc<dyn CustomerRepositoryTrait>,
    rewards: Arc<dyn RewardRepositoryTrait>,
    notifications: Arc<dyn NotificationRepositoryTrait>,
}

impl QueryService {
    pub fn new(
        customers: Arc<dyn CustomerRepositoryTrait>,
        rewards: Arc<dyn RewardRepositoryTrait>,
        notifications: Arc<dyn NotificationRepositoryTrait>,
    ) -> Self {
        Self {
            customers,
            rewards,
            notifications,
        }
    }

    /// 按积分阈值列出符合条件的会员（不含已归档）
    #[instrument(skip(self))]
    pub async fn list_eligible_customers(&self, threshold: i64) -> Result<Vec<Customer>> {
        if threshold < 0 {
            return Err(EngineError::Validation("阈值不能为负数".to_string()));
        }
        self.customers.list_eligible(threshold).await
    }

    /// 会员的奖励墙（全部状态，发放时间倒序）
    #[instrument(skip(self))]
    pub async fn list_customer_rewards(&self, customer_id: &str) -> Result<Vec<Reward>> {
        // 先确认会员存在，避免把"会员不存在"误报为空列表
        if self.customers.get_customer(customer_id).await?.is_none() {
            return Err(EngineError::CustomerNotFound(customer_id.to_string()));
        }
        self.rewards.list_by_customer(customer_id).await
    }

    /// 未读通知列表，`customer_id` 为 None 时返回全部
    #[instrument(skip(self))]
    pub async fn list_unread_notifications(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<Notification>> {
        self.notifications.list_unread(customer_id).await
    }
}
