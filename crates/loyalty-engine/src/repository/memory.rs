//! 内存仓储实现
//!
//! 与 PostgreSQL 实现语义一致的内存版仓储，用于本地演示和无外部依赖的
//! 集成测试。所有条件更新都在写锁内完成，与数据库侧的原子语句等价。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{
    CustomerRepositoryTrait, NotificationRepositoryTrait, ProcessedEventRepositoryTrait,
    RewardRepositoryTrait,
};
use crate::error::{EngineError, Result};
use crate::models::{Customer, Notification, Reward, RewardStatus};

/// 内存会员仓储
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<String, Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置会员（测试辅助）
    pub async fn seed(&self, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
    }
}

#[async_trait]
impl CustomerRepositoryTrait for InMemoryCustomerRepository {
    async fn get_customer(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        if customers.contains_key(&customer.id) {
            return Err(EngineError::CustomerAlreadyExists(customer.id.clone()));
        }
        customers.insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn accrue_points(
        &self,
        id: &str,
        points_delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<Customer> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| EngineError::CustomerNotFound(id.to_string()))?;

        if customer.is_archived {
            return Err(EngineError::CustomerArchived(id.to_string()));
        }

        customer.loyalty_points += points_delta;
        customer.total_purchases += 1;
        customer.last_purchase_at = Some(occurred_at);
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn deduct_points(&self, id: &str, points: i64) -> Result<Customer> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| EngineError::CustomerNotFound(id.to_string()))?;

        if customer.loyalty_points < points {
            return Err(EngineError::InsufficientPoints {
                required: points,
                available: customer.loyalty_points,
            });
        }

        customer.loyalty_points -= points;
        customer.updated_at = Utc::now();
        Ok(customer.clone())
    }

    async fn archive_customer(&self, id: &str) -> Result<()> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(id)
            .ok_or_else(|| EngineError::CustomerNotFound(id.to_string()))?;

        customer.is_archived = true;
        customer.updated_at = Utc::now();
        Ok(())
    }

    async fn list_eligible(&self, threshold: i64) -> Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        let mut eligible: Vec<Customer> = customers
            .values()
            .filter(|c| c.is_eligible(threshold))
            .cloned()
            .collect();
        eligible.sort_by(|a, b| {
            b.loyalty_points
                .cmp(&a.loyalty_points)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(eligible)
    }
}

/// 内存奖励仓储
#[derive(Default)]
pub struct InMemoryRewardRepository {
    rewards: RwLock<HashMap<Uuid, Reward>>,
}

impl InMemoryRewardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, reward: Reward) {
        self.rewards.write().await.insert(reward.id, reward);
    }
}

#[async_trait]
impl RewardRepositoryTrait for InMemoryRewardRepository {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
        Ok(self.rewards.read().await.get(&id).cloned())
    }

    async fn insert_if_absent(&self, reward: &Reward) -> Result<(Reward, bool)> {
        let mut rewards = self.rewards.write().await;

        // 去重键：(customer_id, threshold_multiple)
        if let Some(existing) = rewards.values().find(|r| {
            r.customer_id == reward.customer_id
                && r.threshold_multiple == reward.threshold_multiple
        }) {
            return Ok((existing.clone(), false));
        }

        rewards.insert(reward.id, reward.clone());
        Ok((reward.clone(), true))
    }

    async fn try_mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Reward>> {
        let mut rewards = self.rewards.write().await;
        let Some(reward) = rewards.get_mut(&id) else {
            return Ok(None);
        };

        if reward.status != RewardStatus::Unused || reward.expires_at.is_some_and(|t| t <= now) {
            return Ok(None);
        }

        reward.status = RewardStatus::Used;
        reward.used_at = Some(now);
        reward.updated_at = Utc::now();
        Ok(Some(reward.clone()))
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Reward>> {
        let mut rewards = self.rewards.write().await;
        let mut expired = Vec::new();

        for reward in rewards.values_mut() {
            if reward.status == RewardStatus::Unused && reward.expires_at.is_some_and(|t| t <= now)
            {
                reward.status = RewardStatus::Expired;
                reward.updated_at = Utc::now();
                expired.push(reward.clone());
            }
        }

        Ok(expired)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Reward>> {
        let rewards = self.rewards.read().await;
        let mut result: Vec<Reward> = rewards
            .values()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(result)
    }
}

/// 内存通知仓储
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前存储的通知总数（测试辅助）
    pub async fn count(&self) -> usize {
        self.notifications.read().await.len()
    }
}

#[async_trait]
impl NotificationRepositoryTrait for InMemoryNotificationRepository {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.notifications.read().await.get(&id).cloned())
    }

    async fn insert_if_absent(&self, notification: &Notification) -> Result<Option<Notification>> {
        let mut notifications = self.notifications.write().await;

        // 去重键：(customer_id, notification_type, causing_id)
        let duplicate = notifications.values().any(|n| {
            n.customer_id == notification.customer_id
                && n.notification_type == notification.notification_type
                && n.causing_id == notification.causing_id
        });
        if duplicate {
            return Ok(None);
        }

        notifications.insert(notification.id, notification.clone());
        Ok(Some(notification.clone()))
    }

    async fn mark_read(&self, id: Uuid, now: DateTime<Utc>) -> Result<Notification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .get_mut(&id)
            .ok_or(EngineError::NotificationNotFound(id))?;

        if !notification.is_read {
            notification.is_read = true;
            notification.read_at = Some(now);
        }
        Ok(notification.clone())
    }

    async fn list_unread<'a>(&self, customer_id: Option<&'a str>) -> Result<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| !n.is_read)
            .filter(|n| customer_id.is_none_or(|id| n.customer_id == id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

/// 内存已处理事件仓储
#[derive(Default)]
pub struct InMemoryProcessedEventRepository {
    processed: RwLock<std::collections::HashSet<String>>,
}

impl InMemoryProcessedEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessedEventRepositoryTrait for InMemoryProcessedEventRepository {
    async fn is_processed(&self, event_id: &str) -> Result<bool> {
        Ok(self.processed.read().await.contains(event_id))
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        self.processed.write().await.insert(event_id.to_string());
        Ok(())
    }
}

/// 便捷构造：一组互相独立的内存仓储
pub struct InMemoryRepositories {
    pub customers: Arc<InMemoryCustomerRepository>,
    pub rewards: Arc<InMemoryRewardRepository>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub processed_events: Arc<InMemoryProcessedEventRepository>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(InMemoryCustomerRepository::new()),
            rewards: Arc::new(InMemoryRewardRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            processed_events: Arc::new(InMemoryProcessedEventRepository::new()),
        }
    }
}

impl Default for InMemoryRepositories {
    fn default() -> Self {
        Self::new()
    }
}
