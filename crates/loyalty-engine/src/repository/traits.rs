//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Customer, Notification, Reward};

/// 会员仓储接口
///
/// 积分余额的唯一写入口。`accrue_points` 与 `deduct_points` 必须以
/// 单条原子更新实现，针对同一会员的并发调用不能观察到部分应用的状态。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepositoryTrait: Send + Sync {
    async fn get_customer(&self, id: &str) -> Result<Option<Customer>>;

    /// 创建会员，ID 冲突返回 `CustomerAlreadyExists`
    async fn create_customer(&self, customer: &Customer) -> Result<()>;

    /// 记账：积分增加 `points_delta`，消费次数 +1，更新最近消费时间。
    /// 返回更新后的会员快照。未知会员返回 `CustomerNotFound`，
    /// 已归档会员返回 `CustomerArchived`。
    async fn accrue_points(
        &self,
        id: &str,
        points_delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<Customer>;

    /// 扣减积分：余额不足返回 `InsufficientPoints`，扣减与余额校验为同一原子操作
    async fn deduct_points(&self, id: &str, points: i64) -> Result<Customer>;

    /// 软归档
    async fn archive_customer(&self, id: &str) -> Result<()>;

    /// 按积分阈值列出未归档会员（积分从高到低）
    async fn list_eligible(&self, threshold: i64) -> Result<Vec<Customer>>;
}

/// 奖励仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>>;

    /// 条件插入：`(customer_id, threshold_multiple)` 已存在时返回已有记录。
    /// 返回值的 bool 表示是否为本次新插入。
    async fn insert_if_absent(&self, reward: &Reward) -> Result<(Reward, bool)>;

    /// 条件更新为已使用：仅当状态为 Unused 且未过期时生效，
    /// 返回更新后的记录；条件不满足返回 None，由调用方查询状态分类冲突原因。
    async fn try_mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Reward>>;

    /// 将所有到期的 Unused 奖励转移为 Expired 并返回。
    /// 已是 Expired 的记录不会被重复转移，重复调用返回空列表。
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Reward>>;

    /// 列出会员的全部奖励（发放时间倒序）
    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Reward>>;
}

/// 通知仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepositoryTrait: Send + Sync {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>>;

    /// 条件插入：去重键 `(customer_id, notification_type, causing_id)`
    /// 已存在时返回 None（重复是预期情况，不是错误）
    async fn insert_if_absent(&self, notification: &Notification) -> Result<Option<Notification>>;

    /// 已读确认：返回更新后的记录。重复确认是幂等的。
    async fn mark_read(&self, id: Uuid, now: DateTime<Utc>) -> Result<Notification>;

    /// 列出未读通知，`customer_id` 为 None 时返回全部会员的未读通知
    async fn list_unread<'a>(&self, customer_id: Option<&'a str>) -> Result<Vec<Notification>>;
}

/// 已处理事件仓储接口
///
/// 事件信封级幂等：同一 event_id 的重复投递不会重复走积分管道
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessedEventRepositoryTrait: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> Result<bool>;

    async fn mark_processed(&self, event_id: &str) -> Result<()>;
}
