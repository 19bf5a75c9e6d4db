//! 奖励仓储
//!
//! 发放幂等依赖 `rewards(customer_id, threshold_multiple)` 上的唯一索引：
//! `INSERT ... ON CONFLICT DO NOTHING` 保证同一阈值穿越最多产生一条奖励，
//! 即使进程重启或多实例并发也成立。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::RewardRepositoryTrait;
use crate::error::{EngineError, Result};
use crate::models::Reward;

const REWARD_COLUMNS: &str = "id, customer_id, reward_type, description, status, \
     threshold_multiple, earned_at, used_at, expires_at, created_at, updated_at";

/// 奖励仓储（PostgreSQL）
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    async fn insert_if_absent(&self, reward: &Reward) -> Result<(Reward, bool)> {
        let inserted = sqlx::query_as::<_, Reward>(&format!(
            r#"
            INSERT INTO rewards
                (id, customer_id, reward_type, description, status, threshold_multiple,
                 earned_at, used_at, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (customer_id, threshold_multiple) DO NOTHING
            RETURNING {REWARD_COLUMNS}
            "#
        ))
        .bind(reward.id)
        .bind(&reward.customer_id)
        .bind(reward.reward_type)
        .bind(&reward.description)
        .bind(reward.status)
        .bind(reward.threshold_multiple)
        .bind(reward.earned_at)
        .bind(reward.used_at)
        .bind(reward.expires_at)
        .bind(reward.created_at)
        .bind(reward.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(reward) = inserted {
            return Ok((reward, true));
        }

        // 去重键冲突，返回已存在的记录
        let existing = sqlx::query_as::<_, Reward>(&format!(
            r#"
            SELECT {REWARD_COLUMNS}
            FROM rewards
            WHERE customer_id = $1 AND threshold_multiple = $2
            "#
        ))
        .bind(&reward.customer_id)
        .bind(reward.threshold_multiple)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(reward) => Ok((reward, false)),
            // 插入冲突但又查不到记录，只可能是并发删除之类的异常状况
            None => Err(EngineError::ConcurrencyConflict),
        }
    }

    async fn try_mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Reward>> {
        let updated = sqlx::query_as::<_, Reward>(&format!(
            r#"
            UPDATE rewards
            SET status = 'used', used_at = $2, updated_at = NOW()
            WHERE id = $1
              AND status = 'unused'
              AND (expires_at IS NULL OR expires_at > $2)
            RETURNING {REWARD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Reward>> {
        let expired = sqlx::query_as::<_, Reward>(&format!(
            r#"
            UPDATE rewards
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'unused'
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            RETURNING {REWARD_COLUMNS}
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(expired)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(&format!(
            r#"
            SELECT {REWARD_COLUMNS}
            FROM rewards
            WHERE customer_id = $1
            ORDER BY earned_at DESC
            "#
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }
}
