//! 已处理事件仓储
//!
//! 事件信封级幂等标记，持久化在 `processed_events(event_id)` 唯一键上，
//! 进程重启后幂等性依然成立。

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::ProcessedEventRepositoryTrait;
use crate::error::Result;

/// 已处理事件仓储（PostgreSQL）
pub struct ProcessedEventRepository {
    pool: PgPool,
}

impl ProcessedEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedEventRepositoryTrait for ProcessedEventRepository {
    async fn is_processed(&self, event_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM processed_events WHERE event_id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, processed_at)
            VALUES ($1, NOW())
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
