//! 通知仓储
//!
//! 去重依赖 `notifications(customer_id, notification_type, causing_id)`
//! 上的唯一索引。重复插入返回 None 而非错误：同一因果事件被重复处理
//! 是预期内的无害情况。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::NotificationRepositoryTrait;
use crate::error::{EngineError, Result};
use crate::models::Notification;

const NOTIFICATION_COLUMNS: &str =
    "id, customer_id, notification_type, message, causing_id, is_read, read_at, created_at";

/// 通知仓储（PostgreSQL）
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn insert_if_absent(&self, notification: &Notification) -> Result<Option<Notification>> {
        let inserted = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (id, customer_id, notification_type, message, causing_id,
                 is_read, read_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (customer_id, notification_type, causing_id) DO NOTHING
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.id)
        .bind(&notification.customer_id)
        .bind(notification.notification_type)
        .bind(&notification.message)
        .bind(&notification.causing_id)
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn mark_read(&self, id: Uuid, now: DateTime<Utc>) -> Result<Notification> {
        let updated = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $2
            WHERE id = $1 AND is_read = FALSE
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(notification) => Ok(notification),
            // 已读确认是幂等的：已读通知直接返回当前状态
            None => self
                .get_notification(id)
                .await?
                .ok_or(EngineError::NotificationNotFound(id)),
        }
    }

    async fn list_unread<'a>(&self, customer_id: Option<&'a str>) -> Result<Vec<Notification>> {
        let notifications = match customer_id {
            Some(customer_id) => {
                sqlx::query_as::<_, Notification>(&format!(
                    r#"
                    SELECT {NOTIFICATION_COLUMNS}
                    FROM notifications
                    WHERE customer_id = $1 AND is_read = FALSE
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Notification>(&format!(
                    r#"
                    SELECT {NOTIFICATION_COLUMNS}
                    FROM notifications
                    WHERE is_read = FALSE
                    ORDER BY created_at DESC
                    "#
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(notifications)
    }
}
