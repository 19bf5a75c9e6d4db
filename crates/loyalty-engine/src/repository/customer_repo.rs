//! 会员仓储
//!
//! 提供会员账本的数据访问。积分变更全部采用单条条件更新语句实现，
//! 余额校验与扣减在数据库侧原子完成，不存在读取-更新竞态窗口。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::CustomerRepositoryTrait;
use crate::error::{EngineError, Result};
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, loyalty_points, total_purchases, \
     last_purchase_at, is_archived, created_at, updated_at";

/// 会员仓储（PostgreSQL）
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepositoryTrait for CustomerRepository {
    async fn get_customer(&self, id: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers
                (id, name, phone, email, loyalty_points, total_purchases,
                 last_purchase_at, is_archived, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.loyalty_points)
        .bind(customer.total_purchases)
        .bind(customer.last_purchase_at)
        .bind(customer.is_archived)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::CustomerAlreadyExists(customer.id.clone()));
        }

        Ok(())
    }

    async fn accrue_points(
        &self,
        id: &str,
        points_delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<Customer> {
        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET loyalty_points = loyalty_points + $2,
                total_purchases = total_purchases + 1,
                last_purchase_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND is_archived = FALSE
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(points_delta)
        .bind(occurred_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(customer) => Ok(customer),
            // 条件更新未命中：区分会员不存在与已归档
            None => match self.get_customer(id).await? {
                Some(_) => Err(EngineError::CustomerArchived(id.to_string())),
                None => Err(EngineError::CustomerNotFound(id.to_string())),
            },
        }
    }

    async fn deduct_points(&self, id: &str, points: i64) -> Result<Customer> {
        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET loyalty_points = loyalty_points - $2,
                updated_at = NOW()
            WHERE id = $1 AND loyalty_points >= $2
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(points)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(customer) => Ok(customer),
            None => match self.get_customer(id).await? {
                Some(customer) => Err(EngineError::InsufficientPoints {
                    required: points,
                    available: customer.loyalty_points,
                }),
                None => Err(EngineError::CustomerNotFound(id.to_string())),
            },
        }
    }

    async fn archive_customer(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET is_archived = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::CustomerNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn list_eligible(&self, threshold: i64) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE is_archived = FALSE AND loyalty_points >= $1
            ORDER BY loyalty_points DESC, id ASC
            "#
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}
