//! 会员账本服务
//!
//! 积分余额的唯一写路径：记账（消费累计）与扣减（积分兑换）。
//! 奖励发放器和通知分发器只读账本状态，绝不直接改写。
//!
//! ## 原子性
//!
//! 单个会员的余额变更由仓储层的条件更新保证原子；跨会员的记账互不
//! 影响，可以并行。同一会员的"记账 -> 判定 -> 发放"序列化由
//! 处理器侧的会员锁负责，不在本服务内加锁。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{AccrualOutcome, Customer};
use crate::repository::CustomerRepositoryTrait;
use crate::service::dto::RegisterCustomerRequest;

/// 会员账本服务
pub struct LedgerService {
    customers: Arc<dyn CustomerRepositoryTrait>,
}

impl LedgerService {
    pub fn new(customers: Arc<dyn CustomerRepositoryTrait>) -> Self {
        Self { customers }
    }

    /// 注册会员
    ///
    /// 会员随首笔交易由订单子系统登记，初始积分为零
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn register(&self, request: RegisterCustomerRequest) -> Result<Customer> {
        let id = request
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let customer = Customer::new(id, request.name, request.phone, request.email);

        self.customers.create_customer(&customer).await?;

        info!(customer_id = %customer.id, "会员已注册");
        Ok(customer)
    }

    /// 记账：累计积分与消费次数
    ///
    /// 返回包含 before/after 快照的记账结果，供阈值判定使用
    #[instrument(skip(self), fields(customer_id = %customer_id, points_delta = points_delta))]
    pub async fn accrue(
        &self,
        customer_id: &str,
        points_delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<AccrualOutcome> {
        if points_delta <= 0 {
            return Err(EngineError::Validation(
                "积分增量必须大于0".to_string(),
            ));
        }

        let customer = self
            .customers
            .accrue_points(customer_id, points_delta, occurred_at)
            .await?;

        info!(
            customer_id = %customer_id,
            points_delta = points_delta,
            balance_after = customer.loyalty_points,
            total_purchases = customer.total_purchases,
            "积分记账成功"
        );

        Ok(AccrualOutcome {
            customer,
            points_delta,
        })
    }

    /// 扣减积分（积分直接兑换场景）
    #[instrument(skip(self), fields(customer_id = %customer_id, points = points))]
    pub async fn redeem_points(&self, customer_id: &str, points: i64) -> Result<Customer> {
        if points <= 0 {
            return Err(EngineError::Validation(
                "扣减积分必须大于0".to_string(),
            ));
        }

        let customer = self.customers.deduct_points(customer_id, points).await?;

        info!(
            customer_id = %customer_id,
            points = points,
            balance_after = customer.loyalty_points,
            "积分扣减成功"
        );

        Ok(customer)
    }

    /// 查询会员
    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer> {
        self.customers
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| EngineError::CustomerNotFound(customer_id.to_string()))
    }

    /// 归档会员（软删除）
    #[instrument(skip(self))]
    pub async fn archive(&self, customer_id: &str) -> Result<()> {
        self.customers.archive_customer(customer_id).await?;
        info!(customer_id = %customer_id, "会员已归档");
        Ok(())
    }
}
