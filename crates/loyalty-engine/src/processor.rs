//! 订单完成事件处理器
//!
//! 实现 `EventProcessor`，串起完整的积分管道：
//! 记账 -> 阈值判定 -> 奖励发放 -> 通知分发。
//!
//! ## 并发与顺序
//!
//! 同一会员的 记账 -> 判定 -> 发放 序列在会员锁临界区内执行，
//! 保证阈值判定拿到一致的 before/after 快照，且事件按到达顺序应用。
//! 通知与邮件在临界区外处理：缓慢的邮件服务不能阻塞后续订单的记账。
//!
//! ## 失败语义
//!
//! 记账/发放失败使整个事件失败（可由上游重投，幂等键保证安全）；
//! 通知与邮件属于旁路，失败只收集到结果的 errors 中，不中断主流程。

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use loyalty_shared::events::{
    EventProcessor, IssuedRewardSummary, OrderCompletedEvent, ProcessOutcome,
};

use crate::error::{EngineError, Result};
use crate::lock::CustomerLockManager;
use crate::models::AccrualOutcome;
use crate::notification::{LoyaltyEvent, NotificationDispatcher};
use crate::repository::ProcessedEventRepositoryTrait;
use crate::service::{IssueOutcome, IssuerService, LedgerService, RewardPolicy};

/// 订单完成事件处理器
///
/// 使用 trait object 持有仓储与服务依赖，避免泛型传播到整个调用链。
pub struct OrderEventProcessor {
    ledger: Arc<LedgerService>,
    policy: RewardPolicy,
    issuer: Arc<IssuerService>,
    dispatcher: Arc<NotificationDispatcher>,
    locks: Arc<CustomerLockManager>,
    processed_events: Arc<dyn ProcessedEventRepositoryTrait>,
}

impl OrderEventProcessor {
    pub fn new(
        ledger: Arc<LedgerService>,
        policy: RewardPolicy,
        issuer: Arc<IssuerService>,
        dispatcher: Arc<NotificationDispatcher>,
        locks: Arc<CustomerLockManager>,
        processed_events: Arc<dyn ProcessedEventRepositoryTrait>,
    ) -> Self {
        Self {
            ledger,
            policy,
            issuer,
            dispatcher,
            locks,
            processed_events,
        }
    }

    /// 临界区内的核心序列：记账 -> 判定 -> 发放
    async fn accrue_and_issue(
        &self,
        event: &OrderCompletedEvent,
    ) -> Result<(AccrualOutcome, Vec<IssueOutcome>)> {
        let _guard = self.locks.acquire(&event.customer_id).await;

        let accrual = self
            .ledger
            .accrue(&event.customer_id, event.points_delta, event.occurred_at)
            .await?;

        let decisions = self
            .policy
            .evaluate(accrual.points_before(), accrual.points_after());

        let now = Utc::now();
        let mut issued = Vec::with_capacity(decisions.len());
        for decision in &decisions {
            issued.push(self.issuer.issue(&event.customer_id, decision, now).await?);
        }

        Ok((accrual, issued))
    }

    /// 临界区外的旁路：通知与邮件，失败收集不中断
    async fn dispatch_notifications(
        &self,
        event: &OrderCompletedEvent,
        accrual: &AccrualOutcome,
        issued: &[IssueOutcome],
        notification_ids: &mut Vec<String>,
        errors: &mut Vec<String>,
    ) {
        let mut events = vec![LoyaltyEvent::PointsAdded {
            customer_id: event.customer_id.clone(),
            order_id: event.order_id.clone(),
            points_delta: event.points_delta,
            balance_after: accrual.points_after(),
        }];

        // 只有本次新发放的奖励触发获奖通知；幂等命中说明事件曾被处理过，
        // 对应通知也早已存在（且有去重键兜底）
        for outcome in issued.iter().filter(|o| o.newly_issued) {
            events.push(LoyaltyEvent::RewardEarned {
                customer_id: event.customer_id.clone(),
                reward_id: outcome.reward.id,
                threshold_multiple: outcome.reward.threshold_multiple,
                points_after: accrual.points_after(),
            });
        }

        for milestone in self
            .policy
            .milestones_reached(accrual.purchases_before(), accrual.purchases_after())
        {
            events.push(LoyaltyEvent::MilestoneReached {
                customer_id: event.customer_id.clone(),
                milestone,
            });
        }

        for loyalty_event in &events {
            match self.dispatcher.notify(loyalty_event).await {
                Ok(Some(notification)) => notification_ids.push(notification.id.to_string()),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        customer_id = %event.customer_id,
                        error = %e,
                        "通知创建失败，不影响积分主流程"
                    );
                    errors.push(format!("通知创建失败: {e}"));
                }
            }
        }
    }
}

#[async_trait]
impl EventProcessor for OrderEventProcessor {
    type Error = EngineError;

    async fn process(&self, event: &OrderCompletedEvent) -> Result<ProcessOutcome> {
        let start = Instant::now();

        info!(
            event_id = %event.event_id,
            customer_id = %event.customer_id,
            order_id = %event.order_id,
            points_delta = event.points_delta,
            "开始处理订单完成事件"
        );

        // 信封级幂等：重复投递直接跳过
        if self.is_processed(&event.event_id).await? {
            debug!(event_id = %event.event_id, "事件已处理，跳过");
            return Ok(ProcessOutcome {
                event_id: event.event_id.clone(),
                processed: false,
                issued_rewards: vec![],
                notification_ids: vec![],
                processing_time_ms: start.elapsed().as_millis() as i64,
                errors: vec![],
            });
        }

        let (accrual, issued) = self.accrue_and_issue(event).await?;

        let mut notification_ids = Vec::new();
        let mut errors = Vec::new();
        self.dispatch_notifications(event, &accrual, &issued, &mut notification_ids, &mut errors)
            .await;

        self.mark_processed(&event.event_id).await?;

        let outcome = ProcessOutcome {
            event_id: event.event_id.clone(),
            processed: true,
            issued_rewards: issued
                .iter()
                .map(|o| IssuedRewardSummary {
                    reward_id: o.reward.id.to_string(),
                    threshold_multiple: o.reward.threshold_multiple,
                    newly_issued: o.newly_issued,
                })
                .collect(),
            notification_ids,
            processing_time_ms: start.elapsed().as_millis() as i64,
            errors,
        };

        info!(
            event_id = %event.event_id,
            customer_id = %event.customer_id,
            balance_after = accrual.points_after(),
            issued_count = outcome.issued_rewards.len(),
            notification_count = outcome.notification_ids.len(),
            error_count = outcome.errors.len(),
            processing_time_ms = outcome.processing_time_ms,
            "订单完成事件处理完成"
        );

        Ok(outcome)
    }

    async fn is_processed(&self, event_id: &str) -> Result<bool> {
        self.processed_events.is_processed(event_id).await
    }

    async fn mark_processed(&self, event_id: &str) -> Result<()> {
        self.processed_events.mark_processed(event_id).await
    }
}
