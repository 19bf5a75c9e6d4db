//! 积分管道端到端测试
//!
//! 使用内存仓储驱动完整管道（记账 -> 阈值判定 -> 奖励发放 -> 通知 -> 邮件），
//! 不依赖任何外部基础设施。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use loyalty_shared::config::{EmailConfig, RewardRuleConfig};
use loyalty_shared::events::{EventProcessor, OrderCompletedEvent};

use loyalty_engine::error::EngineError;
use loyalty_engine::models::{Customer, NotificationType, RewardStatus};
use loyalty_engine::notification::types::{DeliveryReceipt, EmailMessage};
use loyalty_engine::notification::{EmailRelay, NotificationDispatcher};
use loyalty_engine::repository::memory::InMemoryRepositories;
use loyalty_engine::repository::traits::{
    CustomerRepositoryTrait, NotificationRepositoryTrait, RewardRepositoryTrait,
};
use loyalty_engine::{
    CustomerLockManager, IssuerService, LedgerService, OrderEventProcessor, RewardPolicy,
};

/// 记录投递尝试的邮件适配器
struct RecordingRelay {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingRelay {
    fn new(fail: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail,
        }
    }

    async fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailRelay for RecordingRelay {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &EmailMessage) -> loyalty_engine::Result<DeliveryReceipt> {
        self.sent.lock().await.push(message.clone());
        if self.fail {
            return Err(EngineError::Delivery {
                provider: "recording".to_string(),
                message: "模拟投递失败".to_string(),
            });
        }
        Ok(DeliveryReceipt {
            message_id: format!("email_{}", Uuid::new_v4()),
        })
    }
}

/// 测试装置：完整管道 + 内存仓储 + 记录型邮件适配器
struct Pipeline {
    repos: InMemoryRepositories,
    relay: Arc<RecordingRelay>,
    processor: Arc<OrderEventProcessor>,
}

fn build_pipeline(rule: RewardRuleConfig, relay_fails: bool) -> Pipeline {
    let repos = InMemoryRepositories::new();
    let relay = Arc::new(RecordingRelay::new(relay_fails));

    let ledger = Arc::new(LedgerService::new(repos.customers.clone()));
    let issuer = Arc::new(IssuerService::new(repos.rewards.clone(), rule.clone()));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        repos.notifications.clone(),
        repos.customers.clone(),
        relay.clone(),
        EmailConfig::default(),
    ));

    let processor = Arc::new(OrderEventProcessor::new(
        ledger,
        RewardPolicy::new(rule),
        issuer,
        dispatcher,
        Arc::new(CustomerLockManager::new()),
        repos.processed_events.clone(),
    ));

    Pipeline {
        repos,
        relay,
        processor,
    }
}

async fn seed_customer(pipeline: &Pipeline, id: &str, points: i64, email: Option<&str>) {
    let mut customer = Customer::new(id, "张三", "13800000000", email.map(str::to_string));
    customer.loyalty_points = points;
    pipeline.repos.customers.seed(customer).await;
}

/// 等待 fire-and-forget 的邮件任务落地
async fn settle() {
    tokio::time::sleep(Duration::from_millis(120)).await;
}

/// 场景：9 分会员下单 +1 分 -> 穿越 10 分阈值。
/// 应产生一条 Unused 免费饮品奖励（30 天有效期）、一条获奖通知、
/// 恰好一次邮件投递尝试。
#[tokio::test]
async fn test_nine_plus_one_scenario() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 9, Some("zhang@example.com")).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 1, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();

    // 积分到账
    let customer = pipeline
        .repos
        .customers
        .get_customer("cust-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.loyalty_points, 10);

    // 一条 Unused 奖励，有效期 = 发放时间 + 30 天
    assert_eq!(outcome.issued_rewards.len(), 1);
    let rewards = pipeline
        .repos
        .rewards
        .list_by_customer("cust-1")
        .await
        .unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].status, RewardStatus::Unused);
    assert_eq!(rewards[0].threshold_multiple, 10);
    assert_eq!(
        rewards[0].expires_at,
        Some(rewards[0].earned_at + chrono::Duration::days(30))
    );

    // 获奖通知 + 积分到账通知
    let unread = pipeline
        .repos
        .notifications
        .list_unread(Some("cust-1"))
        .await
        .unwrap();
    assert_eq!(unread.len(), 2);
    assert!(
        unread
            .iter()
            .any(|n| n.notification_type == NotificationType::RewardEarned)
    );

    // 恰好一次邮件投递尝试，正文包含姓名与积分总数
    settle().await;
    let sent = pipeline.relay.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "zhang@example.com");
    assert!(sent[0].html_body.contains("张三"));
    assert!(sent[0].html_body.contains("10"));
}

/// 8 -> 15 的批量记账恰好发放一条 10 分奖励，不多不少
#[tokio::test]
async fn test_bulk_accrual_jump_issues_exactly_one_reward() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 8, None).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 7, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();

    assert_eq!(outcome.issued_rewards.len(), 1);
    assert_eq!(outcome.issued_rewards[0].threshold_multiple, 10);
}

/// 5 -> 25 一次穿越 10 与 20 两个倍数：每个倍数独立发放一条奖励
#[tokio::test]
async fn test_double_crossing_issues_two_rewards() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 5, None).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 20, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();

    let mut multiples: Vec<i64> = outcome
        .issued_rewards
        .iter()
        .map(|r| r.threshold_multiple)
        .collect();
    multiples.sort();
    assert_eq!(multiples, vec![10, 20]);
}

/// 同一事件重复投递是无操作：积分不重复累计，奖励与通知不重复产生
#[tokio::test]
async fn test_duplicate_event_delivery_is_noop() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 9, Some("zhang@example.com")).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 1, "pos");
    pipeline.processor.process(&event).await.unwrap();
    let second = pipeline.processor.process(&event).await.unwrap();

    assert!(!second.processed);

    let customer = pipeline
        .repos
        .customers
        .get_customer("cust-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.loyalty_points, 10);
    assert_eq!(customer.total_purchases, 1);

    settle().await;
    assert_eq!(pipeline.relay.sent_messages().await.len(), 1);
}

/// 兑换后的第二次兑换失败于"已使用"；有效期过后的兑换失败于"已过期"
#[tokio::test]
async fn test_redeem_conflicts_are_distinguished() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 9, None).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 1, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();
    let reward_id: Uuid = outcome.issued_rewards[0].reward_id.parse().unwrap();

    let issuer = IssuerService::new(pipeline.repos.rewards.clone(), RewardRuleConfig::default());
    let now = Utc::now();

    // 首次兑换成功
    let redeemed = issuer.redeem(reward_id, now).await.unwrap();
    assert_eq!(redeemed.status, RewardStatus::Used);
    assert_eq!(redeemed.used_at, Some(now));

    // 第二次兑换：已使用
    let err = issuer.redeem(reward_id, now).await.unwrap_err();
    assert!(matches!(err, EngineError::RewardAlreadyUsed(_)));
}

/// 过期奖励永远无法兑换；清扫两次第二次为空
#[tokio::test]
async fn test_expiry_sweep_and_redeem_expired() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 9, None).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 1, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();
    let reward_id: Uuid = outcome.issued_rewards[0].reward_id.parse().unwrap();

    let issuer = IssuerService::new(pipeline.repos.rewards.clone(), RewardRuleConfig::default());

    // 快进到有效期之后
    let future = Utc::now() + chrono::Duration::days(31);

    let expired = issuer.expire_due(future).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].status, RewardStatus::Expired);

    // 同一时间点的第二次清扫不再返回任何记录
    let expired_again = issuer.expire_due(future).await.unwrap();
    assert!(expired_again.is_empty());

    // 过期奖励兑换失败于"已过期"，绝不静默成功
    let err = issuer.redeem(reward_id, future).await.unwrap_err();
    assert!(matches!(err, EngineError::RewardExpired(_)));
}

/// 邮件投递失败不回滚通知与奖励，也不触发产生重复通知的重试
#[tokio::test]
async fn test_email_failure_does_not_roll_back_state() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), true);
    seed_customer(&pipeline, "cust-1", 9, Some("zhang@example.com")).await;

    let event = OrderCompletedEvent::new("cust-1", "order-1001", 1, "pos");
    let outcome = pipeline.processor.process(&event).await.unwrap();

    assert!(outcome.processed);
    assert_eq!(outcome.issued_rewards.len(), 1);

    settle().await;

    // 投递被尝试一次且失败
    assert_eq!(pipeline.relay.sent_messages().await.len(), 1);

    // 通知与奖励保持已提交
    let unread = pipeline
        .repos
        .notifications
        .list_unread(Some("cust-1"))
        .await
        .unwrap();
    assert!(
        unread
            .iter()
            .any(|n| n.notification_type == NotificationType::RewardEarned)
    );
    let rewards = pipeline
        .repos
        .rewards
        .list_by_customer("cust-1")
        .await
        .unwrap();
    assert_eq!(rewards[0].status, RewardStatus::Unused);
}

/// 同一会员的并发事件串行应用：最终余额等于全部增量之和，
/// 且每个阈值倍数恰好一条奖励
#[tokio::test]
async fn test_concurrent_events_same_customer() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 0, None).await;

    let mut handles = Vec::new();
    for i in 0..30 {
        let processor = pipeline.processor.clone();
        handles.push(tokio::spawn(async move {
            let event = OrderCompletedEvent::new("cust-1", format!("order-{}", i), 1, "pos");
            processor.process(&event).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let customer = pipeline
        .repos
        .customers
        .get_customer("cust-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.loyalty_points, 30);
    assert_eq!(customer.total_purchases, 30);

    // 30 分恰好穿越 10/20/30 三个阈值，各一条
    let rewards = pipeline
        .repos
        .rewards
        .list_by_customer("cust-1")
        .await
        .unwrap();
    let mut multiples: Vec<i64> = rewards.iter().map(|r| r.threshold_multiple).collect();
    multiples.sort();
    assert_eq!(multiples, vec![10, 20, 30]);
}

/// 不同会员的事件互不干扰：各自余额等于各自增量之和
#[tokio::test]
async fn test_interleaved_events_across_customers() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    for id in ["cust-a", "cust-b", "cust-c"] {
        seed_customer(&pipeline, id, 0, None).await;
    }

    let mut handles = Vec::new();
    for i in 0..10 {
        for id in ["cust-a", "cust-b", "cust-c"] {
            let processor = pipeline.processor.clone();
            let customer_id = id.to_string();
            handles.push(tokio::spawn(async move {
                let event = OrderCompletedEvent::new(
                    customer_id.clone(),
                    format!("order-{}-{}", customer_id, i),
                    2,
                    "pos",
                );
                processor.process(&event).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for id in ["cust-a", "cust-b", "cust-c"] {
        let customer = pipeline
            .repos
            .customers
            .get_customer(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.loyalty_points, 20, "会员 {} 余额不符", id);
        assert_eq!(customer.total_purchases, 10);
    }
}

/// 积分守恒：记账总和减去成功扣减等于最终余额
#[tokio::test]
async fn test_balance_conservation_with_redemptions() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 0, None).await;

    let ledger = LedgerService::new(pipeline.repos.customers.clone());

    for i in 0..5 {
        let event = OrderCompletedEvent::new("cust-1", format!("order-{}", i), 3, "pos");
        pipeline.processor.process(&event).await.unwrap();
    }
    // 15 分，扣减 10 分兑换
    ledger.redeem_points("cust-1", 10).await.unwrap();
    // 超额扣减被拒绝，不影响余额
    assert!(ledger.redeem_points("cust-1", 100).await.is_err());

    let customer = pipeline
        .repos
        .customers
        .get_customer("cust-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.loyalty_points, 5 * 3 - 10);
}

/// 通知去重：同一因果事件的重复 notify 只存一条
#[tokio::test]
async fn test_notification_dedup_across_dispatch() {
    let pipeline = build_pipeline(RewardRuleConfig::default(), false);
    seed_customer(&pipeline, "cust-1", 0, None).await;

    let dispatcher = NotificationDispatcher::new(
        pipeline.repos.notifications.clone(),
        pipeline.repos.customers.clone(),
        pipeline.relay.clone(),
        EmailConfig::default(),
    );

    let event = loyalty_engine::LoyaltyEvent::PointsAdded {
        customer_id: "cust-1".to_string(),
        order_id: "order-1001".to_string(),
        points_delta: 1,
        balance_after: 1,
    };

    assert!(dispatcher.notify(&event).await.unwrap().is_some());
    assert!(dispatcher.notify(&event).await.unwrap().is_none());
    assert_eq!(pipeline.repos.notifications.count().await, 1);
}
