//! 事件模型与处理管道抽象
//!
//! 定义订单完成事件的统一信封格式、处理结果，以及 `EventProcessor` trait
//! 作为事件处理管道的核心抽象。订单处理子系统产生事件，积分引擎消费事件，
//! 两者只通过此信封耦合。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderCompletedEvent — 订单完成事件信封
// ---------------------------------------------------------------------------

/// 订单完成事件
///
/// 外部订单子系统在订单结算完成后产生，驱动积分引擎的完整管道
/// （记账 -> 阈值判定 -> 奖励发放 -> 通知）。设计要点：
/// - 通过 `event_id`（UUID v7）实现幂等性校验，重复投递不会重复累计积分
/// - 通过 `order_id` 作为通知去重键的因果标识
/// - 通过 `trace_id` 串联分布式追踪上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletedEvent {
    /// 事件唯一标识（UUID v7），时间有序便于索引，同时用于幂等性校验
    pub event_id: String,
    /// 会员 ID
    pub customer_id: String,
    /// 订单 ID（通知去重的因果标识）
    pub order_id: String,
    /// 本次订单累计的积分增量
    pub points_delta: i64,
    /// 订单完成时间
    pub occurred_at: DateTime<Utc>,
    /// 事件来源系统
    pub source: String,
    /// 追踪 ID（用于分布式追踪串联）
    pub trace_id: Option<String>,
}

impl OrderCompletedEvent {
    /// 构建新事件，自动生成 UUID v7 作为 event_id 并记录当前时间
    ///
    /// UUID v7 包含时间戳前缀，使得按 event_id 排序即可获得时间顺序。
    pub fn new(
        customer_id: impl Into<String>,
        order_id: impl Into<String>,
        points_delta: i64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            customer_id: customer_id.into(),
            order_id: order_id.into(),
            points_delta,
            occurred_at: Utc::now(),
            source: source.into(),
            trace_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessOutcome — 事件处理结果
// ---------------------------------------------------------------------------

/// 事件处理结果
///
/// 记录单个订单完成事件经过积分管道后的完整处理结果。
/// `errors` 字段采用字符串数组而非立即失败，因为通知、邮件等旁路步骤
/// 失败不应阻止积分记账这一主流程。
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub event_id: String,
    pub processed: bool,
    /// 本次事件触发发放的奖励
    pub issued_rewards: Vec<IssuedRewardSummary>,
    /// 本次事件创建的通知 ID 列表
    pub notification_ids: Vec<String>,
    /// 处理耗时（毫秒）
    pub processing_time_ms: i64,
    /// 旁路步骤失败时收集错误信息，不中断整体流程
    pub errors: Vec<String>,
}

impl ProcessOutcome {
    /// 构建一个已处理但无任何产出的空结果
    pub fn empty(event_id: impl Into<String>, processing_time_ms: i64) -> Self {
        Self {
            event_id: event_id.into(),
            processed: true,
            issued_rewards: vec![],
            notification_ids: vec![],
            processing_time_ms,
            errors: vec![],
        }
    }
}

/// 已发放奖励的摘要
#[derive(Debug, Clone, Serialize)]
pub struct IssuedRewardSummary {
    /// 奖励记录 ID
    pub reward_id: String,
    /// 触发此奖励的阈值倍数（如 10、20）
    pub threshold_multiple: i64,
    /// 是否为本次事件新发放（false 表示命中幂等返回已有记录）
    pub newly_issued: bool,
}

// ---------------------------------------------------------------------------
// EventProcessor trait — 事件处理管道抽象
// ---------------------------------------------------------------------------

/// 事件处理管道的核心抽象
///
/// 积分引擎实现此 trait 处理订单完成事件。设计要点：
/// - `process` 负责完整的处理流程（记账 -> 阈值判定 -> 发放 -> 通知）
/// - `is_processed` / `mark_processed` 配合实现幂等性，防止上游重复投递
///   导致重复累计积分
/// - 错误类型由实现方指定，共享层不绑定具体业务错误
#[async_trait]
pub trait EventProcessor: Send + Sync {
    type Error: std::error::Error + Send + Sync;

    /// 处理单个事件，返回处理结果
    async fn process(&self, event: &OrderCompletedEvent) -> Result<ProcessOutcome, Self::Error>;

    /// 检查事件是否已处理（基于 event_id 的幂等性校验）
    async fn is_processed(&self, event_id: &str) -> Result<bool, Self::Error>;

    /// 标记事件为已处理，写入幂等性记录
    async fn mark_processed(&self, event_id: &str) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
