//! API 处理器
//!
//! 面向展示层的查询/命令端点。响应体统一使用 `ApiResponse` 信封，
//! 兑换冲突（已使用 / 已过期 / 余额不足）携带各自独立的错误码，
//! 由 `EngineError` 的 `IntoResponse` 实现映射。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use loyalty_shared::events::{EventProcessor, OrderCompletedEvent, ProcessOutcome};

use super::dto::{ApiResponse, EligibleQuery, OrderCompletedRequest, UnreadQuery};
use super::state::AppState;
use crate::error::Result;
use crate::models::{Customer, Notification, Reward};
use crate::service::dto::{RedeemPointsRequest, RegisterCustomerRequest};

/// 健康检查
pub async fn health() -> &'static str {
    "OK"
}

/// 注册会员
pub async fn register_customer(
    State(state): State<AppState>,
    Json(request): Json<RegisterCustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>> {
    request.validate()?;

    let customer = state.ledger.register(request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// 上报订单完成事件，驱动完整的积分管道
pub async fn order_completed(
    State(state): State<AppState>,
    Json(request): Json<OrderCompletedRequest>,
) -> Result<Json<ApiResponse<ProcessOutcome>>> {
    request.validate()?;

    let mut event =
        OrderCompletedEvent::new(request.customer_id, request.order_id, request.points_delta, "pos");
    if let Some(occurred_at) = request.occurred_at {
        event.occurred_at = occurred_at;
    }

    let outcome = state.processor.process(&event).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// 按积分阈值查询符合条件的会员
pub async fn list_eligible_customers(
    State(state): State<AppState>,
    Query(query): Query<EligibleQuery>,
) -> Result<Json<ApiResponse<Vec<Customer>>>> {
    let threshold = query.threshold.unwrap_or(state.default_threshold);
    let customers = state.query.list_eligible_customers(threshold).await?;
    Ok(Json(ApiResponse::success(customers)))
}

/// 会员奖励墙
pub async fn list_customer_rewards(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Reward>>>> {
    let rewards = state.query.list_customer_rewards(&customer_id).await?;
    Ok(Json(ApiResponse::success(rewards)))
}

/// 兑换奖励
pub async fn redeem_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reward>>> {
    let reward = state.issuer.redeem(reward_id, Utc::now()).await?;

    info!(reward_id = %reward_id, customer_id = %reward.customer_id, "奖励兑换完成");
    Ok(Json(ApiResponse::success_with_message(reward, "兑换成功")))
}

/// 扣减会员积分
pub async fn redeem_points(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(request): Json<RedeemPointsRequest>,
) -> Result<Json<ApiResponse<Customer>>> {
    request.validate()?;

    let customer = state
        .ledger
        .redeem_points(&customer_id, request.points)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

/// 未读通知列表
pub async fn list_unread_notifications(
    State(state): State<AppState>,
    Query(query): Query<UnreadQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state
        .query
        .list_unread_notifications(query.customer_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// 通知已读确认
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>> {
    let notification = state
        .dispatcher
        .mark_read(notification_id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(notification)))
}
