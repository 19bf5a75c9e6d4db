//! HTTP API 层
//!
//! 基于 axum 的查询/命令端点，供展示层轮询或订阅。
//! 不约定具体前端形态，响应只保证终态不变量：
//! 已兑换或已过期的奖励不会再以可兑换形态出现。

pub mod dto;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::EngineError;
pub use state::AppState;

/// 构建 API 路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // 事件入口
        .route(
            "/api/v1/events/order-completed",
            post(handlers::order_completed),
        )
        // 会员
        .route("/api/v1/customers", post(handlers::register_customer))
        .route(
            "/api/v1/customers/eligible",
            get(handlers::list_eligible_customers),
        )
        .route(
            "/api/v1/customers/{id}/rewards",
            get(handlers::list_customer_rewards),
        )
        .route(
            "/api/v1/customers/{id}/points/redeem",
            post(handlers::redeem_points),
        )
        // 奖励
        .route("/api/v1/rewards/{id}/redeem", post(handlers::redeem_reward))
        // 通知
        .route(
            "/api/v1/notifications/unread",
            get(handlers::list_unread_notifications),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(handlers::mark_notification_read),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl EngineError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::CustomerNotFound(_)
            | Self::RewardNotFound(_)
            | Self::NotificationNotFound(_) => StatusCode::NOT_FOUND,

            // 请求合法但与当前状态冲突
            Self::CustomerAlreadyExists(_)
            | Self::CustomerArchived(_)
            | Self::InsufficientPoints { .. }
            | Self::RewardAlreadyUsed(_)
            | Self::RewardExpired(_)
            | Self::ConcurrencyConflict => StatusCode::CONFLICT,

            Self::Delivery { .. } => StatusCode::BAD_GATEWAY,

            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Serialization(e) => {
                tracing::error!(error = %e, "序列化失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}
