//! API 响应与请求 DTO 定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 创建错误响应
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

/// 订单完成事件上报请求
///
/// 订单子系统在结算完成后调用，`occurred_at` 缺省为服务端当前时间
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompletedRequest {
    #[validate(length(min = 1, max = 64, message = "会员ID长度必须在1-64个字符之间"))]
    pub customer_id: String,
    #[validate(length(min = 1, max = 64, message = "订单ID长度必须在1-64个字符之间"))]
    pub order_id: String,
    #[validate(range(min = 1, message = "积分增量必须大于0"))]
    pub points_delta: i64,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// 资格查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleQuery {
    /// 积分阈值，缺省使用配置中的免费饮品阈值
    pub threshold: Option<i64>,
}

/// 未读通知查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadQuery {
    pub customer_id: Option<String>,
}
