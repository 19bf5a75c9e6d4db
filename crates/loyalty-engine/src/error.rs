//! 积分引擎错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;
use uuid::Uuid;

/// 积分引擎错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // === 会员相关错误 ===
    #[error("会员不存在: {0}")]
    CustomerNotFound(String),

    #[error("会员已归档: {0}")]
    CustomerArchived(String),

    #[error("会员已存在: {0}")]
    CustomerAlreadyExists(String),

    #[error("积分余额不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    // === 奖励相关错误 ===
    #[error("奖励不存在: {0}")]
    RewardNotFound(Uuid),

    #[error("奖励已被使用: reward_id={0}")]
    RewardAlreadyUsed(Uuid),

    #[error("奖励已过期: reward_id={0}")]
    RewardExpired(Uuid),

    // === 通知相关错误 ===
    #[error("通知不存在: {0}")]
    NotificationNotFound(Uuid),

    #[error("邮件投递失败: provider={provider}, {message}")]
    Delivery { provider: String, message: String },

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("并发冲突，请重试")]
    ConcurrencyConflict,
}

/// 积分引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::ConcurrencyConflict)
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Serialization(_)
                | Self::Internal(_)
                | Self::ConcurrencyConflict
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::CustomerArchived(_) => "CUSTOMER_ARCHIVED",
            Self::CustomerAlreadyExists(_) => "CUSTOMER_ALREADY_EXISTS",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RewardAlreadyUsed(_) => "REWARD_ALREADY_USED",
            Self::RewardExpired(_) => "REWARD_EXPIRED",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::Delivery { .. } => "DELIVERY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        }
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
