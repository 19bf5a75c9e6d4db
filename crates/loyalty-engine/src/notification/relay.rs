//! 邮件投递适配器
//!
//! 引擎只决定"是否发送"与"发送什么"，投递本身由外部邮件服务承担。
//! 本模块定义适配器 trait 并提供一个模拟实现，生产环境需要接入真实的
//! 邮件服务（如 SendGrid、AWS SES）。

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use loyalty_shared::config::EmailConfig;

use super::types::{DeliveryReceipt, EmailMessage};
use crate::error::{EngineError, Result};

/// 邮件投递适配器
///
/// 实现应当把一切投递失败表达为 `EngineError::Delivery`，
/// 调用方（通知分发器）负责记录日志并吞掉错误，投递失败
/// 永远不会回滚已提交的通知或奖励。
#[async_trait]
pub trait EmailRelay: Send + Sync {
    /// 适配器名称（用于日志）
    fn name(&self) -> &str;

    /// 投递一封邮件，返回服务商回执
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt>;
}

/// 模拟邮件投递
///
/// 记录日志并伪造消息 ID，不做真实网络调用
pub struct SimulatedEmailRelay {
    config: EmailConfig,
}

impl SimulatedEmailRelay {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(EmailConfig::default())
    }
}

#[async_trait]
impl EmailRelay for SimulatedEmailRelay {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        if !self.config.enabled {
            return Err(EngineError::Delivery {
                provider: self.name().to_string(),
                message: "邮件渠道已禁用".to_string(),
            });
        }

        // 模拟网络延迟
        tokio::time::sleep(tokio::time::Duration::from_millis(30)).await;

        debug!(
            to = %message.to,
            from = %self.config.from_address,
            subject = %message.subject,
            content_length = message.html_body.len(),
            "邮件发送中..."
        );

        let message_id = format!("email_{}", Uuid::new_v4());

        info!(
            to = %message.to,
            message_id = %message_id,
            "邮件发送成功"
        );

        Ok(DeliveryReceipt { message_id })
    }
}
