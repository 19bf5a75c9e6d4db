//! 通知分发器
//!
//! 把积分管道产生的事件转化为站内通知，并在获得奖励时补发一封邮件。
//!
//! ## 去重
//!
//! 通知按 `(customer_id, 通知类型, 因果标识)` 去重，重复事件返回 None
//! 而非报错——重复是预期内的无害情况。
//!
//! ## 邮件投递
//!
//! 通知落库是"顾客已被告知"的事实来源，邮件只是尽力而为的补充：
//! 先提交通知，再异步投递邮件；投递失败或超时仅记录日志，既不回滚
//! 通知，也不触发会产生重复通知的重试。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use loyalty_shared::config::EmailConfig;

use super::relay::EmailRelay;
use super::template::{TemplateContext, TemplateEngine};
use super::types::{EmailMessage, LoyaltyEvent};
use crate::error::Result;
use crate::models::{Notification, NotificationType};
use crate::repository::{CustomerRepositoryTrait, NotificationRepositoryTrait};

/// 通知分发器
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepositoryTrait>,
    customers: Arc<dyn CustomerRepositoryTrait>,
    relay: Arc<dyn EmailRelay>,
    templates: TemplateEngine,
    email_config: EmailConfig,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepositoryTrait>,
        customers: Arc<dyn CustomerRepositoryTrait>,
        relay: Arc<dyn EmailRelay>,
        email_config: EmailConfig,
    ) -> Self {
        Self {
            notifications,
            customers,
            relay,
            templates: TemplateEngine::with_defaults(),
            email_config,
        }
    }

    /// 处理一个通知事件
    ///
    /// 返回新建的通知；命中去重键时返回 None
    #[instrument(skip(self, event), fields(customer_id = %event.customer_id(), causing_id = %event.causing_id()))]
    pub async fn notify(&self, event: &LoyaltyEvent) -> Result<Option<Notification>> {
        let context = self.build_context(event).await;
        let (title, body) = self
            .templates
            .render_for(&event.notification_type(), &context)
            .unwrap_or_else(|| {
                // 类型没有注册模板时退化为因果标识，保证通知仍然可读
                ("会员通知".to_string(), event.causing_id())
            });

        let notification = Notification::new(
            event.customer_id(),
            event.notification_type(),
            body.clone(),
            event.causing_id(),
        );

        let Some(stored) = self.notifications.insert_if_absent(&notification).await? else {
            debug!(
                dedup_key = %notification.dedup_key(),
                "重复通知，跳过创建"
            );
            return Ok(None);
        };

        info!(
            notification_id = %stored.id,
            notification_type = ?stored.notification_type,
            "通知已创建"
        );

        // 获得奖励时补发邮件。通知已提交，邮件在异步任务中尽力投递。
        if stored.notification_type == NotificationType::RewardEarned {
            self.dispatch_email(&context, &title, &body);
        }

        Ok(Some(stored))
    }

    /// 已读确认
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid, now: DateTime<Utc>) -> Result<Notification> {
        let notification = self.notifications.mark_read(id, now).await?;
        debug!(notification_id = %id, "通知已读");
        Ok(notification)
    }

    /// 组装模板上下文
    ///
    /// 会员查询失败不阻断通知创建，缺失的变量由模板引擎保留占位符
    async fn build_context(&self, event: &LoyaltyEvent) -> TemplateContext {
        let mut context = TemplateContext::new();

        match self.customers.get_customer(event.customer_id()).await {
            Ok(Some(customer)) => {
                context.set("customer_name", &customer.name);
                if let Some(email) = &customer.email {
                    context.set("customer_email", email);
                }
            }
            Ok(None) => {
                warn!(customer_id = %event.customer_id(), "通知事件指向未知会员");
            }
            Err(e) => {
                warn!(customer_id = %event.customer_id(), error = %e, "查询会员失败，通知继续创建");
            }
        }

        match event {
            LoyaltyEvent::PointsAdded {
                points_delta,
                balance_after,
                ..
            } => {
                context.set("points_delta", points_delta.to_string());
                context.set("balance_after", balance_after.to_string());
            }
            LoyaltyEvent::RewardEarned {
                threshold_multiple,
                points_after,
                ..
            } => {
                context.set("threshold_multiple", threshold_multiple.to_string());
                context.set("points_after", points_after.to_string());
            }
            LoyaltyEvent::MilestoneReached { milestone, .. } => {
                context.set("milestone", milestone.to_string());
            }
        }

        context
    }

    /// 异步投递邮件（fire-and-forget）
    ///
    /// 必须在会员锁临界区之外调用：缓慢的邮件服务不能阻塞其他订单的
    /// 积分记账。超时视为投递失败，由外部邮件服务自身的策略决定重试。
    fn dispatch_email(&self, context: &TemplateContext, title: &str, body: &str) {
        let Some(to) = context.get("customer_email").map(str::to_string) else {
            debug!("会员未绑定邮箱，跳过邮件");
            return;
        };

        if !self.email_config.enabled {
            debug!("邮件渠道已禁用，跳过邮件");
            return;
        }

        let message = EmailMessage {
            to,
            subject: title.to_string(),
            html_body: self.templates.render_email_html(title, body),
        };

        let relay = self.relay.clone();
        let timeout = Duration::from_millis(self.email_config.send_timeout_ms);

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, relay.send(&message)).await {
                Ok(Ok(receipt)) => {
                    info!(
                        to = %message.to,
                        message_id = %receipt.message_id,
                        "邮件投递成功"
                    );
                }
                Ok(Err(e)) => {
                    error!(
                        to = %message.to,
                        provider = relay.name(),
                        error = %e,
                        "邮件投递失败，通知保持已提交状态"
                    );
                }
                Err(_) => {
                    error!(
                        to = %message.to,
                        provider = relay.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "邮件投递超时，视为投递失败"
                    );
                }
            }
        });
    }
}
