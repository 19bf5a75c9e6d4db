//! 通知服务模块
//!
//! - `dispatcher`: 去重 + 落库 + 邮件旁路
//! - `relay`: 邮件投递适配器抽象与模拟实现
//! - `template`: 通知/邮件模板引擎
//! - `types`: 通知事件与邮件载荷

pub mod dispatcher;
pub mod relay;
pub mod template;
pub mod types;

pub use dispatcher::NotificationDispatcher;
pub use relay::{EmailRelay, SimulatedEmailRelay};
pub use template::{TemplateContext, TemplateEngine};
pub use types::{DeliveryReceipt, EmailMessage, LoyaltyEvent};
