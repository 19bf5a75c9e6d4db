//! 会员积分奖励引擎
//!
//! 把完成的订单转化为积分累计、奖励发放与去重通知。
//!
//! ## 核心功能
//!
//! - **会员账本**：积分余额与消费历史的唯一事实来源
//! - **阈值判定**：纯函数比较 before/after 快照与阈值阶梯，批量记账跳过阈值同样触发
//! - **奖励发放**：每次阈值穿越最多发放一条奖励，幂等键持久化在唯一索引上
//! - **过期清扫**：到期未用的奖励由调度任务转移为终态 Expired
//! - **通知分发**：按 (会员, 类型, 因果事件) 去重，获奖时尽力投递邮件
//! - **会员级串行**：同一会员的记账-判定-发放按到达顺序串行，不同会员并行
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 仓储层（PostgreSQL 与内存实现）
//! - `service`: 业务服务层（账本 / 策略 / 发放 / 查询）
//! - `notification`: 通知分发与邮件适配
//! - `lock`: 会员级互斥锁
//! - `processor`: 订单完成事件处理器
//! - `worker`: 过期清扫后台任务
//! - `api`: HTTP 查询/命令端点

pub mod api;
pub mod error;
pub mod lock;
pub mod models;
pub mod notification;
pub mod processor;
pub mod repository;
pub mod service;
pub mod worker;

pub use error::{EngineError, Result};
pub use lock::{CustomerLockGuard, CustomerLockManager};
pub use models::*;
pub use notification::{
    EmailRelay, LoyaltyEvent, NotificationDispatcher, SimulatedEmailRelay, TemplateEngine,
};
pub use processor::OrderEventProcessor;
pub use repository::{
    CustomerRepository, NotificationRepository, ProcessedEventRepository, RewardRepository,
};
pub use service::{
    IssueOutcome, IssuerService, LedgerService, QueryService, RewardDecision, RewardPolicy,
};
pub use worker::ExpiryWorker;
