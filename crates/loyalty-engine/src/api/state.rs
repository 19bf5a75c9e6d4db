//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use crate::notification::NotificationDispatcher;
use crate::processor::OrderEventProcessor;
use crate::service::{IssuerService, LedgerService, QueryService};

/// Axum 应用共享状态
///
/// 各服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
    pub issuer: Arc<IssuerService>,
    pub query: Arc<QueryService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub processor: Arc<OrderEventProcessor>,
    /// 资格查询的缺省阈值（配置中的免费饮品阈值）
    pub default_threshold: i64,
}

impl AppState {
    pub fn new(
        ledger: Arc<LedgerService>,
        issuer: Arc<IssuerService>,
        query: Arc<QueryService>,
        dispatcher: Arc<NotificationDispatcher>,
        processor: Arc<OrderEventProcessor>,
        default_threshold: i64,
    ) -> Self {
        Self {
            ledger,
            issuer,
            query,
            dispatcher,
            processor,
            default_threshold,
        }
    }
}
