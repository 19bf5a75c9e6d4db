//! 业务服务层
//!
//! - `ledger_service`: 会员账本（积分余额的唯一写路径）
//! - `policy`: 纯函数阈值判定
//! - `issuer_service`: 奖励发放、兑换与过期清扫
//! - `query_service`: 面向展示层的只读查询
//! - `dto`: 请求/响应结构

pub mod dto;
pub mod issuer_service;
pub mod ledger_service;
pub mod policy;
pub mod query_service;

pub use issuer_service::{IssueOutcome, IssuerService};
pub use ledger_service::LedgerService;
pub use policy::{RewardDecision, RewardPolicy, crossed_multiples};
pub use query_service::QueryService;
