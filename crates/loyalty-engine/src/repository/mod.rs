//! 数据库仓储层
//!
//! - `traits`: 仓储接口定义，服务层只依赖接口
//! - PostgreSQL 实现：生产环境使用，幂等性由唯一索引保证
//! - `memory`: 内存实现，用于本地演示和无外部依赖的测试

pub mod memory;
pub mod traits;

mod customer_repo;
mod notification_repo;
mod processed_event_repo;
mod reward_repo;

pub use customer_repo::CustomerRepository;
pub use notification_repo::NotificationRepository;
pub use processed_event_repo::ProcessedEventRepository;
pub use reward_repo::RewardRepository;
pub use traits::{
    CustomerRepositoryTrait, NotificationRepositoryTrait, ProcessedEventRepositoryTrait,
    RewardRepositoryTrait,
};
