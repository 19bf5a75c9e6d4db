//! 会员级互斥锁模块

mod customer_lock;

pub use customer_lock::{CustomerLockGuard, CustomerLockManager};
