//! 后台任务模块

mod expiry_worker;

pub use expiry_worker::ExpiryWorker;
