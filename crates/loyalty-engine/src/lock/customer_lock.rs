//! 会员级互斥锁管理器
//!
//! 同一会员的 记账 -> 阈值判定 -> 奖励发放 序列必须串行执行，
//! 因为阈值穿越判定依赖一致的 before/after 快照。不同会员之间
//! 完全独立，使用按会员 ID 分键的互斥锁而非全局锁，避免吞吐塌陷。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// 会员级互斥锁管理器
///
/// 每个会员 ID 对应一把独立的异步互斥锁。tokio 的 Mutex 按请求顺序
/// 排队（FIFO），因此同一会员的事件按到达顺序获得锁，满足顺序处理要求。
#[derive(Default)]
pub struct CustomerLockManager {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// 会员锁守卫
///
/// RAII 包装，drop 时自动释放锁
pub struct CustomerLockGuard {
    customer_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl CustomerLockGuard {
    /// 持有锁的会员 ID
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }
}

impl CustomerLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定会员的锁，锁被占用时异步等待
    pub async fn acquire(&self, customer_id: &str) -> CustomerLockGuard {
        let lock = self
            .locks
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        debug!(customer_id = %customer_id, "会员锁已获取");

        CustomerLockGuard {
            customer_id: customer_id.to_string(),
            _guard: guard,
        }
    }

    /// 当前登记的锁数量
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_customer_serializes() {
        let manager = Arc::new(CustomerLockManager::new());
        // 非原子的读-改-写计数器：若锁失效，并发执行必然丢失更新
        let counter = Arc::new(AtomicI64::new(0));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let manager = manager.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = manager.acquire("cust-1").await;
                let current = counter.load(Ordering::SeqCst);
                tokio::time::sleep(Duration::from_micros(50)).await;
                counter.store(current + 1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_different_customers_do_not_block() {
        let manager = Arc::new(CustomerLockManager::new());

        // 持有 cust-1 的锁时，cust-2 的锁应当立即可得
        let _guard_1 = manager.acquire("cust-1").await;

        let acquired = tokio::time::timeout(
            Duration::from_millis(100),
            manager.acquire("cust-2"),
        )
        .await;

        assert!(acquired.is_ok(), "不同会员之间不应互相阻塞");
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let manager = Arc::new(CustomerLockManager::new());

        {
            let guard = manager.acquire("cust-1").await;
            assert_eq!(guard.customer_id(), "cust-1");
        }

        // 守卫析构后锁可以再次获取
        let acquired = tokio::time::timeout(
            Duration::from_millis(100),
            manager.acquire("cust-1"),
        )
        .await;
        assert!(acquired.is_ok());
    }
}
