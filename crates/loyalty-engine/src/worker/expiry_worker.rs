//! 过期清扫 Worker
//!
//! 按 cron 表达式周期性触发奖励过期清扫，把到期的 Unused 奖励
//! 转移为 Expired。清扫本身是幂等的（已过期的记录被跳过），
//! 多实例同时运行也不会产生重复转移。

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{error, info};

use loyalty_shared::config::SweepConfig;

use crate::service::IssuerService;

/// 过期清扫 Worker
///
/// 轮询检查是否到达下一次调度时间，到达时执行一次清扫并计算
/// 下一次执行时间。
pub struct ExpiryWorker {
    issuer: Arc<IssuerService>,
    config: SweepConfig,
}

impl ExpiryWorker {
    pub fn new(issuer: Arc<IssuerService>, config: SweepConfig) -> Self {
        Self { issuer, config }
    }

    /// 主循环：持续调度清扫直到进程退出
    pub async fn run(&self) {
        let Some(mut next_run) = Self::next_run(&self.config.cron, Utc::now()) else {
            error!(cron = %self.config.cron, "无效的 cron 表达式，清扫 Worker 退出");
            return;
        };

        info!(
            cron = %self.config.cron,
            poll_interval_seconds = self.config.poll_interval_seconds,
            next_run = %next_run,
            "过期清扫 Worker 已启动"
        );

        loop {
            let now = Utc::now();
            if now >= next_run {
                self.run_once(now).await;

                next_run = match Self::next_run(&self.config.cron, now) {
                    Some(t) => t,
                    None => {
                        error!(cron = %self.config.cron, "无法计算下次执行时间，清扫 Worker 退出");
                        return;
                    }
                };
            }

            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
        }
    }

    /// 执行一次清扫，超时按失败记录（下个周期会再次尝试）
    pub async fn run_once(&self, now: DateTime<Utc>) {
        let timeout = Duration::from_secs(self.config.run_timeout_seconds);

        match tokio::time::timeout(timeout, self.issuer.expire_due(now)).await {
            Ok(Ok(expired)) => {
                info!(count = expired.len(), "过期清扫执行完成");
            }
            Ok(Err(e)) => {
                error!(error = %e, "过期清扫执行出错");
            }
            Err(_) => {
                error!(
                    timeout_seconds = self.config.run_timeout_seconds,
                    "过期清扫超时"
                );
            }
        }
    }

    /// 按 cron 表达式计算 `after` 之后的下一次执行时间
    fn next_run(expr: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let schedule = Schedule::from_str(expr).ok()?;
        schedule.after(&after).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reward;
    use crate::repository::memory::InMemoryRewardRepository;
    use crate::repository::traits::RewardRepositoryTrait;
    use loyalty_shared::config::RewardRuleConfig;

    #[test]
    fn test_next_run_hourly() {
        let after = DateTime::parse_from_rfc3339("2025-06-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let next = ExpiryWorker::next_run("0 0 * * * *", after).unwrap();
        assert_eq!(
            next,
            DateTime::parse_from_rfc3339("2025-06-15T11:00:00Z")
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn test_next_run_invalid_expression() {
        assert!(ExpiryWorker::next_run("not a cron", Utc::now()).is_none());
        assert!(ExpiryWorker::next_run("", Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_run_once_sweeps_due_rewards() {
        let repo = Arc::new(InMemoryRewardRepository::new());
        let earned = Utc::now() - chrono::Duration::days(31);
        repo.seed(Reward::free_drink("cust-1", 10, earned, 30)).await;

        let issuer = Arc::new(IssuerService::new(
            repo.clone(),
            RewardRuleConfig::default(),
        ));
        let worker = ExpiryWorker::new(issuer, SweepConfig::default());

        worker.run_once(Utc::now()).await;

        let reward = repo.list_by_customer("cust-1").await.unwrap();
        assert_eq!(
            reward[0].status,
            crate::models::RewardStatus::Expired
        );
    }
}
