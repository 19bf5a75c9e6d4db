//! 会员积分奖励引擎服务入口
//!
//! 启动顺序：配置 -> 日志 -> 数据库（含迁移）-> 仓储 -> 服务 ->
//! 过期清扫 Worker -> HTTP 服务。

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use loyalty_shared::{config::AppConfig, database::Database, telemetry};

use loyalty_engine::{
    CustomerLockManager, CustomerRepository, IssuerService, LedgerService,
    NotificationDispatcher, NotificationRepository, OrderEventProcessor,
    ProcessedEventRepository, QueryService, RewardPolicy, RewardRepository,
    SimulatedEmailRelay, ExpiryWorker,
    api::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置
    let config = AppConfig::load("loyalty-engine").unwrap_or_else(|e| {
        eprintln!("配置加载失败，使用默认配置: {}", e);
        AppConfig::default()
    });

    // 2. 初始化日志
    telemetry::init(&config.observability)?;

    info!(
        environment = %config.environment,
        "loyalty-engine 启动中..."
    );

    // 3. 初始化数据库并执行迁移
    let db = Database::connect(&config.database).await?;
    let pool = db.pool().clone();
    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("数据库连接与迁移完成");

    // 4. 创建仓储
    let customer_repo = Arc::new(CustomerRepository::new(pool.clone()));
    let reward_repo = Arc::new(RewardRepository::new(pool.clone()));
    let notification_repo = Arc::new(NotificationRepository::new(pool.clone()));
    let processed_event_repo = Arc::new(ProcessedEventRepository::new(pool.clone()));
    info!("仓储已初始化");

    // 5. 创建服务
    let ledger = Arc::new(LedgerService::new(customer_repo.clone()));
    let policy = RewardPolicy::new(config.reward_rule.clone());
    let issuer = Arc::new(IssuerService::new(
        reward_repo.clone(),
        config.reward_rule.clone(),
    ));
    let query = Arc::new(QueryService::new(
        customer_repo.clone(),
        reward_repo.clone(),
        notification_repo.clone(),
    ));

    let relay = Arc::new(SimulatedEmailRelay::new(config.email.clone()));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        notification_repo.clone(),
        customer_repo.clone(),
        relay,
        config.email.clone(),
    ));

    let locks = Arc::new(CustomerLockManager::new());
    let processor = Arc::new(OrderEventProcessor::new(
        ledger.clone(),
        policy,
        issuer.clone(),
        dispatcher.clone(),
        locks,
        processed_event_repo,
    ));
    info!("服务已初始化");

    // 6. 启动过期清扫 Worker
    let sweep_worker = ExpiryWorker::new(issuer.clone(), config.sweep.clone());
    tokio::spawn(async move {
        sweep_worker.run().await;
    });
    info!("过期清扫 Worker 已调度");

    // 7. 启动 HTTP 服务
    let state = AppState::new(
        ledger,
        issuer,
        query,
        dispatcher,
        processor,
        config.reward_rule.points_for_free_drink,
    );
    let app = api::router(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP 服务已启动");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("服务已关闭");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Ctrl+C 信号处理器安装失败");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM 信号处理器安装失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到 Ctrl+C，开始优雅关闭...");
        }
        _ = terminate => {
            info!("收到 SIGTERM，开始优雅关闭...");
        }
    }
}
