//! 会员相关实体定义
//!
//! 会员账本是积分余额的唯一事实来源，`loyalty_points` 只能通过
//! 记账/扣减操作变更，不允许直接赋值。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会员
///
/// 在首次记账交易时创建，之后只做软归档，不做物理删除
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// 会员 ID（外部系统分配的不透明标识）
    pub id: String,
    /// 姓名
    pub name: String,
    /// 手机号
    pub phone: String,
    /// 邮箱（未绑定时为 null，影响邮件通知是否发送）
    #[sqlx(default)]
    pub email: Option<String>,
    /// 当前积分余额，恒为非负
    pub loyalty_points: i64,
    /// 累计消费次数
    pub total_purchases: i64,
    /// 最近一次消费时间
    #[sqlx(default)]
    pub last_purchase_at: Option<DateTime<Utc>>,
    /// 是否已归档
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// 构建新会员（零积分、零消费）
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email,
            loyalty_points: 0,
            total_purchases: 0,
            last_purchase_at: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 积分是否达到指定阈值
    pub fn is_eligible(&self, threshold: i64) -> bool {
        !self.is_archived && self.loyalty_points >= threshold
    }

    /// 是否绑定了邮箱
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// 一次记账操作的结果
///
/// 阈值判定依赖同一次原子更新产生的 before/after 快照，
/// before 由 after 与增量反推，避免读取-更新之间的竞态窗口。
#[derive(Debug, Clone)]
pub struct AccrualOutcome {
    /// 记账后的会员快照
    pub customer: Customer,
    /// 本次记账的积分增量
    pub points_delta: i64,
}

impl AccrualOutcome {
    /// 记账前的积分余额
    pub fn points_before(&self) -> i64 {
        self.customer.loyalty_points - self.points_delta
    }

    /// 记账后的积分余额
    pub fn points_after(&self) -> i64 {
        self.customer.loyalty_points
    }

    /// 记账前的累计消费次数
    pub fn purchases_before(&self) -> i64 {
        self.customer.total_purchases - 1
    }

    /// 记账后的累计消费次数
    pub fn purchases_after(&self) -> i64 {
        self.customer.total_purchases
    }
}
