// ==========================================
// 制造订单路径与对账引擎 - 引擎层事件发布
// ==========================================
// 职责: 定义对账事件发布 trait,实现依赖倒置
// 说明: Engine 层定义 trait,宿主(排程主程序)实现适配器
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 对账事件类型
// ==========================================

/// 对账事件触发类型
///
/// Engine 层定义的事件类型,用于通知下游系统 (历史记录、报表投影)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEventType {
    /// 新订单入册
    OrderCreated,
    /// 整单替换
    OrderReplaced,
    /// 原地更新
    OrderUpdated,
    /// 订单删除 (修订中缺席)
    OrderDeleted,
    /// 拆分订单随替换移除
    SplitRemoved,
    /// 比例改量
    OrderResized,
    /// 当前路径切换
    CurrentPathChanged,
    /// 强制解排
    ForcedUnschedule,
}

impl OrderEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            OrderEventType::OrderCreated => "OrderCreated",
            OrderEventType::OrderReplaced => "OrderReplaced",
            OrderEventType::OrderUpdated => "OrderUpdated",
            OrderEventType::OrderDeleted => "OrderDeleted",
            OrderEventType::SplitRemoved => "SplitRemoved",
            OrderEventType::OrderResized => "OrderResized",
            OrderEventType::CurrentPathChanged => "CurrentPathChanged",
            OrderEventType::ForcedUnschedule => "ForcedUnschedule",
        }
    }
}

/// 对账事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// 事件ID
    pub event_id: String,
    /// 订单外部ID
    pub order_id: String,
    /// 所属工单ID
    pub job_id: String,
    /// 事件类型
    pub event_type: OrderEventType,
    /// 事件来源描述
    pub source: Option<String>,
}

impl OrderEvent {
    pub fn new(
        order_id: impl Into<String>,
        job_id: impl Into<String>,
        event_type: OrderEventType,
        source: Option<String>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            job_id: job_id.into(),
            event_type,
            source,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 对账事件发布者 Trait
///
/// 实现方负责投递;发布失败不阻断对账主流程
pub trait OrderEventPublisher: Send + Sync {
    fn publish(&self, event: OrderEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空实现: 不发布任何事件
#[derive(Debug, Default)]
pub struct NoOpEventPublisher;

impl OrderEventPublisher for NoOpEventPublisher {
    fn publish(&self, _event: OrderEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// 可选发布者: 持有可空的发布者引用,便于逐步接线
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn OrderEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn new(publisher: Option<Arc<dyn OrderEventPublisher>>) -> Self {
        Self { inner: publisher }
    }

    pub fn some(publisher: Arc<dyn OrderEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn publish(&self, event: OrderEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event) {
                tracing::warn!(error = %e, "对账事件发布失败");
            }
        }
    }
}

impl std::fmt::Debug for OptionalEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalEventPublisher")
            .field("wired", &self.inner.is_some())
            .finish()
    }
}
