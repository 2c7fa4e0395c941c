// ==========================================
// 制造订单路径与对账引擎 - 引擎层错误类型
// ==========================================
// 依据: Rust 错误处理最佳实践
// 工具: thiserror 派生宏
// ==========================================
// 传播策略: 校验错误中止单个订单的对账步骤,汇入批次错误清单,
//           同批其余订单继续处理;结构性错误不在本地捕获,
//           直接传播到批次边界
// ==========================================

use thiserror::Error;

use crate::domain::error::DomainError;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum ReconcileError {
    // ===== 校验错误 (调用方可修正) =====
    #[error("订单未找到: {0}")]
    OrderNotFound(String),

    #[error("路径未找到: order={order_id}, path={path_id}")]
    PathNotFound { order_id: String, path_id: String },

    #[error("需求数量必须为正: order={order_id}, qty={qty}")]
    NonPositiveQuantity { order_id: String, qty: f64 },

    #[error("比例缩放基准无效 (原始数量非正): order={order_id}, original={original}")]
    InvalidResizeBase { order_id: String, original: f64 },

    #[error("拆分总量必须为正: order={order_id}, total={total}")]
    SplitTotalNotPositive { order_id: String, total: f64 },

    #[error("剥离数量越界 (须在 0 与源数量之间): order={order_id}, qty={qty}, source_qty={source_qty}")]
    BreakOffQtyOutOfRange {
        order_id: String,
        qty: f64,
        source_qty: f64,
    },

    #[error("拆分数量越界 (须在 0 与源数量之间): order={order_id}, qty={qty}, source_qty={source_qty}")]
    SplitQtyOutOfRange {
        order_id: String,
        qty: f64,
        source_qty: f64,
    },

    #[error("订单已排程,禁止切换当前路径: order={order_id}, path={path_id}")]
    PathSwitchWhileScheduled { order_id: String, path_id: String },

    #[error("锁定工厂引用未找到: order={order_id}, plant={plant}")]
    LockedPlantNotFound { order_id: String, plant: String },

    // ===== 授权错误 =====
    #[error("未持有跨厂排程授权: order={0}")]
    SpanPlantsNotEntitled(String),

    // ===== 结构性错误 (视为缺陷,传播到批次边界) =====
    #[error(transparent)]
    Structural(#[from] DomainError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReconcileError {
    /// 是否为调用方可修正的校验错误 (批次内按订单收集)
    ///
    /// 结构性错误除"备选路径集为空"外均不可恢复
    pub fn is_validation(&self) -> bool {
        match self {
            ReconcileError::OrderNotFound(_)
            | ReconcileError::PathNotFound { .. }
            | ReconcileError::NonPositiveQuantity { .. }
            | ReconcileError::InvalidResizeBase { .. }
            | ReconcileError::SplitTotalNotPositive { .. }
            | ReconcileError::BreakOffQtyOutOfRange { .. }
            | ReconcileError::SplitQtyOutOfRange { .. }
            | ReconcileError::PathSwitchWhileScheduled { .. }
            | ReconcileError::LockedPlantNotFound { .. }
            | ReconcileError::SpanPlantsNotEntitled(_) => true,
            ReconcileError::Structural(DomainError::NoAlternatePath(_)) => true,
            ReconcileError::Structural(_) | ReconcileError::Other(_) => false,
        }
    }
}
