// ==========================================
// 制造订单路径与对账引擎 - 跨订单后继链接
// ==========================================
// 依据: Order_Routing_Master_Spec.md - SuccessorLinkage
// ==========================================
// 红线: 后继链接是弱引用 (仅按外部ID查找,从不持有所有权),
//       批量装载后统一执行 relink 二阶段链接
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// SuccessorLink - 后继链接
// ==========================================
// 从本订单指向后继订单的有向边,可选收窄到后继的某条路径或某个工序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessorLink {
    pub successor_mo_id: String,          // 后继订单外部ID
    pub path_scope: Option<String>,       // 收窄到后继的某条备选路径
    pub operation_scope: Option<String>,  // 收窄到后继的某个工序
    pub transfer_span_minutes: i64,       // 最小转移时距 (分钟)
    pub usage_qty_per_cycle: f64,         // 单循环用量

    // relink 阶段写入;装载期为 false
    #[serde(skip)]
    pub resolved: bool,
}

// resolved 是链接阶段的运行时标记,不参与等价比较
impl PartialEq for SuccessorLink {
    fn eq(&self, other: &Self) -> bool {
        self.successor_mo_id == other.successor_mo_id
            && self.path_scope == other.path_scope
            && self.operation_scope == other.operation_scope
            && self.transfer_span_minutes == other.transfer_span_minutes
            && self.usage_qty_per_cycle == other.usage_qty_per_cycle
    }
}

impl SuccessorLink {
    pub fn new(successor_mo_id: impl Into<String>) -> Self {
        Self {
            successor_mo_id: successor_mo_id.into(),
            path_scope: None,
            operation_scope: None,
            transfer_span_minutes: 0,
            usage_qty_per_cycle: 0.0,
            resolved: false,
        }
    }

    pub fn with_path_scope(mut self, path_id: impl Into<String>) -> Self {
        self.path_scope = Some(path_id.into());
        self
    }

    pub fn with_operation_scope(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_scope = Some(operation_id.into());
        self
    }

    pub fn with_transfer_span_minutes(mut self, minutes: i64) -> Self {
        self.transfer_span_minutes = minutes;
        self
    }

    pub fn with_usage_qty_per_cycle(mut self, qty: f64) -> Self {
        self.usage_qty_per_cycle = qty;
        self
    }
}

// ==========================================
// LinkTarget - 链接目标解析结果
// ==========================================
// 分类下游工序时的解析精度: 工序级 > 路径级 > 订单级,
// 细粒度目标解析失败时逐级回退
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Operation(String), // 命中后继的具体工序
    Path(String),      // 命中后继的某条路径
    Order,             // 整单
}
