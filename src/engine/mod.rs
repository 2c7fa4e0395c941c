// ==========================================
// 制造订单路径与对账引擎 - 引擎层
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 组件设计
// ==========================================
// 职责: 实现路径选择/瓶颈/链接/需求日期/数量/合并对账规则
// 红线: 所有规则必须输出 reason;引擎不做持久化
// ==========================================

pub mod bottleneck;
pub mod erp_merge;
pub mod error;
pub mod events;
pub mod linkage;
pub mod need_date;
pub mod path_selector;
pub mod ports;
pub mod quantity;
pub mod routing_diff;

// 重导出核心引擎
pub use bottleneck::{BottleneckAnalyzer, BottleneckProbe, SimulationFlagProbe};
pub use erp_merge::{BatchReceiveResult, ErpMergeReconciler, OrderFailure};
pub use error::ReconcileError;
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, OrderEvent, OrderEventPublisher, OrderEventType,
};
pub use linkage::SuccessorLinkage;
pub use need_date::NeedDateEngine;
pub use path_selector::PathSelector;
pub use ports::{NoOpSimulation, RecordingSimulation, SimulationPort};
pub use quantity::QuantityReconciler;
pub use routing_diff::{RoutingChangeReport, RoutingDiff};
