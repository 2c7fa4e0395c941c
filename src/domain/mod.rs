// ==========================================
// 制造订单路径与对账引擎 - 领域模型层
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 数据模型
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含跨订单遍历逻辑,不含对账引擎逻辑
// ==========================================

pub mod error;
pub mod operation;
pub mod order;
pub mod revision;
pub mod routing;
pub mod snapshot;
pub mod successor;
pub mod types;

// 重导出核心类型
pub use error::DomainError;
pub use operation::{MaterialRequirement, Operation, OperationHours};
pub use order::ManufacturingOrder;
pub use revision::{
    EditRequest, OperationRevision, OrderRevision, PathRevision, RevisionBatch,
    SuccessorLinkRevision,
};
pub use routing::{select_default_path, AlternatePath, Association, Node};
pub use snapshot::{
    OperationSnapshot, OrderSnapshot, PathSnapshot, SuccessorLinkSnapshot, SNAPSHOT_VERSION,
};
pub use successor::{LinkTarget, SuccessorLink};
pub use types::{
    AutoUsePolicy, BottleneckKind, LockReasons, NeedDateMode, OpSchedState, RecomputeFlags,
    RoutingChangeCause, SplitUpdateMode,
};
