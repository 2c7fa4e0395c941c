// ==========================================
// 制造订单路径与对账引擎 - 核心库
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 系统宪法
// 系统定位: 排程域引擎 (模拟引擎/持久层为外部协作方)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 订单注册表 - 弱引用解析与二阶段链接
pub mod registry;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AutoUsePolicy, BottleneckKind, LockReasons, NeedDateMode, OpSchedState, RecomputeFlags,
    RoutingChangeCause, SplitUpdateMode,
};

// 领域实体
pub use domain::{
    AlternatePath, Association, EditRequest, ManufacturingOrder, Node, Operation, OperationHours,
    OrderRevision, OrderSnapshot, RevisionBatch, SuccessorLink,
};

// 注册表
pub use registry::{JobContext, OrderRegistry};

// 引擎
pub use engine::{
    BatchReceiveResult, BottleneckAnalyzer, ErpMergeReconciler, NeedDateEngine, PathSelector,
    QuantityReconciler, RoutingChangeReport, RoutingDiff, SuccessorLinkage,
};

// 错误类型
pub use engine::error::ReconcileError;

// API
pub use api::OrderApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "制造订单路径与对账引擎";
