// ==========================================
// 制造订单路径与对账引擎 - 领域类型定义
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 路径选择与对账体系
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 自动启用策略 (Auto Use Policy)
// ==========================================
// 默认路径选择规则的判定依据
// 序列化格式: SCREAMING_SNAKE_CASE (与快照格式一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoUsePolicy {
    RegularRelease,                            // 常规放行
    ReleaseOffsetFromDefaultPathsLatestRelease, // 相对默认路径最晚放行偏移
    Other,                                     // 其他 (不参与自动选择)
}

impl fmt::Display for AutoUsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoUsePolicy::RegularRelease => write!(f, "REGULAR_RELEASE"),
            AutoUsePolicy::ReleaseOffsetFromDefaultPathsLatestRelease => {
                write!(f, "RELEASE_OFFSET_FROM_DEFAULT_PATHS_LATEST_RELEASE")
            }
            AutoUsePolicy::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// 需求日期模式 (Need Date Mode)
// ==========================================
// 红线: 显式日期优先,派生日期只在 DerivedFromJob 下生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeedDateMode {
    Explicit,       // 订单自带需求日期
    DerivedFromJob, // 由后继订单/所属工单推导
}

impl fmt::Display for NeedDateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeedDateMode::Explicit => write!(f, "EXPLICIT"),
            NeedDateMode::DerivedFromJob => write!(f, "DERIVED_FROM_JOB"),
        }
    }
}

// ==========================================
// 拆分更新模式 (Split Update Mode)
// ==========================================
// Individual: 各拆分订单独立维护,禁用级联状态分摊
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitUpdateMode {
    Proportional, // 按占比级联分摊
    Individual,   // 独立更新
}

impl fmt::Display for SplitUpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitUpdateMode::Proportional => write!(f, "PROPORTIONAL"),
            SplitUpdateMode::Individual => write!(f, "INDIVIDUAL"),
        }
    }
}

// ==========================================
// 工序排程状态 (Operation Schedule State)
// ==========================================
// 由模拟引擎写入,本引擎只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpSchedState {
    Unscheduled, // 未排程
    Scheduled,   // 已排程
    Started,     // 已开工
    Finished,    // 已完工
}

impl OpSchedState {
    /// 是否已被排程占用 (含开工/完工)
    pub fn is_scheduled(&self) -> bool {
        !matches!(self, OpSchedState::Unscheduled)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, OpSchedState::Finished)
    }
}

impl fmt::Display for OpSchedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpSchedState::Unscheduled => write!(f, "UNSCHEDULED"),
            OpSchedState::Scheduled => write!(f, "SCHEDULED"),
            OpSchedState::Started => write!(f, "STARTED"),
            OpSchedState::Finished => write!(f, "FINISHED"),
        }
    }
}

// ==========================================
// 瓶颈类型 (Bottleneck Kind)
// ==========================================
// 由模拟引擎标记: 产能瓶颈或物料瓶颈
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleneckKind {
    Resource, // 产能瓶颈
    Material, // 物料瓶颈
}

impl fmt::Display for BottleneckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BottleneckKind::Resource => write!(f, "RESOURCE"),
            BottleneckKind::Material => write!(f, "MATERIAL"),
        }
    }
}

// ==========================================
// 路径结构变更原因 (Routing Change Cause)
// ==========================================
// 结构差异判定的输出,决定整单替换还是原地更新
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingChangeCause {
    PathRemoved,                  // 路径被移除 (无已排程工序)
    ScheduledOperationRemoved,    // 已排程工序被移除 (致命)
    OperationRemoved,             // 未排程工序被移除
    OperationAdded,               // 工序新增
    ScheduledOperationChangedType, // 已排程工序类型变更 (致命)
    OperationTypeChanged,         // 未排程工序类型变更
    ProductChanged,               // 产出产品变更 (已排程时致命)
    PathChanged,                  // 路径拓扑/属性变更
}

impl fmt::Display for RoutingChangeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingChangeCause::PathRemoved => write!(f, "PATH_REMOVED"),
            RoutingChangeCause::ScheduledOperationRemoved => {
                write!(f, "SCHEDULED_OPERATION_REMOVED")
            }
            RoutingChangeCause::OperationRemoved => write!(f, "OPERATION_REMOVED"),
            RoutingChangeCause::OperationAdded => write!(f, "OPERATION_ADDED"),
            RoutingChangeCause::ScheduledOperationChangedType => {
                write!(f, "SCHEDULED_OPERATION_CHANGED_TYPE")
            }
            RoutingChangeCause::OperationTypeChanged => write!(f, "OPERATION_TYPE_CHANGED"),
            RoutingChangeCause::ProductChanged => write!(f, "PRODUCT_CHANGED"),
            RoutingChangeCause::PathChanged => write!(f, "PATH_CHANGED"),
        }
    }
}

// ==========================================
// 路径锁定原因 (Lock Reasons)
// ==========================================
// 位掩码: 调用方用按位与测试成员关系
// 替代原 BoolVector32,仅保留命名常量位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockReasons(pub u32);

impl LockReasons {
    pub const FREE: LockReasons = LockReasons(0);
    pub const SINGLE_PATH: LockReasons = LockReasons(1 << 0); // 仅一条备选路径
    pub const LOCK_FLAG_SET: LockReasons = LockReasons(1 << 1); // 人工锁定标志
    pub const STARTED: LockReasons = LockReasons(1 << 2); // 开工截止线之前已排程
    pub const RESOURCE_LOCKED: LockReasons = LockReasons(1 << 3); // 当前路径工序资源锁定
    pub const ANCHORED: LockReasons = LockReasons(1 << 4); // 工序被锚定

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, other: LockReasons) {
        self.0 |= other.0;
    }

    /// 按位与测试成员关系
    pub fn contains(&self, other: LockReasons) -> bool {
        (self.0 & other.0) == other.0
    }

    /// 任意锁定位被置位即视为锁定
    pub fn is_locked(&self) -> bool {
        self.0 != 0
    }
}

impl std::ops::BitOr for LockReasons {
    type Output = LockReasons;

    fn bitor(self, rhs: LockReasons) -> LockReasons {
        LockReasons(self.0 | rhs.0)
    }
}

impl fmt::Display for LockReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_locked() {
            return write!(f, "FREE");
        }
        let mut parts = Vec::new();
        if self.contains(LockReasons::SINGLE_PATH) {
            parts.push("SINGLE_PATH");
        }
        if self.contains(LockReasons::LOCK_FLAG_SET) {
            parts.push("LOCK_FLAG_SET");
        }
        if self.contains(LockReasons::STARTED) {
            parts.push("STARTED");
        }
        if self.contains(LockReasons::RESOURCE_LOCKED) {
            parts.push("RESOURCE_LOCKED");
        }
        if self.contains(LockReasons::ANCHORED) {
            parts.push("ANCHORED");
        }
        write!(f, "{}", parts.join("|"))
    }
}

// ==========================================
// 重算标志 (Recompute Flags)
// ==========================================
// 字段变更触发的下游重算范围,挂在所属工单上
// 由下一次查询/排程周期惰性消费
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecomputeFlags {
    pub eligibility: bool, // 可排程资格重算
    pub constraint: bool,  // 约束重算
    pub jit: bool,         // JIT 时序重算
    pub production: bool,  // 产量重算
}

impl RecomputeFlags {
    pub fn any(&self) -> bool {
        self.eligibility || self.constraint || self.jit || self.production
    }

    pub fn merge(&mut self, other: RecomputeFlags) {
        self.eligibility |= other.eligibility;
        self.constraint |= other.constraint;
        self.jit |= other.jit;
        self.production |= other.production;
    }
}
