// ==========================================
// 制造订单路径与对账引擎 - 工序能力视图
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 外部协作方类型
// 职责: 工序作为能力集被消费,排程字段由模拟引擎写入
// 红线: 本引擎只读模拟引擎写入的字段,唯一回调是 unschedule
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{BottleneckKind, OpSchedState};

// ==========================================
// OperationHours - 工序工时
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationHours {
    pub standard_hours: f64, // 标准工时
    pub setup_hours: f64,    // 换型工时
    pub run_hours: f64,      // 加工工时 (随数量缩放)
    pub clean_hours: f64,    // 清场工时
}

impl OperationHours {
    /// 合计工时 (成本/工时聚合使用)
    pub fn total(&self) -> f64 {
        self.standard_hours + self.setup_hours + self.run_hours + self.clean_hours
    }
}

// ==========================================
// MaterialRequirement - 物料需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_id: String,    // 物料ID
    pub qty_per_cycle: f64,     // 单循环用量
}

// ==========================================
// Operation - 工序
// ==========================================
// 字段分两组: 对账引擎维护的计划字段,与模拟引擎写入的观测字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    // ===== 标识 =====
    pub external_id: String, // 工序外部ID (路径节点引用键)
    pub name: String,        // 工序名称 (拆分分摊按名称配对)
    pub kind: String,        // 工序类型标签 (结构差异判定依据)

    // ===== 计划字段 (本引擎维护) =====
    pub omitted: bool,               // 是否省略 (不参与工时/数量计算)
    pub required_qty: f64,           // 计划数量
    pub finished_qty: f64,           // 完工数量
    pub hours: OperationHours,       // 工时
    pub products_produced: Vec<String>,            // 产出产品
    pub material_requirements: Vec<MaterialRequirement>, // 物料需求

    // ===== 观测字段 (模拟引擎写入,本引擎只读) =====
    pub sched_state: OpSchedState,             // 排程状态
    pub scheduled_start: Option<NaiveDateTime>, // 排程开工时间
    pub scheduled_plant: Option<String>,       // 排程所在工厂
    pub jit_start: Option<NaiveDateTime>,      // JIT 最晚开工时间
    pub resource_locked: bool,                 // 资源锁定
    pub anchored: bool,                        // 锚定
    pub bottleneck_flag: Option<BottleneckKind>, // 模拟引擎标记的瓶颈类型
}

impl Operation {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            kind: kind.into(),
            omitted: false,
            required_qty: 0.0,
            finished_qty: 0.0,
            hours: OperationHours::default(),
            products_produced: Vec::new(),
            material_requirements: Vec::new(),
            sched_state: OpSchedState::Unscheduled,
            scheduled_start: None,
            scheduled_plant: None,
            jit_start: None,
            resource_locked: false,
            anchored: false,
            bottleneck_flag: None,
        }
    }

    /// 是否参与工时/数量聚合
    pub fn is_active(&self) -> bool {
        !self.omitted
    }

    /// 模拟引擎是否已将其标记为瓶颈 (产能或物料)
    pub fn reports_bottleneck(&self) -> bool {
        self.bottleneck_flag.is_some()
    }

    /// 是否产出指定产品
    pub fn produces(&self, product: &str) -> bool {
        self.products_produced.iter().any(|p| p == product)
    }

    /// 是否消耗指定物料
    pub fn consumes(&self, material: &str) -> bool {
        self.material_requirements
            .iter()
            .any(|m| m.material_id == material)
    }
}
