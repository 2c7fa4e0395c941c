// ==========================================
// 制造订单路径与对账引擎 - ERP 修订快照类型
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 修订馈送接口
// ==========================================
// 约定: 每个字段单独携带"源中是否出现"标记 (Option),
//       未出现的字段继承在册订单的现值,而不是被清零
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::operation::{MaterialRequirement, OperationHours};
use crate::domain::routing::Association;
use crate::domain::types::{AutoUsePolicy, NeedDateMode, SplitUpdateMode};

// ==========================================
// RevisionBatch - 修订批次
// ==========================================
// 一个批次覆盖一个工单的全部订单;在册但缺席的订单按删除处理
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionBatch {
    pub job_id: String,
    pub job_need_date: Option<NaiveDateTime>,
    pub revisions: Vec<OrderRevision>,
}

// ==========================================
// OrderRevision - 订单修订
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRevision {
    pub external_id: String,                 // 目标订单外部ID
    pub replacement_id: Option<String>,      // 整单替换时采用的新ID (缺省沿用原ID)

    pub product_name: Option<String>,
    pub required_qty: Option<f64>,
    pub resize_for_storage: bool,            // 仓储改量例外标记

    pub hold: Option<bool>,
    pub hold_reason: Option<String>,
    pub hold_until: Option<NaiveDateTime>,

    pub need_date_mode: Option<NeedDateMode>,
    pub need_date: Option<NaiveDateTime>,
    pub shipping_buffer_minutes: Option<i64>,

    pub lock_to_current_path: Option<bool>,
    pub can_span_plants: Option<bool>,
    pub locked_plant: Option<String>,
    pub clear_locked_plant: bool,

    pub split_update_mode: Option<SplitUpdateMode>,

    pub requested_default_path: Option<String>,

    // 嵌套修订: None 表示源中未携带路径/工序/链接段,沿用在册结构
    pub paths: Option<Vec<PathRevision>>,
    pub operations: Option<Vec<OperationRevision>>,
    pub successor_links: Option<Vec<SuccessorLinkRevision>>,
}

// ==========================================
// PathRevision - 路径修订
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRevision {
    pub external_id: String,
    pub preference: i32,
    pub auto_use_policy: AutoUsePolicy,
    // (工序ID, 单件用量系数)
    pub nodes: Vec<(String, f64)>,
    pub edges: Vec<Association>,
}

// ==========================================
// OperationRevision - 工序修订
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRevision {
    pub external_id: String,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub omitted: Option<bool>,
    pub required_qty: Option<f64>,
    pub hours: Option<OperationHours>,
    pub products_produced: Option<Vec<String>>,
    pub material_requirements: Option<Vec<MaterialRequirement>>,
}

// ==========================================
// SuccessorLinkRevision - 后继链接修订
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessorLinkRevision {
    pub successor_mo_id: String,
    pub path_scope: Option<String>,
    pub operation_scope: Option<String>,
    pub transfer_span_minutes: Option<i64>,
    pub usage_qty_per_cycle: Option<f64>,
}

// ==========================================
// EditRequest - 人工编辑请求
// ==========================================
// 与 ERP 修订同构的"字段出现即生效"语义,但走人工编辑校验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditRequest {
    pub order_id: String,

    pub hold: Option<bool>,
    pub hold_reason: Option<String>,
    pub hold_until: Option<NaiveDateTime>,

    pub lock_to_current_path: Option<bool>,
    pub can_span_plants: Option<bool>,
    pub locked_plant: Option<String>,
    pub clear_locked_plant: bool,

    pub current_path: Option<String>, // 切换当前路径 (仅未排程时允许)

    pub need_date_mode: Option<NeedDateMode>,
    pub need_date: Option<NaiveDateTime>,
    pub shipping_buffer_minutes: Option<i64>,

    pub split_update_mode: Option<SplitUpdateMode>,
}
