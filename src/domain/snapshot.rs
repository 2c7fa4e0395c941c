// ==========================================
// 制造订单路径与对账引擎 - 版本化持久快照
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 持久层接口契约
// ==========================================
// 红线: 字段顺序与出现标志是线上契约的一部分;
//       旧版本缺少新增字段,装载器必须以默认值补齐
// 版本史:
//   v1 基础字段 + 路径/工序/链接子快照
//   v2 新增 发运缓冲覆写 + 拆分/剥离谱系
//   v3 新增 JIT 派生需求日期
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::error::DomainError;
use crate::domain::operation::{MaterialRequirement, Operation, OperationHours};
use crate::domain::order::ManufacturingOrder;
use crate::domain::routing::{AlternatePath, Association};
use crate::domain::successor::SuccessorLink;
use crate::domain::types::{
    AutoUsePolicy, BottleneckKind, NeedDateMode, OpSchedState, SplitUpdateMode,
};

/// 当前快照格式版本
pub const SNAPSHOT_VERSION: u32 = 3;

// ==========================================
// OrderSnapshot - 订单快照
// ==========================================
// 字段声明顺序即序列化顺序,不可重排
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub version: u32,

    // ===== 有序基础字段 =====
    pub external_id: String,
    pub job_id: String,
    pub product_name: Option<String>,
    pub required_qty: f64,
    pub requested_qty: f64,
    pub original_qty: f64,
    pub expected_finish_qty: f64,
    pub hold: bool,
    pub hold_reason: Option<String>,
    pub hold_until: Option<NaiveDateTime>,
    pub need_date_mode: NeedDateMode,
    pub need_date: Option<NaiveDateTime>,
    pub lock_to_current_path: bool,
    pub can_span_plants: bool,
    pub locked_plant: Option<String>,
    pub template_ref: Option<String>,
    pub inventory_ref: Option<String>,

    // ===== v2 新增 (旧版本缺省) =====
    #[serde(default)]
    pub shipping_buffer_minutes: Option<i64>,
    #[serde(default)]
    pub split_from_id: Option<String>,
    #[serde(default = "default_split_update_mode")]
    pub split_update_mode: SplitUpdateMode,
    #[serde(default)]
    pub is_split: bool,
    #[serde(default)]
    pub break_off_source_id: Option<String>,

    // ===== v3 新增 =====
    #[serde(default)]
    pub sub_need_date: Option<NaiveDateTime>,

    // ===== 嵌套子快照 =====
    pub operations: Vec<OperationSnapshot>,
    pub paths: Vec<PathSnapshot>,
    pub current_path_id: Option<String>,
    pub default_path_id: Option<String>,

    // 链接表前置出现标志 (线上契约)
    pub has_successor_links: bool,
    pub successor_links: Vec<SuccessorLinkSnapshot>,
}

fn default_split_update_mode() -> SplitUpdateMode {
    SplitUpdateMode::Proportional
}

// ==========================================
// OperationSnapshot - 工序子快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSnapshot {
    pub external_id: String,
    pub name: String,
    pub kind: String,
    pub omitted: bool,
    pub required_qty: f64,
    pub finished_qty: f64,
    pub hours: OperationHours,
    pub products_produced: Vec<String>,
    pub material_requirements: Vec<MaterialRequirement>,
    pub sched_state: OpSchedState,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_plant: Option<String>,
    pub jit_start: Option<NaiveDateTime>,
    pub resource_locked: bool,
    pub anchored: bool,
    pub bottleneck_flag: Option<BottleneckKind>,
}

// ==========================================
// PathSnapshot - 路径子快照
// ==========================================
// 节点/边分离存储,装载时经构建器重新校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSnapshot {
    pub external_id: String,
    pub preference: i32,
    pub auto_use_policy: AutoUsePolicy,
    pub nodes: Vec<(String, f64)>,
    pub edges: Vec<Association>,
}

// ==========================================
// SuccessorLinkSnapshot - 后继链接子快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessorLinkSnapshot {
    pub successor_mo_id: String,
    pub path_scope: Option<String>,
    pub operation_scope: Option<String>,
    pub transfer_span_minutes: i64,
    pub usage_qty_per_cycle: f64,
}

impl OrderSnapshot {
    /// 从在册订单采集快照
    pub fn capture(mo: &ManufacturingOrder) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            external_id: mo.external_id.clone(),
            job_id: mo.job_id.clone(),
            product_name: mo.product_name.clone(),
            required_qty: mo.required_qty,
            requested_qty: mo.requested_qty,
            original_qty: mo.original_qty,
            expected_finish_qty: mo.expected_finish_qty,
            hold: mo.hold,
            hold_reason: mo.hold_reason.clone(),
            hold_until: mo.hold_until,
            need_date_mode: mo.need_date_mode,
            need_date: mo.need_date,
            lock_to_current_path: mo.lock_to_current_path,
            can_span_plants: mo.can_span_plants,
            locked_plant: mo.locked_plant.clone(),
            template_ref: mo.template_ref.clone(),
            inventory_ref: mo.inventory_ref.clone(),
            shipping_buffer_minutes: mo.shipping_buffer_minutes,
            split_from_id: mo.split_from_id.clone(),
            split_update_mode: mo.split_update_mode,
            is_split: mo.is_split,
            break_off_source_id: mo.break_off_source_id.clone(),
            sub_need_date: mo.sub_need_date,
            operations: {
                // HashMap 迭代序不稳定,按ID排序保证快照确定性
                let mut ops: Vec<&Operation> = mo.operations.values().collect();
                ops.sort_by(|a, b| a.external_id.cmp(&b.external_id));
                ops.into_iter().map(OperationSnapshot::capture).collect()
            },
            paths: mo.alternate_paths.iter().map(PathSnapshot::capture).collect(),
            current_path_id: mo.current_path_id.clone(),
            default_path_id: mo.default_path_id.clone(),
            has_successor_links: !mo.successor_links.is_empty(),
            successor_links: mo
                .successor_links
                .iter()
                .map(SuccessorLinkSnapshot::capture)
                .collect(),
        }
    }

    /// 还原订单;后继链接在注册表 relink 前保持未解析
    pub fn restore(self) -> Result<ManufacturingOrder, DomainError> {
        let mut mo = ManufacturingOrder::new(self.external_id, self.job_id);
        mo.product_name = self.product_name;
        mo.required_qty = self.required_qty;
        mo.requested_qty = self.requested_qty;
        mo.original_qty = self.original_qty;
        mo.expected_finish_qty = self.expected_finish_qty;
        mo.hold = self.hold;
        mo.hold_reason = self.hold_reason;
        mo.hold_until = self.hold_until;
        mo.need_date_mode = self.need_date_mode;
        mo.need_date = self.need_date;
        mo.lock_to_current_path = self.lock_to_current_path;
        mo.can_span_plants = self.can_span_plants;
        mo.locked_plant = self.locked_plant;
        mo.template_ref = self.template_ref;
        mo.inventory_ref = self.inventory_ref;
        mo.shipping_buffer_minutes = self.shipping_buffer_minutes;
        mo.split_from_id = self.split_from_id;
        mo.split_update_mode = self.split_update_mode;
        mo.is_split = self.is_split;
        mo.break_off_source_id = self.break_off_source_id;
        mo.sub_need_date = self.sub_need_date;

        mo.operations = self
            .operations
            .into_iter()
            .map(|snap| (snap.external_id.clone(), snap.restore()))
            .collect::<HashMap<_, _>>();

        mo.alternate_paths = self
            .paths
            .into_iter()
            .map(PathSnapshot::restore)
            .collect::<Result<Vec<_>, _>>()?;
        mo.current_path_id = self.current_path_id;
        mo.default_path_id = self.default_path_id;

        if self.has_successor_links {
            mo.successor_links = self
                .successor_links
                .into_iter()
                .map(SuccessorLinkSnapshot::restore)
                .collect();
        }

        mo.associate_operations_with_paths()?;
        mo.verify_invariants()?;
        Ok(mo)
    }
}

impl OperationSnapshot {
    fn capture(op: &Operation) -> Self {
        Self {
            external_id: op.external_id.clone(),
            name: op.name.clone(),
            kind: op.kind.clone(),
            omitted: op.omitted,
            required_qty: op.required_qty,
            finished_qty: op.finished_qty,
            hours: op.hours,
            products_produced: op.products_produced.clone(),
            material_requirements: op.material_requirements.clone(),
            sched_state: op.sched_state,
            scheduled_start: op.scheduled_start,
            scheduled_plant: op.scheduled_plant.clone(),
            jit_start: op.jit_start,
            resource_locked: op.resource_locked,
            anchored: op.anchored,
            bottleneck_flag: op.bottleneck_flag,
        }
    }

    fn restore(self) -> Operation {
        let mut op = Operation::new(self.external_id, self.name, self.kind);
        op.omitted = self.omitted;
        op.required_qty = self.required_qty;
        op.finished_qty = self.finished_qty;
        op.hours = self.hours;
        op.products_produced = self.products_produced;
        op.material_requirements = self.material_requirements;
        op.sched_state = self.sched_state;
        op.scheduled_start = self.scheduled_start;
        op.scheduled_plant = self.scheduled_plant;
        op.jit_start = self.jit_start;
        op.resource_locked = self.resource_locked;
        op.anchored = self.anchored;
        op.bottleneck_flag = self.bottleneck_flag;
        op
    }
}

impl PathSnapshot {
    fn capture(path: &AlternatePath) -> Self {
        let mut edges = Vec::new();
        for node in &path.nodes {
            for succ in &node.successors {
                edges.push(Association::new(node.operation_id.clone(), succ.clone()));
            }
        }
        Self {
            external_id: path.external_id.clone(),
            preference: path.preference,
            auto_use_policy: path.auto_use_policy,
            nodes: path
                .nodes
                .iter()
                .map(|n| (n.operation_id.clone(), n.qty_per_parent))
                .collect(),
            edges,
        }
    }

    fn restore(self) -> Result<AlternatePath, DomainError> {
        AlternatePath::build(
            self.external_id,
            self.preference,
            self.auto_use_policy,
            self.nodes,
            &self.edges,
        )
    }
}

impl SuccessorLinkSnapshot {
    fn capture(link: &SuccessorLink) -> Self {
        Self {
            successor_mo_id: link.successor_mo_id.clone(),
            path_scope: link.path_scope.clone(),
            operation_scope: link.operation_scope.clone(),
            transfer_span_minutes: link.transfer_span_minutes,
            usage_qty_per_cycle: link.usage_qty_per_cycle,
        }
    }

    fn restore(self) -> SuccessorLink {
        SuccessorLink {
            successor_mo_id: self.successor_mo_id,
            path_scope: self.path_scope,
            operation_scope: self.operation_scope,
            transfer_span_minutes: self.transfer_span_minutes,
            usage_qty_per_cycle: self.usage_qty_per_cycle,
            resolved: false,
        }
    }
}
