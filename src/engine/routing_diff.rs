// ==========================================
// 制造订单路径与对账引擎 - 路径结构差异引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - ERPMergeReconciler 结构差异
// ==========================================
// 判定: 触及已排程工序的结构差异是致命的 (强制整单替换);
//       其余路径差异只要求原地更新时刷新路径集
// ==========================================

use std::collections::BTreeSet;

use crate::domain::order::ManufacturingOrder;
use crate::domain::types::RoutingChangeCause;

// ==========================================
// RoutingChangeReport - 结构差异报告
// ==========================================
#[derive(Debug, Clone)]
pub struct RoutingChangeReport {
    pub scheduled_routing_changed: bool, // 致命: 必须整单替换
    pub alternate_path_changed: bool,    // 非致命: 原地更新需刷新路径
    pub cause: Option<RoutingChangeCause>,
    pub description: String,
}

impl RoutingChangeReport {
    pub fn unchanged() -> Self {
        Self {
            scheduled_routing_changed: false,
            alternate_path_changed: false,
            cause: None,
            description: String::new(),
        }
    }

    fn fatal(cause: RoutingChangeCause, description: String) -> Self {
        Self {
            scheduled_routing_changed: true,
            alternate_path_changed: true,
            cause: Some(cause),
            description,
        }
    }

    fn path_refresh(cause: RoutingChangeCause, description: String) -> Self {
        Self {
            scheduled_routing_changed: false,
            alternate_path_changed: true,
            cause: Some(cause),
            description,
        }
    }
}

// ==========================================
// RoutingDiff - 结构差异引擎
// ==========================================
#[derive(Debug, Default)]
pub struct RoutingDiff;

impl RoutingDiff {
    pub fn new() -> Self {
        Self
    }

    /// 比较在册订单与候选订单的路径结构
    pub fn compare(
        &self,
        live: &ManufacturingOrder,
        candidate: &ManufacturingOrder,
    ) -> RoutingChangeReport {
        // ===== 已排程工序被移除: 致命 =====
        for (op_id, op) in &live.operations {
            if candidate.operations.contains_key(op_id) {
                continue;
            }
            if op.sched_state.is_scheduled() {
                return RoutingChangeReport::fatal(
                    RoutingChangeCause::ScheduledOperationRemoved,
                    format!("已排程工序 {} 在修订中被移除", op_id),
                );
            }
        }

        // ===== 匹配工序逐一比对 =====
        let mut refresh: Option<RoutingChangeReport> = None;
        let mut note_refresh = |report: RoutingChangeReport| {
            if refresh.is_none() {
                refresh = Some(report);
            }
        };

        for (op_id, live_op) in &live.operations {
            let Some(cand_op) = candidate.operations.get(op_id) else {
                // 未排程工序被移除: 非致命
                note_refresh(RoutingChangeReport::path_refresh(
                    RoutingChangeCause::OperationRemoved,
                    format!("工序 {} 在修订中被移除", op_id),
                ));
                continue;
            };
            if live_op.kind != cand_op.kind {
                if live_op.sched_state.is_scheduled() {
                    return RoutingChangeReport::fatal(
                        RoutingChangeCause::ScheduledOperationChangedType,
                        format!(
                            "已排程工序 {} 类型变更: {} -> {}",
                            op_id, live_op.kind, cand_op.kind
                        ),
                    );
                }
                note_refresh(RoutingChangeReport::path_refresh(
                    RoutingChangeCause::OperationTypeChanged,
                    format!("工序 {} 类型变更: {} -> {}", op_id, live_op.kind, cand_op.kind),
                ));
            }
            if live_op.products_produced != cand_op.products_produced {
                if live_op.sched_state.is_scheduled() {
                    return RoutingChangeReport::fatal(
                        RoutingChangeCause::ProductChanged,
                        format!("已排程工序 {} 产出产品变更", op_id),
                    );
                }
                note_refresh(RoutingChangeReport::path_refresh(
                    RoutingChangeCause::ProductChanged,
                    format!("工序 {} 产出产品变更", op_id),
                ));
            }
        }

        // ===== 路径集比对 (按外部ID + 拓扑) =====
        let live_path_ids: BTreeSet<&str> = live
            .alternate_paths
            .iter()
            .map(|p| p.external_id.as_str())
            .collect();
        let cand_path_ids: BTreeSet<&str> = candidate
            .alternate_paths
            .iter()
            .map(|p| p.external_id.as_str())
            .collect();

        for removed in live_path_ids.difference(&cand_path_ids) {
            note_refresh(RoutingChangeReport::path_refresh(
                RoutingChangeCause::PathRemoved,
                format!("备选路径 {} 在修订中被移除", removed),
            ));
        }
        for added in cand_path_ids.difference(&live_path_ids) {
            note_refresh(RoutingChangeReport::path_refresh(
                RoutingChangeCause::PathChanged,
                format!("修订新增备选路径 {}", added),
            ));
        }

        for op_id in candidate.operations.keys() {
            if !live.operations.contains_key(op_id) {
                note_refresh(RoutingChangeReport::path_refresh(
                    RoutingChangeCause::OperationAdded,
                    format!("修订新增工序 {}", op_id),
                ));
            }
        }

        // 同ID路径的拓扑比对: 节点集与边集
        for live_path in &live.alternate_paths {
            let Some(cand_path) = candidate.path(&live_path.external_id) else {
                continue;
            };
            let live_nodes: Vec<(&str, &BTreeSet<String>)> = live_path
                .nodes
                .iter()
                .map(|n| (n.operation_id.as_str(), &n.successors))
                .collect();
            let cand_nodes: Vec<(&str, &BTreeSet<String>)> = cand_path
                .nodes
                .iter()
                .map(|n| (n.operation_id.as_str(), &n.successors))
                .collect();
            if live_nodes != cand_nodes || live_path.preference != cand_path.preference {
                note_refresh(RoutingChangeReport::path_refresh(
                    RoutingChangeCause::PathChanged,
                    format!("备选路径 {} 拓扑或属性变更", live_path.external_id),
                ));
            }
        }

        refresh.unwrap_or_else(RoutingChangeReport::unchanged)
    }
}
