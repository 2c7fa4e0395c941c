// ==========================================
// 制造订单路径与对账引擎 - 数量对账引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - QuantityReconciler
// ==========================================
// 规则: 比例改量先作用于非当前路径,当前路径最后写入;
//       跨路径共享工序的数量以当前路径的值为准 (末写胜出,设计属性)
// 红线: 拆分总量非正属前置条件违反,拒绝而不是猜测回退
// ==========================================

use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::operation::Operation;
use crate::domain::order::ManufacturingOrder;
use crate::domain::types::{OpSchedState, SplitUpdateMode};
use crate::engine::error::ReconcileError;
use crate::registry::OrderRegistry;

/// QuantityReconciler - 数量对账引擎
#[derive(Debug, Default)]
pub struct QuantityReconciler;

impl QuantityReconciler {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 比例改量
    // ==========================================

    /// 按比例缩放订单及其全部路径上的工序数量
    ///
    /// 返回缩放比 (newQty / originalQty)。调用方负责在之后
    /// 触发 JIT 时序重算。对同一 newQty 重复调用是幂等的。
    pub fn set_required_qty(
        &self,
        mo: &mut ManufacturingOrder,
        new_qty: f64,
    ) -> Result<f64, ReconcileError> {
        if new_qty <= 0.0 {
            return Err(ReconcileError::NonPositiveQuantity {
                order_id: mo.external_id.clone(),
                qty: new_qty,
            });
        }
        if mo.original_qty <= 0.0 {
            return Err(ReconcileError::InvalidResizeBase {
                order_id: mo.external_id.clone(),
                original: mo.original_qty,
            });
        }
        let ratio = new_qty / mo.original_qty;

        // 遍历顺序: 非当前路径在前,当前路径最后写入
        let current_id = mo.current_path_id.clone();
        let mut order: Vec<usize> = Vec::with_capacity(mo.alternate_paths.len());
        let mut current_idx = None;
        for (i, path) in mo.alternate_paths.iter().enumerate() {
            if Some(path.external_id.as_str()) == current_id.as_deref() {
                current_idx = Some(i);
            } else {
                order.push(i);
            }
        }
        order.extend(current_idx);

        for idx in order {
            // 先物化 (工序ID, 用量系数) 清单,再回写注册表
            let assignments: Vec<(String, f64)> = mo.alternate_paths[idx]
                .nodes
                .iter()
                .map(|n| (n.operation_id.clone(), n.qty_per_parent))
                .collect();
            for (op_id, qty_per_parent) in assignments {
                if let Some(op) = mo.operations.get_mut(&op_id) {
                    if op.is_active() {
                        op.required_qty = new_qty * qty_per_parent;
                    }
                }
            }
        }

        // 加工工时随比例缩放 (每个工序恰好一次,与路径数无关)
        for op in mo.operations.values_mut() {
            if op.is_active() {
                op.hours.run_hours *= ratio;
            }
        }

        mo.required_qty = new_qty;
        mo.requested_qty = new_qty;
        mo.original_qty = new_qty;
        mo.expected_finish_qty *= ratio;

        info!(order = %mo.external_id, new_qty, ratio, "比例改量完成");
        Ok(ratio)
    }

    // ==========================================
    // 拆分状态级联分摊
    // ==========================================

    /// 在拆分谱系内按占比分摊工序状态
    ///
    /// 对每个 (源工序, 拆分工序) 名称配对调用单工序分摊器,
    /// 占比为 拆分单需求量 / 全谱系总量。
    /// `SplitUpdateMode::Individual` 整体禁用级联。
    pub fn allocate_status_across_splits(
        &self,
        registry: &mut OrderRegistry,
        root_id: &str,
        total_qty: f64,
    ) -> Result<(), ReconcileError> {
        if total_qty <= 0.0 {
            return Err(ReconcileError::SplitTotalNotPositive {
                order_id: root_id.to_string(),
                total: total_qty,
            });
        }
        let root = registry
            .get(root_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(root_id.to_string()))?;

        if root.split_update_mode == SplitUpdateMode::Individual {
            debug!(order = root_id, "拆分更新模式为 INDIVIDUAL,跳过级联分摊");
            return Ok(());
        }

        // 源工序按名称物化 (名称配对是拆分谱系的稳定键)
        let source_ops: HashMap<String, Operation> = root
            .operations
            .values()
            .map(|op| (op.name.clone(), op.clone()))
            .collect();

        let split_ids = registry.split_descendants_of(root_id);
        for split_id in split_ids {
            let Some(split) = registry.get_mut(&split_id) else {
                continue;
            };
            let share = split.required_qty / total_qty;
            for op in split.operations.values_mut() {
                if let Some(src) = source_ops.get(&op.name) {
                    Self::allocate_operation_status(src, op, share);
                }
            }
            debug!(order = %split_id, share, "拆分状态分摊完成");
        }
        Ok(())
    }

    /// 单工序分摊器: 完工量按占比,状态跟随源工序
    fn allocate_operation_status(src: &Operation, dst: &mut Operation, share: f64) {
        dst.finished_qty = src.finished_qty * share;
        dst.omitted = src.omitted;
        match src.sched_state {
            OpSchedState::Finished => dst.sched_state = OpSchedState::Finished,
            OpSchedState::Started if dst.finished_qty > 0.0 => {
                dst.sched_state = OpSchedState::Started;
            }
            _ => {}
        }
    }

    // ==========================================
    // 拆分 / 剥离
    // ==========================================

    /// 从源订单拆出一个子订单
    ///
    /// 子订单复制路径结构,工序观测状态清零,数量按拆分量缩放;
    /// 源订单缩放到剩余量。
    pub fn split_off(
        &self,
        registry: &mut OrderRegistry,
        source_id: &str,
        split_qty: f64,
        new_id: Option<String>,
    ) -> Result<String, ReconcileError> {
        let source = registry
            .get(source_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(source_id.to_string()))?;
        if split_qty <= 0.0 || split_qty >= source.required_qty {
            return Err(ReconcileError::SplitQtyOutOfRange {
                order_id: source_id.to_string(),
                qty: split_qty,
                source_qty: source.required_qty,
            });
        }
        let remaining = source.required_qty - split_qty;
        let child_id =
            new_id.unwrap_or_else(|| format!("{}-S{}", source_id, Uuid::new_v4().simple()));

        let mut child = source.clone();
        child.external_id = child_id.clone();
        child.split_from_id = Some(source_id.to_string());
        child.is_split = true;
        child.clear_simulation_state();
        self.set_required_qty(&mut child, split_qty)?;

        if let Some(source) = registry.get_mut(source_id) {
            self.set_required_qty(source, remaining)?;
        }
        registry.insert(child);

        info!(source = source_id, child = %child_id, split_qty, "订单拆分完成");
        Ok(child_id)
    }

    /// 从源订单剥离一个独立订单 (谱系仅用于命名/审计)
    pub fn break_off(
        &self,
        registry: &mut OrderRegistry,
        source_id: &str,
        break_qty: f64,
        new_id: Option<String>,
    ) -> Result<String, ReconcileError> {
        let source = registry
            .get(source_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(source_id.to_string()))?;
        if break_qty <= 0.0 || break_qty >= source.required_qty {
            return Err(ReconcileError::BreakOffQtyOutOfRange {
                order_id: source_id.to_string(),
                qty: break_qty,
                source_qty: source.required_qty,
            });
        }
        let remaining = source.required_qty - break_qty;
        let child_id =
            new_id.unwrap_or_else(|| format!("{}-B{}", source_id, Uuid::new_v4().simple()));

        let mut child = source.clone();
        child.external_id = child_id.clone();
        child.break_off_source_id = Some(source_id.to_string());
        child.split_from_id = None;
        child.is_split = false;
        child.clear_simulation_state();
        self.set_required_qty(&mut child, break_qty)?;

        if let Some(source) = registry.get_mut(source_id) {
            self.set_required_qty(source, remaining)?;
        }
        registry.insert(child);

        info!(source = source_id, child = %child_id, break_qty, "订单剥离完成");
        Ok(child_id)
    }

}
