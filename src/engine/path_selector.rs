// ==========================================
// 制造订单路径与对账引擎 - 路径选择引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - PathSelector
// ==========================================
// 职责: 当前/默认路径校验、锁定状态与原因位掩码
// 红线: 所有锁定判定必须输出 reason,调用方按位与测试
// ==========================================

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::order::ManufacturingOrder;
use crate::domain::types::LockReasons;
use crate::engine::error::ReconcileError;

/// PathSelector - 路径选择引擎
#[derive(Debug, Default)]
pub struct PathSelector;

impl PathSelector {
    pub fn new() -> Self {
        Self
    }

    /// 锁定原因位掩码
    ///
    /// # 参数
    /// - `schedule_cutoff`: 模拟引擎提供的开工截止线;
    ///   订单排程开工早于该线时视为已开工锁定
    pub fn lock_reasons(
        &self,
        mo: &ManufacturingOrder,
        schedule_cutoff: Option<NaiveDateTime>,
    ) -> LockReasons {
        let mut reasons = LockReasons::FREE;

        // 仅一条备选路径: 无可切换对象
        if mo.alternate_paths.len() == 1 {
            reasons.insert(LockReasons::SINGLE_PATH);
        }

        // 人工锁定标志
        if mo.lock_to_current_path {
            reasons.insert(LockReasons::LOCK_FLAG_SET);
        }

        // 当前路径内任一工序资源锁定
        if let Some(current) = mo.current_path() {
            let resource_locked = current.nodes.iter().any(|node| {
                mo.operations
                    .get(&node.operation_id)
                    .map(|op| op.resource_locked)
                    .unwrap_or(false)
            });
            if resource_locked {
                reasons.insert(LockReasons::RESOURCE_LOCKED);
            }
        }

        // 任一工序被锚定
        if mo.operations.values().any(|op| op.anchored) {
            reasons.insert(LockReasons::ANCHORED);
        }

        // 开工截止线之前已排程
        if let Some(cutoff) = schedule_cutoff {
            let earliest_start = mo
                .operations
                .values()
                .filter(|op| op.sched_state.is_scheduled())
                .filter_map(|op| op.scheduled_start)
                .min();
            if let Some(start) = earliest_start {
                if start < cutoff {
                    reasons.insert(LockReasons::STARTED);
                }
            }
        }

        reasons
    }

    /// 是否锁定在当前路径上 (任一原因位即锁定)
    pub fn is_locked_to_current_path(
        &self,
        mo: &ManufacturingOrder,
        schedule_cutoff: Option<NaiveDateTime>,
    ) -> bool {
        self.lock_reasons(mo, schedule_cutoff).is_locked()
    }

    /// 切换当前路径
    ///
    /// 仅在订单未排程时允许;整单替换流程 (`replacing`) 例外。
    /// 返回是否实际发生切换。
    pub fn switch_current_path(
        &self,
        mo: &mut ManufacturingOrder,
        path_id: &str,
        replacing: bool,
    ) -> Result<bool, ReconcileError> {
        if mo.path(path_id).is_none() {
            return Err(ReconcileError::PathNotFound {
                order_id: mo.external_id.clone(),
                path_id: path_id.to_string(),
            });
        }
        if mo.current_path_id.as_deref() == Some(path_id) {
            return Ok(false);
        }
        if mo.is_scheduled() && !replacing {
            return Err(ReconcileError::PathSwitchWhileScheduled {
                order_id: mo.external_id.clone(),
                path_id: path_id.to_string(),
            });
        }

        debug!(
            order = %mo.external_id,
            from = mo.current_path_id.as_deref().unwrap_or("-"),
            to = path_id,
            "切换当前路径"
        );
        mo.current_path_id = Some(path_id.to_string());
        Ok(true)
    }
}
