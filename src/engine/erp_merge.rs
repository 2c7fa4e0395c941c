// ==========================================
// 制造订单路径与对账引擎 - ERP 合并对账引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - ERPMergeReconciler
// ==========================================
// 状态机 (每条在册订单一条修订):
//   候选构建 -> 结构差异 -> 仓储改量例外 -> 整单替换 / 原地更新
//   -> 修订中缺席的订单删除 (未处理拆分豁免) -> relink
// 传播策略: 校验错误按订单收集,批次继续;结构性错误直达批次边界
// ==========================================

use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

use crate::config::ReconcileConfig;
use crate::domain::operation::Operation;
use crate::domain::order::ManufacturingOrder;
use crate::domain::revision::{EditRequest, OrderRevision, RevisionBatch};
use crate::domain::routing::AlternatePath;
use crate::domain::types::RecomputeFlags;
use crate::engine::error::ReconcileError;
use crate::engine::events::{OptionalEventPublisher, OrderEvent, OrderEventType};
use crate::engine::path_selector::PathSelector;
use crate::engine::ports::SimulationPort;
use crate::engine::quantity::QuantityReconciler;
use crate::engine::routing_diff::{RoutingChangeReport, RoutingDiff};
use crate::registry::OrderRegistry;

/// 数量比较容差
const QTY_EPS: f64 = 1e-9;

// ==========================================
// BatchReceiveResult - 批次接收结果
// ==========================================
// 部分失败语义: 失败订单入清单,其余订单照常生效
#[derive(Debug, Default)]
pub struct BatchReceiveResult {
    pub created: Vec<String>,  // 新入册
    pub updated: Vec<String>,  // 原地更新 (含纯改量)
    pub replaced: Vec<String>, // 整单替换
    pub deleted: Vec<String>,  // 删除 (缺席或随替换移除的拆分)
    pub failures: Vec<OrderFailure>,
}

/// 单订单失败记录
#[derive(Debug)]
pub struct OrderFailure {
    pub order_id: String,
    pub error: ReconcileError,
}

impl BatchReceiveResult {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// 单订单对账结论 (内部)
enum MergeOutcome {
    Created(String),
    Updated { order_id: String, changed: bool },
    Replaced { order_id: String, removed_splits: Vec<String> },
}

// ==========================================
// ErpMergeReconciler - ERP 合并对账引擎
// ==========================================
pub struct ErpMergeReconciler {
    config: ReconcileConfig,
    diff: RoutingDiff,
    quantity: QuantityReconciler,
    selector: PathSelector,
    events: OptionalEventPublisher,
}

impl ErpMergeReconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self::with_events(config, OptionalEventPublisher::default())
    }

    pub fn with_events(config: ReconcileConfig, events: OptionalEventPublisher) -> Self {
        Self {
            config,
            diff: RoutingDiff::new(),
            quantity: QuantityReconciler::new(),
            selector: PathSelector::new(),
            events,
        }
    }

    // ==========================================
    // 批次接收
    // ==========================================

    /// 接收一个工单的修订批次
    ///
    /// 在册但批次中缺席的订单被删除;未处理的拆分订单豁免。
    #[instrument(skip_all, fields(job = %batch.job_id, revisions = batch.revisions.len()))]
    pub fn receive(
        &self,
        registry: &mut OrderRegistry,
        sim: &mut dyn SimulationPort,
        batch: RevisionBatch,
    ) -> Result<BatchReceiveResult, ReconcileError> {
        let mut result = BatchReceiveResult::default();

        if batch.job_need_date.is_some() {
            registry.set_job_need_date(&batch.job_id, batch.job_need_date);
        }

        let mut seen: HashSet<String> = HashSet::new();
        for revision in batch.revisions {
            let target_id = revision.external_id.clone();
            match self.reconcile_one(registry, sim, &batch.job_id, revision) {
                Ok(MergeOutcome::Created(id)) => {
                    seen.insert(id.clone());
                    result.created.push(id);
                }
                Ok(MergeOutcome::Updated { order_id, changed }) => {
                    seen.insert(order_id.clone());
                    if changed {
                        result.updated.push(order_id);
                    }
                }
                Ok(MergeOutcome::Replaced {
                    order_id,
                    removed_splits,
                }) => {
                    seen.insert(order_id.clone());
                    result.replaced.push(order_id);
                    result.deleted.extend(removed_splits);
                }
                Err(e) if e.is_validation() => {
                    // 失败订单保持在册,不落入缺席删除
                    seen.insert(target_id.clone());
                    warn!(order = %target_id, error = %e, "订单对账失败,批次继续");
                    result.failures.push(OrderFailure {
                        order_id: target_id,
                        error: e,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        // ===== 缺席删除趟 (物化清单,未处理拆分豁免) =====
        let live_ids = registry.order_ids_of_job(&batch.job_id);
        for order_id in live_ids {
            if seen.contains(&order_id) {
                continue;
            }
            let Some(mo) = registry.get(&order_id) else {
                continue;
            };
            if mo.is_split {
                continue;
            }
            let job_id = mo.job_id.clone();
            sim.unschedule(&order_id);
            registry.remove(&order_id);
            self.events.publish(OrderEvent::new(
                order_id.clone(),
                job_id,
                OrderEventType::OrderDeleted,
                Some("修订批次中缺席".to_string()),
            ));
            result.deleted.push(order_id);
        }

        // 结构变更后统一重链接
        registry.relink()?;

        info!(
            created = result.created.len(),
            updated = result.updated.len(),
            replaced = result.replaced.len(),
            deleted = result.deleted.len(),
            failures = result.failures.len(),
            "修订批次接收完成"
        );
        Ok(result)
    }

    // ==========================================
    // 单订单对账
    // ==========================================

    fn reconcile_one(
        &self,
        registry: &mut OrderRegistry,
        sim: &mut dyn SimulationPort,
        job_id: &str,
        revision: OrderRevision,
    ) -> Result<MergeOutcome, ReconcileError> {
        if !registry.contains(&revision.external_id) {
            // 在册无此订单: 作为新订单入册
            let seed = ManufacturingOrder::new(revision.external_id.clone(), job_id);
            let candidate = self.build_candidate(&seed, &revision)?;
            let order_id = candidate.external_id.clone();
            registry.insert(candidate);
            self.events.publish(OrderEvent::new(
                order_id.clone(),
                job_id,
                OrderEventType::OrderCreated,
                None,
            ));
            registry.flag_job_recompute(
                job_id,
                RecomputeFlags {
                    eligibility: true,
                    constraint: true,
                    ..Default::default()
                },
            );
            return Ok(MergeOutcome::Created(order_id));
        }

        // 跨厂授权: 修订要求开启而在册未开启时需持有授权
        {
            let live = registry.get(&revision.external_id).expect("checked above");
            if revision.can_span_plants == Some(true)
                && !live.can_span_plants
                && !self.config.can_span_plants_entitled
            {
                return Err(ReconcileError::SpanPlantsNotEntitled(
                    revision.external_id.clone(),
                ));
            }
        }
        self.validate_locked_plant(&revision)?;

        let live = registry.get(&revision.external_id).expect("checked above");
        let candidate = self.build_candidate(live, &revision)?;
        let report = self.diff.compare(live, &candidate);

        // 仓储改量例外: 修订数量等于在册原始数量时按纯比例改量处理,
        // 即使结构差异被判为致命也不触发替换
        let storage_resize = revision.resize_for_storage
            && revision
                .required_qty
                .map(|q| (q - live.original_qty).abs() < QTY_EPS)
                .unwrap_or(false);

        if storage_resize {
            // 纯比例改量: 结构段整体忽略,在册路径/工序原样保留
            info!(order = %revision.external_id, "仓储改量例外,按纯比例改量处理");
            let mut resize_rev = revision.clone();
            resize_rev.paths = None;
            resize_rev.operations = None;
            resize_rev.successor_links = None;
            let candidate = live.clone();
            let report = RoutingChangeReport::unchanged();
            return self.update_in_place(registry, sim, job_id, &resize_rev, candidate, &report);
        }

        if report.scheduled_routing_changed {
            let outcome = self.replace_order(registry, sim, job_id, &revision, candidate, &report)?;
            return Ok(outcome);
        }

        self.update_in_place(registry, sim, job_id, &revision, candidate, &report)
    }

    // ==========================================
    // 候选构建
    // ==========================================

    /// 以在册订单为默认值底座构建候选订单
    ///
    /// 修订未携带的字段继承在册现值,而不是被清零
    fn build_candidate(
        &self,
        existing: &ManufacturingOrder,
        revision: &OrderRevision,
    ) -> Result<ManufacturingOrder, ReconcileError> {
        let mut cand = existing.clone();

        if let Some(v) = &revision.product_name {
            cand.product_name = Some(v.clone());
        }
        if let Some(q) = revision.required_qty {
            cand.required_qty = q;
            cand.requested_qty = q;
            cand.original_qty = q;
            cand.expected_finish_qty = q;
        }
        if let Some(v) = revision.hold {
            cand.hold = v;
        }
        if let Some(v) = &revision.hold_reason {
            cand.hold_reason = Some(v.clone());
        }
        if let Some(v) = revision.hold_until {
            cand.hold_until = Some(v);
        }
        if let Some(v) = revision.need_date_mode {
            cand.need_date_mode = v;
        }
        if let Some(v) = revision.need_date {
            cand.need_date = Some(v);
        }
        if let Some(v) = revision.shipping_buffer_minutes {
            cand.shipping_buffer_minutes = Some(v);
        }
        if let Some(v) = revision.lock_to_current_path {
            cand.lock_to_current_path = v;
        }
        if let Some(v) = revision.can_span_plants {
            cand.can_span_plants = v;
        }
        if revision.clear_locked_plant {
            cand.locked_plant = None;
        } else if let Some(v) = &revision.locked_plant {
            cand.locked_plant = Some(v.clone());
        }
        if let Some(v) = revision.split_update_mode {
            cand.split_update_mode = v;
        }

        // 工序段: 携带即为全集,未列出的工序视为移除
        if let Some(op_revs) = &revision.operations {
            let mut ops: HashMap<String, Operation> = HashMap::new();
            for op_rev in op_revs {
                let mut op = existing
                    .operations
                    .get(&op_rev.external_id)
                    .cloned()
                    .unwrap_or_else(|| {
                        Operation::new(
                            op_rev.external_id.clone(),
                            op_rev.name.clone().unwrap_or_else(|| op_rev.external_id.clone()),
                            op_rev.kind.clone().unwrap_or_else(|| "STANDARD".to_string()),
                        )
                    });
                if let Some(v) = &op_rev.name {
                    op.name = v.clone();
                }
                if let Some(v) = &op_rev.kind {
                    op.kind = v.clone();
                }
                if let Some(v) = op_rev.omitted {
                    op.omitted = v;
                }
                if let Some(v) = op_rev.required_qty {
                    op.required_qty = v;
                }
                if let Some(v) = op_rev.hours {
                    op.hours = v;
                }
                if let Some(v) = &op_rev.products_produced {
                    op.products_produced = v.clone();
                }
                if let Some(v) = &op_rev.material_requirements {
                    op.material_requirements = v.clone();
                }
                ops.insert(op.external_id.clone(), op);
            }
            cand.operations = ops;
        }

        // 路径段: 携带即为全集,经构建器重新校验 (环/悬空边为结构性错误)
        if let Some(path_revs) = &revision.paths {
            cand.alternate_paths = path_revs
                .iter()
                .map(|pr| {
                    AlternatePath::build(
                        pr.external_id.clone(),
                        pr.preference,
                        pr.auto_use_policy,
                        pr.nodes.clone(),
                        &pr.edges,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
        }

        // 后继链接段: 携带即为全集,字段缺省继承同目标的在册链接
        if let Some(link_revs) = &revision.successor_links {
            cand.successor_links = link_revs
                .iter()
                .map(|lr| {
                    let base = existing
                        .successor_links
                        .iter()
                        .find(|l| l.successor_mo_id == lr.successor_mo_id);
                    let mut link = crate::domain::successor::SuccessorLink::new(
                        lr.successor_mo_id.clone(),
                    );
                    link.path_scope = lr
                        .path_scope
                        .clone()
                        .or_else(|| base.and_then(|b| b.path_scope.clone()));
                    link.operation_scope = lr
                        .operation_scope
                        .clone()
                        .or_else(|| base.and_then(|b| b.operation_scope.clone()));
                    link.transfer_span_minutes = lr
                        .transfer_span_minutes
                        .unwrap_or_else(|| base.map(|b| b.transfer_span_minutes).unwrap_or(0));
                    link.usage_qty_per_cycle = lr
                        .usage_qty_per_cycle
                        .unwrap_or_else(|| base.map(|b| b.usage_qty_per_cycle).unwrap_or(0.0));
                    link
                })
                .collect();
        }

        cand.associate_operations_with_paths()?;
        let requested_default = revision
            .requested_default_path
            .clone()
            .or_else(|| existing.default_path_id.clone());
        cand.finalize_paths(requested_default.as_deref())?;
        Ok(cand)
    }

    // ==========================================
    // 整单替换
    // ==========================================

    fn replace_order(
        &self,
        registry: &mut OrderRegistry,
        sim: &mut dyn SimulationPort,
        job_id: &str,
        revision: &OrderRevision,
        mut candidate: ManufacturingOrder,
        report: &RoutingChangeReport,
    ) -> Result<MergeOutcome, ReconcileError> {
        let old_id = revision.external_id.clone();
        info!(order = %old_id, cause = ?report.cause, "结构差异致命,执行整单替换");

        // 旧单解排并摘除 (模板/库存回链与挂起状态已由候选底座继承)
        sim.unschedule(&old_id);
        let old = registry
            .remove(&old_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(old_id.clone()))?;

        // 拆分后代: 未完工者随替换移除,已完工者保留供审计
        let mut removed_splits = Vec::new();
        let descendants = registry.split_descendants_of(&old_id);
        for split_id in descendants {
            let keep_finished = self.config.preserve_finished_splits
                && registry
                    .get(&split_id)
                    .map(|s| s.is_finished())
                    .unwrap_or(false);
            if keep_finished {
                continue;
            }
            sim.unschedule(&split_id);
            registry.remove(&split_id);
            self.events.publish(OrderEvent::new(
                split_id.clone(),
                job_id,
                OrderEventType::SplitRemoved,
                Some(format!("随 {} 整单替换移除", old_id)),
            ));
            removed_splits.push(split_id);
        }

        // 同一或新身份入册;替换后的新单尚未被排程,观测字段清零
        let new_id = revision.replacement_id.clone().unwrap_or(old_id.clone());
        candidate.external_id = new_id.clone();
        candidate.clear_simulation_state();
        // 重新套用挂起状态 (修订未携带时沿用旧单)
        candidate.hold = if revision.hold.is_some() {
            candidate.hold
        } else {
            old.hold
        };
        registry.insert(candidate);

        registry.flag_job_recompute(
            job_id,
            RecomputeFlags {
                eligibility: true,
                constraint: true,
                jit: true,
                ..Default::default()
            },
        );
        self.events.publish(OrderEvent::new(
            new_id.clone(),
            job_id,
            OrderEventType::OrderReplaced,
            Some(report.description.clone()),
        ));

        Ok(MergeOutcome::Replaced {
            order_id: new_id,
            removed_splits,
        })
    }

    // ==========================================
    // 原地更新
    // ==========================================

    fn update_in_place(
        &self,
        registry: &mut OrderRegistry,
        sim: &mut dyn SimulationPort,
        job_id: &str,
        revision: &OrderRevision,
        candidate: ManufacturingOrder,
        report: &RoutingChangeReport,
    ) -> Result<MergeOutcome, ReconcileError> {
        let order_id = revision.external_id.clone();
        let mut flags = RecomputeFlags::default();
        let mut updated = false;
        let mut force_unschedule = false;

        {
            let live = registry
                .get_mut(&order_id)
                .ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))?;

            // ===== 标量字段逐一落账 (字段变更 -> 下游标志) =====
            if let Some(v) = &revision.product_name {
                if live.product_name.as_deref() != Some(v.as_str()) {
                    live.product_name = Some(v.clone());
                    flags.constraint = true;
                    updated = true;
                }
            }
            if let Some(v) = revision.hold {
                if live.hold != v {
                    live.hold = v;
                    flags.constraint = true;
                    updated = true;
                }
            }
            if let Some(v) = &revision.hold_reason {
                if live.hold_reason.as_deref() != Some(v.as_str()) {
                    live.hold_reason = Some(v.clone());
                    updated = true;
                }
            }
            if let Some(v) = revision.hold_until {
                if live.hold_until != Some(v) {
                    live.hold_until = Some(v);
                    flags.constraint = true;
                    updated = true;
                }
            }
            if let Some(v) = revision.need_date_mode {
                if live.need_date_mode != v {
                    live.need_date_mode = v;
                    flags.jit = true;
                    updated = true;
                }
            }
            if let Some(v) = revision.need_date {
                if live.need_date != Some(v) {
                    live.need_date = Some(v);
                    flags.jit = true;
                    updated = true;
                }
            }
            if let Some(v) = revision.shipping_buffer_minutes {
                if live.shipping_buffer_minutes != Some(v) {
                    live.shipping_buffer_minutes = Some(v);
                    flags.jit = true;
                    updated = true;
                }
            }
            if let Some(v) = revision.lock_to_current_path {
                if live.lock_to_current_path != v {
                    live.lock_to_current_path = v;
                    updated = true;
                }
            }
            if let Some(v) = revision.split_update_mode {
                if live.split_update_mode != v {
                    live.split_update_mode = v;
                    updated = true;
                }
            }

            // 跨厂开关: 关闭时若当前排程跨越多厂,强制解排
            if let Some(v) = revision.can_span_plants {
                if live.can_span_plants != v {
                    if !v && live.scheduled_plants().len() > 1 {
                        force_unschedule = true;
                    }
                    live.can_span_plants = v;
                    flags.eligibility = true;
                    updated = true;
                }
            }

            // 锁定工厂: 现排程落在别厂时强制解排
            if revision.clear_locked_plant {
                if live.locked_plant.is_some() {
                    live.locked_plant = None;
                    flags.eligibility = true;
                    updated = true;
                }
            } else if let Some(plant) = &revision.locked_plant {
                if live.locked_plant.as_deref() != Some(plant.as_str()) {
                    let mismatch = live
                        .scheduled_plants()
                        .iter()
                        .any(|p| p != plant);
                    if mismatch {
                        force_unschedule = true;
                    }
                    live.locked_plant = Some(plant.clone());
                    flags.eligibility = true;
                    updated = true;
                }
            }
        }

        // ===== 路径/工序结构刷新 (非致命差异) =====
        if report.alternate_path_changed
            || revision.operations.is_some()
            || revision.successor_links.is_some()
        {
            let live = registry
                .get_mut(&order_id)
                .ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))?;
            let structurally_differs = live.operations != candidate.operations
                || live.successor_links != candidate.successor_links
                || report.alternate_path_changed;
            if structurally_differs {
                live.alternate_paths = candidate.alternate_paths;
                live.operations = candidate.operations;
                live.successor_links = candidate.successor_links;
                live.current_path_id = candidate.current_path_id;
                live.default_path_id = candidate.default_path_id;
                live.verify_invariants()?;
                flags.eligibility = true;
                flags.jit = true;
                updated = true;
            }
        }

        // ===== 数量落账: 拆分存续规则 =====
        if let Some(new_qty) = revision.required_qty {
            updated |= self.apply_quantity(registry, job_id, &order_id, new_qty, &mut flags)?;
        }

        if force_unschedule {
            sim.unschedule(&order_id);
            self.events.publish(OrderEvent::new(
                order_id.clone(),
                job_id,
                OrderEventType::ForcedUnschedule,
                Some("工厂约束变更".to_string()),
            ));
        }

        if flags.any() {
            registry.flag_job_recompute(job_id, flags);
        }
        if updated {
            self.events.publish(OrderEvent::new(
                order_id.clone(),
                job_id,
                OrderEventType::OrderUpdated,
                None,
            ));
        }

        Ok(MergeOutcome::Updated {
            order_id,
            changed: updated,
        })
    }

    /// 修订数量落账
    ///
    /// 有拆分后代且 (本单 + 拆分) 总量与修订一致时保留拆分,
    /// 只做状态级联;否则对本单做比例改量。
    fn apply_quantity(
        &self,
        registry: &mut OrderRegistry,
        job_id: &str,
        order_id: &str,
        new_qty: f64,
        flags: &mut RecomputeFlags,
    ) -> Result<bool, ReconcileError> {
        let splits = registry.split_descendants_of(order_id);
        let live_qty = registry
            .get(order_id)
            .map(|mo| mo.required_qty)
            .unwrap_or(0.0);

        if !splits.is_empty() {
            let split_sum: f64 = splits
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|mo| mo.required_qty)
                .sum();
            let total = live_qty + split_sum;
            if (total - new_qty).abs() < QTY_EPS {
                // 总量未变: 拆分存续,按占比级联状态
                self.quantity
                    .allocate_status_across_splits(registry, order_id, total)?;
                flags.production = true;
                return Ok(true);
            }
        }

        if (live_qty - new_qty).abs() < QTY_EPS {
            return Ok(false);
        }
        let live = registry
            .get_mut(order_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;
        self.quantity.set_required_qty(live, new_qty)?;
        flags.production = true;
        flags.eligibility = true;
        flags.jit = true;
        self.events.publish(OrderEvent::new(
            order_id,
            job_id,
            OrderEventType::OrderResized,
            None,
        ));
        Ok(true)
    }

    // ==========================================
    // 人工编辑
    // ==========================================

    /// 应用人工编辑请求 (与修订同构的字段语义,走编辑校验)
    pub fn apply_edit(
        &self,
        registry: &mut OrderRegistry,
        sim: &mut dyn SimulationPort,
        edit: EditRequest,
    ) -> Result<bool, ReconcileError> {
        let order_id = edit.order_id.clone();
        if !registry.contains(&order_id) {
            return Err(ReconcileError::OrderNotFound(order_id));
        }

        // 路径切换先行校验 (订单已排程时拒绝)
        if let Some(path_id) = &edit.current_path {
            let live = registry.get_mut(&order_id).expect("checked above");
            let switched = self.selector.switch_current_path(live, path_id, false)?;
            if switched {
                let job_id = live.job_id.clone();
                self.events.publish(OrderEvent::new(
                    order_id.clone(),
                    job_id,
                    OrderEventType::CurrentPathChanged,
                    Some("人工编辑".to_string()),
                ));
            }
        }

        let job_id = registry
            .get(&order_id)
            .map(|mo| mo.job_id.clone())
            .expect("checked above");
        let revision = OrderRevision {
            external_id: order_id,
            hold: edit.hold,
            hold_reason: edit.hold_reason,
            hold_until: edit.hold_until,
            lock_to_current_path: edit.lock_to_current_path,
            can_span_plants: edit.can_span_plants,
            locked_plant: edit.locked_plant,
            clear_locked_plant: edit.clear_locked_plant,
            need_date_mode: edit.need_date_mode,
            need_date: edit.need_date,
            shipping_buffer_minutes: edit.shipping_buffer_minutes,
            split_update_mode: edit.split_update_mode,
            ..Default::default()
        };

        // 编辑走与修订相同的授权/引用校验
        {
            let live = registry.get(&revision.external_id).expect("checked above");
            if revision.can_span_plants == Some(true)
                && !live.can_span_plants
                && !self.config.can_span_plants_entitled
            {
                return Err(ReconcileError::SpanPlantsNotEntitled(
                    revision.external_id.clone(),
                ));
            }
        }
        self.validate_locked_plant(&revision)?;

        // 编辑不携带结构段,候选即在册现状
        let candidate = registry
            .get(&revision.external_id)
            .expect("checked above")
            .clone();
        let report = RoutingChangeReport::unchanged();
        match self.update_in_place(registry, sim, &job_id, &revision, candidate, &report)? {
            MergeOutcome::Updated { changed, .. } => Ok(changed),
            _ => Ok(true),
        }
    }

    // ==========================================
    // 共用校验
    // ==========================================

    fn validate_locked_plant(&self, revision: &OrderRevision) -> Result<(), ReconcileError> {
        let (Some(plant), Some(known)) = (&revision.locked_plant, &self.config.known_plants)
        else {
            return Ok(());
        };
        if !known.iter().any(|p| p == plant) {
            return Err(ReconcileError::LockedPlantNotFound {
                order_id: revision.external_id.clone(),
                plant: plant.clone(),
            });
        }
        Ok(())
    }
}
