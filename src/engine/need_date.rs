// ==========================================
// 制造订单路径与对账引擎 - 需求日期引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - NeedDateEngine
// ==========================================
// 规则: 显式日期 > 后继派生 (最紧后继胜出) > 工单需求日期
// 发运缓冲只作用于工单派生日期,覆写优先于配置默认值
// ==========================================

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::config::ReconcileConfig;
use crate::domain::order::ManufacturingOrder;
use crate::domain::successor::{LinkTarget, SuccessorLink};
use crate::domain::types::NeedDateMode;
use crate::engine::linkage::SuccessorLinkage;
use crate::registry::OrderRegistry;

/// NeedDateEngine - 需求日期引擎
#[derive(Debug)]
pub struct NeedDateEngine {
    config: ReconcileConfig,
    linkage: SuccessorLinkage,
}

impl NeedDateEngine {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            linkage: SuccessorLinkage::new(),
        }
    }

    /// 订单生效需求日期
    ///
    /// - Explicit: 取订单自带日期,不加缓冲
    /// - 有后继链接: 所有链接派生日期取最小;全部不可得时回退工单
    /// - 否则: 工单需求日期减去发运缓冲
    pub fn effective_need_date(
        &self,
        registry: &OrderRegistry,
        mo: &ManufacturingOrder,
    ) -> Option<NaiveDateTime> {
        if mo.need_date_mode == NeedDateMode::Explicit {
            return mo.need_date;
        }

        if !mo.successor_links.is_empty() {
            let derived = mo
                .successor_links
                .iter()
                .filter_map(|link| self.link_derived_date(registry, link))
                .min();
            if derived.is_some() {
                return derived;
            }
            // 无任何链接给出有限值: 回退工单
        }

        self.job_need_date(registry, mo)
    }

    /// 单条链接的派生日期: 后继先导工序 JIT 开工 - 转移时距
    fn link_derived_date(
        &self,
        registry: &OrderRegistry,
        link: &SuccessorLink,
    ) -> Option<NaiveDateTime> {
        let succ = registry.get(&link.successor_mo_id)?;
        let jit = match self.linkage.resolve_link_target(registry, link) {
            LinkTarget::Operation(op_id) => succ.operations.get(&op_id)?.jit_start,
            // 路径级/订单级: 取当前路径先导(叶)工序里最早的 JIT 开工
            LinkTarget::Path(_) | LinkTarget::Order => {
                let path = succ.current_path()?;
                path.leaves()
                    .iter()
                    .filter_map(|n| succ.operations.get(&n.operation_id))
                    .filter_map(|op| op.jit_start)
                    .min()
            }
        }?;
        Some(jit - Duration::minutes(link.transfer_span_minutes))
    }

    /// 工单需求日期减发运缓冲 (订单覆写 > 配置默认)
    fn job_need_date(
        &self,
        registry: &OrderRegistry,
        mo: &ManufacturingOrder,
    ) -> Option<NaiveDateTime> {
        let base = registry.job(&mo.job_id).and_then(|job| job.need_date)?;
        let buffer_minutes = mo
            .shipping_buffer_minutes
            .unwrap_or(self.config.default_shipping_buffer_minutes);
        Some(base - Duration::minutes(buffer_minutes))
    }

    // ==========================================
    // JIT 派生需求日期传播
    // ==========================================

    /// 模拟趟开始: 清除工单下所有订单的趟内采纳标记
    pub fn begin_jit_pass(&self, registry: &mut OrderRegistry, job_id: &str) {
        for order_id in registry.order_ids_of_job(job_id) {
            if let Some(mo) = registry.get_mut(&order_id) {
                mo.begin_jit_pass();
            }
        }
    }

    /// 向订单提交一个派生需求日期 (最紧后继胜出)
    ///
    /// 返回是否发生变更,供调用方打变更标记
    pub fn update_sub_need_date(
        &self,
        registry: &mut OrderRegistry,
        order_id: &str,
        new_date: NaiveDateTime,
    ) -> bool {
        let Some(mo) = registry.get_mut(order_id) else {
            return false;
        };
        let changed = mo.update_sub_need_date(new_date);
        if changed {
            debug!(order = order_id, date = %new_date, "采纳派生需求日期");
        }
        changed
    }

    /// 从后继重新推导并提交派生需求日期
    pub fn propagate_from_successors(
        &self,
        registry: &mut OrderRegistry,
        order_id: &str,
    ) -> bool {
        let Some(mo) = registry.get(order_id) else {
            return false;
        };
        let derived = mo
            .successor_links
            .iter()
            .filter_map(|link| self.link_derived_date(registry, link))
            .min();
        match derived {
            Some(date) => self.update_sub_need_date(registry, order_id, date),
            None => false,
        }
    }
}
