// ==========================================
// 制造订单路径与对账引擎 - 订单 API
// ==========================================
// 职责: 聚合注册表/配置/引擎,向宿主暴露业务接口
// 对外面: Receive / Edit / SetRequiredQty / effectiveNeedDate /
//         lockReasons / bottleneckOperations / successorsRecursive /
//         predecessorsOf / 快照存取
// ==========================================

use chrono::NaiveDateTime;

use crate::config::ReconcileConfig;
use crate::domain::order::ManufacturingOrder;
use crate::domain::revision::{EditRequest, RevisionBatch};
use crate::domain::snapshot::OrderSnapshot;
use crate::domain::types::{LockReasons, RecomputeFlags};
use crate::engine::bottleneck::{BottleneckAnalyzer, SimulationFlagProbe};
use crate::engine::erp_merge::{BatchReceiveResult, ErpMergeReconciler};
use crate::engine::error::ReconcileError;
use crate::engine::events::OptionalEventPublisher;
use crate::engine::linkage::SuccessorLinkage;
use crate::engine::need_date::NeedDateEngine;
use crate::engine::path_selector::PathSelector;
use crate::engine::ports::{NoOpSimulation, SimulationPort};
use crate::engine::quantity::QuantityReconciler;
use crate::registry::OrderRegistry;

/// OrderApi - 订单业务接口
pub struct OrderApi {
    registry: OrderRegistry,
    reconciler: ErpMergeReconciler,
    selector: PathSelector,
    analyzer: BottleneckAnalyzer,
    need_date: NeedDateEngine,
    linkage: SuccessorLinkage,
    quantity: QuantityReconciler,
    simulation: Box<dyn SimulationPort>,
}

impl OrderApi {
    pub fn new(config: ReconcileConfig) -> Self {
        Self::with_simulation(config, Box::new(NoOpSimulation))
    }

    pub fn with_simulation(config: ReconcileConfig, simulation: Box<dyn SimulationPort>) -> Self {
        Self::with_parts(config, simulation, OptionalEventPublisher::default())
    }

    pub fn with_parts(
        config: ReconcileConfig,
        simulation: Box<dyn SimulationPort>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            registry: OrderRegistry::new(),
            reconciler: ErpMergeReconciler::with_events(config.clone(), events),
            selector: PathSelector::new(),
            analyzer: BottleneckAnalyzer::new(),
            need_date: NeedDateEngine::new(config),
            linkage: SuccessorLinkage::new(),
            quantity: QuantityReconciler::new(),
            simulation,
        }
    }

    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OrderRegistry {
        &mut self.registry
    }

    // ==========================================
    // 修订与编辑
    // ==========================================

    /// 接收 ERP 修订批次 (部分失败语义)
    pub fn receive(&mut self, batch: RevisionBatch) -> Result<BatchReceiveResult, ReconcileError> {
        self.reconciler
            .receive(&mut self.registry, self.simulation.as_mut(), batch)
    }

    /// 应用人工编辑请求
    pub fn edit(&mut self, edit: EditRequest) -> Result<bool, ReconcileError> {
        self.reconciler
            .apply_edit(&mut self.registry, self.simulation.as_mut(), edit)
    }

    /// 比例改量,完成后标记工单 JIT/产量重算
    pub fn set_required_qty(
        &mut self,
        order_id: &str,
        new_qty: f64,
    ) -> Result<f64, ReconcileError> {
        let mo = self
            .registry
            .get_mut(order_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;
        let job_id = mo.job_id.clone();
        let ratio = self.quantity.set_required_qty(mo, new_qty)?;
        self.registry.flag_job_recompute(
            &job_id,
            RecomputeFlags {
                jit: true,
                production: true,
                ..Default::default()
            },
        );
        Ok(ratio)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 订单生效需求日期
    pub fn effective_need_date(
        &self,
        order_id: &str,
    ) -> Result<Option<NaiveDateTime>, ReconcileError> {
        let mo = self.order(order_id)?;
        Ok(self.need_date.effective_need_date(&self.registry, mo))
    }

    /// 路径锁定原因位掩码
    pub fn lock_reasons(
        &self,
        order_id: &str,
        schedule_cutoff: Option<NaiveDateTime>,
    ) -> Result<LockReasons, ReconcileError> {
        let mo = self.order(order_id)?;
        Ok(self.selector.lock_reasons(mo, schedule_cutoff))
    }

    /// 当前路径瓶颈工序 (按需重算,不缓存)
    pub fn bottleneck_operations(&mut self, order_id: &str) -> Result<Vec<String>, ReconcileError> {
        let mo = self
            .registry
            .get_mut(order_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;
        Ok(self.analyzer.analyze_current_path(mo, &SimulationFlagProbe))
    }

    /// 后继闭包 (含 BOM 深度多重集)
    pub fn successors_recursive(&self, order_id: &str) -> Vec<(String, u32)> {
        self.linkage.successors_recursive(&self.registry, order_id)
    }

    /// 物料后继闭包
    pub fn material_successors_recursive(&self, order_id: &str) -> Vec<(String, u32)> {
        self.linkage
            .material_successors_recursive(&self.registry, order_id)
    }

    /// 前驱闭包
    pub fn predecessors_of(&self, order_id: &str) -> Vec<String> {
        self.linkage.predecessors_of(&self.registry, order_id)
    }

    // ==========================================
    // 快照存取
    // ==========================================

    /// 采集订单快照
    pub fn capture_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, ReconcileError> {
        Ok(OrderSnapshot::capture(self.order(order_id)?))
    }

    /// 采集订单快照为 JSON
    pub fn capture_snapshot_json(&self, order_id: &str) -> Result<String, ReconcileError> {
        let snapshot = self.capture_snapshot(order_id)?;
        serde_json::to_string(&snapshot)
            .map_err(|e| ReconcileError::Other(anyhow::anyhow!("快照序列化失败: {e}")))
    }

    /// 从 JSON 快照装载订单并入册
    ///
    /// 调用方装载完一批后应执行 `relink_all` 完成二阶段链接
    pub fn load_snapshot_json(&mut self, json: &str) -> Result<String, ReconcileError> {
        let snapshot: OrderSnapshot = serde_json::from_str(json)
            .map_err(|e| ReconcileError::Other(anyhow::anyhow!("快照反序列化失败: {e}")))?;
        let mo = snapshot.restore()?;
        let order_id = mo.external_id.clone();
        self.registry.insert(mo);
        Ok(order_id)
    }

    /// 批量装载后的重链接趟
    pub fn relink_all(&mut self) -> Result<(), ReconcileError> {
        self.registry.relink().map_err(ReconcileError::from)
    }

    fn order(&self, order_id: &str) -> Result<&ManufacturingOrder, ReconcileError> {
        self.registry
            .get(order_id)
            .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))
    }
}
