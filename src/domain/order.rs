// ==========================================
// 制造订单路径与对账引擎 - 制造订单聚合
// ==========================================
// 依据: Order_Routing_Master_Spec.md - ManufacturingOrder
// ==========================================
// 职责: 订单属性、工序注册表、备选路径集、后继链接
// 不变量: 备选路径至少一条;当前/默认路径必须是成员
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::error::DomainError;
use crate::domain::operation::Operation;
use crate::domain::routing::{select_default_path, AlternatePath};
use crate::domain::successor::SuccessorLink;
use crate::domain::types::{NeedDateMode, OpSchedState, SplitUpdateMode};

// ==========================================
// ManufacturingOrder - 制造订单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    // ===== 标识 =====
    pub external_id: String, // 订单外部ID
    pub job_id: String,      // 所属工单ID

    // ===== 产品 =====
    // None 时从产出工序惰性解析
    pub product_name: Option<String>,

    // ===== 数量 =====
    pub required_qty: f64,        // 需求数量
    pub requested_qty: f64,       // 请求数量
    pub original_qty: f64,        // 原始数量 (比例缩放基准)
    pub expected_finish_qty: f64, // 预计完工数量

    // ===== 挂起 =====
    pub hold: bool,
    pub hold_reason: Option<String>,
    pub hold_until: Option<NaiveDateTime>,

    // ===== 需求日期 =====
    pub need_date_mode: NeedDateMode,
    pub need_date: Option<NaiveDateTime>,        // Explicit 模式下生效
    pub shipping_buffer_minutes: Option<i64>,    // 发运缓冲覆写

    // ===== 锁定标志 =====
    pub lock_to_current_path: bool,
    pub can_span_plants: bool,
    pub locked_plant: Option<String>, // 锁定工厂 (弱引用,按ID解析)

    // ===== 拆分/剥离谱系 =====
    pub split_from_id: Option<String>,
    pub split_update_mode: SplitUpdateMode,
    pub is_split: bool,
    pub break_off_source_id: Option<String>, // 剥离来源 (仅命名/审计用)

    // ===== 模板/库存回链 (弱引用,替换时保留) =====
    pub template_ref: Option<String>,
    pub inventory_ref: Option<String>,

    // ===== 集合 =====
    pub operations: HashMap<String, Operation>, // 工序注册表 (外部ID键控)
    pub alternate_paths: Vec<AlternatePath>,    // 备选路径 (不变量: >=1)
    pub current_path_id: Option<String>,
    pub default_path_id: Option<String>,
    pub successor_links: Vec<SuccessorLink>,

    // ===== JIT 派生需求日期 (单次模拟趟内维护) =====
    pub sub_need_date: Option<NaiveDateTime>,
    #[serde(skip)]
    pub sub_need_date_touched: bool,
}

impl ManufacturingOrder {
    pub fn new(external_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            job_id: job_id.into(),
            product_name: None,
            required_qty: 0.0,
            requested_qty: 0.0,
            original_qty: 0.0,
            expected_finish_qty: 0.0,
            hold: false,
            hold_reason: None,
            hold_until: None,
            need_date_mode: NeedDateMode::DerivedFromJob,
            need_date: None,
            shipping_buffer_minutes: None,
            lock_to_current_path: false,
            can_span_plants: false,
            locked_plant: None,
            split_from_id: None,
            split_update_mode: SplitUpdateMode::Proportional,
            is_split: false,
            break_off_source_id: None,
            template_ref: None,
            inventory_ref: None,
            operations: HashMap::new(),
            alternate_paths: Vec::new(),
            current_path_id: None,
            default_path_id: None,
            successor_links: Vec::new(),
            sub_need_date: None,
            sub_need_date_touched: false,
        }
    }

    // ==========================================
    // 路径集维护
    // ==========================================

    /// 路径集定稿: 按偏好排序,套用默认路径选择规则
    ///
    /// 显式请求的默认路径不存在时,与未请求同样走选择规则。
    /// 当前路径缺失时跟随默认路径。
    pub fn finalize_paths(
        &mut self,
        requested_default: Option<&str>,
    ) -> Result<(), DomainError> {
        if self.alternate_paths.is_empty() {
            return Err(DomainError::NoAlternatePath(self.external_id.clone()));
        }
        self.alternate_paths.sort_by_key(|p| p.preference);

        let default_id = requested_default
            .and_then(|id| self.path(id).map(|p| p.external_id.clone()))
            .or_else(|| {
                select_default_path(&self.alternate_paths).map(|p| p.external_id.clone())
            });
        self.default_path_id = default_id;

        let current_still_member = self
            .current_path_id
            .as_deref()
            .map(|id| self.path(id).is_some())
            .unwrap_or(false);
        if !current_still_member {
            self.current_path_id = self.default_path_id.clone();
        }
        self.verify_invariants()
    }

    /// 路径与工序注册表关联校验
    ///
    /// 每条路径引用的工序必须已存在于订单工序注册表中
    pub fn associate_operations_with_paths(&self) -> Result<(), DomainError> {
        if self.alternate_paths.is_empty() {
            return Err(DomainError::NoAlternatePath(self.external_id.clone()));
        }
        for path in &self.alternate_paths {
            for node in &path.nodes {
                if !self.operations.contains_key(&node.operation_id) {
                    return Err(DomainError::UnknownOperation {
                        path_id: path.external_id.clone(),
                        operation_id: node.operation_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 不变量: 路径集非空,当前/默认路径均为成员
    pub fn verify_invariants(&self) -> Result<(), DomainError> {
        if self.alternate_paths.is_empty() {
            return Err(DomainError::NoAlternatePath(self.external_id.clone()));
        }
        for id in [&self.current_path_id, &self.default_path_id].into_iter().flatten() {
            if self.path(id).is_none() {
                return Err(DomainError::PathNotMember {
                    order_id: self.external_id.clone(),
                    path_id: id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn path(&self, path_id: &str) -> Option<&AlternatePath> {
        self.alternate_paths
            .iter()
            .find(|p| p.external_id == path_id)
    }

    pub fn path_mut(&mut self, path_id: &str) -> Option<&mut AlternatePath> {
        self.alternate_paths
            .iter_mut()
            .find(|p| p.external_id == path_id)
    }

    pub fn current_path(&self) -> Option<&AlternatePath> {
        self.current_path_id.as_deref().and_then(|id| self.path(id))
    }

    pub fn default_path(&self) -> Option<&AlternatePath> {
        self.default_path_id.as_deref().and_then(|id| self.path(id))
    }

    /// 定位持有某工序的路径 (先查当前路径)
    pub fn path_owning_operation(&self, operation_id: &str) -> Option<&AlternatePath> {
        if let Some(current) = self.current_path() {
            if current.contains_operation(operation_id) {
                return Some(current);
            }
        }
        self.alternate_paths
            .iter()
            .find(|p| p.contains_operation(operation_id))
    }

    // ==========================================
    // 派生只读视图
    // ==========================================

    /// 产品名: 覆写优先,否则取当前路径拓扑序最后一个产出工序的产品
    pub fn resolved_product_name(&self) -> Option<String> {
        if let Some(name) = &self.product_name {
            return Some(name.clone());
        }
        let path = self.current_path()?;
        let mut product = None;
        path.for_each_in_topological_order(|node| {
            if let Some(op) = self.operations.get(&node.operation_id) {
                if let Some(p) = op.products_produced.first() {
                    product = Some(p.clone());
                }
            }
        });
        product
    }

    /// 任一工序被排程即视为订单已排程
    pub fn is_scheduled(&self) -> bool {
        self.operations.values().any(|op| op.sched_state.is_scheduled())
    }

    /// 全部非省略工序完工即视为订单完工
    pub fn is_finished(&self) -> bool {
        let mut any = false;
        for op in self.operations.values().filter(|op| op.is_active()) {
            any = true;
            if !op.sched_state.is_finished() {
                return false;
            }
        }
        any
    }

    /// 当前排程跨越的工厂集合
    pub fn scheduled_plants(&self) -> BTreeSet<String> {
        self.operations
            .values()
            .filter(|op| op.sched_state.is_scheduled())
            .filter_map(|op| op.scheduled_plant.clone())
            .collect()
    }

    /// 清除模拟引擎写入的全部观测字段
    ///
    /// 用于整单替换后的候选与新生的拆分/剥离子订单:
    /// 模拟引擎是排程字段的唯一写入方,本引擎只负责清零
    pub fn clear_simulation_state(&mut self) {
        for op in self.operations.values_mut() {
            op.sched_state = OpSchedState::Unscheduled;
            op.finished_qty = 0.0;
            op.scheduled_start = None;
            op.scheduled_plant = None;
            op.jit_start = None;
            op.resource_locked = false;
            op.anchored = false;
            op.bottleneck_flag = None;
        }
        self.sub_need_date = None;
        self.sub_need_date_touched = false;
    }

    // ==========================================
    // JIT 派生需求日期 (最紧后继胜出)
    // ==========================================

    /// 模拟趟开始时清除本趟的采纳标记
    pub fn begin_jit_pass(&mut self) {
        self.sub_need_date_touched = false;
    }

    /// 趟内首次调用无条件采纳;后续仅当更早时采纳
    ///
    /// 返回是否发生变更,供调用方打变更标记
    pub fn update_sub_need_date(&mut self, new_date: NaiveDateTime) -> bool {
        let adopt = if !self.sub_need_date_touched {
            true
        } else {
            match self.sub_need_date {
                Some(held) => new_date < held,
                None => true,
            }
        };
        self.sub_need_date_touched = true;
        if !adopt {
            return false;
        }
        let changed = self.sub_need_date != Some(new_date);
        self.sub_need_date = Some(new_date);
        changed
    }
}
