// ==========================================
// 制造订单路径与对账引擎 - 订单注册表
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 并发与资源模型
// ==========================================
// 职责: 场景内订单的唯一存放处;弱引用按外部ID解析
// 红线: 单场景单线程变更;跨场景相互独立,无内部锁
// 红线: "缺席即删除"之类的结构性删改只允许在
//       预先物化的候选清单上进行,禁止边遍历边删除
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::order::ManufacturingOrder;
use crate::domain::types::RecomputeFlags;

// ==========================================
// JobContext - 工单上下文
// ==========================================
// 订单所属工单的需求日期与待消费重算标志
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobContext {
    pub need_date: Option<NaiveDateTime>,
    pub recompute: RecomputeFlags,
}

// ==========================================
// OrderRegistry - 订单注册表
// ==========================================
#[derive(Debug, Default)]
pub struct OrderRegistry {
    orders: HashMap<String, ManufacturingOrder>,
    jobs: HashMap<String, JobContext>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 基础存取
    // ==========================================

    pub fn get(&self, order_id: &str) -> Option<&ManufacturingOrder> {
        self.orders.get(order_id)
    }

    pub fn get_mut(&mut self, order_id: &str) -> Option<&mut ManufacturingOrder> {
        self.orders.get_mut(order_id)
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    pub fn insert(&mut self, mo: ManufacturingOrder) {
        self.jobs.entry(mo.job_id.clone()).or_default();
        self.orders.insert(mo.external_id.clone(), mo);
    }

    /// 摘除订单 (调用方负责先行 unschedule 与回链清理)
    pub fn remove(&mut self, order_id: &str) -> Option<ManufacturingOrder> {
        self.orders.remove(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManufacturingOrder> {
        self.orders.values()
    }

    /// 物化的订单ID清单,供结构性删改遍历使用
    pub fn order_ids(&self) -> Vec<String> {
        self.orders.keys().cloned().collect()
    }

    /// 某工单下全部订单ID (物化清单)
    pub fn order_ids_of_job(&self, job_id: &str) -> Vec<String> {
        self.orders
            .values()
            .filter(|mo| mo.job_id == job_id)
            .map(|mo| mo.external_id.clone())
            .collect()
    }

    // ==========================================
    // 工单上下文
    // ==========================================

    pub fn job(&self, job_id: &str) -> Option<&JobContext> {
        self.jobs.get(job_id)
    }

    pub fn job_mut(&mut self, job_id: &str) -> &mut JobContext {
        self.jobs.entry(job_id.to_string()).or_default()
    }

    pub fn set_job_need_date(&mut self, job_id: &str, need_date: Option<NaiveDateTime>) {
        self.job_mut(job_id).need_date = need_date;
    }

    /// 为工单累计重算标志,待下一查询周期惰性消费
    pub fn flag_job_recompute(&mut self, job_id: &str, flags: RecomputeFlags) {
        self.job_mut(job_id).recompute.merge(flags);
    }

    // ==========================================
    // 二阶段链接 (structural load, then relink)
    // ==========================================

    /// 批量装载后的重链接趟
    ///
    /// 校验每条后继链接的目标可解析并打上 resolved 标记。
    /// 目标悬空属结构性错误 (上游数据良构时不应出现)。
    pub fn relink(&mut self) -> Result<(), DomainError> {
        let known: HashSet<String> = self.orders.keys().cloned().collect();
        for mo in self.orders.values_mut() {
            for link in &mut mo.successor_links {
                if !known.contains(&link.successor_mo_id) {
                    warn!(
                        order = %mo.external_id,
                        successor = %link.successor_mo_id,
                        "后继链接目标悬空"
                    );
                    return Err(DomainError::DanglingSuccessorLink {
                        order_id: mo.external_id.clone(),
                        successor_id: link.successor_mo_id.clone(),
                    });
                }
                link.resolved = true;
            }
        }
        Ok(())
    }

    // ==========================================
    // 谱系与反向索引
    // ==========================================

    /// 直接或间接从 root 拆分出的订单 (递归闭包,带已访问集)
    pub fn split_descendants_of(&self, root_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![root_id.to_string()];
        while let Some(parent) = frontier.pop() {
            if !visited.insert(parent.clone()) {
                continue;
            }
            for mo in self.orders.values() {
                if mo.split_from_id.as_deref() == Some(parent.as_str()) {
                    result.push(mo.external_id.clone());
                    frontier.push(mo.external_id.clone());
                }
            }
        }
        result
    }

    /// 反向链接索引: 后继订单ID -> 指向它的前驱订单ID
    ///
    /// 按需构建;跨订单图不假设无环,遍历方自带已访问集
    pub fn reverse_link_index(&self) -> HashMap<String, Vec<String>> {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for mo in self.orders.values() {
            for link in &mo.successor_links {
                index
                    .entry(link.successor_mo_id.clone())
                    .or_default()
                    .push(mo.external_id.clone());
            }
        }
        index
    }
}
