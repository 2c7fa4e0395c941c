// ==========================================
// 制造订单路径与对账引擎 - 跨订单链接引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - SuccessorLinkage
// ==========================================
// 职责: 跨订单依赖边的递归闭包查询与目标解析
// 红线: 跨订单图不假设无环;已访问集显式出现在函数签名里,
//       意外环记录为异常日志而不是无限递归
// ==========================================

use std::collections::HashSet;
use tracing::warn;

use crate::domain::order::ManufacturingOrder;
use crate::domain::successor::{LinkTarget, SuccessorLink};
use crate::registry::OrderRegistry;

/// SuccessorLinkage - 跨订单链接引擎
#[derive(Debug, Default)]
pub struct SuccessorLinkage;

impl SuccessorLinkage {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 递归闭包查询
    // ==========================================

    /// 后继闭包,记录每次到达的 BOM 深度
    ///
    /// 直接后继深度为 0。同一订单可在多个深度出现,全部保留
    /// (菱形图上汇点按到达次数各记一条)。递归栈检查保证环上
    /// 终止,(订单, 深度) 已见集约束重复展开。
    pub fn successors_recursive(
        &self,
        registry: &OrderRegistry,
        order_id: &str,
    ) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        let mut stack = vec![order_id.to_string()];
        let mut seen: HashSet<(String, u32)> = HashSet::new();
        self.walk_successors(registry, order_id, 0, false, &mut stack, &mut seen, &mut out);
        out
    }

    /// 物料后继闭包: 只追随"后继确实消耗本单产出"的链接
    pub fn material_successors_recursive(
        &self,
        registry: &OrderRegistry,
        order_id: &str,
    ) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        let mut stack = vec![order_id.to_string()];
        let mut seen: HashSet<(String, u32)> = HashSet::new();
        self.walk_successors(registry, order_id, 0, true, &mut stack, &mut seen, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_successors(
        &self,
        registry: &OrderRegistry,
        order_id: &str,
        depth: u32,
        material_only: bool,
        stack: &mut Vec<String>,
        seen: &mut HashSet<(String, u32)>,
        out: &mut Vec<(String, u32)>,
    ) {
        let Some(mo) = registry.get(order_id) else {
            return;
        };
        for link in &mo.successor_links {
            let succ_id = link.successor_mo_id.as_str();
            if registry.get(succ_id).is_none() {
                continue;
            }
            if material_only && !self.is_material_link(registry, mo, link) {
                continue;
            }
            if stack.iter().any(|id| id == succ_id) {
                warn!(order = order_id, successor = succ_id, "跨订单链接存在环,截断遍历");
                continue;
            }
            out.push((succ_id.to_string(), depth));
            // 同 (订单,深度) 的子树只展开一次
            if seen.insert((succ_id.to_string(), depth)) {
                stack.push(succ_id.to_string());
                self.walk_successors(registry, succ_id, depth + 1, material_only, stack, seen, out);
                stack.pop();
            }
        }
    }

    /// 前驱闭包 (反向索引 + 已访问集)
    pub fn predecessors_of(&self, registry: &OrderRegistry, order_id: &str) -> Vec<String> {
        let index = registry.reverse_link_index();
        let mut out = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(order_id.to_string());
        let mut frontier = vec![order_id.to_string()];
        while let Some(current) = frontier.pop() {
            if let Some(preds) = index.get(&current) {
                for pred in preds {
                    if visited.insert(pred.clone()) {
                        out.push(pred.clone());
                        frontier.push(pred.clone());
                    }
                }
            }
        }
        out
    }

    // ==========================================
    // 链接目标解析 (工序级 > 路径级 > 订单级)
    // ==========================================

    /// 按精度降序解析链接目标,细粒度解析失败逐级回退
    pub fn resolve_link_target(&self, registry: &OrderRegistry, link: &SuccessorLink) -> LinkTarget {
        let Some(succ) = registry.get(&link.successor_mo_id) else {
            return LinkTarget::Order;
        };
        if let Some(op_id) = &link.operation_scope {
            if succ.operations.contains_key(op_id) {
                return LinkTarget::Operation(op_id.clone());
            }
            // 被引用工序已不存在,回退到路径级
        }
        if let Some(path_id) = &link.path_scope {
            if succ.path(path_id).is_some() {
                return LinkTarget::Path(path_id.clone());
            }
            // 被引用路径已不存在,回退到订单级
        }
        LinkTarget::Order
    }

    /// 判定后继的候选工序是否为本单的子装配消费点
    pub fn is_subassembly_consumer(
        &self,
        registry: &OrderRegistry,
        link: &SuccessorLink,
        candidate_operation_id: &str,
    ) -> bool {
        match self.resolve_link_target(registry, link) {
            LinkTarget::Operation(op_id) => op_id == candidate_operation_id,
            LinkTarget::Path(path_id) => registry
                .get(&link.successor_mo_id)
                .and_then(|succ| succ.path(&path_id))
                .map(|path| path.contains_operation(candidate_operation_id))
                .unwrap_or(false),
            LinkTarget::Order => registry
                .get(&link.successor_mo_id)
                .map(|succ| succ.operations.contains_key(candidate_operation_id))
                .unwrap_or(false),
        }
    }

    /// 链接是否供应物料: 解析到的目标确实消耗本单产出的产品
    fn is_material_link(
        &self,
        registry: &OrderRegistry,
        source: &ManufacturingOrder,
        link: &SuccessorLink,
    ) -> bool {
        let Some(succ) = registry.get(&link.successor_mo_id) else {
            return false;
        };
        let products: Vec<&String> = source
            .operations
            .values()
            .filter(|op| op.is_active())
            .flat_map(|op| op.products_produced.iter())
            .collect();
        if products.is_empty() {
            return false;
        }
        let consumes = |op_id: &str| -> bool {
            succ.operations
                .get(op_id)
                .map(|op| products.iter().any(|p| op.consumes(p)))
                .unwrap_or(false)
        };
        match self.resolve_link_target(registry, link) {
            LinkTarget::Operation(op_id) => consumes(&op_id),
            LinkTarget::Path(path_id) => succ
                .path(&path_id)
                .map(|path| path.nodes.iter().any(|n| consumes(&n.operation_id)))
                .unwrap_or(false),
            LinkTarget::Order => succ.operations.keys().any(|id| consumes(id)),
        }
    }
}
