// ==========================================
// 制造订单路径与对账引擎 - 路径工序图
// ==========================================
// 依据: Order_Routing_Master_Spec.md - RoutingGraph / AlternatePath
// ==========================================
// 职责: 单条备选路径内的工序 DAG (节点 + 先后关联)
// 红线: 单路径工序图必须无环,构建期校验,运行期不再检查
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::domain::error::DomainError;
use crate::domain::operation::Operation;
use crate::domain::types::AutoUsePolicy;

// ==========================================
// Association - 先后关联边
// ==========================================
// 仅在同一路径内的节点之间成边
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub predecessor_id: String, // 前序工序ID
    pub successor_id: String,   // 后序工序ID
}

impl Association {
    pub fn new(predecessor_id: impl Into<String>, successor_id: impl Into<String>) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
        }
    }
}

// ==========================================
// Node - 路径节点
// ==========================================
// 包装一个工序(按外部ID引用),持有同路径内的先后关联
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub operation_id: String,            // 被包装工序的外部ID
    pub qty_per_parent: f64,             // 本路径下单件用量系数
    pub successors: BTreeSet<String>,    // 后序节点 (工序ID)
    pub predecessors: BTreeSet<String>,  // 前序节点 (工序ID)

    // 瓶颈分析临时标志 (按需重算,不入快照)
    #[serde(skip)]
    pub is_bottleneck: bool,
    #[serde(skip)]
    pub tested: bool,
}

impl Node {
    pub fn new(operation_id: impl Into<String>, qty_per_parent: f64) -> Self {
        Self {
            operation_id: operation_id.into(),
            qty_per_parent,
            successors: BTreeSet::new(),
            predecessors: BTreeSet::new(),
            is_bottleneck: false,
            tested: false,
        }
    }

    /// 叶节点: 无前序,遍历入口
    pub fn is_leaf(&self) -> bool {
        self.predecessors.is_empty()
    }
}

// ==========================================
// AlternatePath - 备选路径
// ==========================================
// 一条候选工艺路线: 有序节点集 (按工序外部ID键控) + 元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternatePath {
    pub external_id: String,          // 路径外部ID
    pub preference: i32,              // 偏好序 (越小越优先)
    pub auto_use_policy: AutoUsePolicy, // 自动启用策略
    pub nodes: Vec<Node>,             // 有序节点集
}

impl AlternatePath {
    /// 从有序节点清单与关联边清单构建路径
    ///
    /// 上游数据良构时图必然无环;此处的环检查是构建期的致命错误,
    /// 不是运行期防御。
    pub fn build(
        external_id: impl Into<String>,
        preference: i32,
        auto_use_policy: AutoUsePolicy,
        node_specs: Vec<(String, f64)>,
        edges: &[Association],
    ) -> Result<Self, DomainError> {
        let external_id = external_id.into();
        let mut nodes: Vec<Node> = node_specs
            .into_iter()
            .map(|(op_id, qty)| Node::new(op_id, qty))
            .collect();

        let positions: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.operation_id.clone(), i))
            .collect();

        for edge in edges {
            let Some(&pred_pos) = positions.get(&edge.predecessor_id) else {
                return Err(DomainError::DanglingAssociation {
                    path_id: external_id,
                    operation_id: edge.predecessor_id.clone(),
                });
            };
            let Some(&succ_pos) = positions.get(&edge.successor_id) else {
                return Err(DomainError::DanglingAssociation {
                    path_id: external_id,
                    operation_id: edge.successor_id.clone(),
                });
            };
            nodes[pred_pos].successors.insert(edge.successor_id.clone());
            nodes[succ_pos].predecessors.insert(edge.predecessor_id.clone());
        }

        let path = Self {
            external_id,
            preference,
            auto_use_policy,
            nodes,
        };
        path.verify_acyclic()?;
        Ok(path)
    }

    /// Kahn 拓扑校验: 消不完的节点即为环
    fn verify_acyclic(&self) -> Result<(), DomainError> {
        let mut visited = 0usize;
        self.walk_topological(|_| visited += 1);
        if visited != self.nodes.len() {
            return Err(DomainError::CyclicNodeGraph {
                path_id: self.external_id.clone(),
                remaining: self.nodes.len() - visited,
            });
        }
        Ok(())
    }

    /// 叶节点 (无前序),遍历入口
    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_leaf()).collect()
    }

    pub fn find_node(&self, operation_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.operation_id == operation_id)
    }

    pub fn find_node_mut(&mut self, operation_id: &str) -> Option<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.operation_id == operation_id)
    }

    /// 定位某工序是否属于本路径
    pub fn contains_operation(&self, operation_id: &str) -> bool {
        self.find_node(operation_id).is_some()
    }

    /// 按拓扑序访问每个节点
    pub fn for_each_in_topological_order(&self, mut visit: impl FnMut(&Node)) {
        self.walk_topological(|n| visit(n));
    }

    fn walk_topological(&self, mut visit: impl FnMut(&Node)) {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| (n.operation_id.as_str(), n.predecessors.len()))
            .collect();
        let mut queue: VecDeque<&Node> =
            self.nodes.iter().filter(|n| n.is_leaf()).collect();

        while let Some(node) = queue.pop_front() {
            visit(node);
            for succ_id in &node.successors {
                if let Some(deg) = in_degree.get_mut(succ_id.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        if let Some(succ) = self.find_node(succ_id) {
                            queue.push_back(succ);
                        }
                    }
                }
            }
        }
    }

    /// 非省略工序的合计工时 (标准/换型/加工/清场)
    pub fn aggregate_hours(&self, operations: &HashMap<String, Operation>) -> f64 {
        let mut total = 0.0;
        self.for_each_in_topological_order(|node| {
            if let Some(op) = operations.get(&node.operation_id) {
                if op.is_active() {
                    total += op.hours.total();
                }
            }
        });
        total
    }

    /// 清除瓶颈分析临时标志
    pub fn reset_bottleneck_flags(&mut self) {
        for node in &mut self.nodes {
            node.is_bottleneck = false;
            node.tested = false;
        }
    }
}

// ==========================================
// 默认路径选择规则
// ==========================================
// 前提: paths 已按 preference 升序排序
// 1. 首个 RegularRelease
// 2. 否则首个 ReleaseOffsetFromDefaultPathsLatestRelease
// 3. 否则按输入顺序取第一条
pub fn select_default_path(paths: &[AlternatePath]) -> Option<&AlternatePath> {
    paths
        .iter()
        .find(|p| p.auto_use_policy == AutoUsePolicy::RegularRelease)
        .or_else(|| {
            paths.iter().find(|p| {
                p.auto_use_policy == AutoUsePolicy::ReleaseOffsetFromDefaultPathsLatestRelease
            })
        })
        .or_else(|| paths.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_path(ids: &[&str]) -> AlternatePath {
        let specs = ids.iter().map(|id| (id.to_string(), 1.0)).collect();
        let edges: Vec<Association> = ids
            .windows(2)
            .map(|w| Association::new(w[0], w[1]))
            .collect();
        AlternatePath::build("P1", 1, AutoUsePolicy::RegularRelease, specs, &edges).unwrap()
    }

    #[test]
    fn test_build_chain_and_topological_order() {
        let path = chain_path(&["A", "B", "C"]);
        assert_eq!(path.leaves().len(), 1);
        assert_eq!(path.leaves()[0].operation_id, "A");

        let mut order = Vec::new();
        path.for_each_in_topological_order(|n| order.push(n.operation_id.clone()));
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_cycle_is_fatal_construction_error() {
        let specs = vec![("A".to_string(), 1.0), ("B".to_string(), 1.0)];
        let edges = vec![Association::new("A", "B"), Association::new("B", "A")];
        let err = AlternatePath::build("P1", 1, AutoUsePolicy::RegularRelease, specs, &edges)
            .unwrap_err();
        assert!(matches!(err, DomainError::CyclicNodeGraph { .. }));
    }

    #[test]
    fn test_dangling_association_rejected() {
        let specs = vec![("A".to_string(), 1.0)];
        let edges = vec![Association::new("A", "GHOST")];
        let err = AlternatePath::build("P1", 1, AutoUsePolicy::RegularRelease, specs, &edges)
            .unwrap_err();
        assert!(matches!(err, DomainError::DanglingAssociation { .. }));
    }

    #[test]
    fn test_diamond_topological_order_respects_edges() {
        // A -> B, A -> C, B -> D, C -> D
        let specs = ["A", "B", "C", "D"]
            .iter()
            .map(|id| (id.to_string(), 1.0))
            .collect();
        let edges = vec![
            Association::new("A", "B"),
            Association::new("A", "C"),
            Association::new("B", "D"),
            Association::new("C", "D"),
        ];
        let path =
            AlternatePath::build("P1", 1, AutoUsePolicy::RegularRelease, specs, &edges).unwrap();

        let mut pos: HashMap<String, usize> = HashMap::new();
        let mut i = 0usize;
        path.for_each_in_topological_order(|n| {
            pos.insert(n.operation_id.clone(), i);
            i += 1;
        });
        assert!(pos["A"] < pos["B"]);
        assert!(pos["A"] < pos["C"]);
        assert!(pos["B"] < pos["D"]);
        assert!(pos["C"] < pos["D"]);
    }
}
