// ==========================================
// 制造订单路径与对账引擎 - 瓶颈分析引擎
// ==========================================
// 依据: Order_Routing_Master_Spec.md - BottleneckAnalyzer
// ==========================================
// 算法: 自当前路径叶节点正向单趟遍历;命中瓶颈即截断,
//       其全部可达后继压制为非瓶颈 (上游限制者胜出)
// 复杂度: O(节点+边),按需运行,不缓存
// ==========================================

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::operation::Operation;
use crate::domain::order::ManufacturingOrder;
use crate::domain::routing::AlternatePath;

// ==========================================
// 瓶颈判定谓词
// ==========================================

/// 外部瓶颈判定谓词 (模拟引擎供给)
pub trait BottleneckProbe {
    fn is_bottleneck(&self, op: &Operation) -> bool;
}

impl<F> BottleneckProbe for F
where
    F: Fn(&Operation) -> bool,
{
    fn is_bottleneck(&self, op: &Operation) -> bool {
        self(op)
    }
}

/// 默认谓词: 读模拟引擎写入的瓶颈标记
#[derive(Debug, Default)]
pub struct SimulationFlagProbe;

impl BottleneckProbe for SimulationFlagProbe {
    fn is_bottleneck(&self, op: &Operation) -> bool {
        op.reports_bottleneck()
    }
}

// ==========================================
// BottleneckAnalyzer - 瓶颈分析引擎
// ==========================================
#[derive(Debug, Default)]
pub struct BottleneckAnalyzer;

impl BottleneckAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// 分析订单当前路径,返回瓶颈工序ID
    pub fn analyze_current_path(
        &self,
        mo: &mut ManufacturingOrder,
        probe: &dyn BottleneckProbe,
    ) -> Vec<String> {
        let ManufacturingOrder {
            operations,
            alternate_paths,
            current_path_id,
            ..
        } = mo;
        let Some(current_id) = current_path_id.as_deref() else {
            return Vec::new();
        };
        let Some(path) = alternate_paths
            .iter_mut()
            .find(|p| p.external_id == current_id)
        else {
            return Vec::new();
        };
        self.analyze(path, operations, probe)
    }

    /// 分析一条路径,返回仍保持瓶颈标记的工序ID
    pub fn analyze(
        &self,
        path: &mut AlternatePath,
        operations: &HashMap<String, Operation>,
        probe: &dyn BottleneckProbe,
    ) -> Vec<String> {
        path.reset_bottleneck_flags();

        let positions: HashMap<String, usize> = path
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.operation_id.clone(), i))
            .collect();

        let leaf_indices: Vec<usize> = path
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i)
            .collect();

        for leaf in leaf_indices {
            if !path.nodes[leaf].tested {
                Self::visit(path, leaf, &positions, operations, probe);
            }
        }

        let result = self.bottleneck_operations(path);
        debug!(
            path = %path.external_id,
            count = result.len(),
            "瓶颈分析完成"
        );
        result
    }

    /// 当前标志下的瓶颈工序ID (拓扑序即节点序)
    pub fn bottleneck_operations(&self, path: &AlternatePath) -> Vec<String> {
        path.nodes
            .iter()
            .filter(|n| n.is_bottleneck)
            .map(|n| n.operation_id.clone())
            .collect()
    }

    fn visit(
        path: &mut AlternatePath,
        idx: usize,
        positions: &HashMap<String, usize>,
        operations: &HashMap<String, Operation>,
        probe: &dyn BottleneckProbe,
    ) {
        path.nodes[idx].tested = true;

        let hit = operations
            .get(&path.nodes[idx].operation_id)
            .map(|op| probe.is_bottleneck(op))
            .unwrap_or(false);

        let successor_indices: Vec<usize> = path.nodes[idx]
            .successors
            .iter()
            .filter_map(|id| positions.get(id).copied())
            .collect();

        if hit {
            // 上游限制者胜出: 命中即截断,全部可达后继压制
            path.nodes[idx].is_bottleneck = true;
            let mut suppressed = HashSet::new();
            for succ in successor_indices {
                Self::suppress(path, succ, positions, &mut suppressed);
            }
            return;
        }

        for succ in successor_indices {
            if !path.nodes[succ].tested {
                Self::visit(path, succ, positions, operations, probe);
            }
        }
    }

    /// 压制趟: 可达后继全部标记为 非瓶颈 + 已测试
    fn suppress(
        path: &mut AlternatePath,
        idx: usize,
        positions: &HashMap<String, usize>,
        visited: &mut HashSet<usize>,
    ) {
        if !visited.insert(idx) {
            return;
        }
        path.nodes[idx].is_bottleneck = false;
        path.nodes[idx].tested = true;
        let successor_indices: Vec<usize> = path.nodes[idx]
            .successors
            .iter()
            .filter_map(|id| positions.get(id).copied())
            .collect();
        for succ in successor_indices {
            Self::suppress(path, succ, positions, visited);
        }
    }
}
