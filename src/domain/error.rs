// ==========================================
// 制造订单路径与对账引擎 - 领域层错误类型
// ==========================================
// 依据: Rust 错误处理最佳实践
// 工具: thiserror 派生宏
// ==========================================
// 结构性错误 (上游数据良构时不应出现,视为缺陷):
//   环状工序图 / 路径引用不存在的工序 / 重链接后目标悬空
// 校验错误 (调用方可修正): 备选路径集为空
// ==========================================

use thiserror::Error;

/// 领域层错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    // ===== 结构性错误 =====
    #[error("工序图存在环: path={path_id}, 剩余节点 {remaining} 个无法拓扑排序")]
    CyclicNodeGraph { path_id: String, remaining: usize },

    #[error("路径引用了订单工序注册表之外的工序: path={path_id}, operation={operation_id}")]
    UnknownOperation {
        path_id: String,
        operation_id: String,
    },

    #[error("关联边端点不在路径节点集内: path={path_id}, operation={operation_id}")]
    DanglingAssociation {
        path_id: String,
        operation_id: String,
    },

    #[error("后继链接重链接后目标悬空: order={order_id}, successor={successor_id}")]
    DanglingSuccessorLink {
        order_id: String,
        successor_id: String,
    },

    // ===== 校验错误 =====
    #[error("至少需要一条备选路径: order={0}")]
    NoAlternatePath(String),

    #[error("当前/默认路径不在备选路径集内: order={order_id}, path={path_id}")]
    PathNotMember { order_id: String, path_id: String },
}
