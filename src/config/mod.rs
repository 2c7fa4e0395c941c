// ==========================================
// 制造订单路径与对账引擎 - 配置层
// ==========================================
// 依据: Order_Routing_Master_Spec.md - 能力开关与默认值
// ==========================================
// 红线: 跨厂授权是传入引擎的能力开关,不是全局单例查询
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ReconcileConfig - 对账配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// 是否持有跨厂排程授权 (许可能力开关)
    pub can_span_plants_entitled: bool,
    /// 工单派生需求日期的默认发运缓冲 (分钟)
    pub default_shipping_buffer_minutes: i64,
    /// 整单替换时是否保留已完工的拆分订单供审计
    pub preserve_finished_splits: bool,
    /// 已知工厂清单;None 表示不校验锁定工厂引用
    pub known_plants: Option<Vec<String>>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            can_span_plants_entitled: false,
            default_shipping_buffer_minutes: 0,
            preserve_finished_splits: true,
            known_plants: None,
        }
    }
}
