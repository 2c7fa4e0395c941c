// ==========================================
// 订单快照往返测试
// ==========================================


use std::fs;
use std::io::Write;

use order_routing_aps::domain::snapshot::{OrderSnapshot, SNAPSHOT_VERSION};
use order_routing_aps::domain::types::{AutoUsePolicy, SplitUpdateMode};
use order_routing_aps::registry::OrderRegistry;
use test_helpers::{chain_mo, chain_path, link, ts};

#[test]
fn test_roundtrip_preserves_paths_identity_and_links() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();
    mo.shipping_buffer_minutes = Some(45);
    mo.sub_need_date = Some(ts(9, 6));
    link(&mut mo, "MO2", 30);
    let mo2 = chain_mo("MO2", "JOB1", &["C"]);

    let json = serde_json::to_string(&OrderSnapshot::capture(&mo)).unwrap();
    let snapshot: OrderSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert!(snapshot.has_successor_links);

    let restored = snapshot.restore().unwrap();
    assert_eq!(restored.external_id, "MO1");
    assert_eq!(restored.alternate_paths.len(), 2);
    assert_eq!(restored.current_path_id, mo.current_path_id);
    assert_eq!(restored.default_path_id, mo.default_path_id);
    assert_eq!(restored.shipping_buffer_minutes, Some(45));
    assert_eq!(restored.sub_need_date, Some(ts(9, 6)));
    assert_eq!(restored.operations.len(), 2);
    assert_eq!(restored.successor_links.len(), 1);

    // 重链接趟之后链接恢复已解析状态
    let mut registry = OrderRegistry::new();
    registry.insert(restored);
    registry.insert(mo2);
    registry.relink().unwrap();
    assert!(registry.get("MO1").unwrap().successor_links[0].resolved);
}

#[test]
fn test_roundtrip_through_file() {
    let mo = chain_mo("MO1", "JOB1", &["A", "B", "C"]);
    let json = serde_json::to_string_pretty(&OrderSnapshot::capture(&mo)).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let loaded = fs::read_to_string(file.path()).unwrap();
    let restored: OrderSnapshot = serde_json::from_str(&loaded).unwrap();
    let restored = restored.restore().unwrap();
    assert_eq!(restored.alternate_paths.len(), 1);
    assert_eq!(restored.operations.len(), 3);
}

#[test]
fn test_older_version_snapshot_defaults_newer_fields() {
    let mut mo = chain_mo("MO1", "JOB1", &["A"]);
    mo.shipping_buffer_minutes = Some(99);
    mo.is_split = true;
    mo.sub_need_date = Some(ts(3, 3));

    // 构造 v1 快照: 去掉 v2/v3 新增字段,装载器必须以默认值补齐
    let mut value = serde_json::to_value(OrderSnapshot::capture(&mo)).unwrap();
    let obj = value.as_object_mut().unwrap();
    obj.insert("version".to_string(), serde_json::json!(1));
    for field in [
        "shipping_buffer_minutes",
        "split_from_id",
        "split_update_mode",
        "is_split",
        "break_off_source_id",
        "sub_need_date",
    ] {
        obj.remove(field);
    }

    let snapshot: OrderSnapshot = serde_json::from_value(value).unwrap();
    assert_eq!(snapshot.version, 1);

    let restored = snapshot.restore().unwrap();
    assert_eq!(restored.shipping_buffer_minutes, None);
    assert_eq!(restored.split_update_mode, SplitUpdateMode::Proportional);
    assert!(!restored.is_split);
    assert_eq!(restored.sub_need_date, None);
    // 基础字段不受影响
    assert_eq!(restored.external_id, "MO1");
    assert_eq!(restored.current_path_id.as_deref(), Some("P1"));
}

#[test]
fn test_snapshot_rejects_inconsistent_path_reference() {
    let mo = chain_mo("MO1", "JOB1", &["A"]);
    let mut snapshot = OrderSnapshot::capture(&mo);
    // 当前路径指向不存在的成员: 还原时校验失败
    snapshot.current_path_id = Some("P-GONE".to_string());
    assert!(snapshot.restore().is_err());
}
