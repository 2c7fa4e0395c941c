// ==========================================
// SuccessorLinkage 单元测试
// ==========================================


use order_routing_aps::domain::successor::LinkTarget;
use order_routing_aps::domain::{MaterialRequirement, SuccessorLink};
use order_routing_aps::engine::SuccessorLinkage;
use test_helpers::{chain_mo, link, registry_with};

#[test]
fn test_diamond_join_appears_once_per_arrival_and_terminates() {
    // MO1 -> MO2, MO1 -> MO3, MO2 -> MO4, MO3 -> MO4
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    link(&mut mo1, "MO2", 0);
    link(&mut mo1, "MO3", 0);
    let mut mo2 = chain_mo("MO2", "JOB1", &["B"]);
    link(&mut mo2, "MO4", 0);
    let mut mo3 = chain_mo("MO3", "JOB1", &["C"]);
    link(&mut mo3, "MO4", 0);
    let mo4 = chain_mo("MO4", "JOB1", &["D"]);

    let registry = registry_with(vec![mo1, mo2, mo3, mo4]);
    let result = SuccessorLinkage::new().successors_recursive(&registry, "MO1");

    // 直接后继深度 0;汇点 MO4 经两条长度2的通路各到达一次,层级 {1,1}
    let mo4_depths: Vec<u32> = result
        .iter()
        .filter(|(id, _)| id == "MO4")
        .map(|(_, d)| *d)
        .collect();
    assert_eq!(mo4_depths, vec![1, 1]);
    assert_eq!(result.len(), 4);
}

#[test]
fn test_cycle_terminates_with_visited_stack() {
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    link(&mut mo1, "MO2", 0);
    let mut mo2 = chain_mo("MO2", "JOB1", &["B"]);
    link(&mut mo2, "MO1", 0); // 环

    let registry = registry_with(vec![mo1, mo2]);
    let result = SuccessorLinkage::new().successors_recursive(&registry, "MO1");

    // 环被截断: 只记录 MO2,不回到 MO1
    assert_eq!(result, vec![("MO2".to_string(), 0)]);
}

#[test]
fn test_predecessors_of_collects_transitive_closure() {
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    link(&mut mo1, "MO2", 0);
    let mut mo2 = chain_mo("MO2", "JOB1", &["B"]);
    link(&mut mo2, "MO4", 0);
    let mut mo3 = chain_mo("MO3", "JOB1", &["C"]);
    link(&mut mo3, "MO4", 0);
    let mo4 = chain_mo("MO4", "JOB1", &["D"]);

    let registry = registry_with(vec![mo1, mo2, mo3, mo4]);
    let mut preds = SuccessorLinkage::new().predecessors_of(&registry, "MO4");
    preds.sort();
    assert_eq!(preds, vec!["MO1", "MO2", "MO3"]);
}

#[test]
fn test_link_target_resolution_precedence_with_fallback() {
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    mo1.successor_links.push(
        SuccessorLink::new("MO2")
            .with_path_scope("P1")
            .with_operation_scope("B"),
    );
    let mo2 = chain_mo("MO2", "JOB1", &["B", "C"]);

    let registry = registry_with(vec![mo1, mo2]);
    let linkage = SuccessorLinkage::new();
    let link = registry.get("MO1").unwrap().successor_links[0].clone();

    // 工序级可解析: 最高精度
    assert_eq!(
        linkage.resolve_link_target(&registry, &link),
        LinkTarget::Operation("B".to_string())
    );

    // 工序不存在: 回退路径级
    let mut degraded = link.clone();
    degraded.operation_scope = Some("GONE".to_string());
    assert_eq!(
        linkage.resolve_link_target(&registry, &degraded),
        LinkTarget::Path("P1".to_string())
    );

    // 路径也不存在: 回退订单级
    degraded.path_scope = Some("P-GONE".to_string());
    assert_eq!(
        linkage.resolve_link_target(&registry, &degraded),
        LinkTarget::Order
    );
}

#[test]
fn test_subassembly_consumer_classification() {
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    mo1.successor_links
        .push(SuccessorLink::new("MO2").with_operation_scope("B"));
    let mo2 = chain_mo("MO2", "JOB1", &["B", "C"]);

    let registry = registry_with(vec![mo1, mo2]);
    let linkage = SuccessorLinkage::new();
    let link = registry.get("MO1").unwrap().successor_links[0].clone();

    assert!(linkage.is_subassembly_consumer(&registry, &link, "B"));
    assert!(!linkage.is_subassembly_consumer(&registry, &link, "C"));
}

#[test]
fn test_material_successors_follow_only_consuming_links() {
    let mut mo1 = chain_mo("MO1", "JOB1", &["A"]);
    mo1.operations
        .get_mut("A")
        .unwrap()
        .products_produced
        .push("钢坯".to_string());
    link(&mut mo1, "MO2", 0);
    link(&mut mo1, "MO3", 0);

    let mut mo2 = chain_mo("MO2", "JOB1", &["B"]);
    mo2.operations
        .get_mut("B")
        .unwrap()
        .material_requirements
        .push(MaterialRequirement {
            material_id: "钢坯".to_string(),
            qty_per_cycle: 1.0,
        });
    let mo3 = chain_mo("MO3", "JOB1", &["C"]); // 不消耗本单产出

    let registry = registry_with(vec![mo1, mo2, mo3]);
    let result = SuccessorLinkage::new().material_successors_recursive(&registry, "MO1");
    assert_eq!(result, vec![("MO2".to_string(), 0)]);
}
