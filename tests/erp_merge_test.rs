// ==========================================
// ErpMergeReconciler 单元测试
// ==========================================


use order_routing_aps::config::ReconcileConfig;
use order_routing_aps::domain::revision::{
    OperationRevision, OrderRevision, PathRevision, RevisionBatch,
};
use order_routing_aps::domain::routing::Association;
use order_routing_aps::domain::types::{AutoUsePolicy, OpSchedState};
use order_routing_aps::domain::EditRequest;
use order_routing_aps::engine::{ErpMergeReconciler, ReconcileError, RecordingSimulation};
use test_helpers::{chain_mo, chain_path, registry_with, schedule_op, ts};

fn op_rev(id: &str) -> OperationRevision {
    OperationRevision {
        external_id: id.to_string(),
        name: None,
        kind: None,
        omitted: None,
        required_qty: None,
        hours: None,
        products_produced: None,
        material_requirements: None,
    }
}

fn path_rev(path_id: &str, ids: &[&str]) -> PathRevision {
    PathRevision {
        external_id: path_id.to_string(),
        preference: 1,
        auto_use_policy: AutoUsePolicy::RegularRelease,
        nodes: ids.iter().map(|id| (id.to_string(), 1.0)).collect(),
        edges: ids
            .windows(2)
            .map(|w| Association::new(w[0], w[1]))
            .collect(),
    }
}

fn batch(job_id: &str, revisions: Vec<OrderRevision>) -> RevisionBatch {
    RevisionBatch {
        job_id: job_id.to_string(),
        job_need_date: None,
        revisions,
    }
}

#[test]
fn test_removing_scheduled_operation_forces_replace() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B", "C"]);
    schedule_op(&mut mo, "B", ts(5, 8), "PLANT-1");
    mo.template_ref = Some("TPL-7".to_string());
    mo.inventory_ref = Some("INV-3".to_string());
    let mut registry = registry_with(vec![mo]);

    let revision = OrderRevision {
        external_id: "MO1".to_string(),
        operations: Some(vec![op_rev("A"), op_rev("C")]),
        paths: Some(vec![path_rev("P1", &["A", "C"])]),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert_eq!(result.replaced, vec!["MO1".to_string()]);
    assert!(sim.unscheduled.contains(&"MO1".to_string()));

    // 替换后: 工序集为修订全集,模板/库存回链保留
    let live = registry.get("MO1").unwrap();
    assert!(live.operations.contains_key("A"));
    assert!(!live.operations.contains_key("B"));
    assert_eq!(live.template_ref.as_deref(), Some("TPL-7"));
    assert_eq!(live.inventory_ref.as_deref(), Some("INV-3"));

    // 所属工单被标记重算
    let job = registry.job("JOB1").unwrap();
    assert!(job.recompute.eligibility);
    assert!(job.recompute.constraint);
}

#[test]
fn test_replace_can_adopt_new_identity() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    schedule_op(&mut mo, "B", ts(5, 8), "PLANT-1");
    let mut registry = registry_with(vec![mo]);

    let revision = OrderRevision {
        external_id: "MO1".to_string(),
        replacement_id: Some("MO1-R2".to_string()),
        operations: Some(vec![op_rev("A")]),
        paths: Some(vec![path_rev("P1", &["A"])]),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert_eq!(result.replaced, vec!["MO1-R2".to_string()]);
    assert!(!registry.contains("MO1"));
    assert!(registry.contains("MO1-R2"));
}

#[test]
fn test_cosmetic_change_updates_in_place() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");
    let mut registry = registry_with(vec![mo]);

    let mut renamed = op_rev("A");
    renamed.name = Some("精整改名".to_string());
    let revision = OrderRevision {
        external_id: "MO1".to_string(),
        operations: Some(vec![renamed, op_rev("B")]),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert!(result.replaced.is_empty());
    assert_eq!(result.updated, vec!["MO1".to_string()]);
    assert!(sim.unscheduled.is_empty());

    let live = registry.get("MO1").unwrap();
    assert_eq!(live.operations["A"].name, "精整改名");
    // 排程观测字段在原地更新中保留
    assert_eq!(live.operations["A"].sched_state, OpSchedState::Scheduled);
}

#[test]
fn test_orders_absent_from_batch_are_deleted_splits_exempt() {
    let mo_a = chain_mo("MO-A", "JOB1", &["A"]);
    let mo_b = chain_mo("MO-B", "JOB1", &["B"]);
    let mut split = chain_mo("MO-S", "JOB1", &["A"]);
    split.split_from_id = Some("MO-A".to_string());
    split.is_split = true;
    let mut registry = registry_with(vec![mo_a, mo_b, split]);

    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    // 缺席的 MO-B 被删除;未处理拆分 MO-S 豁免
    assert_eq!(result.deleted, vec!["MO-B".to_string()]);
    assert!(registry.contains("MO-A"));
    assert!(registry.contains("MO-S"));
    assert!(!registry.contains("MO-B"));
}

#[test]
fn test_storage_resize_exception_skips_replacement() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    schedule_op(&mut mo, "B", ts(5, 8), "PLANT-1");
    mo.required_qty = 90.0; // 本地已做过仓储改量
    let mut registry = registry_with(vec![mo]);

    // 结构差异本应致命 (移除已排程工序 B),但仓储改量例外生效
    let revision = OrderRevision {
        external_id: "MO1".to_string(),
        required_qty: Some(100.0), // 等于在册 original_qty
        resize_for_storage: true,
        operations: Some(vec![op_rev("A")]),
        paths: Some(vec![path_rev("P1", &["A"])]),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert!(result.replaced.is_empty());
    assert!(result.failures.is_empty());

    // 结构原样保留,仅数量回到 100
    let live = registry.get("MO1").unwrap();
    assert!(live.operations.contains_key("B"));
    assert!((live.required_qty - 100.0).abs() < 1e-9);
}

#[test]
fn test_unchanged_split_total_preserves_splits_and_cascades() {
    let mut root = chain_mo("MO-A", "JOB1", &["A"]);
    root.required_qty = 60.0;
    {
        let a = root.operations.get_mut("A").unwrap();
        a.finished_qty = 50.0;
        a.sched_state = OpSchedState::Started;
    }
    let mut split = chain_mo("MO-S", "JOB1", &["A"]);
    split.required_qty = 40.0;
    split.split_from_id = Some("MO-A".to_string());
    split.is_split = true;
    let mut registry = registry_with(vec![root, split]);

    // ERP 视角的总量 100 = 60 + 40,未变
    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        required_qty: Some(100.0),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();
    assert!(result.failures.is_empty());

    // 拆分存续,本单不被改量,状态按占比级联
    assert!(registry.contains("MO-S"));
    let root = registry.get("MO-A").unwrap();
    assert!((root.required_qty - 60.0).abs() < 1e-9);
    let split_op = &registry.get("MO-S").unwrap().operations["A"];
    assert!((split_op.finished_qty - 20.0).abs() < 1e-9);
}

#[test]
fn test_replace_removes_unfinished_splits_keeps_finished() {
    let mut root = chain_mo("MO-A", "JOB1", &["A", "B"]);
    schedule_op(&mut root, "B", ts(5, 8), "PLANT-1");
    let mut s1 = chain_mo("MO-S1", "JOB1", &["A"]);
    s1.split_from_id = Some("MO-A".to_string());
    s1.is_split = true;
    let mut s2 = chain_mo("MO-S2", "JOB1", &["A"]);
    s2.split_from_id = Some("MO-A".to_string());
    s2.is_split = true;
    s2.operations.get_mut("A").unwrap().sched_state = OpSchedState::Finished;
    let mut registry = registry_with(vec![root, s1, s2]);

    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        operations: Some(vec![op_rev("A")]),
        paths: Some(vec![path_rev("P1", &["A"])]),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert_eq!(result.replaced, vec!["MO-A".to_string()]);
    // 未完工拆分随替换移除,已完工拆分保留供审计
    assert!(result.deleted.contains(&"MO-S1".to_string()));
    assert!(!registry.contains("MO-S1"));
    assert!(registry.contains("MO-S2"));
}

#[test]
fn test_new_order_is_created_from_revision() {
    let mut registry = registry_with(vec![]);
    let revision = OrderRevision {
        external_id: "MO-NEW".to_string(),
        required_qty: Some(80.0),
        operations: Some(vec![op_rev("A"), op_rev("B")]),
        paths: Some(vec![path_rev("P1", &["A", "B"])]),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert_eq!(result.created, vec!["MO-NEW".to_string()]);
    let live = registry.get("MO-NEW").unwrap();
    assert_eq!(live.current_path_id.as_deref(), Some("P1"));
    assert_eq!(live.default_path_id.as_deref(), Some("P1"));
    assert!((live.required_qty - 80.0).abs() < 1e-9);
}

#[test]
fn test_validation_failure_is_collected_batch_continues() {
    let mo_a = chain_mo("MO-A", "JOB1", &["A"]);
    let mo_b = chain_mo("MO-B", "JOB1", &["B"]);
    let mut registry = registry_with(vec![mo_a, mo_b]);

    let bad = OrderRevision {
        external_id: "MO-A".to_string(),
        required_qty: Some(-5.0),
        ..Default::default()
    };
    let good = OrderRevision {
        external_id: "MO-B".to_string(),
        hold: Some(true),
        ..Default::default()
    };

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![bad, good]))
        .unwrap();

    // 部分失败语义: MO-A 入失败清单,MO-B 照常生效,且 MO-A 不落入缺席删除
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].order_id, "MO-A");
    assert!(matches!(
        result.failures[0].error,
        ReconcileError::NonPositiveQuantity { .. }
    ));
    assert_eq!(result.updated, vec!["MO-B".to_string()]);
    assert!(registry.contains("MO-A"));
    assert!(registry.get("MO-B").unwrap().hold);
}

#[test]
fn test_enabling_span_plants_requires_entitlement() {
    let mo = chain_mo("MO-A", "JOB1", &["A"]);
    let mut registry = registry_with(vec![mo]);

    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        can_span_plants: Some(true),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert!(matches!(
        result.failures[0].error,
        ReconcileError::SpanPlantsNotEntitled(_)
    ));

    // 持有授权后同一修订生效
    let entitled = ErpMergeReconciler::new(ReconcileConfig {
        can_span_plants_entitled: true,
        ..Default::default()
    });
    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        can_span_plants: Some(true),
        ..Default::default()
    };
    let result = entitled
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();
    assert!(result.failures.is_empty());
    assert!(registry.get("MO-A").unwrap().can_span_plants);
}

#[test]
fn test_revoking_span_plants_while_spanning_forces_unschedule() {
    let mut mo = chain_mo("MO-A", "JOB1", &["A", "B"]);
    mo.can_span_plants = true;
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");
    schedule_op(&mut mo, "B", ts(6, 8), "PLANT-2");
    let mut registry = registry_with(vec![mo]);

    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        can_span_plants: Some(false),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert!(sim.unscheduled.contains(&"MO-A".to_string()));
    assert!(!registry.get("MO-A").unwrap().can_span_plants);
}

#[test]
fn test_locked_plant_mismatch_forces_unschedule() {
    let mut mo = chain_mo("MO-A", "JOB1", &["A"]);
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");
    let mut registry = registry_with(vec![mo]);

    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        locked_plant: Some("PLANT-2".to_string()),
        ..Default::default()
    };
    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();

    assert!(sim.unscheduled.contains(&"MO-A".to_string()));
    assert_eq!(
        registry.get("MO-A").unwrap().locked_plant.as_deref(),
        Some("PLANT-2")
    );
}

#[test]
fn test_unknown_locked_plant_reference_is_rejected() {
    let mo = chain_mo("MO-A", "JOB1", &["A"]);
    let mut registry = registry_with(vec![mo]);

    let reconciler = ErpMergeReconciler::new(ReconcileConfig {
        known_plants: Some(vec!["PLANT-1".to_string()]),
        ..Default::default()
    });
    let revision = OrderRevision {
        external_id: "MO-A".to_string(),
        locked_plant: Some("PLANT-9".to_string()),
        ..Default::default()
    };
    let mut sim = RecordingSimulation::default();
    let result = reconciler
        .receive(&mut registry, &mut sim, batch("JOB1", vec![revision]))
        .unwrap();
    assert!(matches!(
        result.failures[0].error,
        ReconcileError::LockedPlantNotFound { .. }
    ));
}

#[test]
fn test_edit_switch_path_rejected_while_scheduled() {
    let mut mo = chain_mo("MO-A", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");
    let mut registry = registry_with(vec![mo]);

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let edit = EditRequest {
        order_id: "MO-A".to_string(),
        current_path: Some("P2".to_string()),
        ..Default::default()
    };
    let err = reconciler
        .apply_edit(&mut registry, &mut sim, edit)
        .unwrap_err();
    assert!(matches!(err, ReconcileError::PathSwitchWhileScheduled { .. }));
}

#[test]
fn test_edit_applies_hold_and_need_date() {
    let mo = chain_mo("MO-A", "JOB1", &["A"]);
    let mut registry = registry_with(vec![mo]);

    let reconciler = ErpMergeReconciler::new(ReconcileConfig::default());
    let mut sim = RecordingSimulation::default();
    let edit = EditRequest {
        order_id: "MO-A".to_string(),
        hold: Some(true),
        hold_reason: Some("质检待定".to_string()),
        need_date: Some(ts(20, 0)),
        ..Default::default()
    };
    let changed = reconciler.apply_edit(&mut registry, &mut sim, edit).unwrap();
    assert!(changed);

    let live = registry.get("MO-A").unwrap();
    assert!(live.hold);
    assert_eq!(live.hold_reason.as_deref(), Some("质检待定"));
    assert_eq!(live.need_date, Some(ts(20, 0)));
    // 需求日期变更触发 JIT 重算标志
    assert!(registry.job("JOB1").unwrap().recompute.jit);
}
