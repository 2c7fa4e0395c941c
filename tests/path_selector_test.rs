// ==========================================
// PathSelector 单元测试
// ==========================================


use order_routing_aps::domain::types::{AutoUsePolicy, LockReasons};
use order_routing_aps::engine::{PathSelector, ReconcileError};
use test_helpers::{chain_mo, chain_path, schedule_op, ts};

#[test]
fn test_single_path_always_includes_single_path_reason() {
    let mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    let selector = PathSelector::new();

    let reasons = selector.lock_reasons(&mo, None);
    assert!(reasons.contains(LockReasons::SINGLE_PATH));
    assert!(selector.is_locked_to_current_path(&mo, None));
}

#[test]
fn test_removing_second_path_flips_lock_state() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();

    let selector = PathSelector::new();
    assert!(!selector.is_locked_to_current_path(&mo, None));

    // 第二条路径被移除后锁定状态翻转
    mo.alternate_paths.retain(|p| p.external_id == "P1");
    mo.finalize_paths(None).unwrap();
    assert!(selector.is_locked_to_current_path(&mo, None));
    assert!(selector
        .lock_reasons(&mo, None)
        .contains(LockReasons::SINGLE_PATH));
}

#[test]
fn test_lock_flag_and_anchor_reasons() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();
    mo.lock_to_current_path = true;
    mo.operations.get_mut("B").unwrap().anchored = true;

    let reasons = PathSelector::new().lock_reasons(&mo, None);
    assert!(reasons.contains(LockReasons::LOCK_FLAG_SET));
    assert!(reasons.contains(LockReasons::ANCHORED));
    assert!(!reasons.contains(LockReasons::RESOURCE_LOCKED));
}

#[test]
fn test_resource_locked_only_counts_current_path() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.operations.insert(
        "X".to_string(),
        order_routing_aps::domain::Operation::new("X", "工序X", "MACHINING"),
    );
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["X"]));
    mo.finalize_paths(None).unwrap();
    assert_eq!(mo.current_path_id.as_deref(), Some("P1"));

    // 资源锁定在非当前路径的工序上: 不构成锁定原因
    mo.operations.get_mut("X").unwrap().resource_locked = true;
    let reasons = PathSelector::new().lock_reasons(&mo, None);
    assert!(!reasons.contains(LockReasons::RESOURCE_LOCKED));

    // 锁定移到当前路径工序上
    mo.operations.get_mut("A").unwrap().resource_locked = true;
    let reasons = PathSelector::new().lock_reasons(&mo, None);
    assert!(reasons.contains(LockReasons::RESOURCE_LOCKED));
}

#[test]
fn test_started_before_cutoff() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");

    let selector = PathSelector::new();
    // 截止线晚于开工: 视为已开工
    assert!(selector
        .lock_reasons(&mo, Some(ts(6, 0)))
        .contains(LockReasons::STARTED));
    // 截止线早于开工: 未开工
    assert!(!selector
        .lock_reasons(&mo, Some(ts(4, 0)))
        .contains(LockReasons::STARTED));
    // 无截止线: 不判开工
    assert!(!selector
        .lock_reasons(&mo, None)
        .contains(LockReasons::STARTED));
}

#[test]
fn test_switch_current_path_rejected_while_scheduled() {
    let mut mo = chain_mo("MO1", "JOB1", &["A", "B"]);
    mo.alternate_paths
        .push(chain_path("P2", 2, AutoUsePolicy::Other, &["A", "B"]));
    mo.finalize_paths(None).unwrap();
    schedule_op(&mut mo, "A", ts(5, 8), "PLANT-1");

    let selector = PathSelector::new();
    let err = selector.switch_current_path(&mut mo, "P2", false).unwrap_err();
    assert!(matches!(err, ReconcileError::PathSwitchWhileScheduled { .. }));

    // 整单替换流程例外
    assert!(selector.switch_current_path(&mut mo, "P2", true).unwrap());
    assert_eq!(mo.current_path_id.as_deref(), Some("P2"));
}

#[test]
fn test_switch_to_unknown_path_is_validation_error() {
    let mut mo = chain_mo("MO1", "JOB1", &["A"]);
    let err = PathSelector::new()
        .switch_current_path(&mut mo, "P-GONE", false)
        .unwrap_err();
    assert!(matches!(err, ReconcileError::PathNotFound { .. }));
    assert!(err.is_validation());
}
