//! Centralized integration tests for di-impl crate
//!
//! 覆盖依赖解析、自动构造、放置约束、帧驱动与销毁的端到端场景

use di_abstractions::{resolve, ContainerSpec, DeclarationRegistry};
use di_impl::{ExecutionDriver, ManagerContainer};
use di_impl_integration_tests::{ids, recorder_registry, Journal};
use infrastructure_common::{
    ContainerError, ContainerState, ResolveError, ServiceError, ServiceId,
};
use std::sync::Arc;

fn id(name: &str) -> ServiceId {
    ServiceId::new(name)
}

/// 场景一：B 依赖 A，解析为 [A, B]，A 先于 B 完成 awake
#[test]
fn test_dependency_resolved_and_awoken_first() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("A", &[], false), ("B", &["A"], false)], &journal);

    assert_eq!(resolve(&registry, &ids(&["B"])).unwrap(), ids(&["A", "B"]));

    let mut container = ManagerContainer::new(ContainerSpec::global().request_id("B"), Arc::new(registry));
    container.initialize(None).unwrap();

    assert_eq!(journal.entries(), vec!["A.awake", "B.awake"]);
}

/// 场景二：X 与 Y 互相依赖，解析失败并指出环上的成员
#[test]
fn test_cycle_names_participant() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("X", &["Y"], false), ("Y", &["X"], false)], &journal);

    for _ in 0..3 {
        match resolve(&registry, &ids(&["X"])) {
            Err(ResolveError::CyclicDependency { service, chain }) => {
                assert!(service == id("X") || service == id("Y"));
                assert!(chain.contains(&id("X")) && chain.contains(&id("Y")));
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }
}

/// 场景三：会话容器请求仅全局服务 G，G 被跳过，容器仍进入 Active
#[test]
fn test_global_only_request_in_session_is_skipped() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("G", &[], true)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let session = driver
        .create_container(ContainerSpec::session("level-1").request_id("G"))
        .unwrap();
    let report = driver.initialize(&session).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        report.skipped[0].error,
        ContainerError::InvalidPlacement {
            service: id("G"),
            scope: "session:level-1".to_string(),
        }
    );
    assert_eq!(driver.container_state(&session), Some(ContainerState::Active));
    assert!(driver.container(&session).unwrap().is_empty());
    assert_eq!(journal.count("G.awake"), 0);
}

/// 全局容器已持有仅全局服务 G 时，会话容器请求 G 仍被拒绝，依赖方经全局回退取得 G
#[test]
fn test_global_only_request_rejected_while_global_holds_it() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("G", &[], true), ("Hud", &["G"], false)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let global = driver
        .create_container(ContainerSpec::global().request_id("G"))
        .unwrap();
    let session = driver
        .create_container(ContainerSpec::session("level-1").request_all(["G", "Hud"]))
        .unwrap();
    let results = driver.initialize_all();

    let report = results[1].1.as_ref().unwrap();
    assert!(report.provided_by_global.is_empty());
    assert_eq!(report.created, ids(&["Hud"]));
    assert_eq!(
        report.skipped[0].error,
        ContainerError::InvalidPlacement {
            service: id("G"),
            scope: "session:level-1".to_string(),
        }
    );
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(journal.count("G.awake"), 1);

    let through_session = driver.get_service(&session, &id("Hud"), &id("G")).unwrap();
    let held = driver
        .container(&global)
        .unwrap()
        .find_local(&id("G"))
        .unwrap()
        .cell()
        .clone();
    assert!(Arc::ptr_eq(&through_session, &held));
}

/// 对已处于 Active 的容器重复初始化只返回错误，不销毁任何实例
#[test]
fn test_repeated_initialize_leaves_containers_running() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("Core", &[], false), ("Level", &["Core"], false)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let global = driver
        .create_container(ContainerSpec::global().request_id("Core"))
        .unwrap();
    let session = driver
        .create_container(ContainerSpec::session("level-1").request_id("Level"))
        .unwrap();
    driver.initialize_all();

    for handle in [&session, &global] {
        assert!(matches!(
            driver.initialize(handle),
            Err(ContainerError::InvalidStateTransition {
                from: ContainerState::Active,
                ..
            })
        ));
        assert_eq!(driver.container_state(handle), Some(ContainerState::Active));
    }
    assert_eq!(journal.count("Core.destroy"), 0);
    assert_eq!(journal.count("Level.destroy"), 0);

    driver.on_frame_start();
    driver.on_update();
    assert_eq!(journal.count("Level.update"), 1);
    assert!(driver.get_service(&session, &id("Level"), &id("Core")).is_ok());
}

/// 场景四：新建实例不会在创建它的那一次帧开始中启动，而是在下一次
#[test]
fn test_start_deferred_to_next_frame_start() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("S", &[], false), ("Late", &[], false)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let global = driver
        .create_container(ContainerSpec::global().request_id("S"))
        .unwrap();
    driver.initialize(&global).unwrap();
    assert_eq!(journal.count("S.start"), 0);

    driver.on_frame_start();
    assert_eq!(journal.count("S.start"), 1);

    let session = driver
        .create_container(ContainerSpec::session("late").request_id("Late"))
        .unwrap();
    driver.initialize(&session).unwrap();
    driver.on_update();
    assert_eq!(journal.count("Late.start"), 0);
    assert_eq!(journal.count("Late.update"), 0);

    driver.on_frame_start();
    driver.on_frame_start();
    assert_eq!(journal.count("S.start"), 1);
    assert_eq!(journal.count("Late.start"), 1);
}

/// 场景五：全局容器已持有 D，会话容器不再创建第二个 D
#[test]
fn test_session_does_not_duplicate_global_dependency() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("D", &[], false), ("User", &["D"], false)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let global = driver
        .create_container(ContainerSpec::global().request_id("D"))
        .unwrap();
    let session = driver
        .create_container(ContainerSpec::session("level-1").request_id("User"))
        .unwrap();
    driver.initialize_all();

    assert_eq!(journal.count("D.awake"), 1);
    let local = driver.container(&session).unwrap();
    assert!(!local.contains(&id("D")));
    assert!(local.contains(&id("User")));

    let through_session = driver.get_service(&session, &id("User"), &id("D")).unwrap();
    let global_instance = driver
        .container(&global)
        .unwrap()
        .find_local(&id("D"))
        .unwrap()
        .cell()
        .clone();
    assert!(Arc::ptr_eq(&through_session, &global_instance));
}

/// 依赖 [B, C] 的服务在 B 与 C 都完成 awake 之后才 awake
#[test]
fn test_all_dependencies_awake_before_dependent() {
    let journal = Journal::default();
    let registry = recorder_registry(
        &[
            ("C", &[], false),
            ("B", &["C"], false),
            ("A", &["B", "C"], false),
            ("Other", &[], false),
        ],
        &journal,
    );

    let mut container = ManagerContainer::new(
        ContainerSpec::global().request_all(["Other", "A"]),
        Arc::new(registry),
    );
    let report = container.initialize(None).unwrap();

    let a = journal.position("A.awake").unwrap();
    assert!(journal.position("B.awake").unwrap() < a);
    assert!(journal.position("C.awake").unwrap() < a);
    assert_eq!(report.created, ids(&["Other", "C", "B", "A"]));
}

/// 自动构造的依赖在容器进入 Active 之前完成 awake
#[test]
fn test_autoconstructed_dependency_awake_before_active() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("Dep", &[], false), ("Root", &["Dep"], false)], &journal);

    let mut container = ManagerContainer::new(ContainerSpec::global().request_id("Root"), Arc::new(registry));
    assert_eq!(container.state(), ContainerState::Uninitialized);

    let report = container.initialize(None).unwrap();
    assert_eq!(container.state(), ContainerState::Active);
    assert!(report.created.contains(&id("Dep")));
    assert_eq!(journal.count("Dep.awake"), 1);
}

/// 销毁后的容器不再参与解析
#[test]
fn test_destroyed_container_lookups_fail() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("Dep", &[], false), ("Root", &["Dep"], false)], &journal);

    let mut container = ManagerContainer::new(ContainerSpec::global().request_id("Root"), Arc::new(registry));
    container.initialize(None).unwrap();
    assert!(container.get_service(None, &id("Root"), &id("Dep")).is_ok());

    container.destroy();

    let error = container.get_service(None, &id("Root"), &id("Dep")).unwrap_err();
    assert!(matches!(
        error,
        ServiceError::UnknownServiceType { .. } | ServiceError::MissingInstance { .. }
    ));
    assert!(!container.contains(&id("Dep")));
    assert_eq!(journal.entries()[2..], ["Root.destroy", "Dep.destroy"]);
}

/// 一个配置错误的容器不影响其他容器初始化与运行
#[test]
fn test_misconfigured_container_is_isolated() {
    let journal = Journal::default();
    let registry = recorder_registry(
        &[("X", &["Y"], false), ("Y", &["X"], false), ("Fine", &[], false)],
        &journal,
    );
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let broken = driver
        .create_container(ContainerSpec::global().request_id("X"))
        .unwrap();
    let healthy = driver
        .create_container(ContainerSpec::session("healthy").request_id("Fine"))
        .unwrap();

    let results = driver.initialize_all();
    assert!(matches!(results[0].1, Err(ContainerError::Resolve { .. })));
    assert!(results[1].1.is_ok());
    assert_eq!(driver.container_state(&broken), None);

    driver.on_frame_start();
    driver.on_update();
    assert_eq!(driver.container_state(&healthy), Some(ContainerState::Active));
    assert_eq!(journal.entries(), vec!["Fine.awake", "Fine.start", "Fine.update"]);
}

/// 未声明的依赖访问被拒绝
#[test]
fn test_undeclared_access_is_rejected() {
    let journal = Journal::default();
    let registry = recorder_registry(&[("A", &[], false), ("B", &[], false)], &journal);
    let mut driver = ExecutionDriver::new(Arc::new(registry));

    let global = driver
        .create_container(ContainerSpec::global().request_all(["A", "B"]))
        .unwrap();
    driver.initialize(&global).unwrap();

    assert_eq!(
        driver.get_service(&global, &id("A"), &id("B")).unwrap_err(),
        ServiceError::UndeclaredDependencyAccess {
            requester: id("A"),
            target: id("B"),
        }
    );
}

/// 注册表声明在构建后保持不变，可被多个驱动器共享
#[test]
fn test_registry_shared_between_drivers() {
    let journal = Journal::default();
    let registry: Arc<DeclarationRegistry> =
        Arc::new(recorder_registry(&[("Shared", &[], false)], &journal));

    let mut first = ExecutionDriver::new(registry.clone());
    let mut second = ExecutionDriver::new(registry.clone());
    for driver in [&mut first, &mut second] {
        let handle = driver
            .create_container(ContainerSpec::global().request_id("Shared"))
            .unwrap();
        driver.initialize(&handle).unwrap();
    }

    assert_eq!(journal.count("Shared.awake"), 2);
    assert_eq!(registry.len(), 1);
}
