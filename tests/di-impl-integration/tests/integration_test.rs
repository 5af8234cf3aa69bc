//! Centralized integration tests for di-impl: spawning, inheritance and host descriptors
use di_abstractions::{ComponentResolver, DependencyDescriptor, DiContainer, Overrides};
use di_impl::{load_container_config, Container, RegistrationManifest};
use infrastructure_common::{DependencyError, Lifecycle};
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 测试组件
#[derive(Debug)]
struct Session {
    id: usize,
}

fn counting_session(container: &Container, name: &str, lifecycle: Lifecycle) -> Arc<AtomicUsize> {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    container
        .service(name, &[], lifecycle, move |_| {
            Ok(Session {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        })
        .unwrap();
    builds
}

#[test]
fn test_isolated_child_does_not_leak() {
    init_test_logger();
    let parent = Container::new();
    parent.constant("shared", 1_u8).unwrap();
    let child = parent.spawn(false);
    child.constant("local", 2_u8).unwrap();

    assert!(matches!(
        parent.get("local"),
        Err(DependencyError::UnknownDependency { .. })
    ));
    // 隔离的子容器也看不到父容器的定义
    assert!(matches!(
        child.get("shared"),
        Err(DependencyError::UnknownDependency { .. })
    ));
    assert!(parent.registered_names() == vec!["shared"]);
}

#[test]
fn test_inheriting_child_resolves_parent_names() {
    init_test_logger();
    let parent = Container::new();
    parent.constant("apiRoot", String::from("http://a")).unwrap();
    parent.enumeration("Level", &["low", "high"]).unwrap();
    parent
        .service("client", &["apiRoot"], Lifecycle::Application, |deps| {
            Ok(format!("client({})", deps.get::<String>(0)?))
        })
        .unwrap();

    let child = parent.spawn(true);
    child.constant("childOnly", 3_u8).unwrap();

    for name in ["apiRoot", "client"] {
        let from_parent = parent.get_as::<String>(name).unwrap();
        let from_child = child.get_as::<String>(name).unwrap();
        assert_eq!(from_parent, from_child);
    }
    assert!(child.get("Level").is_ok());
    assert!(child.get("childOnly").is_ok());
    assert!(parent.get("childOnly").is_err());
    assert!(!parent.has("childOnly"));
}

#[test]
fn test_grandchild_walks_whole_chain() {
    let root = Container::new();
    root.constant("depth", 0_u8).unwrap();
    let grandchild = root.spawn(true).spawn(true);
    assert_eq!(*grandchild.get_as::<u8>("depth").unwrap(), 0);
    assert_eq!(grandchild.definition_info("depth").unwrap().scope, "root");
}

#[test]
fn test_application_instance_shared_with_children() {
    let parent = Container::new();
    let builds = counting_session(&parent, "session", Lifecycle::Application);
    let child = parent.spawn(true);

    let from_child = child.get_as::<Session>("session").unwrap();
    let from_parent = parent.get_as::<Session>("session").unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_class_instance_is_per_container() {
    let parent = Container::new();
    let builds = counting_session(&parent, "session", Lifecycle::Class);
    let parent_session = parent.get_as::<Session>("session").unwrap();

    let child = parent.spawn(true);
    let child_first = child.get_as::<Session>("session").unwrap();
    let child_second = child.get_as::<Session>("session").unwrap();

    // 子容器从空缓存开始，但在自身范围内缓存
    assert!(!Arc::ptr_eq(&parent_session, &child_first));
    assert!(Arc::ptr_eq(&child_first, &child_second));
    assert_eq!(parent_session.id, 0);
    assert_eq!(child_first.id, 1);
    assert_eq!(builds.load(Ordering::SeqCst), 2);

    // 清理子容器缓存不影响父容器
    child.clear_cache(false);
    let child_rebuilt = child.get_as::<Session>("session").unwrap();
    assert!(!Arc::ptr_eq(&child_first, &child_rebuilt));
    assert!(Arc::ptr_eq(
        &parent_session,
        &parent.get_as::<Session>("session").unwrap()
    ));
}

#[test]
fn test_application_and_class_agree_on_child_only_dependency() {
    init_test_logger();
    for lifecycle in [Lifecycle::Application, Lifecycle::Class] {
        let parent = Container::new();
        parent
            .service("svc", &["dep"], lifecycle, |deps| Ok(*deps.get::<u8>(0)?))
            .unwrap();
        let child = parent.spawn(true);
        child.constant("dep", 9_u8).unwrap();

        assert_eq!(*child.get_as::<u8>("svc").unwrap(), 9, "{lifecycle}");
        assert!(parent.get("svc").is_err(), "{lifecycle}");
    }
}

#[test]
fn test_child_registration_shadows_for_class_lifecycle() {
    let parent = Container::new();
    parent.constant("greeting", String::from("hello")).unwrap();
    parent
        .service("message", &["greeting"], Lifecycle::Class, |deps| {
            Ok(format!("{} world", deps.get::<String>(0)?))
        })
        .unwrap();

    let child = parent.spawn(true);
    child.constant("greeting", String::from("bonjour")).unwrap();

    assert_eq!(*parent.get_as::<String>("message").unwrap(), "hello world");
    assert_eq!(*child.get_as::<String>("message").unwrap(), "bonjour world");
}

#[test]
fn test_reset_and_clear_cache_only_touch_own_registry() {
    let parent = Container::new();
    let builds = counting_session(&parent, "session", Lifecycle::Application);
    let child = parent.spawn(true);
    child.constant("local", 1_u8).unwrap();
    child.get("session").unwrap();

    child.clear_cache(true);
    child.reset();

    assert!(child.get("local").is_err());
    assert!(child.get("session").is_ok());
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(
        parent.definition_info("session").unwrap().lifecycle,
        Lifecycle::Application
    );
}

#[test]
fn test_overrides_apply_at_every_depth() {
    let container = Container::new();
    container.constant("leaf", 1_u32).unwrap();
    container
        .service("middle", &["leaf"], Lifecycle::Application, |deps| {
            Ok(*deps.get::<u32>(0)? + 10)
        })
        .unwrap();
    container
        .service("top", &["middle"], Lifecycle::Application, |deps| {
            Ok(*deps.get::<u32>(0)? + 100)
        })
        .unwrap();

    assert_eq!(*container.get_as::<u32>("top").unwrap(), 111);
    let overrides = Overrides::new().with("leaf", 5_u32);
    assert_eq!(*container.get_as_with::<u32>("top", &overrides).unwrap(), 115);
    let middle_override = Overrides::new().with("middle", 0_u32);
    assert_eq!(
        *container.get_as_with::<u32>("top", &middle_override).unwrap(),
        100
    );
    assert_eq!(*container.get_as::<u32>("top").unwrap(), 111);
}

#[test]
fn test_override_satisfies_unknown_name() {
    let container = Container::new();
    container
        .service("needs", &["provided"], Lifecycle::Application, |deps| {
            Ok(deps.get::<String>(0)?.len())
        })
        .unwrap();

    assert!(container.get("needs").is_err());
    let overrides = Overrides::new().with("provided", String::from("four"));
    assert_eq!(*container.get_as_with::<usize>("needs", &overrides).unwrap(), 4);
    // 由覆盖值满足的结果不缓存
    assert!(container.get("needs").is_err());
}

#[test]
fn test_override_cycle_member_breaks_cycle() {
    let container = Container::new();
    container
        .service("A", &["B"], Lifecycle::Application, |_| Ok(()))
        .unwrap();
    container
        .service("B", &["A"], Lifecycle::Application, |_| Ok(()))
        .unwrap();

    assert!(container.get("A").unwrap_err().cycle_path().is_some());
    let overrides = Overrides::new().with("B", ());
    assert!(container.get_with("A", &overrides).is_ok());
}

#[test]
fn test_resolve_descriptor_shapes() {
    let container = Container::new();
    container.constant("apiRoot", String::from("http://a")).unwrap();
    container.constant("timeout", 30_u64).unwrap();

    let single: DependencyDescriptor = serde_json::from_value(json!("apiRoot")).unwrap();
    let bindings = container
        .resolve_descriptor(&single, &Overrides::new())
        .unwrap();
    assert_eq!(*bindings.get_as::<String>("apiRoot").unwrap(), "http://a");

    let list: DependencyDescriptor = serde_json::from_value(json!(["timeout", "apiRoot"])).unwrap();
    let bindings = container.resolve_descriptor(&list, &Overrides::new()).unwrap();
    assert_eq!(bindings.aliases().collect::<Vec<_>>(), vec!["timeout", "apiRoot"]);

    let aliased: DependencyDescriptor =
        serde_json::from_value(json!({ "root": "apiRoot", "wait": "timeout" })).unwrap();
    let overrides = Overrides::new().with("timeout", 5_u64);
    let bindings = container.resolve_descriptor(&aliased, &overrides).unwrap();
    assert_eq!(*bindings.get_as::<u64>("wait").unwrap(), 5);
    assert_eq!(*bindings.get_as::<String>("root").unwrap(), "http://a");
    assert!(bindings.get("apiRoot").is_none());
}

#[test]
fn test_descriptor_fails_as_a_whole() {
    let container = Container::new();
    container.constant("present", 1_u8).unwrap();
    let descriptor = DependencyDescriptor::List(vec!["present".into(), "absent".into()]);
    assert!(matches!(
        container.resolve_descriptor(&descriptor, &Overrides::new()),
        Err(DependencyError::UnknownDependency { .. })
    ));
}

#[test]
fn test_manifest_on_parent_visible_to_child() {
    init_test_logger();
    let parent = Container::new();
    RegistrationManifest::from_value(&json!({
        "definitions": [
            { "name": "region", "kind": "constant", "value": "eu-west" },
            { "name": "Tier", "kind": "enum", "labels": ["free", "pro"], "lifecycle": "class" }
        ]
    }))
    .unwrap()
    .apply(&parent)
    .unwrap();

    let child = parent.spawn(true);
    assert_eq!(
        *child.get_as::<serde_json::Value>("region").unwrap(),
        json!("eu-west")
    );
    assert_eq!(child.definition_info("Tier").unwrap().lifecycle, Lifecycle::Class);
    assert!(child.validate().is_ok());
}

#[test]
fn test_stats_track_resolutions() {
    let container = Container::new();
    container.constant("a", 1_u8).unwrap();
    container.get("a").unwrap();
    container.get("a").unwrap();
    let _ = container.get("missing");

    let stats = container.stats();
    assert_eq!(stats.registered_components, 1);
    assert_eq!(stats.resolutions, 3);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.resolution_errors, 1);
    assert_eq!(stats.cached_instances, 1);
}

#[test]
fn test_container_from_config_and_manifest_files() {
    init_test_logger();
    let mut config_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        config_file,
        r#"{{ "name": "app", "max_resolution_depth": 3, "default_lifecycle": "class" }}"#
    )
    .unwrap();
    let mut manifest_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        manifest_file,
        "definitions:\n  - name: region\n    kind: constant\n    value: eu-west\n\
         \x20 - name: Tier\n    kind: enum\n    labels: [free, pro]"
    )
    .unwrap();

    let config = load_container_config(Some(config_file.path())).unwrap();
    let container = Container::with_config(config);
    RegistrationManifest::from_path(manifest_file.path())
        .unwrap()
        .apply(&container)
        .unwrap();

    assert_eq!(container.scope().name, "app");
    assert_eq!(container.spawn(true).scope().name, "app.1");
    assert_eq!(container.definition_info("region").unwrap().lifecycle, Lifecycle::Class);
    assert_eq!(
        *container.get_as::<serde_json::Value>("region").unwrap(),
        json!("eu-west")
    );
}
