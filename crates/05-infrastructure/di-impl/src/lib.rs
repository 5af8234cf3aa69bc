//! # 依赖注入具体实现
//!
//! 提供具体的依赖注入容器、定义注册表和解析器实现。
//!
//! ```ignore
//! let container = Container::new();
//! container.constant("apiRoot", String::from("http://a"))?;
//! container.factory("urlBuilder", &["apiRoot"], Lifecycle::Application, |deps| {
//!     let root = deps.get::<String>(0)?;
//!     Ok(Arc::new(UrlBuilder::new(root)))
//! })?;
//! let builder = container.get_as::<UrlBuilder>("urlBuilder")?;
//! ```

pub mod cache;
pub mod manifest;
pub mod registry;
mod resolver;
pub mod settings;

pub use manifest::{ManifestEntry, ManifestValue, RegistrationManifest};
pub use settings::load_container_config;

use crate::cache::ScopedCache;
use crate::registry::RegistryStore;
use di_abstractions::{
    CircularDependencyDetector, ComponentResolver, ContainerConfig, ContainerStats,
    DefaultCircularDependencyDetector, Definition, DefinitionRegistry, Dependencies,
    DependencyGraphNode, DiContainer, Instance, Overrides, RegistrationHandle, ResolveContext,
};
use infrastructure_common::{ContainerScope, DependencyError, DependencyResult, Lifecycle};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 解析计数器
#[derive(Debug, Default)]
struct StatsCounters {
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    errors: AtomicU64,
}

struct ContainerInner {
    scope: ContainerScope,
    config: ContainerConfig,
    registry: RegistryStore,
    /// 为继承的类生命周期定义构建的实例
    class_cache: ScopedCache,
    /// 父容器，只用于向上查找
    parent: Option<Container>,
    spawned: AtomicUsize,
    counters: StatsCounters,
}

/// 依赖注入容器
///
/// 克隆得到的是同一个容器的句柄。
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// 使用默认配置创建根容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建根容器
    pub fn with_config(config: ContainerConfig) -> Self {
        let scope = ContainerScope::new(config.name.clone());
        info!("创建容器: {} ({})", scope.name, scope.id);
        Self::build(scope, config, None)
    }

    fn build(scope: ContainerScope, config: ContainerConfig, parent: Option<Self>) -> Self {
        let registry = RegistryStore::new(scope.name.clone(), config.warn_on_overwrite);
        Self {
            inner: Arc::new(ContainerInner {
                scope,
                config,
                registry,
                class_cache: ScopedCache::new(),
                parent,
                spawned: AtomicUsize::new(0),
                counters: StatsCounters::default(),
            }),
        }
    }

    /// 注册定义
    pub fn register(
        &self,
        definition: Definition,
        lifecycle: Lifecycle,
    ) -> DependencyResult<RegistrationHandle> {
        self.inner.registry.register(definition, lifecycle)
    }

    /// 注册服务：构造器按声明顺序接收依赖，每次构建产生新实例
    pub fn service<T, F>(
        &self,
        name: &str,
        dependencies: &[&str],
        lifecycle: Lifecycle,
        constructor: F,
    ) -> DependencyResult<RegistrationHandle>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.register(Definition::service(name, dependencies, constructor)?, lifecycle)
    }

    /// 注册工厂：函数的返回值原样作为解析结果
    pub fn factory<T, F>(
        &self,
        name: &str,
        dependencies: &[&str],
        lifecycle: Lifecycle,
        function: F,
    ) -> DependencyResult<RegistrationHandle>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register(Definition::factory(name, dependencies, function)?, lifecycle)
    }

    /// 注册常量
    pub fn constant<T>(&self, name: &str, value: T) -> DependencyResult<RegistrationHandle>
    where
        T: Send + Sync + 'static,
    {
        self.register(Definition::constant(name, value)?, self.inner.config.default_lifecycle)
    }

    /// 注册枚举，标签按声明顺序映射为 0, 1, 2...
    pub fn enumeration(&self, name: &str, labels: &[&str]) -> DependencyResult<RegistrationHandle> {
        self.register(
            Definition::enumeration(name, labels.iter().copied())?,
            self.inner.config.default_lifecycle,
        )
    }

    /// 解析名称
    pub fn get(&self, name: &str) -> DependencyResult<Instance> {
        self.resolve(name)
    }

    /// 使用覆盖值解析名称
    pub fn get_with(&self, name: &str, overrides: &Overrides) -> DependencyResult<Instance> {
        self.resolve_with(name, overrides)
    }

    /// 名称在本容器或祖先容器中是否可见
    pub fn has(&self, name: &str) -> bool {
        self.can_resolve(name)
    }

    /// 父容器（仅继承模式派生的容器有）
    pub fn parent(&self) -> Option<&Self> {
        self.inner.parent.as_ref()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 本容器可见的所有定义，近处的定义遮蔽祖先的同名定义
    fn visible_definitions(&self) -> BTreeMap<String, Arc<Definition>> {
        let mut visible = BTreeMap::new();
        let mut current = Some(self);
        while let Some(container) = current {
            for definition in container.inner.registry.definitions() {
                visible
                    .entry(definition.name().to_string())
                    .or_insert(definition);
            }
            current = container.parent();
        }
        visible
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.inner.scope.name)
            .field("parent", &self.parent().map(|p| p.inner.scope.name.as_str()))
            .field("registrations", &self.inner.registry.len())
            .finish()
    }
}

impl ComponentResolver for Container {
    fn resolve_with(&self, name: &str, overrides: &Overrides) -> DependencyResult<Instance> {
        self.inner.counters.resolutions.fetch_add(1, Ordering::Relaxed);
        let mut context = ResolveContext::new(overrides, self.inner.config.max_resolution_depth);
        self.resolve_in(&mut context, name).map_err(|err| {
            self.inner.counters.errors.fetch_add(1, Ordering::Relaxed);
            warn!("[{}] 解析失败: {}, 原因: {}", self.inner.scope, name, err);
            err
        })
    }

    fn can_resolve(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

impl DiContainer for Container {
    fn spawn(&self, inherit: bool) -> Self {
        let index = self.inner.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        let scope = self.inner.scope.child(index);
        info!(
            "派生子容器: {} (继承: {}, 父容器: {})",
            scope.name, inherit, self.inner.scope
        );
        Self::build(scope, self.inner.config.clone(), inherit.then(|| self.clone()))
    }

    fn reset(&self) {
        info!("[{}] 重置容器", self.inner.scope);
        self.inner.registry.reset();
    }

    fn clear_cache(&self, forever: bool) {
        let cleared = self.inner.registry.clear_cache(forever) + self.inner.class_cache.len();
        self.inner.class_cache.clear();
        info!(
            "[{}] 清理缓存: {} 个实例{}",
            self.inner.scope,
            cleared,
            if forever { "，所有定义改为不缓存" } else { "" }
        );
    }

    fn has_local(&self, name: &str) -> bool {
        self.inner.registry.contains(name)
    }

    fn registered_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    fn definition_info(&self, name: &str) -> Option<RegistrationHandle> {
        self.locate(name).map(|located| {
            RegistrationHandle::new(
                &located.definition,
                located.lifecycle,
                located.owner.inner.scope.name.clone(),
            )
        })
    }

    fn scope(&self) -> &ContainerScope {
        &self.inner.scope
    }

    fn stats(&self) -> ContainerStats {
        let counters = &self.inner.counters;
        ContainerStats {
            registered_components: self.inner.registry.len(),
            cached_instances: self.inner.registry.cached_count() + self.inner.class_cache.len(),
            resolutions: counters.resolutions.load(Ordering::Relaxed),
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            resolution_errors: counters.errors.load(Ordering::Relaxed),
        }
    }

    fn validate(&self) -> Result<(), Vec<DependencyError>> {
        info!("[{}] 验证容器状态", self.inner.scope);
        let visible = self.visible_definitions();
        let mut errors = Vec::new();

        for definition in visible.values() {
            for dep in definition.dependencies() {
                if !visible.contains_key(dep) {
                    errors.push(DependencyError::UnknownDependency {
                        name: dep.clone(),
                        chain: vec![definition.name().to_string()],
                    });
                }
            }
        }

        let graph: Vec<DependencyGraphNode> = visible
            .values()
            .map(|definition| DependencyGraphNode::of(definition))
            .collect();
        if let Err(err) = DefaultCircularDependencyDetector.detect_circular_dependencies(&graph) {
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
