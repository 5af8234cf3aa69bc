//! 递归解析算法
//!
//! 覆盖值 -> 沿父链查找定义 -> 循环检测 -> 读缓存 -> 按声明顺序解析依赖 -> 构建 -> 写缓存。

use crate::Container;
use di_abstractions::{
    Definition, DefinitionRegistry, Dependencies, DiContainer, Instance, Overrides, ResolveContext,
};
use infrastructure_common::{DependencyError, DependencyResult, Lifecycle};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

/// 沿父链找到的定义
pub(crate) struct Located {
    /// 拥有该定义的容器
    pub owner: Container,
    pub definition: Arc<Definition>,
    pub lifecycle: Lifecycle,
    /// 拥有者注册表中的缓存值
    pub cached: Option<Instance>,
}

impl Container {
    /// 依次在本容器、父容器、更上层祖先中查找定义
    pub(crate) fn locate(&self, name: &str) -> Option<Located> {
        let mut current = Some(self);
        while let Some(container) = current {
            if let Some(entry) = container.inner.registry.lookup(name) {
                return Some(Located {
                    owner: container.clone(),
                    definition: entry.definition,
                    lifecycle: entry.lifecycle,
                    cached: entry.cached,
                });
            }
            current = container.parent();
        }
        None
    }

    pub(crate) fn resolve_in(
        &self,
        context: &mut ResolveContext<'_>,
        name: &str,
    ) -> DependencyResult<Instance> {
        if let Some(value) = context.overrides().get(name) {
            trace!("[{}] 使用覆盖值: {}", self.scope(), name);
            return Ok(Arc::clone(value));
        }

        let located = self.locate(name).ok_or_else(|| DependencyError::UnknownDependency {
            name: name.to_string(),
            chain: context.chain().to_vec(),
        })?;

        let mut frame = context.enter(name)?;
        let builder = self.builder_for(&located);

        // 依赖子树触及覆盖值时，本次请求既不读也不写缓存
        let bypass_cache =
            !frame.overrides().is_empty() && self.reaches_override(&located, frame.overrides());

        if !bypass_cache {
            if let Some(value) = self.read_cache(&located, builder) {
                self.inner.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                trace!("[{}] 缓存命中: {}", self.scope(), name);
                return Ok(value);
            }
        }

        let mut dependencies = Dependencies::new();
        for dep in located.definition.dependencies() {
            let value = builder.resolve_in(&mut frame, dep)?;
            dependencies.push(dep.clone(), value);
        }

        debug!(
            "[{}] 构建定义: {} ({}, {})",
            builder.scope(),
            name,
            located.definition.kind(),
            located.lifecycle
        );
        let value = located
            .definition
            .instantiate(&dependencies)
            .map_err(|err| match err {
                DependencyError::ProducerFailed { .. } => err,
                other => DependencyError::producer_failed(name, other),
            })?;

        if bypass_cache || !located.lifecycle.caches() {
            return Ok(value);
        }
        Ok(self.write_cache(&located, builder, value))
    }

    /// 构建定义时解析依赖所用的容器
    ///
    /// 应用生命周期的实例由整个容器树共享，在拥有者能满足整棵依赖子树时于拥有者的上下文中构建；
    /// 否则与其他生命周期一样在发起解析的容器中构建，结果只缓存在该容器内。
    fn builder_for<'a>(&'a self, located: &'a Located) -> &'a Self {
        match located.lifecycle {
            Lifecycle::Application
                if located.cached.is_some()
                    || located.owner.is_same(self)
                    || located
                        .owner
                        .resolvable_from(&located.definition, &mut HashSet::new()) =>
            {
                &located.owner
            }
            _ => self,
        }
    }

    /// 静态判断定义的依赖子树能否从本容器的视角全部找到
    fn resolvable_from(
        &self,
        definition: &Definition,
        visited: &mut HashSet<(uuid::Uuid, String)>,
    ) -> bool {
        definition.dependencies().iter().all(|dep| {
            if !visited.insert((self.scope().id, dep.clone())) {
                return true;
            }
            let Some(next) = self.locate(dep) else {
                return false;
            };
            if next.lifecycle == Lifecycle::Application && !next.owner.is_same(self) {
                next.owner.resolvable_from(&next.definition, visited)
                    || self.resolvable_from(&next.definition, visited)
            } else {
                self.resolvable_from(&next.definition, visited)
            }
        })
    }

    /// 由拥有者构建的值放在拥有者的缓存槽，其余放在本容器的作用域缓存
    fn read_cache(&self, located: &Located, builder: &Self) -> Option<Instance> {
        if !located.lifecycle.caches() {
            None
        } else if builder.is_same(&located.owner) {
            located.cached.clone()
        } else {
            self.inner
                .class_cache
                .get(located.definition.name(), &located.definition)
        }
    }

    fn write_cache(&self, located: &Located, builder: &Self, value: Instance) -> Instance {
        let name = located.definition.name();
        if builder.is_same(&located.owner) {
            located.owner.inner.registry.store(name, &located.definition, value)
        } else {
            debug!("[{}] 缓存继承的定义: {} ({})", self.scope(), name, located.lifecycle);
            self.inner.class_cache.store(name, &located.definition, value)
        }
    }

    /// 静态遍历依赖图，判断定义是否（间接）依赖某个被覆盖的名称
    fn reaches_override(&self, located: &Located, overrides: &Overrides) -> bool {
        let mut visited = HashSet::new();
        self.walk_reaches_override(located, overrides, &mut visited)
    }

    fn walk_reaches_override(
        &self,
        located: &Located,
        overrides: &Overrides,
        visited: &mut HashSet<(uuid::Uuid, String)>,
    ) -> bool {
        let builder = self.builder_for(located);
        for dep in located.definition.dependencies() {
            if overrides.contains(dep) {
                return true;
            }
            if !visited.insert((builder.scope().id, dep.clone())) {
                continue;
            }
            if let Some(next) = builder.locate(dep) {
                if builder.walk_reaches_override(&next, overrides, visited) {
                    return true;
                }
            }
        }
        false
    }
}
