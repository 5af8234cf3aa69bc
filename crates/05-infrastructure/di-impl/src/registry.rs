//! 定义注册表实现

use crate::cache::CacheSlot;
use di_abstractions::{Definition, DefinitionRegistry, Instance, RegistrationHandle, RegistryEntry};
use infrastructure_common::{DependencyResult, Lifecycle};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 注册表中的一个定义及其缓存状态
#[derive(Debug)]
struct Registration {
    definition: Arc<Definition>,
    lifecycle: Lifecycle,
    cache: CacheSlot,
}

/// 注册表实现
///
/// 缓存槽与定义存放在一起，归本容器独占。
#[derive(Debug)]
pub struct RegistryStore {
    scope: String,
    warn_on_overwrite: bool,
    registrations: RwLock<HashMap<String, Registration>>,
}

impl RegistryStore {
    /// 创建新的注册表
    pub fn new(scope: impl Into<String>, warn_on_overwrite: bool) -> Self {
        Self {
            scope: scope.into(),
            warn_on_overwrite,
            registrations: RwLock::new(HashMap::new()),
        }
    }

    /// 写入缓存
    ///
    /// 仅当条目仍是构建时的定义且生命周期允许缓存时写入；返回最终应交给调用者的值。
    pub fn store(&self, name: &str, definition: &Arc<Definition>, value: Instance) -> Instance {
        let mut registrations = self.registrations.write();
        match registrations.get_mut(name) {
            Some(registration)
                if Arc::ptr_eq(&registration.definition, definition)
                    && registration.lifecycle.caches() =>
            {
                debug!("[{}] 缓存已解析的定义: {}", self.scope, name);
                registration.cache.write(value)
            }
            _ => value,
        }
    }

    /// 清理缓存，`forever` 为真时把所有定义改为不缓存；返回被清理的缓存数量
    pub fn clear_cache(&self, forever: bool) -> usize {
        let mut registrations = self.registrations.write();
        let mut cleared = 0;
        for registration in registrations.values_mut() {
            if registration.cache.is_resolved() {
                cleared += 1;
            }
            registration.cache.clear();
            if forever {
                registration.lifecycle = Lifecycle::None;
            }
        }
        cleared
    }

    /// 已缓存的实例数量
    pub fn cached_count(&self) -> usize {
        self.registrations
            .read()
            .values()
            .filter(|registration| registration.cache.is_resolved())
            .count()
    }

    /// 本地所有定义
    pub fn definitions(&self) -> Vec<Arc<Definition>> {
        self.registrations
            .read()
            .values()
            .map(|registration| Arc::clone(&registration.definition))
            .collect()
    }
}

impl DefinitionRegistry for RegistryStore {
    fn register(
        &self,
        definition: Definition,
        lifecycle: Lifecycle,
    ) -> DependencyResult<RegistrationHandle> {
        let handle = RegistrationHandle::new(&definition, lifecycle, self.scope.clone());
        let name = definition.name().to_string();
        let registration = Registration {
            definition: Arc::new(definition),
            lifecycle,
            cache: CacheSlot::default(),
        };

        let previous = self.registrations.write().insert(name.clone(), registration);
        if previous.is_some() {
            if self.warn_on_overwrite {
                warn!("[{}] 覆盖已有定义: {}", self.scope, name);
            } else {
                debug!("[{}] 覆盖已有定义: {}", self.scope, name);
            }
        }
        debug!(
            "[{}] 注册定义: {} ({}, {}), 依赖: {:?}",
            self.scope, name, handle.kind, lifecycle, handle.dependencies
        );

        Ok(handle)
    }

    fn lookup(&self, name: &str) -> Option<RegistryEntry> {
        self.registrations.read().get(name).map(|registration| RegistryEntry {
            definition: Arc::clone(&registration.definition),
            lifecycle: registration.lifecycle,
            cached: registration.cache.read().cloned(),
        })
    }

    fn contains(&self, name: &str) -> bool {
        self.registrations.read().contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registrations.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn len(&self) -> usize {
        self.registrations.read().len()
    }

    fn reset(&self) {
        let removed = {
            let mut registrations = self.registrations.write();
            let removed = registrations.len();
            registrations.clear();
            removed
        };
        debug!("[{}] 清空注册表，移除 {} 个定义", self.scope, removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RegistryStore {
        RegistryStore::new("test", false)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = store();
        let handle = registry
            .register(Definition::constant("answer", 42_u32).unwrap(), Lifecycle::Application)
            .unwrap();
        assert_eq!(handle.scope, "test");
        assert!(registry.contains("answer"));

        let entry = registry.lookup("answer").unwrap();
        assert_eq!(entry.definition.name(), "answer");
        assert!(entry.cached.is_none());
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = store();
        registry
            .register(Definition::constant("value", 1_u8).unwrap(), Lifecycle::Application)
            .unwrap();
        registry
            .register(Definition::constant("value", 2_u8).unwrap(), Lifecycle::None)
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("value").unwrap().lifecycle, Lifecycle::None);
    }

    #[test]
    fn test_store_respects_lifecycle_and_identity() {
        let registry = store();
        registry
            .register(Definition::constant("cached", 1_u8).unwrap(), Lifecycle::Application)
            .unwrap();
        registry
            .register(Definition::constant("fresh", 1_u8).unwrap(), Lifecycle::None)
            .unwrap();

        let cached = registry.lookup("cached").unwrap().definition;
        registry.store("cached", &cached, Arc::new(1_u8));
        assert!(registry.lookup("cached").unwrap().cached.is_some());

        let fresh = registry.lookup("fresh").unwrap().definition;
        registry.store("fresh", &fresh, Arc::new(1_u8));
        assert!(registry.lookup("fresh").unwrap().cached.is_none());

        // 构建期间定义被替换，结果不写入新定义的缓存
        registry
            .register(Definition::constant("cached", 9_u8).unwrap(), Lifecycle::Application)
            .unwrap();
        registry.store("cached", &cached, Arc::new(1_u8));
        assert!(registry.lookup("cached").unwrap().cached.is_none());
    }

    #[test]
    fn test_clear_cache_forever() {
        let registry = store();
        registry
            .register(Definition::constant("c", 1_u8).unwrap(), Lifecycle::Application)
            .unwrap();
        let definition = registry.lookup("c").unwrap().definition;
        registry.store("c", &definition, Arc::new(1_u8));
        assert_eq!(registry.cached_count(), 1);

        assert_eq!(registry.clear_cache(true), 1);
        assert_eq!(registry.cached_count(), 0);
        assert_eq!(registry.lookup("c").unwrap().lifecycle, Lifecycle::None);
    }

    #[test]
    fn test_reset_removes_everything() {
        let registry = store();
        registry
            .register(Definition::enumeration("E", ["a"]).unwrap(), Lifecycle::Application)
            .unwrap();
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }
}
