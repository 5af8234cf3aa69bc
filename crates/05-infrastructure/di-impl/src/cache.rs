//! 解析结果缓存

use di_abstractions::{Definition, Instance};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// 单个定义的缓存槽
#[derive(Debug, Default)]
pub struct CacheSlot {
    value: Option<Instance>,
}

impl CacheSlot {
    /// 读取缓存值，`None` 表示尚未解析
    pub fn read(&self) -> Option<&Instance> {
        self.value.as_ref()
    }

    pub const fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// 写入缓存；已解析时保留先写入的值并返回它
    pub fn write(&mut self, value: Instance) -> Instance {
        Arc::clone(self.value.get_or_insert(value))
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// 类生命周期的容器级缓存
///
/// 保存本容器为继承而来的定义构建的实例。条目记录构建时使用的定义，
/// 父容器重新注册同名定义后旧条目不再命中。
#[derive(Debug, Default)]
pub struct ScopedCache {
    entries: RwLock<HashMap<String, (Arc<Definition>, Instance)>>,
}

impl ScopedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, definition: &Arc<Definition>) -> Option<Instance> {
        self.entries
            .read()
            .get(name)
            .filter(|(cached_for, _)| Arc::ptr_eq(cached_for, definition))
            .map(|(_, value)| Arc::clone(value))
    }

    /// 写入缓存；同一定义已有值时返回先写入的值
    pub fn store(&self, name: &str, definition: &Arc<Definition>, value: Instance) -> Instance {
        let mut entries = self.entries.write();
        if let Some((cached_for, existing)) = entries.get(name) {
            if Arc::ptr_eq(cached_for, definition) {
                return Arc::clone(existing);
            }
        }
        entries.insert(name.to_string(), (Arc::clone(definition), Arc::clone(&value)));
        value
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
